//! Per-screen view state.
//!
//! Each screen has a state struct, a pure `reduce(state, event)` returning the
//! next state plus effects, and a controller that owns the state and a
//! repository and runs the effects.

pub mod form;
pub mod list;

use crate::{Error, ErrorKind};

pub use form::{
    FormController, FormEffect, FormEvent, FormMode, FormState, ImageSource, Navigation,
    PendingOp,
};
pub use list::{DeletePolicy, ListController, ListEffect, ListEvent, ListState};

/// Message shown when an edit screen asks for an id the store does not have.
pub const NOTE_NOT_FOUND_MESSAGE: &str = "Note not found";

/// Hint shown by a list screen with no notes.
pub const EMPTY_LIST_HINT: &str = "No notes yet. Add a new note!";

/// Render an error as the single string a screen displays.
#[must_use]
pub fn user_message(error: &Error) -> String {
    match (error.kind(), error) {
        (ErrorKind::NotFound, _) => NOTE_NOT_FOUND_MESSAGE.to_string(),
        (ErrorKind::Validation, Error::Validation(message)) => message.clone(),
        _ => error.to_string(),
    }
}
