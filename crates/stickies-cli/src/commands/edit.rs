use std::path::PathBuf;

use stickies_core::screens::{FormController, FormEvent};
use stickies_core::{NoteRepository, PickedImage};

use crate::commands::common::{resolve_note_id, screen_error, submit_form};
use crate::error::CliError;

/// Field changes requested on the command line.
#[derive(Debug, Default)]
pub struct NoteEdits {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image: Option<PathBuf>,
    pub remove_image: bool,
}

impl NoteEdits {
    fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.image.is_none() && !self.remove_image
    }
}

pub async fn run_edit<R: NoteRepository>(
    repository: R,
    id: &str,
    edits: NoteEdits,
) -> Result<(), CliError> {
    if edits.is_empty() {
        return Err(CliError::NothingToEdit);
    }

    let picked = match &edits.image {
        Some(path) => Some(PickedImage::from_path(path).await?),
        None => None,
    };
    let id = resolve_note_id(&repository, id).await?;

    let mut form = FormController::edit(repository, id);
    form.mount().await;
    if form.state().error_message.is_some() {
        return Err(screen_error(form.state().error_message.as_deref()));
    }

    if edits.remove_image {
        form.dispatch(FormEvent::ImageCleared).await;
    }
    if let Some(title) = edits.title {
        form.dispatch(FormEvent::TitleChanged(title)).await;
    }
    if let Some(content) = edits.content {
        form.dispatch(FormEvent::ContentChanged(content)).await;
    }
    if let Some(image) = picked {
        form.dispatch(FormEvent::ImagePicked(image)).await;
    }

    let note = submit_form(&mut form).await?;
    println!("{}", note.id);
    Ok(())
}
