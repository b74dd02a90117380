use stickies_core::screens::{ListController, EMPTY_LIST_HINT};
use stickies_core::NoteRepository;

use crate::commands::common::{format_note_lines, note_to_list_item, screen_error, NoteListItem};
use crate::error::CliError;

pub async fn run_list<R: NoteRepository>(repository: R, as_json: bool) -> Result<(), CliError> {
    let mut screen = ListController::new(repository);
    screen.mount().await;

    let state = screen.state();
    if state.error_message.is_some() {
        return Err(screen_error(state.error_message.as_deref()));
    }

    if as_json {
        let json_items = state
            .notes
            .iter()
            .map(note_to_list_item)
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if state.is_empty() {
        println!("{EMPTY_LIST_HINT}");
    } else {
        for line in format_note_lines(&state.notes) {
            println!("{line}");
        }
    }

    Ok(())
}
