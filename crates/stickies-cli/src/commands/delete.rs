use stickies_core::screens::{DeletePolicy, ListController};
use stickies_core::NoteRepository;

use crate::commands::common::{resolve_note_id, screen_error};
use crate::error::CliError;

pub async fn run_delete<R: NoteRepository>(repository: R, id: &str) -> Result<(), CliError> {
    let id = resolve_note_id(&repository, id).await?;

    // Optimistic mode skips the reload, so only the delete decides the outcome.
    let mut screen = ListController::new(repository).with_delete_policy(DeletePolicy::Optimistic);
    screen.delete(id.clone()).await;
    if screen.state().error_message.is_some() {
        return Err(screen_error(screen.state().error_message.as_deref()));
    }

    println!("{id}");
    Ok(())
}
