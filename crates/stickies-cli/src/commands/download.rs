use std::path::{Path, PathBuf};

use chrono::Utc;
use stickies_core::export::{
    render_notes_export, suggested_export_file_name, suggested_note_file_name, ExportFormat,
};
use stickies_core::screens::ListController;
use stickies_core::NoteRepository;

use crate::commands::common::{resolve_note_id, screen_error};
use crate::error::CliError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadTarget {
    Note(String),
    All,
}

pub async fn run_download<R: NoteRepository>(
    repository: R,
    target: DownloadTarget,
    format: ExportFormat,
    output_path: Option<&Path>,
) -> Result<(), CliError> {
    let (notes, file_name) = match target {
        DownloadTarget::Note(query) => {
            let id = resolve_note_id(&repository, &query).await?;
            let note = repository
                .get_by_id(&id)
                .await?
                .ok_or(CliError::NoteNotFound(id))?;
            let file_name = suggested_note_file_name(&note, format);
            (vec![note], file_name)
        }
        DownloadTarget::All => {
            let mut screen = ListController::new(repository);
            screen.mount().await;
            if screen.state().error_message.is_some() {
                return Err(screen_error(screen.state().error_message.as_deref()));
            }
            let file_name = suggested_export_file_name(format, Utc::now().timestamp_millis());
            (screen.state().notes.clone(), file_name)
        }
    };

    let rendered = render_notes_export(&notes, format)?;
    if let Some(path) = output_path {
        let path = resolve_output_path(path, &file_name);
        std::fs::write(&path, rendered)?;
        println!("{}", path.display());
    } else {
        print!("{rendered}");
    }

    Ok(())
}

/// A directory output gets the suggested file name appended.
fn resolve_output_path(path: &Path, file_name: &str) -> PathBuf {
    if path.is_dir() {
        path.join(file_name)
    } else {
        path.to_path_buf()
    }
}
