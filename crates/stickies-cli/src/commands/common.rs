use std::path::Path;

use serde::Serialize;
use stickies_core::config::{AppConfig, ConfiguredRepository};
use stickies_core::screens::{FormController, Navigation};
use stickies_core::{Note, NoteRepository};

use crate::error::CliError;

const DATA_DIR_ENV: &str = "STICKIES_DATA_DIR";
const SHORT_ID_LEN: usize = 13;

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub id: String,
    pub title: String,
    pub preview: String,
    pub content: String,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
}

/// Build the repository from the environment, letting `--data-dir` win.
pub fn open_repository(data_dir: Option<&Path>) -> Result<ConfiguredRepository, CliError> {
    let data_dir = data_dir.map(|dir| dir.to_string_lossy().into_owned());
    let config = AppConfig::from_lookup(|name| match (name, &data_dir) {
        (DATA_DIR_ENV, Some(dir)) => Some(dir.clone()),
        _ => std::env::var(name).ok(),
    })?;
    tracing::debug!(
        data_dir = %config.data_dir.display(),
        remote = config.is_remote(),
        "Loaded configuration"
    );
    Ok(config.build_repository()?)
}

/// Resolve a full id or a unique id prefix to a note id.
///
/// Unknown ids are returned unchanged so the screen reports the store's answer.
pub async fn resolve_note_id<R: NoteRepository>(
    repository: &R,
    note_query: &str,
) -> Result<String, CliError> {
    let note_query = normalize_note_identifier(note_query)?;
    let notes = repository.list().await?;
    if notes.iter().any(|note| note.id == note_query) {
        return Ok(note_query);
    }

    let matching_ids = notes
        .iter()
        .filter(|note| note.id.starts_with(&note_query))
        .map(|note| note.id.as_str())
        .collect::<Vec<_>>();

    match matching_ids.as_slice() {
        [] => Ok(note_query),
        [id] => Ok((*id).to_string()),
        _ => {
            let options = matching_ids
                .iter()
                .take(3)
                .map(|id| id.chars().take(SHORT_ID_LEN).collect::<String>())
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousNoteId(format!(
                "ID prefix '{note_query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

/// Submit a form and return the saved note, or the message the form shows.
pub async fn submit_form<R: NoteRepository>(
    form: &mut FormController<R>,
) -> Result<Note, CliError> {
    match form.submit().await {
        Navigation::Back => form
            .state()
            .saved
            .clone()
            .ok_or_else(|| CliError::Screen("Save did not complete".to_string())),
        Navigation::Stay => Err(screen_error(form.state().error_message.as_deref())),
    }
}

pub fn screen_error(message: Option<&str>) -> CliError {
    CliError::Screen(message.unwrap_or("Operation did not complete").to_string())
}

pub fn format_note_lines(notes: &[Note]) -> Vec<String> {
    notes
        .iter()
        .map(|note| {
            let short_id = note.id.chars().take(SHORT_ID_LEN).collect::<String>();
            let title = truncate_with_ellipsis(note.title.trim(), 24);
            let preview = note_preview(note, 40);
            let image_marker = if note.image_url.is_some() { "  [image]" } else { "" };
            format!("{short_id:<13}  {title:<24}  {preview}{image_marker}")
        })
        .collect()
}

pub fn note_to_list_item(note: &Note) -> NoteListItem {
    NoteListItem {
        id: note.id.clone(),
        title: note.title.clone(),
        preview: note_preview(note, 80),
        content: note.content.clone(),
        image_url: note.image_url.clone(),
    }
}

pub fn note_preview(note: &Note, max_chars: usize) -> String {
    let first_line = note.content.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_with_ellipsis(&collapsed, max_chars)
}

fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = text.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn normalize_note_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyNoteId)
    } else {
        Ok(trimmed.to_string())
    }
}
