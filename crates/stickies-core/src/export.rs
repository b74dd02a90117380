//! Note download/export rendering shared by clients.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::util::sanitize_token;
use crate::Note;

/// Export output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Json,
    #[default]
    Markdown,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }
}

/// Render notes as a pretty-printed JSON array in the stored wire shape.
pub fn render_json_export(notes: &[Note]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(notes)
}

/// Render notes as Markdown, one frontmatter block per note.
#[must_use]
pub fn render_markdown_export(notes: &[Note]) -> String {
    let mut output = String::new();

    for (index, note) in notes.iter().enumerate() {
        if index > 0 {
            output.push('\n');
        }

        let _ = writeln!(output, "---");
        let _ = writeln!(output, "id: {}", note.id);
        if let Some(image_url) = &note.image_url {
            let _ = writeln!(output, "image: {image_url}");
        }
        let _ = writeln!(output, "---");
        let _ = writeln!(output);
        let _ = writeln!(output, "# {}", note.title.trim());
        let _ = writeln!(output);
        if let Some(image_url) = &note.image_url {
            let _ = writeln!(output, "![{}]({image_url})", note.title.trim());
            let _ = writeln!(output);
        }
        output.push_str(note.content.trim_end());
        output.push('\n');
    }

    output
}

/// Render notes in the selected format.
pub fn render_notes_export(notes: &[Note], format: ExportFormat) -> serde_json::Result<String> {
    match format {
        ExportFormat::Json => render_json_export(notes),
        ExportFormat::Markdown => Ok(render_markdown_export(notes)),
    }
}

/// Default file name for downloading a single note, derived from its title.
#[must_use]
pub fn suggested_note_file_name(note: &Note, format: ExportFormat) -> String {
    let stem = sanitize_token(&note.title);
    let stem = if stem.is_empty() {
        "note".to_string()
    } else {
        stem
    };
    format!("{stem}.{}", format.extension())
}

/// Default file name for exporting every note.
#[must_use]
pub fn suggested_export_file_name(format: ExportFormat, timestamp_ms: i64) -> String {
    format!("stickies-export-{timestamp_ms}.{}", format.extension())
}
