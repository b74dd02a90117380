//! Small text helpers shared by config parsing and HTTP adapters.

/// Trim optional text, turning blank values into `None`.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Check if a string starts with `http://` or `https://`.
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Trim a base URL and drop trailing slashes so paths can be appended with `/`.
pub fn trim_base_url(value: &str) -> String {
    value.trim().trim_end_matches('/').to_string()
}

/// Truncate response bodies to at most 180 characters for error messages.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

/// Lowercase ASCII token with runs of other characters collapsed to `-`.
pub fn sanitize_token(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_dash = false;

    for ch in input.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }

    out.trim_matches('-').to_string()
}

/// Sanitize a file name, keeping a sanitized extension when present.
pub fn sanitize_file_name(file_name: &str) -> String {
    let trimmed = file_name.trim().trim_matches('/');
    let (stem, ext) = trimmed.rsplit_once('.').unwrap_or((trimmed, ""));
    let stem = sanitize_token(stem);
    let stem = if stem.is_empty() {
        "image".to_string()
    } else {
        stem
    };
    let ext = sanitize_token(ext);

    if ext.is_empty() {
        stem
    } else {
        format!("{stem}.{ext}")
    }
}
