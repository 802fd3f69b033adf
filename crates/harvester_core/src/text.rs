const TRUNCATED_MARKER: &str = " [truncated]";

/// The first `max_chars` characters of `text`, never splitting a character.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Single-line log preview: newlines flattened, long text cut with a marker.
pub fn log_preview(text: &str, max_chars: usize) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let truncated = truncate_chars(&flat, max_chars);
    if truncated.len() < flat.len() {
        format!("{truncated}{TRUNCATED_MARKER}")
    } else {
        flat
    }
}
