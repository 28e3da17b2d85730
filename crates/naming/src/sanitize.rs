//! Filename sanitization.

/// Characters that are rejected or meaningful on at least one common filesystem.
const RESERVED: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Make `name` safe to use as a single path component.
///
/// Separators, reserved characters and control characters become `_`;
/// surrounding whitespace and trailing dots are trimmed. If nothing usable
/// remains, `fallback` is sanitized and used instead (or `"export"`).
pub fn sanitize_filename(name: &str, fallback: &str) -> String {
    match clean(name) {
        Some(cleaned) => cleaned,
        None => clean(fallback).unwrap_or_else(|| "export".to_string()),
    }
}

fn clean(name: &str) -> Option<String> {
    let replaced: String = name
        .chars()
        .map(|ch| {
            if RESERVED.contains(&ch) || ch.is_control() {
                '_'
            } else {
                ch
            }
        })
        .collect();

    let trimmed = replaced.trim().trim_end_matches('.').trim_end();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        None
    } else {
        Some(trimmed.to_string())
    }
}
