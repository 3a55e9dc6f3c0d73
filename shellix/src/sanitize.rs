//! Output sanitizer.
//!
//! Turns raw command output into text the transport can render inside a
//! MarkdownV2 code block: placeholder for empty output, tail truncation, then
//! escaping of reserved characters.
//!
//! The placeholder and the truncation marker are emitted as-is. Escaping runs
//! after truncation, so inserted backslashes may push the result past
//! [`MAX_MESSAGE_LEN`].

use shellix_shared::constants::transport::MAX_MESSAGE_LEN;

/// Substituted when the output is blank.
pub const EMPTY_PLACEHOLDER: &str = "Empty response";

/// Prepended when leading output was dropped.
pub const TRUNCATION_MARKER: &str = "... Message is too long\n";

/// Characters reserved by the transport markup.
pub const RESERVED: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Sanitize with the transport's default length limit.
pub fn sanitize(text: &str) -> String {
    sanitize_with_limit(text, MAX_MESSAGE_LEN)
}

pub fn sanitize_with_limit(text: &str, max_len: usize) -> String {
    if text.trim().is_empty() {
        return EMPTY_PLACEHOLDER.to_string();
    }

    match truncate_front(text, max_len) {
        Some(tail) => {
            let mut out = String::with_capacity(max_len + tail.len() / 4);
            out.push_str(TRUNCATION_MARKER);
            escape_into(tail, &mut out);
            out
        }
        None => escape(text),
    }
}

/// Returns the suffix to keep when `text` is longer than `max_len` chars.
///
/// The suffix plus [`TRUNCATION_MARKER`] is exactly `max_len` chars.
fn truncate_front(text: &str, max_len: usize) -> Option<&str> {
    let len = text.chars().count();
    if len <= max_len {
        return None;
    }
    let keep = max_len.saturating_sub(TRUNCATION_MARKER.chars().count());
    let skip = len - keep;
    let start = text
        .char_indices()
        .nth(skip)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    Some(&text[start..])
}

/// Backslash-escape every reserved character in one left-to-right pass.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    escape_into(text, &mut out);
    out
}

fn escape_into(text: &str, out: &mut String) {
    for c in text.chars() {
        if RESERVED.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
}
