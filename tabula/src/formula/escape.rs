//! Text escaping for formula arguments and sink-bound text
//!
//! JSON-style escaping of control and quote characters, so text can be
//! embedded in a formula or handed to a sink without being misread.

use regex::{Captures, Regex};
use std::sync::OnceLock;

fn pattern() -> &'static Regex {
    static ESCAPE: OnceLock<Regex> = OnceLock::new();
    ESCAPE.get_or_init(|| Regex::new(r#"[\x00-\x1f\\"]"#).unwrap())
}

pub fn needs_escape(text: &str) -> bool {
    pattern().is_match(text)
}

/// Quote and escape text for embedding inside a formula.
pub fn escape(text: &str) -> String {
    let replaced = pattern().replace_all(text, |caps: &Captures| {
        let c = caps[0].chars().next().expect("non-empty match");
        match c {
            '\\' => "\\\\".to_string(),
            '"' => "\\\"".to_string(),
            '\x08' => "\\b".to_string(),
            '\x0c' => "\\f".to_string(),
            '\n' => "\\n".to_string(),
            '\r' => "\\r".to_string(),
            '\t' => "\\t".to_string(),
            other => format!("\\u{:04x}", other as u32),
        }
    });
    format!("\"{}\"", replaced)
}

/// Escape only when the text contains control or quote characters;
/// clean text passes through untouched.
pub fn escape_if_needed(text: &str) -> String {
    if needs_escape(text) {
        escape(text)
    } else {
        text.to_string()
    }
}
