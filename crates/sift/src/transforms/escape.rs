//! 🧼 Control-character escaping for free-text content.
//!
//! Newline, single quote, double quote, ampersand, carriage return, tab, backspace
//! and form-feed each become a two-character backslash sequence. Everything else
//! walks through untouched.
//!
//! Two modes, because history:
//! - [`EscapeMode::All`]: every occurrence, single left-to-right pass. The default.
//! - [`EscapeMode::FirstOccurrence`]: only the first occurrence of each class, applied
//!   class by class in the order above. This is what the legacy mappers emitted and
//!   some downstream consumers may have grown attached to it. 🦆

use serde::Deserialize;

/// 🎛️ How thorough the scrubbing is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscapeMode {
    #[default]
    All,
    FirstOccurrence,
}

// 📋 order matters for FirstOccurrence: it is the legacy replacement order
const ESCAPES: [(char, &str); 8] = [
    ('\n', "\\n"),
    ('\'', "\\'"),
    ('"', "\\\""),
    ('&', "\\&"),
    ('\r', "\\r"),
    ('\t', "\\t"),
    ('\u{8}', "\\b"),
    ('\u{c}', "\\f"),
];

fn escape_for(c: char) -> Option<&'static str> {
    ESCAPES
        .iter()
        .find(|(needle, _)| *needle == c)
        .map(|(_, replacement)| *replacement)
}

/// 🧽 Escape `content` according to `mode`.
pub fn escape_control_chars(content: &str, mode: EscapeMode) -> String {
    match mode {
        EscapeMode::All => {
            let mut escaped = String::with_capacity(content.len() + content.len() / 8);
            for c in content.chars() {
                match escape_for(c) {
                    Some(replacement) => escaped.push_str(replacement),
                    None => escaped.push(c),
                }
            }
            escaped
        }
        EscapeMode::FirstOccurrence => {
            // -- 🐢 one replacen per class, in table order. no replacement contains a
            // -- character from a later class, so the passes never feed each other.
            ESCAPES
                .iter()
                .fold(content.to_string(), |acc, (needle, replacement)| {
                    acc.replacen(*needle, replacement, 1)
                })
        }
    }
}
