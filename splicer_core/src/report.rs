//! Human-readable renderings of mutation sequences and dictionaries.

use crate::dictionary::{DictionaryEntry, Word};
use crate::mutator::MutatorKind;
use std::fmt::Write;

/// Escapes bytes for display.
///
/// Printable ASCII is kept as-is except `\` and `"`, which get a backslash;
/// every other byte becomes `\xHH`. The result can be parsed back by
/// [`crate::dictionary::parse_dictionary`] once wrapped in quotes.
pub fn escape_word(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &byte in bytes {
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'"' => out.push_str("\\\""),
            0x20..=0x7e => out.push(byte as char),
            _ => {
                let _ = write!(out, "\\x{:02x}", byte);
            }
        }
    }
    out
}

/// Renders `MS: <n> <Name>-... DE: "<word>"-...`.
///
/// The `DE:` part is omitted when no dictionary word was used.
pub fn render_mutation_sequence<'a>(
    mutators: &[MutatorKind],
    words: impl IntoIterator<Item = &'a Word>,
) -> String {
    let mut out = format!("MS: {} ", mutators.len());
    for mutator in mutators {
        let _ = write!(out, "{}-", mutator.name());
    }
    let mut words = words.into_iter().peekable();
    if words.peek().is_some() {
        out.push_str(" DE: ");
        for word in words {
            let _ = write!(out, "\"{}\"-", escape_word(word.as_bytes()));
        }
    }
    out
}

/// Renders dictionary entries as a ready-to-use dictionary file.
///
/// Returns an empty string when there is nothing to recommend.
pub fn render_recommended_dictionary<'a>(
    entries: impl IntoIterator<Item = &'a DictionaryEntry>,
) -> String {
    let mut body = String::new();
    for entry in entries {
        let _ = writeln!(
            body,
            "\"{}\" # Uses: {}",
            escape_word(entry.word().as_bytes()),
            entry.use_count()
        );
    }
    if body.is_empty() {
        return body;
    }
    format!(
        "###### Recommended dictionary. ######\n{}###### End of recommended dictionary. ######\n",
        body
    )
}
