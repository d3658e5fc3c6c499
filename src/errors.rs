//! Errors generated by the parsers and the catalog containers.

use std::io;

use snafu::prelude::*;

/// Errors raised while parsing PO content.
///
/// Every variant produced by the line state machine carries the
/// 1-based line number of the offending line, available through
/// [POParseError::lineno].
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum POParseError {
    /// An unescaped double quote has been found inside a quoted
    /// field string.
    ///
    /// Quotes inside field values must be written as `\"`. A quote
    /// preceded by an even number of backslashes (including zero)
    /// terminates the string early and the rest of the line can not
    /// be parsed.
    #[snafu(display("unescaped double quote found: (line {line})"))]
    UnescapedDoubleQuote { line: usize },

    /// A line could not be classified as a comment, a directive or
    /// a continuation string.
    #[snafu(display("syntax error: (line {line})"))]
    Syntax { line: usize },

    /// A directive carried a malformed argument, like a `msgstr[n]`
    /// index that is not a number.
    #[snafu(display("{message}: (line {line})"))]
    Malformed { message: String, line: usize },

    /// Two entries share the same `(msgctxt, msgid, msgid_plural)`
    /// identity while duplicate checking is enabled.
    #[snafu(display("entry \"{msgid}\" already exists: (line {line})"))]
    Duplicate { msgid: String, line: usize },

    /// The underlying byte reader failed; the source error is
    /// propagated unchanged.
    #[snafu(display("{source}"))]
    #[snafu(context(false))]
    Io { source: io::Error },
}

impl POParseError {
    /// 1-based line where the error was detected, when the error
    /// originates from a line of the input.
    pub fn lineno(&self) -> Option<usize> {
        match self {
            POParseError::UnescapedDoubleQuote { line }
            | POParseError::Syntax { line }
            | POParseError::Malformed { line, .. }
            | POParseError::Duplicate { line, .. } => Some(*line),
            POParseError::Io { .. } => None,
        }
    }
}

/// Errors raised while parsing binary MO content.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum MOParseError {
    /// The file is shorter than the four bytes that should contain
    /// the magic number.
    #[snafu(display("invalid mo file, error reading magic number"))]
    ErrorReadingMagicNumber,

    /// The first four bytes are neither `0x950412de` nor its byte
    /// swapped form `0xde120495`.
    #[snafu(display(
        "invalid mo file, magic number is incorrect ({magic_number_le:#x} read as little endian, {magic_number_be:#x} read as big endian)"
    ))]
    IncorrectMagicNumber {
        magic_number_le: u32,
        magic_number_be: u32,
    },

    /// The revision field declares a major version other than 0
    /// or 1. The format specification instructs readers to stop at
    /// an unexpected major revision.
    #[snafu(display(
        "invalid mo file, expected major revision number 0 or 1, found {version}"
    ))]
    UnsupportedRevisionNumber { version: u32 },

    /// A length or offset points outside the file. The context names
    /// the parsing step that hit the truncation.
    #[snafu(display(
        "invalid mo file, malformed or corrupted data found when {context}"
    ))]
    CorruptedMOData { context: String },

    /// The underlying byte reader failed; the source error is
    /// propagated unchanged.
    #[snafu(display("{source}"))]
    #[snafu(context(false))]
    Io { source: io::Error },
}

/// An `append` or `insert` on a catalog with duplicate checking
/// enabled collided with an existing entry identity.
#[derive(Debug, PartialEq, Eq, Snafu)]
#[snafu(display("entry \"{msgid}\" already exists"))]
pub struct DuplicateEntryError {
    pub msgid: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn po_parse_error_display() {
        let err = POParseError::UnescapedDoubleQuote { line: 3 };
        assert_eq!(
            err.to_string(),
            "unescaped double quote found: (line 3)"
        );
        assert_eq!(err.lineno(), Some(3));
    }

    #[test]
    fn mo_parse_error_display() {
        let err = MOParseError::UnsupportedRevisionNumber {
            version: 2 << 16,
        };
        assert_eq!(
            err.to_string(),
            format!(
                "invalid mo file, expected major revision number 0 or 1, found {}",
                2 << 16,
            )
        );
    }

    #[test]
    fn duplicate_entry_error_display() {
        let err = DuplicateEntryError {
            msgid: "and".to_string(),
        };
        assert_eq!(err.to_string(), "entry \"and\" already exists");
    }
}
