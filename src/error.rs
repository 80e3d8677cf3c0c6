use std::{io, path::PathBuf};

use miette::{Diagnostic, NamedSource, Report, SourceSpan};
use thiserror::Error;

use crate::location::SourceRange;

#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
#[error("lexical error")]
pub enum LexError {
    #[error("unterminated string literal at {range}")]
    #[diagnostic(code(cfe::unterminated_string_literal))]
    UnterminatedStringLiteral {
        range: SourceRange,
        #[label("string literal starts here")]
        at: SourceSpan,
    },

    #[error("invalid character literal at {range}")]
    #[diagnostic(
        code(cfe::invalid_char_literal),
        help("a character literal holds exactly one character")
    )]
    InvalidCharLiteral {
        range: SourceRange,
        #[label]
        at: SourceSpan,
    },

    #[error("unexpected character '{}' at {range}", shown(.byte))]
    #[diagnostic(code(cfe::unexpected_character))]
    UnexpectedCharacter {
        byte: u8,
        range: SourceRange,
        #[label]
        at: SourceSpan,
    },

    #[error("unknown escape sequence at {range}")]
    #[diagnostic(code(cfe::unknown_escape_sequence))]
    UnknownEscapeSequence {
        range: SourceRange,
        #[label]
        at: SourceSpan,
    },

    #[error("invalid number literal at {range}")]
    #[diagnostic(code(cfe::invalid_number_literal))]
    InvalidNumberLiteral {
        range: SourceRange,
        #[label]
        at: SourceSpan,
    },

    #[error("unterminated block comment at {range}")]
    #[diagnostic(code(cfe::unterminated_comment))]
    UnterminatedComment {
        range: SourceRange,
        #[label("comment starts here")]
        at: SourceSpan,
    },
}

impl LexError {
    pub fn range(&self) -> SourceRange {
        match self {
            LexError::UnterminatedStringLiteral { range, .. }
            | LexError::InvalidCharLiteral { range, .. }
            | LexError::UnexpectedCharacter { range, .. }
            | LexError::UnknownEscapeSequence { range, .. }
            | LexError::InvalidNumberLiteral { range, .. }
            | LexError::UnterminatedComment { range, .. } => *range,
        }
    }
}

/// Printable ASCII as itself, anything else as a `\xNN` escape.
fn shown(byte: &u8) -> String {
    if byte.is_ascii_graphic() {
        char::from(*byte).to_string()
    } else {
        format!("\\x{byte:02X}")
    }
}

/// Failure to decode the escapes of a string or character literal.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("unknown escape sequence at byte {offset}")]
pub struct EscapeError {
    /// Offset of the backslash within the raw literal content.
    pub offset: usize,
}

#[derive(Error, Diagnostic, Debug)]
pub enum LoadError {
    #[error("no such file at path: `{}`", path.display())]
    #[diagnostic(code(cfe::no_such_file))]
    NoSuchFile { path: PathBuf },

    #[error("failed to read `{}`", path.display())]
    #[diagnostic(code(cfe::io))]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Error, Diagnostic, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqError {
    #[error("index {index} out of range for sequence of length {len}")]
    #[diagnostic(code(cfe::index_out_of_range))]
    IndexOutOfRange { index: usize, len: usize },
}

/// Command line misuse. The message is the fully rendered clap error,
/// usage included.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
#[diagnostic(code(cfe::argument_parse_error))]
pub struct ArgumentParseError {
    pub message: String,
}

#[derive(Error, Diagnostic, Debug)]
pub enum DriverError {
    #[error("failed to lex file with errors: '{}'", path.display())]
    #[diagnostic(code(cfe::lex_failure))]
    Lex {
        path: PathBuf,
        text: String,
        #[source]
        error: LexError,
    },

    #[error("failed to write output")]
    #[diagnostic(code(cfe::output))]
    Output(#[from] io::Error),
}

impl DriverError {
    /// Converts the error into a report. Lex failures report the underlying
    /// [`LexError`] with the file's source attached so its label renders.
    pub fn into_report(self) -> Report {
        match self {
            DriverError::Lex { path, text, error } => Report::new(error)
                .with_source_code(NamedSource::new(path.display().to_string(), text)),
            other => Report::new(other),
        }
    }
}
