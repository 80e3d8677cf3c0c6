//! Front end of a C compiler: loads source files and lexes them into located
//! tokens.

pub mod builder;
pub mod driver;
pub mod error;
pub mod lexer;
pub mod location;
pub mod options;
pub mod seq;
pub mod source;

pub use error::{DriverError, LexError, LoadError};
pub use lexer::{Token, TokenKind, TokenStream, tokenize};
pub use location::{FileId, SourceRange};
