use std::fmt::{self, Display};

use ecow::EcoString;
use elegance::{Printer, Render};
use logos::{Lexer, Logos};
use miette::SourceSpan;
use tracing::{debug, trace};

use crate::{
    builder::StringBuilder,
    error::{EscapeError, LexError, SeqError},
    location::{FileId, SourceRange, Tracker},
    seq::Seq,
};

/// Lexes one source buffer into a token stream ending in [`TokenKind::Eof`].
///
/// Lexing stops at the first error.
pub fn tokenize(source: &[u8], file: Option<FileId>) -> Result<TokenStream, LexError> {
    Session::new(source, file).run()
}

/// State of one lexing run: the source, the location tracker and the tokens
/// produced so far.
pub struct Session<'src> {
    source: &'src [u8],
    tracker: Tracker,
    tokens: Seq<Token>,
}

impl<'src> Session<'src> {
    pub fn new(source: &'src [u8], file: Option<FileId>) -> Session<'src> {
        Session {
            source,
            tracker: Tracker::new(file),
            tokens: Seq::new(),
        }
    }

    pub fn run(mut self) -> Result<TokenStream, LexError> {
        let source = self.source;
        for (unit, span) in TokenUnit::lexer(source).spanned() {
            debug_assert_eq!(self.tracker.live().offset, span.start);
            self.tracker.save_mark();
            self.tracker.advance_over(&source[span.clone()]);
            match unit {
                Ok(unit) => self.lex(unit, &source[span.clone()], span.start)?,
                Err(error) => return Err(self.error(error, span.start)),
            }
        }

        debug_assert_eq!(self.tracker.live().offset, self.source.len());
        self.tracker.save_mark();
        self.emit(TokenKind::Eof, EcoString::new());
        debug!(tokens = self.tokens.len(), "lexed source");
        Ok(TokenStream {
            inner: self.tokens,
        })
    }

    fn lex(&mut self, unit: TokenUnit, slice: &[u8], start: usize) -> Result<(), LexError> {
        match unit {
            TokenUnit::Word(kind) => {
                let text = if kind == TokenKind::Ident {
                    text_of(slice)
                } else {
                    EcoString::new()
                };
                self.emit(kind, text);
            }
            TokenUnit::Punct(kind) => self.emit(kind, EcoString::new()),
            TokenUnit::Integer => self.emit(TokenKind::IntLit, text_of(slice)),
            TokenUnit::Float => self.emit(TokenKind::FloatLit, text_of(slice)),
            TokenUnit::Str => {
                let raw = quoted_content(slice);
                unescape(raw).map_err(|_| self.error(RawError::UnknownEscape, start))?;
                self.emit(TokenKind::StrLit, text_of(raw));
            }
            TokenUnit::Char => {
                let raw = quoted_content(slice);
                let value =
                    unescape(raw).map_err(|_| self.error(RawError::UnknownEscape, start))?;
                if value.len() != 1 {
                    return Err(self.error(RawError::InvalidChar, start));
                }
                self.emit(TokenKind::CharLit, text_of(raw));
            }
            TokenUnit::Whitespace | TokenUnit::Comment => {}
        }
        Ok(())
    }

    fn emit(&mut self, kind: TokenKind, text: EcoString) {
        let token = Token {
            kind,
            text,
            range: self.tracker.current_range(),
        };
        trace!(?token, "emit");
        self.tokens.push(token);
    }

    /// Builds the error for the lexeme between the mark and the live cursor.
    fn error(&self, error: RawError, start: usize) -> LexError {
        let range = self.tracker.current_range();
        let at = SourceSpan::from(start..self.tracker.live().offset);
        match error {
            RawError::UnexpectedCharacter => LexError::UnexpectedCharacter {
                byte: self.source[start],
                range,
                at,
            },
            RawError::UnterminatedString => LexError::UnterminatedStringLiteral { range, at },
            RawError::InvalidChar => LexError::InvalidCharLiteral { range, at },
            RawError::UnknownEscape => LexError::UnknownEscapeSequence { range, at },
            RawError::InvalidNumber => LexError::InvalidNumberLiteral { range, at },
            RawError::UnterminatedComment => LexError::UnterminatedComment { range, at },
        }
    }
}

/// Token text is UTF-8; bytes that are not become U+FFFD.
fn text_of(bytes: &[u8]) -> EcoString {
    EcoString::from(String::from_utf8_lossy(bytes).as_ref())
}

/// The content of a terminated literal lexeme, without its quotes.
fn quoted_content(slice: &[u8]) -> &[u8] {
    slice.get(1..slice.len().saturating_sub(1)).unwrap_or_default()
}

/// Decodes the escape sequences of raw string or character literal content.
///
/// Supports the simple escapes, octal `\ooo` and hexadecimal `\xhh`. Bytes
/// outside escapes are copied as they are, whatever the source encoding.
pub fn unescape(raw: impl AsRef<[u8]>) -> Result<StringBuilder, EscapeError> {
    let bytes = raw.as_ref();
    let mut value = StringBuilder::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' {
            value.append_char(bytes[i]);
            i += 1;
            continue;
        }
        let error = EscapeError { offset: i };
        let Some(&escape) = bytes.get(i + 1) else {
            return Err(error);
        };
        i += 2;
        let byte = match escape {
            b'n' => b'\n',
            b't' => b'\t',
            b'r' => b'\r',
            b'a' => 0x07,
            b'b' => 0x08,
            b'f' => 0x0c,
            b'v' => 0x0b,
            b'\\' | b'"' | b'\'' | b'?' => escape,
            b'0'..=b'7' => {
                let mut code = u32::from(escape - b'0');
                let mut digits = 1;
                while digits < 3 {
                    match bytes.get(i) {
                        Some(&d @ b'0'..=b'7') => {
                            code = code * 8 + u32::from(d - b'0');
                            digits += 1;
                            i += 1;
                        }
                        _ => break,
                    }
                }
                u8::try_from(code).map_err(|_| error)?
            }
            b'x' => {
                let digits = bytes[i..]
                    .iter()
                    .take_while(|b| b.is_ascii_hexdigit())
                    .count();
                if digits == 0 {
                    return Err(error);
                }
                let code = bytes[i..i + digits]
                    .iter()
                    .try_fold(0u8, |code, &d| {
                        let digit = char::from(d).to_digit(16)?;
                        code.checked_mul(16)?.checked_add(u8::try_from(digit).ok()?)
                    })
                    .ok_or(error)?;
                i += digits;
                code
            }
            _ => return Err(error),
        };
        value.append_char(byte);
    }
    Ok(value)
}

/// A lexical unit with its location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    kind: TokenKind,
    text: EcoString,
    range: SourceRange,
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// The spelling of identifiers and numbers, and the raw content between
    /// the quotes of string and character literals. Empty for every other
    /// kind.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn range(&self) -> SourceRange {
        self.range
    }

    pub fn pretty<'a, R: Render>(
        &'a self,
        pp: &mut Printer<'a, R, EcoString>,
    ) -> Result<(), R::Error> {
        match self.kind {
            TokenKind::Ident | TokenKind::IntLit | TokenKind::FloatLit => pp.text(&self.text),
            TokenKind::StrLit => {
                pp.text("\"")?;
                pp.text(&self.text)?;
                pp.text("\"")
            }
            TokenKind::CharLit => {
                pp.text("'")?;
                pp.text(&self.text)?;
                pp.text("'")
            }
            kind => pp.text(kind.spelling().unwrap_or_default()),
        }
    }
}

macro_rules! token_kinds {
    ($(
        $(#[$family:meta])*
        $($variant:ident => $spelling:expr),+ $(,)?
    );+ $(;)?) => {
        /// The class of a token.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum TokenKind {
            $($(#[$family])* $($variant,)+)+
            Ident,
            IntLit,
            FloatLit,
            StrLit,
            CharLit,
            Eof,
        }

        impl TokenKind {
            /// Every kind that has a fixed spelling.
            pub const FIXED: &'static [TokenKind] = &[$($(TokenKind::$variant,)+)+];

            /// The fixed spelling of keywords, punctuation and operators.
            pub fn spelling(self) -> Option<&'static str> {
                match self {
                    $($(TokenKind::$variant => Some($spelling),)+)+
                    _ => None,
                }
            }
        }
    };
}

token_kinds! {
    /// Keywords.
    Int => "int", Char => "char", Void => "void", Long => "long",
    Double => "double", Unsigned => "unsigned", Signed => "signed",
    Short => "short", Struct => "struct", Enum => "enum", Const => "const",
    Float => "float", Return => "return", If => "if", Else => "else",
    While => "while", For => "for", Do => "do", Break => "break",
    Continue => "continue", Switch => "switch", Case => "case",
    Default => "default", Goto => "goto", Static => "static",
    Extern => "extern", Typedef => "typedef", Sizeof => "sizeof",
    Union => "union";
    /// Punctuation.
    LParen => "(", RParen => ")", LBrace => "{", RBrace => "}",
    Comma => ",", Semi => ";", Colon => ":", LBracket => "[",
    RBracket => "]", Dot => ".", Question => "?", Hash => "#";
    /// Operators.
    Plus => "+", Minus => "-", Star => "*", Slash => "/", Percent => "%",
    Assign => "=", EqEq => "==", NotEq => "!=", Lt => "<", Gt => ">",
    LtEq => "<=", GtEq => ">=", Not => "!", AndAnd => "&&", OrOr => "||",
    Amp => "&", Pipe => "|", Caret => "^", Tilde => "~", Shl => "<<",
    Shr => ">>", Inc => "++", Dec => "--", Arrow => "->";
}

impl TokenKind {
    /// Looks `word` up in the keyword table.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        TokenKind::FIXED
            .iter()
            .copied()
            .filter(|kind| kind.is_keyword())
            .find(|kind| kind.spelling() == Some(word))
    }

    pub fn is_keyword(self) -> bool {
        self.spelling()
            .is_some_and(|s| s.bytes().all(|b| b.is_ascii_lowercase()))
    }
}

/// The tokens of one source file, in source order, ending in a single
/// [`TokenKind::Eof`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenStream {
    inner: Seq<Token>,
}

impl TokenStream {
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&Token, SeqError> {
        self.inner.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.inner.iter()
    }

    pub fn kinds(&self) -> Vec<TokenKind> {
        self.iter().map(Token::kind).collect()
    }

    pub fn pretty<'a, R: Render>(
        &'a self,
        pp: &mut Printer<'a, R, EcoString>,
    ) -> Result<(), R::Error> {
        pp.igroup(0, |pp| {
            for token in self.iter().filter(|t| t.kind != TokenKind::Eof) {
                token.pretty(pp)?;
                pp.space()?;
            }
            Ok(())
        })
    }
}

/// Renders the stream back to source text.
impl Display for TokenStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pp = Printer::new_with(String::new(), 120);
        self.pretty(&mut pp).map_err(|_| fmt::Error)?;
        write!(f, "{}", pp.finish().map_err(|_| fmt::Error)?)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum RawError {
    #[default]
    UnexpectedCharacter,
    UnterminatedString,
    InvalidChar,
    UnknownEscape,
    InvalidNumber,
    UnterminatedComment,
}

#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(source = [u8])]
#[logos(error = RawError)]
enum TokenUnit {
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", lex_word)]
    Word(TokenKind),

    #[token("(", |_| TokenKind::LParen)]
    #[token(")", |_| TokenKind::RParen)]
    #[token("{", |_| TokenKind::LBrace)]
    #[token("}", |_| TokenKind::RBrace)]
    #[token(",", |_| TokenKind::Comma)]
    #[token(";", |_| TokenKind::Semi)]
    #[token(":", |_| TokenKind::Colon)]
    #[token("[", |_| TokenKind::LBracket)]
    #[token("]", |_| TokenKind::RBracket)]
    #[token(".", |_| TokenKind::Dot)]
    #[token("?", |_| TokenKind::Question)]
    #[token("#", |_| TokenKind::Hash)]
    #[token("+", |_| TokenKind::Plus)]
    #[token("-", |_| TokenKind::Minus)]
    #[token("*", |_| TokenKind::Star)]
    #[token("/", |_| TokenKind::Slash)]
    #[token("%", |_| TokenKind::Percent)]
    #[token("=", |_| TokenKind::Assign)]
    #[token("==", |_| TokenKind::EqEq)]
    #[token("!=", |_| TokenKind::NotEq)]
    #[token("<", |_| TokenKind::Lt)]
    #[token(">", |_| TokenKind::Gt)]
    #[token("<=", |_| TokenKind::LtEq)]
    #[token(">=", |_| TokenKind::GtEq)]
    #[token("!", |_| TokenKind::Not)]
    #[token("&&", |_| TokenKind::AndAnd)]
    #[token("||", |_| TokenKind::OrOr)]
    #[token("&", |_| TokenKind::Amp)]
    #[token("|", |_| TokenKind::Pipe)]
    #[token("^", |_| TokenKind::Caret)]
    #[token("~", |_| TokenKind::Tilde)]
    #[token("<<", |_| TokenKind::Shl)]
    #[token(">>", |_| TokenKind::Shr)]
    #[token("++", |_| TokenKind::Inc)]
    #[token("--", |_| TokenKind::Dec)]
    #[token("->", |_| TokenKind::Arrow)]
    Punct(TokenKind),

    #[regex(r"[0-9]+([uU](l|L|ll|LL)?|(l|L|ll|LL)[uU]?)?", lex_integer)]
    #[regex(r"0[xX][0-9a-fA-F]+([uU](l|L|ll|LL)?|(l|L|ll|LL)[uU]?)?")]
    Integer,

    #[regex(r"[0-9]+[eE][+-]?[0-9]+[fFlL]?")]
    #[regex(r"[0-9]*\.[0-9]+([eE][+-]?[0-9]+)?[fFlL]?")]
    #[regex(r"[0-9]+\.([eE][+-]?[0-9]+)?[fFlL]?")]
    Float,

    #[token("\"", |lex| lex_quoted(lex, b'"', RawError::UnterminatedString))]
    Str,

    #[token("'", |lex| lex_quoted(lex, b'\'', RawError::InvalidChar))]
    Char,

    #[regex(r"[ \t\r\n\x0B\x0C]+")]
    Whitespace,

    #[token("//", lex_line_comment)]
    #[token("/*", lex_block_comment)]
    Comment,
}

fn lex_word(lex: &mut Lexer<TokenUnit>) -> TokenKind {
    std::str::from_utf8(lex.slice())
        .ok()
        .and_then(TokenKind::keyword)
        .unwrap_or(TokenKind::Ident)
}

/// Rejects octal literals holding an `8` or `9`.
fn lex_integer(lex: &mut Lexer<TokenUnit>) -> Result<(), RawError> {
    let slice = lex.slice();
    let digits = &slice[..slice.iter().take_while(|b| b.is_ascii_digit()).count()];
    if digits.len() > 1 && digits[0] == b'0' && digits.iter().any(|&b| b > b'7') {
        return Err(RawError::InvalidNumber);
    }
    Ok(())
}

/// Scans the rest of a quoted literal after its opening quote, closing quote
/// included. A newline or the end of input before the closing quote fails
/// with `unterminated`, leaving the lexeme up to that point.
fn lex_quoted(lex: &mut Lexer<TokenUnit>, quote: u8, unterminated: RawError) -> Result<(), RawError> {
    let rest = lex.remainder();
    let mut i = 0;
    while i < rest.len() {
        match rest[i] {
            b'\\' if rest.get(i + 1).is_some_and(|&b| b != b'\n') => i += 2,
            b'\n' | b'\\' => break,
            b if b == quote => {
                lex.bump(i + 1);
                return Ok(());
            }
            _ => i += 1,
        }
    }
    // Stop before the newline, or consume an escape-less trailing backslash.
    let consumed = if rest.get(i) == Some(&b'\\') { i + 1 } else { i };
    lex.bump(consumed.min(rest.len()));
    Err(unterminated)
}

fn lex_line_comment(lex: &mut Lexer<TokenUnit>) -> Result<(), RawError> {
    let rest = lex.remainder();
    lex.bump(rest.iter().position(|&b| b == b'\n').unwrap_or(rest.len()));
    Ok(())
}

fn lex_block_comment(lex: &mut Lexer<TokenUnit>) -> Result<(), RawError> {
    let rest = lex.remainder();
    match rest.windows(2).position(|pair| pair == b"*/") {
        Some(end) => {
            lex.bump(end + 2);
            Ok(())
        }
        None => {
            lex.bump(rest.len());
            Err(RawError::UnterminatedComment)
        }
    }
}
