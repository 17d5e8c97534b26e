//! Lexer for Apache httpd.conf
//!
//! Tokenizes the httpd.conf directive syntax.
//!
//! Key features:
//! - Whitespace sensitive (newlines terminate directives)
//! - Directive names and arguments are just Words
//! - < > for block open/close tags
//! - "..." arguments are kept verbatim, quotes included
//! - # for comments (skipped)
//! - A trailing backslash joins physical lines into one logical line

use logos::{Logos, Span};
use std::fmt;

/// Source location for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub start: usize,
    pub end: usize,
}

impl From<Span> for Location {
    fn from(span: Span) -> Self {
        Self {
            start: span.start,
            end: span.end,
        }
    }
}

/// A token with its location in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Location,
}

impl<T> Spanned<T> {
    pub fn new(value: T, span: impl Into<Location>) -> Self {
        Self {
            value,
            span: span.into(),
        }
    }
}

/// Token types for the httpd.conf syntax
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token {
    // Skip whitespace (spaces and tabs), but NOT newlines
    #[regex(r"[ \t\f]+", logos::skip)]
    Whitespace,

    // Comments run from # to the end of the line. The newline itself is not
    // consumed, so a comment-only line still terminates at a Newline token.
    #[regex(r"#[^\n]*", logos::skip)]
    Comment,

    // Line continuation: a trailing backslash (optionally followed by
    // whitespace) elides the newline, so the next physical line's tokens
    // belong to the same logical directive.
    #[regex(r"\\[ \t]*\r?\n", logos::skip)]
    Continuation,

    // ============================================================
    // Structural
    // ============================================================
    #[token("</")]
    CloseTagOpen,

    #[token("<")]
    TagOpen,

    #[token(">")]
    TagClose,

    #[regex(r"\r?\n")]
    Newline,

    // ============================================================
    // Values
    // ============================================================
    /// Quoted string literal: "..."
    ///
    /// The delimiting quotes are part of the argument text. Apache treats the
    /// quoted form as the argument, so `".*MSIE.*"` keeps its quote marks.
    #[regex(r#""([^"\\]|\\.)*""#, |lex| lex.slice().to_string())]
    QuotedString(String),

    /// Generic Word (directive names, barewords, paths, ip:port, etc.)
    ///
    /// Matches anything that isn't whitespace, a tag delimiter, a quote, a
    /// comment start, or a backslash.
    #[regex(r##"[^ \t\r\n\f<>"#\\]+"##, |lex| lex.slice().to_string())]
    Word(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::CloseTagOpen => write!(f, "</"),
            Token::TagOpen => write!(f, "<"),
            Token::TagClose => write!(f, ">"),
            Token::Newline => write!(f, "end of line"),
            Token::QuotedString(s) => write!(f, "{}", s),
            Token::Word(s) => write!(f, "{}", s),
            _ => write!(f, "{:?}", self),
        }
    }
}

/// Lexer result type
pub type LexResult = Result<Vec<Spanned<Token>>, LexError>;

/// Lexer error
#[derive(Debug, Clone, thiserror::Error)]
pub enum LexError {
    #[error("Unexpected character at position {position}")]
    UnexpectedChar { position: usize },
}

/// Tokenize an httpd.conf source string
pub fn tokenize(source: &str) -> LexResult {
    let lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    for (result, span) in lexer.spanned() {
        match result {
            Ok(Token::Whitespace) | Ok(Token::Comment) | Ok(Token::Continuation) => {
                // Skipped by the logos attributes already; ignore if seen
                continue;
            }
            Ok(token) => {
                tokens.push(Spanned::new(token, span));
            }
            Err(_) => {
                // The Word regex is permissive, so the only way to get here
                // is a stray backslash that does not continue a line
                return Err(LexError::UnexpectedChar {
                    position: span.start,
                });
            }
        }
    }

    Ok(tokens)
}
