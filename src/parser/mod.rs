//! Parser module for httpd.conf
//!
//! This module provides the lexer, AST, and parser for Apache-style
//! configuration text.

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::*;
pub use lexer::{tokenize, LexError, Location, Spanned, Token};
pub use parser::{parse, ParseError, Parser, Position};
