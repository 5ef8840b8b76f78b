//! emc-lex - Lexical analyzer for EMLang.
//!
//! Transforms source text into a stream of [`Token`]s. The lexer is a
//! direct-coded scanner: a [`cursor::Cursor`] walks the UTF-8 source while
//! specialized methods lex each token category. Whitespace within a line is
//! discarded, newlines become explicit [`TokenKind::Newline`] tokens, and
//! comments (line, block, and doc) are elided entirely.
//!
//! Lexical errors never abort the scan. A bad byte is reported through the
//! diagnostic handler, emitted as a [`TokenKind::Invalid`] token, and the
//! cursor moves one character forward. [`Lexer::tokenize`] therefore always
//! returns a well-formed vector terminated by a single EOF token.

pub mod cursor;
mod lexer;
pub mod token;

pub use lexer::Lexer;
pub use token::{Token, TokenKind};
