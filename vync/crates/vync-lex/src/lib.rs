//! vync-lex - Lexical analysis for the Vyn language.
//!
//! The lexer converts a UTF-8 source string plus file id into a flat vector
//! of tokens terminated by `Eof`. Vyn mixes indentation-sensitive and
//! brace-delimited blocks, so alongside ordinary tokens the lexer emits
//! three synthetic kinds:
//!
//! - `Newline` on lines carrying real content,
//! - `Indent` when the leading whitespace of a line rises,
//! - `Dedent` when it falls back to an enclosing level.
//!
//! Inside `(`/`[`/`{` brackets indentation is not significant. Tabs are a
//! lexical error anywhere. Lexical errors are fatal and halt tokenization.
//!
//! # Example
//!
//! ```
//! use vync_lex::{tokenize, TokenKind};
//! use vync_util::FileId;
//!
//! let tokens = tokenize("fn main()\n  return 0\n", FileId::DUMMY).unwrap();
//! assert!(tokens.iter().any(|t| t.kind == TokenKind::Indent));
//! assert!(tokens.iter().any(|t| t.kind == TokenKind::Dedent));
//! ```

pub mod cursor;
mod error;
mod lexer;
pub mod token;

pub use error::LexError;
pub use lexer::Lexer;
pub use token::{keyword_from_ident, keyword_spelling, Token, TokenKind};

use vync_util::FileId;

/// Tokenize `source`, attributing locations to `file`.
///
/// Single pass, left to right, with at most two characters of lookahead.
pub fn tokenize(source: &str, file: FileId) -> Result<Vec<Token>, LexError> {
    Lexer::new(source, file).tokenize()
}

#[cfg(test)]
mod edge_cases;
