//! Core lexer implementation.
//!
//! The lexer makes a single left-to-right pass over the source, dispatching
//! on the current character. Lookahead never exceeds two characters (the
//! widest digraphs are `==`, `->`, `::`, `..`, `<<`, `>>`).
//!
//! Indentation state lives here: an indent stack that starts at `[0]` and a
//! bracket-nesting counter incremented by `(`/`[`/`{` and decremented by
//! their closers. Inside brackets, indentation is not significant.

use vync_util::{FileId, SourceLocation};

use crate::cursor::Cursor;
use crate::error::LexError;
use crate::token::{Token, TokenKind};

/// Lexer for Vyn source code.
///
/// # Example
///
/// ```
/// use vync_lex::{Lexer, TokenKind};
/// use vync_util::FileId;
///
/// let tokens = Lexer::new("let x = 42", FileId::DUMMY).tokenize().unwrap();
/// assert_eq!(tokens[0].kind, TokenKind::KwLet);
/// assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
/// ```
pub struct Lexer<'a> {
    /// Character cursor over the source.
    pub(crate) cursor: Cursor<'a>,

    /// File the source was loaded from.
    pub(crate) file: FileId,

    /// Tokens produced so far.
    pub(crate) tokens: Vec<Token>,

    /// Stack of active indentation widths; never empty, base level 0.
    pub(crate) indent_stack: Vec<u32>,

    /// Open bracket depth; indentation is ignored while positive.
    pub(crate) nesting: u32,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over `source`, attributing locations to `file`.
    pub fn new(source: &'a str, file: FileId) -> Self {
        Self {
            cursor: Cursor::new(source),
            file,
            tokens: Vec::new(),
            indent_stack: vec![0],
            nesting: 0,
        }
    }

    /// Tokenize the whole input.
    ///
    /// On success the result is terminated by one `Dedent` per open
    /// indentation level followed by a single `Eof`. On failure the first
    /// lexical error is returned and no tokens are produced.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        while !self.cursor.is_at_end() {
            match self.cursor.current_char() {
                '\r' => self.cursor.advance(),
                '\n' => self.handle_newline()?,
                ' ' => self.cursor.advance(),
                '\t' => {
                    return Err(LexError::TabIndent {
                        line: self.cursor.line(),
                        column: self.cursor.column(),
                    })
                },
                '#' => self.lex_hash_comment(),
                '/' if self.cursor.peek_char(1) == '/' => self.lex_line_comment(),
                '"' => self.lex_string()?,
                '\'' => self.lex_char()?,
                c if c.is_ascii_digit() => self.lex_number()?,
                c if c.is_ascii_alphabetic() || c == '_' => self.lex_identifier(),
                _ => self.lex_operator()?,
            }
        }

        // Close every open indentation level before EOF.
        let loc = self.loc();
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.tokens.push(Token::new(TokenKind::Dedent, "", loc));
        }
        self.tokens.push(Token::new(TokenKind::Eof, "", loc));

        Ok(self.tokens)
    }

    /// Location of the character under the cursor.
    pub(crate) fn loc(&self) -> SourceLocation {
        SourceLocation::new(self.file, self.cursor.line(), self.cursor.column())
    }

    /// Push a token starting at `loc`.
    pub(crate) fn push(&mut self, kind: TokenKind, lexeme: impl Into<String>, loc: SourceLocation) {
        self.tokens.push(Token::new(kind, lexeme, loc));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source, FileId::DUMMY)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_simple_let() {
        assert_eq!(
            kinds("let x = 42"),
            vec![
                TokenKind::KwLet,
                TokenKind::Ident,
                TokenKind::Eq,
                TokenKind::Int,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_whitespace_skipped() {
        assert_eq!(
            kinds("  a   b  "),
            vec![TokenKind::Ident, TokenKind::Ident, TokenKind::Eof]
        );
    }

    #[test]
    fn test_tab_outside_indent_rejected() {
        let err = Lexer::new("a\tb", FileId::DUMMY).tokenize().unwrap_err();
        assert!(matches!(err, LexError::TabIndent { .. }));
    }

    #[test]
    fn test_token_locations() {
        let tokens = Lexer::new("let x", FileId::DUMMY).tokenize().unwrap();
        assert_eq!(tokens[0].loc.line, 1);
        assert_eq!(tokens[0].loc.column, 1);
        assert_eq!(tokens[1].loc.column, 5);
    }

    #[test]
    fn test_carriage_return_skipped() {
        assert_eq!(
            kinds("a\r\nb"),
            vec![
                TokenKind::Ident,
                TokenKind::Newline,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }
}
