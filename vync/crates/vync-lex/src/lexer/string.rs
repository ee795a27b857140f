//! String and character literal lexing.
//!
//! Escape processing happens here; the token lexeme carries the cooked
//! value without quotes. Recognized escapes: `\n`, `\t`, `\r`, `\0`, `\\`,
//! `\"`, `\'`.

use crate::error::LexError;
use crate::lexer::Lexer;
use crate::token::TokenKind;

impl<'a> Lexer<'a> {
    /// Lex a double-quoted string literal.
    pub(crate) fn lex_string(&mut self) -> Result<(), LexError> {
        let loc = self.loc();
        self.cursor.advance(); // opening quote

        let mut value = String::new();
        loop {
            if self.cursor.is_at_end() {
                return Err(LexError::UnterminatedString {
                    line: loc.line,
                    column: loc.column,
                });
            }
            match self.cursor.current_char() {
                '"' => {
                    self.cursor.advance();
                    break;
                },
                '\\' => {
                    self.cursor.advance();
                    value.push(self.lex_escape()?);
                },
                c => {
                    value.push(c);
                    self.cursor.advance();
                },
            }
        }

        self.push(TokenKind::Str, value, loc);
        Ok(())
    }

    /// Lex a single-quoted character literal.
    pub(crate) fn lex_char(&mut self) -> Result<(), LexError> {
        let loc = self.loc();
        self.cursor.advance(); // opening quote

        if self.cursor.is_at_end() || self.cursor.current_char() == '\'' {
            return Err(LexError::UnterminatedChar {
                line: loc.line,
                column: loc.column,
            });
        }

        let value = if self.cursor.current_char() == '\\' {
            self.cursor.advance();
            self.lex_escape()?
        } else {
            let c = self.cursor.current_char();
            self.cursor.advance();
            c
        };

        if !self.cursor.match_char('\'') {
            return Err(LexError::UnterminatedChar {
                line: loc.line,
                column: loc.column,
            });
        }

        self.push(TokenKind::Char, value.to_string(), loc);
        Ok(())
    }

    /// Process the character after a backslash.
    fn lex_escape(&mut self) -> Result<char, LexError> {
        let line = self.cursor.line();
        let column = self.cursor.column();
        let c = self.cursor.current_char();
        self.cursor.advance();
        match c {
            'n' => Ok('\n'),
            't' => Ok('\t'),
            'r' => Ok('\r'),
            '0' => Ok('\0'),
            '\\' => Ok('\\'),
            '"' => Ok('"'),
            '\'' => Ok('\''),
            other => Err(LexError::UnknownEscape {
                escape: other,
                line,
                column,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Token;
    use vync_util::FileId;

    fn lex(source: &str) -> Vec<Token> {
        Lexer::new(source, FileId::DUMMY).tokenize().unwrap()
    }

    #[test]
    fn test_simple_string() {
        let tokens = lex("\"hello\"");
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].lexeme, "hello");
    }

    #[test]
    fn test_string_escapes() {
        let tokens = lex(r#""a\nb\t\"c\"""#);
        assert_eq!(tokens[0].lexeme, "a\nb\t\"c\"");
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("\"abc", FileId::DUMMY).tokenize().unwrap_err();
        assert!(matches!(err, LexError::UnterminatedString { .. }));
    }

    #[test]
    fn test_char_literal() {
        let tokens = lex("'x'");
        assert_eq!(tokens[0].kind, TokenKind::Char);
        assert_eq!(tokens[0].lexeme, "x");
    }

    #[test]
    fn test_char_escape() {
        let tokens = lex(r"'\n'");
        assert_eq!(tokens[0].lexeme, "\n");
    }

    #[test]
    fn test_unterminated_char() {
        let err = Lexer::new("'ab", FileId::DUMMY).tokenize().unwrap_err();
        assert!(matches!(err, LexError::UnterminatedChar { .. }));
    }

    #[test]
    fn test_unknown_escape() {
        let err = Lexer::new(r#""\q""#, FileId::DUMMY).tokenize().unwrap_err();
        assert!(matches!(err, LexError::UnknownEscape { escape: 'q', .. }));
    }
}
