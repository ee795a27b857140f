//! Number literal lexing.
//!
//! A digit run may be followed by `.` and more digits to form a float.
//! `digits..` is an integer followed by the range operator, so the dots
//! must not be consumed as a decimal point. A dot after a digit run that
//! starts neither a fraction nor `..` is an error, as is a second dot
//! inside a float (`1.2.3`).

use crate::error::LexError;
use crate::lexer::Lexer;
use crate::token::TokenKind;

impl<'a> Lexer<'a> {
    /// Lex an integer or float literal.
    pub(crate) fn lex_number(&mut self) -> Result<(), LexError> {
        let loc = self.loc();
        let start = self.cursor.position();

        self.cursor.consume_while(|c| c.is_ascii_digit());

        if self.cursor.current_char() == '.' {
            if self.cursor.peek_char(1) == '.' {
                // Integer directly followed by the range operator; leave the
                // dots for the operator lexer.
                let lexeme = self.cursor.slice_from(start);
                self.push(TokenKind::Int, lexeme, loc);
                return Ok(());
            }

            if self.cursor.peek_char(1).is_ascii_digit() {
                self.cursor.advance(); // the decimal point
                self.cursor.consume_while(|c| c.is_ascii_digit());

                // 1.2.3 has no reading as a number
                if self.cursor.current_char() == '.' {
                    return Err(LexError::MalformedNumber {
                        lexeme: format!("{}.", self.cursor.slice_from(start)),
                        line: loc.line,
                        column: loc.column,
                    });
                }

                let lexeme = self.cursor.slice_from(start);
                self.push(TokenKind::Float, lexeme, loc);
                return Ok(());
            }

            // Trailing dot: "1." is not a number and not a range.
            return Err(LexError::MalformedNumber {
                lexeme: format!("{}.", self.cursor.slice_from(start)),
                line: loc.line,
                column: loc.column,
            });
        }

        let lexeme = self.cursor.slice_from(start);
        self.push(TokenKind::Int, lexeme, loc);
        Ok(())
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
    fn test_integer() {
        let tokens = lex("42");
        assert_eq!(tokens[0].kind, TokenKind::Int);
        assert_eq!(tokens[0].lexeme, "42");
    }

    #[test]
    fn test_float() {
        let tokens = lex("3.14");
        assert_eq!(tokens[0].kind, TokenKind::Float);
        assert_eq!(tokens[0].lexeme, "3.14");
    }

    #[test]
    fn test_integer_then_range() {
        let tokens = lex("0..10");
        assert_eq!(tokens[0].kind, TokenKind::Int);
        assert_eq!(tokens[0].lexeme, "0");
        assert_eq!(tokens[1].kind, TokenKind::DotDot);
        assert_eq!(tokens[2].kind, TokenKind::Int);
        assert_eq!(tokens[2].lexeme, "10");
    }

    #[test]
    fn test_trailing_dot_rejected() {
        let err = Lexer::new("1.", FileId::DUMMY).tokenize().unwrap_err();
        assert!(matches!(err, LexError::MalformedNumber { .. }));
    }

    #[test]
    fn test_multiple_dots_rejected() {
        let err = Lexer::new("1.2.3", FileId::DUMMY).tokenize().unwrap_err();
        assert!(matches!(err, LexError::MalformedNumber { .. }));
    }

    #[test]
    fn test_float_member_is_not_lexed_here() {
        // "1.0.abs()" style chains are malformed at the lexical level; the
        // language requires parenthesizing: "(1.0).abs()".
        let tokens = lex("(1.0)");
        assert_eq!(tokens[1].kind, TokenKind::Float);
    }
}
