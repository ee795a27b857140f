//! Operator and punctuation lexing.
//!
//! All digraphs resolve with a single character of lookahead. Open brackets
//! bump the nesting counter that disables indentation tracking; closers
//! release it.

use crate::error::LexError;
use crate::lexer::Lexer;
use crate::token::TokenKind;

impl<'a> Lexer<'a> {
    /// Lex a single operator or punctuation token.
    pub(crate) fn lex_operator(&mut self) -> Result<(), LexError> {
        let loc = self.loc();
        let c = self.cursor.current_char();
        self.cursor.advance();

        let (kind, lexeme): (TokenKind, &str) = match c {
            '(' => {
                self.nesting += 1;
                (TokenKind::LParen, "(")
            },
            ')' => {
                self.nesting = self.nesting.saturating_sub(1);
                (TokenKind::RParen, ")")
            },
            '[' => {
                self.nesting += 1;
                (TokenKind::LBracket, "[")
            },
            ']' => {
                self.nesting = self.nesting.saturating_sub(1);
                (TokenKind::RBracket, "]")
            },
            '{' => {
                self.nesting += 1;
                (TokenKind::LBrace, "{")
            },
            '}' => {
                self.nesting = self.nesting.saturating_sub(1);
                (TokenKind::RBrace, "}")
            },
            ',' => (TokenKind::Comma, ","),
            ';' => (TokenKind::Semicolon, ";"),
            '?' => (TokenKind::Question, "?"),
            '+' => (TokenKind::Plus, "+"),
            '%' => (TokenKind::Percent, "%"),
            '*' => (TokenKind::Star, "*"),
            '/' => (TokenKind::Slash, "/"),
            '^' => (TokenKind::Caret, "^"),
            '~' => (TokenKind::Tilde, "~"),
            '-' => {
                if self.cursor.match_char('>') {
                    (TokenKind::Arrow, "->")
                } else {
                    (TokenKind::Minus, "-")
                }
            },
            '=' => {
                if self.cursor.match_char('=') {
                    (TokenKind::EqEq, "==")
                } else if self.cursor.match_char('>') {
                    (TokenKind::FatArrow, "=>")
                } else {
                    (TokenKind::Eq, "=")
                }
            },
            '!' => {
                if self.cursor.match_char('=') {
                    (TokenKind::NotEq, "!=")
                } else {
                    (TokenKind::Bang, "!")
                }
            },
            '<' => {
                if self.cursor.match_char('=') {
                    (TokenKind::LtEq, "<=")
                } else if self.cursor.match_char('<') {
                    (TokenKind::Shl, "<<")
                } else {
                    (TokenKind::Lt, "<")
                }
            },
            '>' => {
                if self.cursor.match_char('=') {
                    (TokenKind::GtEq, ">=")
                } else if self.cursor.match_char('>') {
                    (TokenKind::Shr, ">>")
                } else {
                    (TokenKind::Gt, ">")
                }
            },
            '&' => {
                if self.cursor.match_char('&') {
                    (TokenKind::AndAnd, "&&")
                } else {
                    (TokenKind::Amp, "&")
                }
            },
            '|' => {
                if self.cursor.match_char('|') {
                    (TokenKind::OrOr, "||")
                } else {
                    (TokenKind::Pipe, "|")
                }
            },
            ':' => {
                if self.cursor.match_char(':') {
                    (TokenKind::ColonColon, "::")
                } else {
                    (TokenKind::Colon, ":")
                }
            },
            '.' => {
                if self.cursor.match_char('.') {
                    (TokenKind::DotDot, "..")
                } else {
                    (TokenKind::Dot, ".")
                }
            },
            other => {
                return Err(LexError::UnexpectedChar {
                    ch: other,
                    line: loc.line,
                    column: loc.column,
                })
            },
        };

        self.push(kind, lexeme, loc);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vync_util::FileId;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut v: Vec<TokenKind> = Lexer::new(source, FileId::DUMMY)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect();
        v.pop(); // drop Eof
        v
    }

    #[test]
    fn test_digraphs() {
        assert_eq!(
            kinds("== != <= >= -> => :: .. << >>"),
            vec![
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::LtEq,
                TokenKind::GtEq,
                TokenKind::Arrow,
                TokenKind::FatArrow,
                TokenKind::ColonColon,
                TokenKind::DotDot,
                TokenKind::Shl,
                TokenKind::Shr,
            ]
        );
    }

    #[test]
    fn test_single_char_operators() {
        assert_eq!(
            kinds("+ - * / % ! & | ^ ~ < > = ? . , ; :"),
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Percent,
                TokenKind::Bang,
                TokenKind::Amp,
                TokenKind::Pipe,
                TokenKind::Caret,
                TokenKind::Tilde,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::Eq,
                TokenKind::Question,
                TokenKind::Dot,
                TokenKind::Comma,
                TokenKind::Semicolon,
                TokenKind::Colon,
            ]
        );
    }

    #[test]
    fn test_logical_operators() {
        assert_eq!(kinds("&& ||"), vec![TokenKind::AndAnd, TokenKind::OrOr]);
    }

    #[test]
    fn test_unexpected_character() {
        let err = Lexer::new("$", FileId::DUMMY).tokenize().unwrap_err();
        assert!(matches!(err, LexError::UnexpectedChar { ch: '$', .. }));
    }

    #[test]
    fn test_unbalanced_closer_does_not_underflow() {
        // The parser reports the imbalance; the lexer just keeps going.
        assert_eq!(kinds(")("), vec![TokenKind::RParen, TokenKind::LParen]);
    }
}
