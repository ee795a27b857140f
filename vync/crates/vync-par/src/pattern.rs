//! Pattern parsing.
//!
//! Patterns appear on the left of variable declarations and in catch
//! clauses: `_`, a binding identifier, a literal, or a tuple of patterns.

use vync_lex::TokenKind;

use crate::ast::*;
use crate::{ParseError, Parser};

impl Parser {
    /// Parse a single pattern.
    pub fn parse_pattern(&mut self) -> Result<Pattern, ParseError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Underscore => {
                self.consume();
                Ok(Pattern::Wildcard(WildcardPattern { loc: token.loc }))
            },
            TokenKind::Ident => {
                self.consume();
                Ok(Pattern::Identifier(IdentPattern {
                    name: token.lexeme,
                    loc: token.loc,
                }))
            },
            TokenKind::LParen => {
                self.consume();
                let mut elements = Vec::new();
                if !self.check(TokenKind::RParen) {
                    loop {
                        elements.push(self.parse_pattern()?);
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RParen)?;
                Ok(Pattern::Tuple(TuplePattern {
                    elements,
                    loc: token.loc,
                }))
            },
            kind if kind.is_literal() => {
                let value = self.parse_expression()?;
                Ok(Pattern::Literal(LiteralPattern {
                    value,
                    loc: token.loc,
                }))
            },
            _ => Err(self.error(
                &token,
                format!("expected pattern, found {}", token.kind),
            )),
        }
    }
}
