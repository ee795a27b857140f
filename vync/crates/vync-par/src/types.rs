//! Type expression parsing.
//!
//! A type starts with an atom - a possibly `::`-qualified identifier with
//! optional generic arguments, a parenthesized tuple, an array in brackets
//! with optional `; size`, a `fn(..) -> T` signature, or an ownership
//! wrapper `my<T>` / `our<T>` / `their<T>` / `ptr<T>` - followed by postfix
//! modifiers applied in order: `[]` for dynamic-array decay, `*` for
//! pointer, `?` for optional, `const` for read-only data. Applying the same
//! modifier twice is rejected at the modifier's location.

use vync_lex::{Token, TokenKind};
use vync_util::SourceLocation;

use crate::ast::*;
use crate::{ParseError, Parser};

impl Parser {
    /// Parse a full type expression.
    pub fn parse_type(&mut self) -> Result<TypeNode, ParseError> {
        let atom = self.parse_type_atom()?;
        self.parse_type_postfix(atom)
    }

    fn parse_type_atom(&mut self) -> Result<TypeNode, ParseError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::KwMy | TokenKind::KwOur | TokenKind::KwTheir | TokenKind::KwPtr => {
                self.consume();
                let kind = match token.kind {
                    TokenKind::KwMy => OwnershipKind::My,
                    TokenKind::KwOur => OwnershipKind::Our,
                    TokenKind::KwTheir => OwnershipKind::Their,
                    _ => OwnershipKind::Ptr,
                };
                self.expect(TokenKind::Lt)?;
                let inner = self.parse_type()?;
                self.expect_generic_close()?;
                Ok(TypeNode {
                    kind: TypeKind::OwnershipWrapped {
                        kind,
                        inner: Box::new(inner),
                    },
                    data_is_const: false,
                    is_optional: false,
                    is_pointer: false,
                    loc: token.loc,
                })
            },
            TokenKind::LParen => {
                self.consume();
                let mut elements = Vec::new();
                if !self.check(TokenKind::RParen) {
                    loop {
                        elements.push(self.parse_type()?);
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RParen)?;
                Ok(TypeNode {
                    kind: TypeKind::Tuple(elements),
                    data_is_const: false,
                    is_optional: false,
                    is_pointer: false,
                    loc: token.loc,
                })
            },
            TokenKind::LBracket => {
                self.consume();
                let element = self.parse_type()?;
                let size = if self.eat(TokenKind::Semicolon) {
                    Some(Box::new(self.parse_expression()?))
                } else {
                    None
                };
                self.expect(TokenKind::RBracket)?;
                Ok(TypeNode {
                    kind: TypeKind::Array {
                        element: Box::new(element),
                        size,
                    },
                    data_is_const: false,
                    is_optional: false,
                    is_pointer: false,
                    loc: token.loc,
                })
            },
            TokenKind::KwFn => {
                self.consume();
                self.expect(TokenKind::LParen)?;
                let mut params = Vec::new();
                if !self.check(TokenKind::RParen) {
                    loop {
                        params.push(self.parse_type()?);
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RParen)?;
                let ret = if self.eat(TokenKind::Arrow) {
                    self.parse_type()?
                } else {
                    TypeNode::named("Void", token.loc)
                };
                Ok(TypeNode {
                    kind: TypeKind::FunctionSignature {
                        params,
                        ret: Box::new(ret),
                    },
                    data_is_const: false,
                    is_optional: false,
                    is_pointer: false,
                    loc: token.loc,
                })
            },
            TokenKind::Ident => {
                self.consume();
                let mut name = token.lexeme.clone();
                while self.eat(TokenKind::ColonColon) {
                    let segment = self.expect(TokenKind::Ident)?;
                    name.push_str("::");
                    name.push_str(&segment.lexeme);
                }

                let mut generic_args = Vec::new();
                if self.eat(TokenKind::Lt) {
                    loop {
                        generic_args.push(self.parse_type()?);
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect_generic_close()?;
                }

                Ok(TypeNode {
                    kind: TypeKind::Identifier { name, generic_args },
                    data_is_const: false,
                    is_optional: false,
                    is_pointer: false,
                    loc: token.loc,
                })
            },
            _ => Err(self.error(&token, format!("expected type, found {}", token.kind))),
        }
    }

    fn parse_type_postfix(&mut self, mut ty: TypeNode) -> Result<TypeNode, ParseError> {
        loop {
            // `[]` decays to an unsized array
            if self.check(TokenKind::LBracket) && self.peek_next().kind == TokenKind::RBracket {
                let open = self.consume();
                self.consume();
                ty = TypeNode {
                    kind: TypeKind::Array {
                        element: Box::new(ty),
                        size: None,
                    },
                    data_is_const: false,
                    is_optional: false,
                    is_pointer: false,
                    loc: open.loc,
                };
                continue;
            }

            if self.check(TokenKind::Star) {
                let star = self.consume();
                if ty.is_pointer {
                    return Err(self.error(&star, "type is already a pointer"));
                }
                ty.is_pointer = true;
                continue;
            }

            if self.check(TokenKind::Question) {
                let q = self.consume();
                if ty.is_optional {
                    return Err(self.error(&q, "type is already optional"));
                }
                ty.is_optional = true;
                continue;
            }

            if self.check(TokenKind::KwConst) {
                let c = self.consume();
                if ty.data_is_const {
                    return Err(self.error(&c, "type is already const"));
                }
                ty.data_is_const = true;
                continue;
            }

            break;
        }
        Ok(ty)
    }

    /// Close a generic argument list.
    ///
    /// The lexer greedily produces `>>` as a shift token, so a nested
    /// `our<Vec<T>>` ends in `Shr`; the token is split in place, leaving
    /// one `>` for the enclosing list.
    pub(crate) fn expect_generic_close(&mut self) -> Result<(), ParseError> {
        if self.eat(TokenKind::Gt) {
            return Ok(());
        }
        if self.check(TokenKind::Shr) {
            let i = self.significant_index(self.pos);
            let loc = self.tokens[i].loc;
            self.tokens[i] = Token::new(
                TokenKind::Gt,
                ">",
                SourceLocation::new(loc.file, loc.line, loc.column + 1),
            );
            return Ok(());
        }
        let found = self.peek().clone();
        Err(self.error(&found, format!("expected '>', found {}", found.kind)))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use vync_lex::tokenize;
    use vync_util::FileId;

    fn parse_type(source: &str) -> TypeNode {
        let tokens = tokenize(source, FileId::DUMMY).unwrap();
        let mut parser = Parser::new(tokens);
        let ty = parser.parse_type().unwrap();
        assert_eq!(parser.peek().kind, TokenKind::Eof, "trailing input");
        ty
    }

    fn parse_type_err(source: &str) -> ParseError {
        let tokens = tokenize(source, FileId::DUMMY).unwrap();
        Parser::new(tokens).parse_type().unwrap_err()
    }

    #[test]
    fn test_named_type() {
        let ty = parse_type("Int");
        assert!(matches!(ty.kind, TypeKind::Identifier { ref name, .. } if name == "Int"));
    }

    #[test]
    fn test_qualified_name() {
        let ty = parse_type("std::io::Reader");
        assert!(
            matches!(ty.kind, TypeKind::Identifier { ref name, .. } if name == "std::io::Reader")
        );
    }

    #[test]
    fn test_generic_args() {
        let ty = parse_type("Map<String, Int>");
        match ty.kind {
            TypeKind::Identifier { generic_args, .. } => assert_eq!(generic_args.len(), 2),
            other => panic!("expected identifier type, got {:?}", other),
        }
    }

    #[test]
    fn test_tuple_type() {
        let ty = parse_type("(Int, Float, Bool)");
        assert!(matches!(ty.kind, TypeKind::Tuple(ref elems) if elems.len() == 3));
    }

    #[test]
    fn test_sized_array() {
        let ty = parse_type("[Int; 4]");
        match ty.kind {
            TypeKind::Array { size, .. } => assert!(size.is_some()),
            other => panic!("expected array type, got {:?}", other),
        }
    }

    #[test]
    fn test_unsized_array() {
        let ty = parse_type("[Int]");
        match ty.kind {
            TypeKind::Array { size, .. } => assert!(size.is_none()),
            other => panic!("expected array type, got {:?}", other),
        }
    }

    #[test]
    fn test_function_signature() {
        let ty = parse_type("fn(Int, Int) -> Int");
        match ty.kind {
            TypeKind::FunctionSignature { params, ret } => {
                assert_eq!(params.len(), 2);
                assert!(matches!(ret.kind, TypeKind::Identifier { ref name, .. } if name == "Int"));
            },
            other => panic!("expected function type, got {:?}", other),
        }
    }

    #[test]
    fn test_function_signature_void_return() {
        let ty = parse_type("fn(Int)");
        match ty.kind {
            TypeKind::FunctionSignature { ret, .. } => {
                assert!(matches!(ret.kind, TypeKind::Identifier { ref name, .. } if name == "Void"));
            },
            other => panic!("expected function type, got {:?}", other),
        }
    }

    #[test]
    fn test_ownership_wrappers() {
        for (source, expected) in [
            ("my<Buffer>", OwnershipKind::My),
            ("our<Buffer>", OwnershipKind::Our),
            ("their<Buffer>", OwnershipKind::Their),
            ("ptr<Buffer>", OwnershipKind::Ptr),
        ] {
            let ty = parse_type(source);
            match ty.kind {
                TypeKind::OwnershipWrapped { kind, .. } => assert_eq!(kind, expected),
                other => panic!("expected ownership wrapper, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_nested_ownership_closes_shr() {
        // `>>` must close two lists.
        let ty = parse_type("our<Vec<Int>>");
        match ty.kind {
            TypeKind::OwnershipWrapped { kind, inner } => {
                assert_eq!(kind, OwnershipKind::Our);
                assert!(
                    matches!(inner.kind, TypeKind::Identifier { ref name, .. } if name == "Vec")
                );
            },
            other => panic!("expected ownership wrapper, got {:?}", other),
        }
    }

    #[test]
    fn test_postfix_modifiers() {
        let ty = parse_type("Int*");
        assert!(ty.is_pointer);

        let ty = parse_type("Int?");
        assert!(ty.is_optional);

        let ty = parse_type("Int const");
        assert!(ty.data_is_const);

        let ty = parse_type("Int*? const");
        assert!(ty.is_pointer && ty.is_optional && ty.data_is_const);
    }

    #[test]
    fn test_ownership_wrapper_takes_postfix() {
        let ty = parse_type("my<Buffer>?");
        assert!(ty.is_optional);
        assert!(matches!(ty.kind, TypeKind::OwnershipWrapped { .. }));
    }

    #[test]
    fn test_array_decay_postfix() {
        let ty = parse_type("Int[]");
        match ty.kind {
            TypeKind::Array { element, size } => {
                assert!(size.is_none());
                assert!(
                    matches!(element.kind, TypeKind::Identifier { ref name, .. } if name == "Int")
                );
            },
            other => panic!("expected array type, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_pointer_rejected() {
        let err = parse_type_err("Int**");
        assert!(err.message.contains("already a pointer"));
    }

    #[test]
    fn test_duplicate_optional_rejected() {
        let err = parse_type_err("Int??");
        assert!(err.message.contains("already optional"));
    }

    #[test]
    fn test_duplicate_const_rejected() {
        let err = parse_type_err("Int const const");
        assert!(err.message.contains("already const"));
    }

    #[test]
    fn test_missing_type() {
        let err = parse_type_err("+");
        assert!(err.message.contains("expected type"));
    }
}
