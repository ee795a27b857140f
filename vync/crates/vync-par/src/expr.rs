//! Expression parsing: a Pratt-style precedence climber.
//!
//! # Operator precedence (lowest to highest)
//!
//! | Level | Operators | Associativity |
//! |-------|-----------|---------------|
//! | 1 | `=` | Right |
//! | 2 | `\|\|` | Left |
//! | 3 | `&&` | Left |
//! | 4 | `\|` | Left |
//! | 5 | `^` | Left |
//! | 6 | `&` | Left |
//! | 7 | `==`, `!=` | Left |
//! | 8 | `<`, `<=`, `>`, `>=` | Left |
//! | 9 | `<<`, `>>` | Left |
//! | 10 | `+`, `-` | Left |
//! | 11 | `*`, `/`, `%` | Left |
//! | 12 | `!`, `-`, `~` (prefix) | - |
//! | 13 | call, member, index (postfix) | Left |
//!
//! Assignment sits above the climber and validates its left-hand side:
//! only identifiers and member expressions are legal targets.
//!
//! `borrow`/`view` and the raw-location intrinsics `at`/`addr`/`from`/`loc`
//! are contextual: they lex as identifiers and are recognized here by
//! lexeme, the call-shaped four only when directly followed by `(`.

use vync_lex::TokenKind;

use crate::ast::*;
use crate::{ParseError, Parser};

/// Binding power levels for the climber. Left-associative operators use
/// `(bp, bp + 1)`; higher binds tighter.
pub(crate) mod bp {
    /// Minimum binding power (start of expression)
    pub const MIN: u8 = 0;

    /// Logical OR: `||`
    pub const LOGICAL_OR: u8 = 2;

    /// Logical AND: `&&`
    pub const LOGICAL_AND: u8 = 4;

    /// Bitwise OR: `|`
    pub const BITWISE_OR: u8 = 6;

    /// Bitwise XOR: `^`
    pub const BITWISE_XOR: u8 = 8;

    /// Bitwise AND: `&`
    pub const BITWISE_AND: u8 = 10;

    /// Equality: `==`, `!=`
    pub const EQUALITY: u8 = 12;

    /// Relational: `<`, `<=`, `>`, `>=`
    pub const RELATIONAL: u8 = 14;

    /// Shift: `<<`, `>>`
    pub const SHIFT: u8 = 16;

    /// Additive: `+`, `-`
    pub const ADDITIVE: u8 = 18;

    /// Multiplicative: `*`, `/`, `%`
    pub const MULTIPLICATIVE: u8 = 20;
}

impl Parser {
    /// Main expression entry point: assignment level, right-associative.
    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_expr_bp(bp::MIN)?;

        if self.check(TokenKind::Eq) {
            let op = self.consume();
            if !matches!(left, Expr::Ident(_) | Expr::Member(_)) {
                return Err(self.error(&op, "invalid left-hand side in assignment expression"));
            }
            let value = self.parse_expression()?;
            return Ok(Expr::Assign(AssignExpr {
                target: Box::new(left),
                value: Box::new(value),
                loc: op.loc,
            }));
        }

        Ok(left)
    }

    /// Climber core: parse while the next operator binds at least `min_bp`.
    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let Some((lbp, rbp)) = self.infix_binding_power() else {
                break;
            };
            if lbp < min_bp {
                break;
            }

            let op_token = self.consume();
            let op = binop_for(op_token.kind);
            let rhs = self.parse_expr_bp(rbp)?;
            lhs = Expr::Binary(BinaryExpr {
                op,
                left: Box::new(lhs),
                right: Box::new(rhs),
                loc: op_token.loc,
            });
        }

        Ok(lhs)
    }

    /// Binding powers of the next token, if it is an infix operator.
    fn infix_binding_power(&self) -> Option<(u8, u8)> {
        let base = match self.peek().kind {
            TokenKind::OrOr => bp::LOGICAL_OR,
            TokenKind::AndAnd => bp::LOGICAL_AND,
            TokenKind::Pipe => bp::BITWISE_OR,
            TokenKind::Caret => bp::BITWISE_XOR,
            TokenKind::Amp => bp::BITWISE_AND,
            TokenKind::EqEq | TokenKind::NotEq => bp::EQUALITY,
            TokenKind::Lt | TokenKind::LtEq | TokenKind::Gt | TokenKind::GtEq => bp::RELATIONAL,
            TokenKind::Shl | TokenKind::Shr => bp::SHIFT,
            TokenKind::Plus | TokenKind::Minus => bp::ADDITIVE,
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => bp::MULTIPLICATIVE,
            _ => return None,
        };
        Some((base, base + 1))
    }

    /// Prefix level: unary operators, then postfix chains.
    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek().kind {
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            _ => None,
        };
        if let Some(op) = op {
            let token = self.consume();
            let operand = self.parse_prefix()?;
            return Ok(Expr::Unary(UnaryExpr {
                op,
                operand: Box::new(operand),
                loc: token.loc,
            }));
        }
        self.parse_postfix()
    }

    /// Postfix level: call, member and index chains, left-associative.
    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.peek().kind {
                TokenKind::LParen => {
                    let open = self.consume();
                    let mut args = Vec::new();
                    if !self.check(TokenKind::RParen) {
                        loop {
                            args.push(self.parse_expression()?);
                            if !self.eat(TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(TokenKind::RParen)?;
                    expr = Expr::Call(CallExpr {
                        callee: Box::new(expr),
                        args,
                        loc: open.loc,
                    });
                },
                TokenKind::Dot => {
                    let dot = self.consume();
                    let name = self.peek().clone();
                    if name.kind != TokenKind::Ident {
                        return Err(self.error(&name, "expected identifier for member access"));
                    }
                    self.consume();
                    expr = Expr::Member(MemberExpr {
                        object: Box::new(expr),
                        property: Box::new(Expr::Ident(Ident {
                            name: name.lexeme,
                            loc: name.loc,
                        })),
                        computed: false,
                        loc: dot.loc,
                    });
                },
                TokenKind::LBracket => {
                    let open = self.consume();
                    let index = self.parse_expression()?;
                    self.expect(TokenKind::RBracket)?;
                    expr = Expr::ArrayElement(ArrayElementExpr {
                        object: Box::new(expr),
                        index: Box::new(index),
                        loc: open.loc,
                    });
                },
                _ => break,
            }
        }

        Ok(expr)
    }

    /// Primary level: literals, identifiers, grouping, and the
    /// keyword-introduced forms.
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Int => {
                self.consume();
                let value = token
                    .lexeme
                    .parse::<i64>()
                    .map_err(|_| self.error(&token, "integer literal out of range"))?;
                Ok(Expr::Int(IntLit {
                    value,
                    loc: token.loc,
                }))
            },
            TokenKind::Float => {
                self.consume();
                let value = token
                    .lexeme
                    .parse::<f64>()
                    .map_err(|_| self.error(&token, "malformed float literal"))?;
                Ok(Expr::Float(FloatLit {
                    value,
                    loc: token.loc,
                }))
            },
            TokenKind::Str => {
                self.consume();
                Ok(Expr::Str(StrLit {
                    value: token.lexeme,
                    loc: token.loc,
                }))
            },
            TokenKind::Char => {
                self.consume();
                let value = token
                    .lexeme
                    .chars()
                    .next()
                    .ok_or_else(|| self.error(&token, "empty character literal"))?;
                Ok(Expr::Char(CharLit {
                    value,
                    loc: token.loc,
                }))
            },
            TokenKind::KwTrue | TokenKind::KwFalse => {
                self.consume();
                Ok(Expr::Bool(BoolLit {
                    value: token.kind == TokenKind::KwTrue,
                    loc: token.loc,
                }))
            },
            TokenKind::KwNil => {
                self.consume();
                Ok(Expr::Nil(NilLit { loc: token.loc }))
            },
            TokenKind::Ident => self.parse_ident_or_intrinsic(),
            TokenKind::LParen => {
                self.consume();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            },
            TokenKind::LBracket => self.parse_array_or_comprehension(),
            TokenKind::LBrace => self.parse_object_literal(),
            _ => Err(self.error(
                &token,
                format!("expected expression, found {}", token.kind),
            )),
        }
    }

    /// An identifier, a borrow form, or a raw-location intrinsic.
    fn parse_ident_or_intrinsic(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek().clone();

        // borrow e / view e
        let borrow_kind = match token.lexeme.as_str() {
            "borrow" => Some(BorrowKind::Mutable),
            "view" => Some(BorrowKind::Immutable),
            _ => None,
        };
        if let Some(kind) = borrow_kind {
            if starts_expression(self.peek_next().kind) {
                self.consume();
                let operand = self.parse_prefix()?;
                return Ok(Expr::Borrow(BorrowExpr {
                    kind,
                    expr: Box::new(operand),
                    loc: token.loc,
                }));
            }
        }

        // at(p) / addr(x) / from(i) / loc(e)
        if self.peek_next().kind == TokenKind::LParen {
            let make: Option<fn(Box<Expr>, vync_util::SourceLocation) -> Expr> =
                match token.lexeme.as_str() {
                    "at" => Some(|inner, loc| {
                        Expr::PointerDeref(PointerDerefExpr {
                            pointer: inner,
                            loc,
                        })
                    }),
                    "addr" => Some(|inner, loc| Expr::AddrOf(AddrOfExpr { place: inner, loc })),
                    "from" => Some(|inner, loc| {
                        Expr::FromIntToLoc(FromIntToLocExpr {
                            address: inner,
                            loc,
                        })
                    }),
                    "loc" => Some(|inner, loc| Expr::Location(LocationExpr { place: inner, loc })),
                    _ => None,
                };
            if let Some(make) = make {
                self.consume(); // intrinsic name
                self.expect(TokenKind::LParen)?;
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                return Ok(make(Box::new(inner), token.loc));
            }
        }

        self.consume();
        Ok(Expr::Ident(Ident {
            name: token.lexeme,
            loc: token.loc,
        }))
    }

    /// `[a, b, c]` or `[elem for x in iterable if cond]`.
    fn parse_array_or_comprehension(&mut self) -> Result<Expr, ParseError> {
        let open = self.expect(TokenKind::LBracket)?;

        if self.eat(TokenKind::RBracket) {
            return Ok(Expr::Array(ArrayLit {
                elements: Vec::new(),
                loc: open.loc,
            }));
        }

        let first = self.parse_expression()?;

        if self.eat(TokenKind::KwFor) {
            let name = self.expect(TokenKind::Ident)?;
            self.expect(TokenKind::KwIn)?;
            let iterable = self.parse_expression()?;
            let condition = if self.eat(TokenKind::KwIf) {
                Some(Box::new(self.parse_expression()?))
            } else {
                None
            };
            self.expect(TokenKind::RBracket)?;
            return Ok(Expr::ListComprehension(ListComprehensionExpr {
                element: Box::new(first),
                variable: Ident {
                    name: name.lexeme,
                    loc: name.loc,
                },
                iterable: Box::new(iterable),
                condition,
                loc: open.loc,
            }));
        }

        let mut elements = vec![first];
        while self.eat(TokenKind::Comma) {
            if self.check(TokenKind::RBracket) {
                break; // trailing comma
            }
            elements.push(self.parse_expression()?);
        }
        self.expect(TokenKind::RBracket)?;
        Ok(Expr::Array(ArrayLit {
            elements,
            loc: open.loc,
        }))
    }

    /// `{ name: expr, ... }` in expression position.
    fn parse_object_literal(&mut self) -> Result<Expr, ParseError> {
        let open = self.expect(TokenKind::LBrace)?;
        let mut fields = Vec::new();

        while !self.check(TokenKind::RBrace) {
            let name = self.expect(TokenKind::Ident)?;
            self.expect(TokenKind::Colon)?;
            let value = self.parse_expression()?;
            fields.push(ObjectField {
                name: name.lexeme,
                value,
                loc: name.loc,
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }

        self.expect(TokenKind::RBrace)?;
        Ok(Expr::Object(ObjectLit {
            fields,
            loc: open.loc,
        }))
    }
}

/// Map an operator token to its AST operator. Callers only pass kinds that
/// `infix_binding_power` accepted.
fn binop_for(kind: TokenKind) -> BinaryOp {
    match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Rem,
        TokenKind::EqEq => BinaryOp::Eq,
        TokenKind::NotEq => BinaryOp::Ne,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::LtEq => BinaryOp::Le,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::GtEq => BinaryOp::Ge,
        TokenKind::AndAnd => BinaryOp::And,
        TokenKind::OrOr => BinaryOp::Or,
        TokenKind::Amp => BinaryOp::BitAnd,
        TokenKind::Pipe => BinaryOp::BitOr,
        TokenKind::Caret => BinaryOp::BitXor,
        TokenKind::Shl => BinaryOp::Shl,
        TokenKind::Shr => BinaryOp::Shr,
        other => unreachable!("not an infix operator: {:?}", other),
    }
}

/// Whether a token can begin an expression; used to tell `borrow x` from a
/// plain identifier spelled `borrow`.
fn starts_expression(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Int
            | TokenKind::Float
            | TokenKind::Str
            | TokenKind::Char
            | TokenKind::Ident
            | TokenKind::KwTrue
            | TokenKind::KwFalse
            | TokenKind::KwNil
            | TokenKind::LParen
            | TokenKind::LBracket
            | TokenKind::LBrace
            | TokenKind::Bang
            | TokenKind::Minus
            | TokenKind::Tilde
    )
}

// =============================================================================
// TESTS
// =============================================================================
