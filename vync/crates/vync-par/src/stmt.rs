//! Statement parsing.
//!
//! Dispatch is on the leading significant token: binding keywords start a
//! variable declaration; `if`, `while`, `for`, `return`, `break`,
//! `continue`, `try` start their control-flow forms; `scoped` and `{` start
//! blocks; anything else is an expression statement.
//!
//! Blocks are brace-delimited (`{ .. }`) or indent-delimited
//! (`Indent .. Dedent`); inside a block, statements are separated by
//! semicolons, newlines, or plain adjacency.

use vync_lex::TokenKind;

use crate::ast::*;
use crate::{ParseError, Parser};

impl Parser {
    /// Parse a single statement. Trailing separators are left for callers.
    pub fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        match self.peek().kind {
            TokenKind::KwLet | TokenKind::KwVar | TokenKind::KwConst | TokenKind::KwMut => {
                Ok(Stmt::Decl(Decl::Variable(self.parse_variable_decl()?)))
            },
            TokenKind::KwIf => self.parse_if_statement(),
            TokenKind::KwWhile => self.parse_while_statement(),
            TokenKind::KwFor => self.parse_for_statement(),
            TokenKind::KwReturn => self.parse_return_statement(),
            TokenKind::KwBreak => {
                let token = self.consume();
                Ok(Stmt::Break(BreakStmt { loc: token.loc }))
            },
            TokenKind::KwContinue => {
                let token = self.consume();
                Ok(Stmt::Continue(ContinueStmt { loc: token.loc }))
            },
            TokenKind::KwTry => self.parse_try_statement(),
            TokenKind::KwScoped => {
                self.consume();
                let mut block = self.parse_block()?;
                block.is_scoped = true;
                Ok(Stmt::Block(block))
            },
            TokenKind::LBrace | TokenKind::Indent => Ok(Stmt::Block(self.parse_block()?)),
            _ => {
                let loc = self.peek().loc;
                let expr = self.parse_expression()?;
                Ok(Stmt::Expr(ExprStmt { expr, loc }))
            },
        }
    }

    /// Parse a block, brace- or indent-delimited.
    pub fn parse_block(&mut self) -> Result<Block, ParseError> {
        if self.check(TokenKind::LBrace) {
            let open = self.consume();
            let mut body = Vec::new();
            loop {
                while self.eat(TokenKind::Semicolon) {}
                if self.check(TokenKind::RBrace) || self.check(TokenKind::Eof) {
                    break;
                }
                body.push(self.parse_statement()?);
            }
            self.expect(TokenKind::RBrace)?;
            return Ok(Block {
                body,
                is_scoped: false,
                loc: open.loc,
            });
        }

        if self.check(TokenKind::Indent) {
            let open = self.consume();
            let mut body = Vec::new();
            loop {
                while self.eat(TokenKind::Semicolon) {}
                if self.check(TokenKind::Dedent) || self.check(TokenKind::Eof) {
                    break;
                }
                body.push(self.parse_statement()?);
            }
            self.expect(TokenKind::Dedent)?;
            return Ok(Block {
                body,
                is_scoped: false,
                loc: open.loc,
            });
        }

        let found = self.peek().clone();
        Err(self.error(
            &found,
            format!("expected '{{' or an indented block, found {}", found.kind),
        ))
    }

    /// `let` / `var` / `mut` / `const` declaration. `const` requires an
    /// initializer at the point of declaration.
    pub(crate) fn parse_variable_decl(&mut self) -> Result<VariableDecl, ParseError> {
        let keyword = self.consume();
        let binding = match keyword.kind {
            TokenKind::KwLet => BindingKind::Let,
            TokenKind::KwVar | TokenKind::KwMut => BindingKind::Var,
            _ => BindingKind::Const,
        };

        let pattern = self.parse_pattern()?;

        let ty = if self.eat(TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let init = if self.eat(TokenKind::Eq) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        if binding == BindingKind::Const && init.is_none() {
            return Err(self.error(&keyword, "const declaration requires an initializer"));
        }

        Ok(VariableDecl {
            binding,
            pattern,
            ty,
            init,
            is_const: binding == BindingKind::Const,
            loc: keyword.loc,
        })
    }

    /// `if cond block [else (if .. | block)]`; else-if nests as the else
    /// branch.
    fn parse_if_statement(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.expect(TokenKind::KwIf)?;
        let cond = self.parse_expression()?;
        let then_branch = self.parse_block()?;

        let else_branch = if self.eat(TokenKind::KwElse) {
            if self.check(TokenKind::KwIf) {
                Some(Box::new(self.parse_if_statement()?))
            } else {
                Some(Box::new(Stmt::Block(self.parse_block()?)))
            }
        } else {
            None
        };

        Ok(Stmt::If(IfStmt {
            cond,
            then_branch,
            else_branch,
            loc: keyword.loc,
        }))
    }

    fn parse_while_statement(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.expect(TokenKind::KwWhile)?;
        let cond = self.parse_expression()?;
        let body = self.parse_block()?;
        Ok(Stmt::While(WhileStmt {
            cond,
            body,
            loc: keyword.loc,
        }))
    }

    /// C-style `for (init; cond; update) block`, each clause optional.
    fn parse_for_statement(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.expect(TokenKind::KwFor)?;
        self.expect(TokenKind::LParen)?;

        let init = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_statement()?))
        };
        self.expect(TokenKind::Semicolon)?;

        let cond = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenKind::Semicolon)?;

        let update = if self.check(TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenKind::RParen)?;

        let body = self.parse_block()?;
        Ok(Stmt::For(ForStmt {
            init,
            cond,
            update,
            body,
            loc: keyword.loc,
        }))
    }

    fn parse_return_statement(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.expect(TokenKind::KwReturn)?;
        let value = if self.at_line_end() || self.check(TokenKind::RBrace) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        Ok(Stmt::Return(ReturnStmt {
            value,
            loc: keyword.loc,
        }))
    }

    /// `try block [catch [(pattern)] block] [finally block]`.
    fn parse_try_statement(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.expect(TokenKind::KwTry)?;
        let body = self.parse_block()?;

        let catch = if self.check(TokenKind::KwCatch) {
            let catch_kw = self.consume();
            let param = if self.eat(TokenKind::LParen) {
                let pattern = self.parse_pattern()?;
                self.expect(TokenKind::RParen)?;
                Some(pattern)
            } else {
                None
            };
            let catch_body = self.parse_block()?;
            Some(CatchClause {
                param,
                body: catch_body,
                loc: catch_kw.loc,
            })
        } else {
            None
        };

        let finally = if self.eat(TokenKind::KwFinally) {
            Some(self.parse_block()?)
        } else {
            None
        };

        Ok(Stmt::Try(TryStmt {
            body,
            catch,
            finally,
            loc: keyword.loc,
        }))
    }
}

// =============================================================================
// TESTS
// =============================================================================
