//! vync-par - Recursive descent parser for the Vyn language.
//!
//! One [`Parser`] owns the token vector and the shared cursor; the
//! cooperating sub-parsers (expression, type, statement, declaration,
//! module) are `impl Parser` blocks split across `expr.rs`, `types.rs`,
//! `stmt.rs` and `items.rs`, all driving the same cursor through the base
//! services defined here.
//!
//! Comments and newlines are transparent to every cursor operation;
//! `Indent` and `Dedent` are significant tokens the parsers see and
//! consume. Syntactic errors are fatal: each parse method returns
//! `Result<_, ParseError>` and propagates with `?`.
//!
//! # Example
//!
//! ```
//! use vync_lex::tokenize;
//! use vync_par::Parser;
//! use vync_util::FileId;
//!
//! let tokens = tokenize("fn main() {\n  const x = 1\n}\n", FileId::DUMMY).unwrap();
//! let module = Parser::new(tokens).parse_module().unwrap();
//! assert_eq!(module.body.len(), 1);
//! ```

pub mod ast;
mod expr;
mod items;
mod pattern;
mod stmt;
mod types;
pub mod visitor;

use thiserror::Error;

use vync_lex::{Token, TokenKind};
use vync_util::SourceLocation;

use ast::{Decl, Module, Stmt};

/// A fatal syntactic error, attributed to a specific token.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ParseError {
    /// Human-readable description, e.g. `expected '}', found end of file`.
    pub message: String,
    /// Location of the offending token.
    pub loc: SourceLocation,
}

/// Recursive descent parser over a lexed token vector.
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    /// Index of the next unconsumed token.
    pub(crate) pos: usize,
    /// Index of the most recently consumed significant token.
    pub(crate) prev: usize,
}

impl Parser {
    /// Create a parser. The token vector must be terminated by `Eof`,
    /// which [`vync_lex::tokenize`] guarantees.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            prev: 0,
        }
    }

    /// Parse a whole module: top-level items until `Eof`.
    ///
    /// Each item is first attempted as a declaration, then as a statement.
    /// Consumes the entire stream; any significant token left over after
    /// the loop is an error.
    pub fn parse_module(&mut self) -> Result<Module, ParseError> {
        let loc = self.peek().loc;
        let mut body = Vec::new();

        loop {
            while self.eat(TokenKind::Semicolon) {}
            if self.check(TokenKind::Eof) {
                break;
            }

            let stmt = if self.at_declaration() {
                Stmt::Decl(self.parse_declaration()?)
            } else {
                self.parse_statement()?
            };

            // Globals must bind a simple identifier; destructuring patterns
            // are local-only.
            if let Stmt::Decl(Decl::Variable(decl)) = &stmt {
                if decl.pattern.as_identifier().is_none() {
                    return Err(ParseError {
                        message: "global variable declarations require a simple identifier"
                            .to_string(),
                        loc: decl.pattern.loc(),
                    });
                }
            }

            body.push(stmt);
        }

        self.expect(TokenKind::Eof)?;
        Ok(Module { body, loc })
    }

    // =========================================================================
    // BASE SERVICES - shared cursor operations
    // =========================================================================

    /// Index of the next significant token at or after `from`.
    pub(crate) fn significant_index(&self, from: usize) -> usize {
        let mut i = from;
        while i < self.tokens.len() && self.tokens[i].kind.is_trivia() {
            i += 1;
        }
        i.min(self.tokens.len().saturating_sub(1))
    }

    /// Next significant token, without advancing.
    pub fn peek(&self) -> &Token {
        &self.tokens[self.significant_index(self.pos)]
    }

    /// Second significant token, without advancing.
    pub fn peek_next(&self) -> &Token {
        let first = self.significant_index(self.pos);
        &self.tokens[self.significant_index(first + 1)]
    }

    /// Consume and return the next significant token.
    pub fn consume(&mut self) -> Token {
        let i = self.significant_index(self.pos);
        self.prev = i;
        self.pos = i + 1;
        self.tokens[i].clone()
    }

    /// The most recently consumed significant token.
    pub fn previous_token(&self) -> &Token {
        &self.tokens[self.prev]
    }

    /// Consume a token of `kind` or raise a diagnostic pinned to the
    /// offending token.
    pub fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.consume())
        } else {
            let found = self.peek().clone();
            Err(self.error(&found, format!("expected {}, found {}", kind, found.kind)))
        }
    }

    /// Consume the next token if it has `kind`.
    pub fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.consume();
            true
        } else {
            false
        }
    }

    /// Consume the next token if it is an identifier spelled `lexeme`.
    pub fn eat_contextual(&mut self, lexeme: &str) -> bool {
        if self.check(TokenKind::Ident) && self.peek().lexeme == lexeme {
            self.consume();
            true
        } else {
            false
        }
    }

    /// Predicate on the next significant token.
    pub fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    /// Construct a positioned syntactic error.
    pub fn error(&self, token: &Token, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            loc: token.loc,
        }
    }

    /// Whether the current line ends here: the next raw token, skipping
    /// only comments, terminates a statement. `return` uses this so a
    /// value on the following line is not glued onto it.
    pub(crate) fn at_line_end(&self) -> bool {
        let mut i = self.pos;
        while i < self.tokens.len() && self.tokens[i].kind == TokenKind::Comment {
            i += 1;
        }
        match self.tokens.get(i).map(|t| t.kind) {
            Some(TokenKind::Newline)
            | Some(TokenKind::Semicolon)
            | Some(TokenKind::RBrace)
            | Some(TokenKind::Dedent)
            | Some(TokenKind::Eof)
            | None => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vync_lex::tokenize;
    use vync_util::FileId;

    fn parser(source: &str) -> Parser {
        Parser::new(tokenize(source, FileId::DUMMY).unwrap())
    }

    // =========================================================================
    // BASE SERVICE TESTS
    // =========================================================================

    #[test]
    fn test_peek_skips_trivia() {
        let p = parser("// comment\nlet x");
        assert_eq!(p.peek().kind, TokenKind::KwLet);
    }

    #[test]
    fn test_peek_next() {
        let p = parser("let x = 1");
        assert_eq!(p.peek().kind, TokenKind::KwLet);
        assert_eq!(p.peek_next().kind, TokenKind::Ident);
    }

    #[test]
    fn test_consume_and_previous() {
        let mut p = parser("a b");
        let a = p.consume();
        assert_eq!(a.lexeme, "a");
        assert_eq!(p.previous_token().lexeme, "a");
        assert_eq!(p.peek().lexeme, "b");
    }

    #[test]
    fn test_expect_failure_names_both_tokens() {
        let mut p = parser("let");
        let err = p.expect(TokenKind::KwFn).unwrap_err();
        assert!(err.message.contains("'fn'"));
        assert!(err.message.contains("'let'"));
    }

    #[test]
    fn test_indent_tokens_are_significant() {
        let p = parser("a\n  b");
        let mut q = p;
        q.consume(); // a
        assert_eq!(q.peek().kind, TokenKind::Indent);
    }

    // =========================================================================
    // MODULE-LEVEL TESTS
    // =========================================================================

    #[test]
    fn test_parse_module_consumes_everything() {
        let mut p = parser("let x = 1\nlet y = 2\n");
        let module = p.parse_module().unwrap();
        assert_eq!(module.body.len(), 2);
    }

    #[test]
    fn test_empty_module() {
        let mut p = parser("\n\n// only comments\n");
        let module = p.parse_module().unwrap();
        assert!(module.body.is_empty());
    }

    #[test]
    fn test_braced_function_module() {
        // Braced function body with a single declaration.
        let mut p = parser("fn main() {\n  const x = 1\n}\n");
        let module = p.parse_module().unwrap();
        assert_eq!(module.body.len(), 1);
        match &module.body[0] {
            Stmt::Decl(Decl::Function(f)) => {
                assert_eq!(f.name.name, "main");
                let body = f.body.as_ref().unwrap();
                assert_eq!(body.body.len(), 1);
                assert!(matches!(body.body[0], Stmt::Decl(Decl::Variable(_))));
            },
            other => panic!("expected function declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_indented_function_module() {
        let mut p = parser("\nfn main()\n  const x = 1\n");
        let module = p.parse_module().unwrap();
        assert_eq!(module.body.len(), 1);
        assert!(matches!(module.body[0], Stmt::Decl(Decl::Function(_))));
    }

    #[test]
    fn test_unmatched_brace_reports_missing_rbrace() {
        let mut p = parser("fn main() {\n  const x = 1\n");
        let err = p.parse_module().unwrap_err();
        assert!(err.message.contains("'}'"), "message: {}", err.message);
    }

    #[test]
    fn test_global_requires_simple_identifier() {
        let mut p = parser("let (a, b) = pair;\n");
        let err = p.parse_module().unwrap_err();
        assert!(err.message.contains("simple identifier"));
    }

    #[test]
    fn test_statements_separated_by_semicolons() {
        let mut p = parser("x = 1; y = 2; z = 3");
        let module = p.parse_module().unwrap();
        assert_eq!(module.body.len(), 3);
    }
}
