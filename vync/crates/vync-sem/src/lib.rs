//! vync-sem - Semantic analysis for the Vyn language.
//!
//! The analyzer walks the module with lexical scoping: blocks enter and
//! exit scopes, declarations insert into the innermost scope, identifier
//! references resolve through the scope chain. It reports:
//!
//! - undeclared identifiers,
//! - redeclaration in the same scope,
//! - assignment to an immutable binding,
//! - borrow conflicts (a second mutable borrow, or mutable and immutable
//!   borrows overlapping),
//! - raw-location intrinsics (`at`, `addr`, `from`, `loc`) used outside a
//!   `scoped` block.
//!
//! Analysis is best-effort: errors accumulate in the shared [`Handler`] and
//! the walk continues, so one run surfaces as many problems as possible.
//!
//! A pre-pass registers every top-level declaration before bodies are
//! walked, so declaration order does not matter.
//!
//! # Example
//!
//! ```
//! use vync_lex::tokenize;
//! use vync_par::Parser;
//! use vync_sem::SemanticAnalyzer;
//! use vync_util::{FileId, Handler};
//!
//! let tokens = tokenize("let x = y\n", FileId::DUMMY).unwrap();
//! let module = Parser::new(tokens).parse_module().unwrap();
//!
//! let handler = Handler::new();
//! SemanticAnalyzer::new(&handler).analyze(&module);
//! assert!(handler.has_errors()); // y is undeclared
//! ```

pub mod scope;

use vync_par::ast::*;
use vync_par::visitor::{walk_expr, walk_stmt, Visitor};
use vync_util::Handler;

pub use scope::{ScopeTree, Symbol, SymbolKind};

/// An active borrow, released when its scope ends.
struct BorrowRecord {
    owner: String,
    mutable: bool,
}

/// Best-effort semantic analyzer over a parsed module.
pub struct SemanticAnalyzer<'a> {
    handler: &'a Handler,
    scopes: ScopeTree,
    /// Depth of enclosing `scoped { .. }` regions.
    scoped_depth: usize,
    /// Active borrows, innermost last.
    borrows: Vec<BorrowRecord>,
}

impl<'a> SemanticAnalyzer<'a> {
    /// Create an analyzer reporting into `handler`.
    pub fn new(handler: &'a Handler) -> Self {
        Self {
            handler,
            scopes: ScopeTree::new(),
            scoped_depth: 0,
            borrows: Vec::new(),
        }
    }

    /// Analyze a module. Diagnostics go to the handler; the walk never
    /// stops at the first error.
    pub fn analyze(&mut self, module: &Module) {
        // Pre-pass: register top-level names so use may precede declaration.
        for stmt in &module.body {
            if let Stmt::Decl(decl) = stmt {
                self.predeclare(decl);
            }
        }
        self.visit_module(module);
    }

    /// Register the name a top-level declaration introduces.
    fn predeclare(&mut self, decl: &Decl) {
        let (name, kind, loc) = match decl {
            Decl::Function(d) => (d.name.name.clone(), SymbolKind::Function, d.loc),
            Decl::Struct(d) => (d.name.name.clone(), SymbolKind::Type, d.loc),
            Decl::Class(d) => (d.name.name.clone(), SymbolKind::Type, d.loc),
            Decl::Enum(d) => (d.name.name.clone(), SymbolKind::Type, d.loc),
            Decl::Trait(d) => (d.name.name.clone(), SymbolKind::Type, d.loc),
            Decl::TypeAlias(d) => (d.name.name.clone(), SymbolKind::Type, d.loc),
            Decl::Template(d) => (d.name.name.clone(), SymbolKind::Type, d.loc),
            _ => return,
        };
        self.declare(
            &name,
            Symbol {
                kind,
                declared_type: None,
                is_mutable: false,
                decl_loc: loc,
            },
        );
    }

    /// Declare into the innermost scope, reporting same-scope conflicts.
    /// Re-declaring the exact same source location is the idempotent case
    /// the pre-pass creates and is not an error.
    fn declare(&mut self, name: &str, symbol: Symbol) {
        let loc = symbol.decl_loc;
        if let Some(prev) = self.scopes.declare(name, symbol) {
            if prev != loc {
                self.handler
                    .error(format!("redeclaration of '{}' in the same scope", name), loc);
            }
        }
    }

    /// Bind every name a pattern introduces.
    fn declare_pattern(&mut self, pattern: &Pattern, ty: Option<&TypeNode>, mutable: bool) {
        match pattern {
            Pattern::Identifier(p) => {
                self.declare(
                    &p.name,
                    Symbol {
                        kind: SymbolKind::Variable,
                        declared_type: ty.cloned(),
                        is_mutable: mutable,
                        decl_loc: p.loc,
                    },
                );
            },
            Pattern::Tuple(p) => {
                for element in &p.elements {
                    self.declare_pattern(element, None, mutable);
                }
            },
            Pattern::Wildcard(_) | Pattern::Literal(_) => {},
        }
    }

    /// The variable a place expression ultimately names, if any.
    fn root_owner<'e>(expr: &'e Expr) -> Option<&'e str> {
        match expr {
            Expr::Ident(ident) => Some(&ident.name),
            Expr::Member(member) => Self::root_owner(&member.object),
            Expr::ArrayElement(element) => Self::root_owner(&element.object),
            _ => None,
        }
    }

    fn require_scoped(&self, what: &str, loc: vync_util::SourceLocation) {
        if self.scoped_depth == 0 {
            self.handler.error(
                format!("{} requires an enclosing 'scoped' block", what),
                loc,
            );
        }
    }
}

impl<'a, 'ast> Visitor<'ast> for SemanticAnalyzer<'a> {
    fn visit_ident(&mut self, ident: &'ast Ident) {
        if self.scopes.resolve(&ident.name).is_none() {
            self.handler
                .error(format!("undeclared identifier '{}'", ident.name), ident.loc);
        }
    }

    fn visit_block(&mut self, block: &'ast Block) {
        self.scopes.enter_scope();
        if block.is_scoped {
            self.scoped_depth += 1;
        }
        let borrow_mark = self.borrows.len();

        for stmt in &block.body {
            walk_stmt(self, stmt);
        }

        self.borrows.truncate(borrow_mark);
        if block.is_scoped {
            self.scoped_depth -= 1;
        }
        self.scopes.exit_scope();
    }

    fn visit_variable_decl(&mut self, decl: &'ast VariableDecl) {
        // The initializer sees the environment before the new binding.
        if let Some(init) = &decl.init {
            walk_expr(self, init);
        }
        let mutable = decl.binding == BindingKind::Var;
        self.declare_pattern(&decl.pattern, decl.ty.as_ref(), mutable);
    }

    fn visit_function_decl(&mut self, decl: &'ast FunctionDecl) {
        self.declare(
            &decl.name.name,
            Symbol {
                kind: SymbolKind::Function,
                declared_type: decl.ret_type.clone(),
                is_mutable: false,
                decl_loc: decl.loc,
            },
        );

        self.scopes.enter_scope();
        for param in &decl.params {
            self.declare(
                &param.name.name,
                Symbol {
                    kind: SymbolKind::Variable,
                    declared_type: Some(param.ty.clone()),
                    is_mutable: true,
                    decl_loc: param.loc,
                },
            );
        }
        if let Some(body) = &decl.body {
            self.visit_block(body);
        }
        self.scopes.exit_scope();
    }

    fn visit_struct_decl(&mut self, decl: &'ast StructDecl) {
        self.declare(
            &decl.name.name,
            Symbol {
                kind: SymbolKind::Type,
                declared_type: None,
                is_mutable: false,
                decl_loc: decl.loc,
            },
        );
    }

    fn visit_class_decl(&mut self, decl: &'ast ClassDecl) {
        self.declare(
            &decl.name.name,
            Symbol {
                kind: SymbolKind::Type,
                declared_type: None,
                is_mutable: false,
                decl_loc: decl.loc,
            },
        );
        self.scopes.enter_scope();
        for member in &decl.members {
            vync_par::visitor::walk_decl(self, member);
        }
        self.scopes.exit_scope();
    }

    fn visit_for(&mut self, stmt: &'ast ForStmt) {
        // The init clause scopes over the whole loop.
        self.scopes.enter_scope();
        if let Some(init) = &stmt.init {
            walk_stmt(self, init);
        }
        if let Some(cond) = &stmt.cond {
            walk_expr(self, cond);
        }
        if let Some(update) = &stmt.update {
            walk_expr(self, update);
        }
        self.visit_block(&stmt.body);
        self.scopes.exit_scope();
    }

    fn visit_assign(&mut self, expr: &'ast AssignExpr) {
        walk_expr(self, &expr.value);
        walk_expr(self, &expr.target);

        if let Expr::Ident(ident) = expr.target.as_ref() {
            if let Some(symbol) = self.scopes.resolve(&ident.name) {
                if symbol.kind == SymbolKind::Variable && !symbol.is_mutable {
                    self.handler.error(
                        format!("assignment to immutable binding '{}'", ident.name),
                        expr.loc,
                    );
                }
            }
        }
    }

    fn visit_borrow(&mut self, expr: &'ast BorrowExpr) {
        walk_expr(self, &expr.expr);

        let Some(owner) = Self::root_owner(&expr.expr) else {
            self.handler
                .error("borrow target must be a place expression", expr.loc);
            return;
        };

        let wants_mut = expr.kind == BorrowKind::Mutable;
        for active in &self.borrows {
            if active.owner != owner {
                continue;
            }
            if wants_mut {
                self.handler.error(
                    format!("cannot borrow '{}': already borrowed", owner),
                    expr.loc,
                );
                return;
            }
            if active.mutable {
                self.handler.error(
                    format!("cannot view '{}' while it is mutably borrowed", owner),
                    expr.loc,
                );
                return;
            }
        }

        self.borrows.push(BorrowRecord {
            owner: owner.to_string(),
            mutable: wants_mut,
        });
    }

    fn visit_pointer_deref(&mut self, expr: &'ast PointerDerefExpr) {
        self.require_scoped("raw location dereference 'at'", expr.loc);
        walk_expr(self, &expr.pointer);
    }

    fn visit_addr_of(&mut self, expr: &'ast AddrOfExpr) {
        self.require_scoped("address-of operation 'addr'", expr.loc);
        walk_expr(self, &expr.place);
    }

    fn visit_from_int_to_loc(&mut self, expr: &'ast FromIntToLocExpr) {
        self.require_scoped("raw location conversion 'from'", expr.loc);
        walk_expr(self, &expr.address);
    }

    fn visit_location(&mut self, expr: &'ast LocationExpr) {
        self.require_scoped("location operation 'loc'", expr.loc);
        walk_expr(self, &expr.place);
    }

    fn visit_list_comprehension(&mut self, expr: &'ast ListComprehensionExpr) {
        walk_expr(self, &expr.iterable);
        // The loop variable scopes over the element and condition only.
        self.scopes.enter_scope();
        self.declare(
            &expr.variable.name,
            Symbol {
                kind: SymbolKind::Variable,
                declared_type: None,
                is_mutable: false,
                decl_loc: expr.variable.loc,
            },
        );
        if let Some(cond) = &expr.condition {
            walk_expr(self, cond);
        }
        walk_expr(self, &expr.element);
        self.scopes.exit_scope();
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use vync_lex::tokenize;
    use vync_par::Parser;
    use vync_util::FileId;

    fn analyze(source: &str) -> Handler {
        let tokens = tokenize(source, FileId::DUMMY).unwrap();
        let module = Parser::new(tokens).parse_module().unwrap();
        let handler = Handler::new();
        SemanticAnalyzer::new(&handler).analyze(&module);
        handler
    }

    fn messages(handler: &Handler) -> Vec<String> {
        handler.diagnostics().into_iter().map(|d| d.message).collect()
    }

    // =========================================================================
    // NAME RESOLUTION
    // =========================================================================

    #[test]
    fn test_declared_identifier_resolves() {
        let handler = analyze("let x = 1\nlet y = x\n");
        assert!(!handler.has_errors(), "{:?}", messages(&handler));
    }

    #[test]
    fn test_undeclared_identifier() {
        let handler = analyze("let x = missing\n");
        assert!(messages(&handler)
            .iter()
            .any(|m| m.contains("undeclared identifier 'missing'")));
    }

    #[test]
    fn test_use_before_function_declaration_is_fine() {
        let handler = analyze("fn a() { b() }\nfn b() { }\n");
        assert!(!handler.has_errors(), "{:?}", messages(&handler));
    }

    #[test]
    fn test_redeclaration_in_same_scope() {
        let handler = analyze("fn f() {\n  let x = 1\n  let x = 2\n}\n");
        assert!(messages(&handler)
            .iter()
            .any(|m| m.contains("redeclaration of 'x'")));
    }

    #[test]
    fn test_shadowing_in_inner_scope_is_fine() {
        let handler = analyze("fn f() {\n  let x = 1\n  { let x = 2\n    x }\n}\n");
        assert!(!handler.has_errors(), "{:?}", messages(&handler));
    }

    #[test]
    fn test_block_bindings_do_not_escape() {
        let handler = analyze("fn f() {\n  { let inner = 1 }\n  inner\n}\n");
        assert!(messages(&handler)
            .iter()
            .any(|m| m.contains("undeclared identifier 'inner'")));
    }

    #[test]
    fn test_analysis_continues_after_error() {
        let handler = analyze("let a = u1\nlet b = u2\n");
        assert_eq!(handler.error_count(), 2);
    }

    // =========================================================================
    // MUTABILITY
    // =========================================================================

    #[test]
    fn test_assignment_to_var_is_fine() {
        let handler = analyze("fn f() {\n  var x = 1\n  x = 2\n}\n");
        assert!(!handler.has_errors(), "{:?}", messages(&handler));
    }

    #[test]
    fn test_assignment_to_let_rejected() {
        let handler = analyze("fn f() {\n  let x = 1\n  x = 2\n}\n");
        assert!(messages(&handler)
            .iter()
            .any(|m| m.contains("assignment to immutable binding 'x'")));
    }

    #[test]
    fn test_assignment_to_const_rejected() {
        let handler = analyze("fn f() {\n  const x = 1\n  x = 2\n}\n");
        assert!(messages(&handler)
            .iter()
            .any(|m| m.contains("immutable binding 'x'")));
    }

    // =========================================================================
    // BORROWS
    // =========================================================================

    #[test]
    fn test_single_borrow_is_fine() {
        let handler = analyze("fn f() {\n  var x = 1\n  let b = borrow x\n}\n");
        assert!(!handler.has_errors(), "{:?}", messages(&handler));
    }

    #[test]
    fn test_two_mutable_borrows_conflict() {
        let handler =
            analyze("fn f() {\n  var x = 1\n  let a = borrow x\n  let b = borrow x\n}\n");
        assert!(messages(&handler)
            .iter()
            .any(|m| m.contains("already borrowed")));
    }

    #[test]
    fn test_view_while_mutably_borrowed_conflicts() {
        let handler = analyze("fn f() {\n  var x = 1\n  let a = borrow x\n  let b = view x\n}\n");
        assert!(messages(&handler)
            .iter()
            .any(|m| m.contains("mutably borrowed")));
    }

    #[test]
    fn test_two_views_are_fine() {
        let handler = analyze("fn f() {\n  var x = 1\n  let a = view x\n  let b = view x\n}\n");
        assert!(!handler.has_errors(), "{:?}", messages(&handler));
    }

    #[test]
    fn test_borrow_released_at_scope_end() {
        let handler =
            analyze("fn f() {\n  var x = 1\n  { let a = borrow x }\n  { let b = borrow x }\n}\n");
        assert!(!handler.has_errors(), "{:?}", messages(&handler));
    }

    // =========================================================================
    // RAW LOCATION INTRINSICS
    // =========================================================================

    #[test]
    fn test_raw_location_outside_scoped_rejected() {
        let handler = analyze("fn f() {\n  var x = 1\n  let p = loc(x)\n}\n");
        assert!(messages(&handler)
            .iter()
            .any(|m| m.contains("'scoped' block")));
    }

    #[test]
    fn test_raw_location_inside_scoped_allowed() {
        let handler = analyze("fn f() {\n  var x = 1\n  scoped {\n    let p = loc(x)\n  }\n}\n");
        assert!(!handler.has_errors(), "{:?}", messages(&handler));
    }

    #[test]
    fn test_deref_requires_scoped() {
        let handler = analyze("fn f(p: ptr<Int>) {\n  let v = at(p)\n}\n");
        assert!(messages(&handler)
            .iter()
            .any(|m| m.contains("'scoped' block")));
    }
}
