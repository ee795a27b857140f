//! Visitor protocol over the AST.
//!
//! The trait names one method per concrete node variant; dispatch on the
//! family tags happens in the free `walk_*` functions, so there are no
//! virtual fallbacks to abstract families. Default method bodies walk the
//! node's children, letting an implementation override only the variants
//! it cares about.
//!
//! # Example
//!
//! ```
//! use vync_par::ast::*;
//! use vync_par::visitor::{walk_module, Visitor};
//!
//! struct IdentCounter(usize);
//!
//! impl<'ast> Visitor<'ast> for IdentCounter {
//!     fn visit_ident(&mut self, _ident: &'ast Ident) {
//!         self.0 += 1;
//!     }
//! }
//! ```

use crate::ast::*;

/// One visit method per concrete AST variant, with child-walking defaults.
pub trait Visitor<'ast>: Sized {
    // -------------------------------------------------------------------------
    // Module
    // -------------------------------------------------------------------------
    fn visit_module(&mut self, module: &'ast Module) {
        for stmt in &module.body {
            walk_stmt(self, stmt);
        }
    }

    // -------------------------------------------------------------------------
    // Expressions
    // -------------------------------------------------------------------------
    fn visit_int_lit(&mut self, _expr: &'ast IntLit) {}

    fn visit_float_lit(&mut self, _expr: &'ast FloatLit) {}

    fn visit_str_lit(&mut self, _expr: &'ast StrLit) {}

    fn visit_char_lit(&mut self, _expr: &'ast CharLit) {}

    fn visit_bool_lit(&mut self, _expr: &'ast BoolLit) {}

    fn visit_nil_lit(&mut self, _expr: &'ast NilLit) {}

    fn visit_array_lit(&mut self, expr: &'ast ArrayLit) {
        for element in &expr.elements {
            walk_expr(self, element);
        }
    }

    fn visit_object_lit(&mut self, expr: &'ast ObjectLit) {
        for field in &expr.fields {
            walk_expr(self, &field.value);
        }
    }

    fn visit_ident(&mut self, _expr: &'ast Ident) {}

    fn visit_unary(&mut self, expr: &'ast UnaryExpr) {
        walk_expr(self, &expr.operand);
    }

    fn visit_binary(&mut self, expr: &'ast BinaryExpr) {
        walk_expr(self, &expr.left);
        walk_expr(self, &expr.right);
    }

    fn visit_call(&mut self, expr: &'ast CallExpr) {
        walk_expr(self, &expr.callee);
        for arg in &expr.args {
            walk_expr(self, arg);
        }
    }

    fn visit_member(&mut self, expr: &'ast MemberExpr) {
        walk_expr(self, &expr.object);
        if expr.computed {
            walk_expr(self, &expr.property);
        }
    }

    fn visit_array_element(&mut self, expr: &'ast ArrayElementExpr) {
        walk_expr(self, &expr.object);
        walk_expr(self, &expr.index);
    }

    fn visit_assign(&mut self, expr: &'ast AssignExpr) {
        walk_expr(self, &expr.target);
        walk_expr(self, &expr.value);
    }

    fn visit_borrow(&mut self, expr: &'ast BorrowExpr) {
        walk_expr(self, &expr.expr);
    }

    fn visit_pointer_deref(&mut self, expr: &'ast PointerDerefExpr) {
        walk_expr(self, &expr.pointer);
    }

    fn visit_addr_of(&mut self, expr: &'ast AddrOfExpr) {
        walk_expr(self, &expr.place);
    }

    fn visit_from_int_to_loc(&mut self, expr: &'ast FromIntToLocExpr) {
        walk_expr(self, &expr.address);
    }

    fn visit_location(&mut self, expr: &'ast LocationExpr) {
        walk_expr(self, &expr.place);
    }

    fn visit_list_comprehension(&mut self, expr: &'ast ListComprehensionExpr) {
        walk_expr(self, &expr.iterable);
        if let Some(cond) = &expr.condition {
            walk_expr(self, cond);
        }
        walk_expr(self, &expr.element);
    }

    // -------------------------------------------------------------------------
    // Statements
    // -------------------------------------------------------------------------
    fn visit_block(&mut self, block: &'ast Block) {
        for stmt in &block.body {
            walk_stmt(self, stmt);
        }
    }

    fn visit_expr_stmt(&mut self, stmt: &'ast ExprStmt) {
        walk_expr(self, &stmt.expr);
    }

    fn visit_if(&mut self, stmt: &'ast IfStmt) {
        walk_expr(self, &stmt.cond);
        self.visit_block(&stmt.then_branch);
        if let Some(else_branch) = &stmt.else_branch {
            walk_stmt(self, else_branch);
        }
    }

    fn visit_while(&mut self, stmt: &'ast WhileStmt) {
        walk_expr(self, &stmt.cond);
        self.visit_block(&stmt.body);
    }

    fn visit_for(&mut self, stmt: &'ast ForStmt) {
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
    }

    fn visit_return(&mut self, stmt: &'ast ReturnStmt) {
        if let Some(value) = &stmt.value {
            walk_expr(self, value);
        }
    }

    fn visit_break(&mut self, _stmt: &'ast BreakStmt) {}

    fn visit_continue(&mut self, _stmt: &'ast ContinueStmt) {}

    fn visit_try(&mut self, stmt: &'ast TryStmt) {
        self.visit_block(&stmt.body);
        if let Some(catch) = &stmt.catch {
            if let Some(param) = &catch.param {
                walk_pattern(self, param);
            }
            self.visit_block(&catch.body);
        }
        if let Some(finally) = &stmt.finally {
            self.visit_block(finally);
        }
    }

    // -------------------------------------------------------------------------
    // Declarations
    // -------------------------------------------------------------------------
    fn visit_variable_decl(&mut self, decl: &'ast VariableDecl) {
        walk_pattern(self, &decl.pattern);
        if let Some(ty) = &decl.ty {
            walk_type(self, ty);
        }
        if let Some(init) = &decl.init {
            walk_expr(self, init);
        }
    }

    fn visit_function_decl(&mut self, decl: &'ast FunctionDecl) {
        for param in &decl.params {
            walk_type(self, &param.ty);
        }
        if let Some(ret) = &decl.ret_type {
            walk_type(self, ret);
        }
        if let Some(body) = &decl.body {
            self.visit_block(body);
        }
    }

    fn visit_struct_decl(&mut self, decl: &'ast StructDecl) {
        for field in &decl.fields {
            self.visit_field_decl(field);
        }
    }

    fn visit_class_decl(&mut self, decl: &'ast ClassDecl) {
        for member in &decl.members {
            walk_decl(self, member);
        }
    }

    fn visit_impl_decl(&mut self, decl: &'ast ImplDecl) {
        walk_type(self, &decl.target);
        if let Some(trait_ref) = &decl.trait_ref {
            walk_type(self, trait_ref);
        }
        for method in &decl.methods {
            self.visit_function_decl(method);
        }
    }

    fn visit_enum_decl(&mut self, decl: &'ast EnumDecl) {
        for variant in &decl.variants {
            for field in &variant.fields {
                walk_type(self, field);
            }
        }
    }

    fn visit_field_decl(&mut self, decl: &'ast FieldDecl) {
        if let Some(ty) = &decl.ty {
            walk_type(self, ty);
        }
        if let Some(init) = &decl.init {
            walk_expr(self, init);
        }
    }

    fn visit_type_alias_decl(&mut self, decl: &'ast TypeAliasDecl) {
        walk_type(self, &decl.ty);
    }

    fn visit_trait_decl(&mut self, decl: &'ast TraitDecl) {
        for method in &decl.methods {
            self.visit_function_decl(method);
        }
    }

    fn visit_import_decl(&mut self, _decl: &'ast ImportDecl) {}

    fn visit_template_decl(&mut self, decl: &'ast TemplateDecl) {
        walk_decl(self, &decl.decl);
    }

    // -------------------------------------------------------------------------
    // Types
    // -------------------------------------------------------------------------
    fn visit_type(&mut self, ty: &'ast TypeNode) {
        match &ty.kind {
            TypeKind::Identifier { generic_args, .. } => {
                for arg in generic_args {
                    walk_type(self, arg);
                }
            },
            TypeKind::Tuple(elements) => {
                for element in elements {
                    walk_type(self, element);
                }
            },
            TypeKind::Array { element, size } => {
                walk_type(self, element);
                if let Some(size) = size {
                    walk_expr(self, size);
                }
            },
            TypeKind::FunctionSignature { params, ret } => {
                for param in params {
                    walk_type(self, param);
                }
                walk_type(self, ret);
            },
            TypeKind::OwnershipWrapped { inner, .. } => {
                walk_type(self, inner);
            },
        }
    }

    // -------------------------------------------------------------------------
    // Patterns
    // -------------------------------------------------------------------------
    fn visit_wildcard_pattern(&mut self, _pattern: &'ast WildcardPattern) {}

    fn visit_ident_pattern(&mut self, _pattern: &'ast IdentPattern) {}

    fn visit_literal_pattern(&mut self, pattern: &'ast LiteralPattern) {
        walk_expr(self, &pattern.value);
    }

    fn visit_tuple_pattern(&mut self, pattern: &'ast TuplePattern) {
        for element in &pattern.elements {
            walk_pattern(self, element);
        }
    }
}

/// Dispatch an expression to its variant method.
pub fn walk_expr<'ast, V: Visitor<'ast>>(visitor: &mut V, expr: &'ast Expr) {
    match expr {
        Expr::Int(e) => visitor.visit_int_lit(e),
        Expr::Float(e) => visitor.visit_float_lit(e),
        Expr::Str(e) => visitor.visit_str_lit(e),
        Expr::Char(e) => visitor.visit_char_lit(e),
        Expr::Bool(e) => visitor.visit_bool_lit(e),
        Expr::Nil(e) => visitor.visit_nil_lit(e),
        Expr::Array(e) => visitor.visit_array_lit(e),
        Expr::Object(e) => visitor.visit_object_lit(e),
        Expr::Ident(e) => visitor.visit_ident(e),
        Expr::Unary(e) => visitor.visit_unary(e),
        Expr::Binary(e) => visitor.visit_binary(e),
        Expr::Call(e) => visitor.visit_call(e),
        Expr::Member(e) => visitor.visit_member(e),
        Expr::ArrayElement(e) => visitor.visit_array_element(e),
        Expr::Assign(e) => visitor.visit_assign(e),
        Expr::Borrow(e) => visitor.visit_borrow(e),
        Expr::PointerDeref(e) => visitor.visit_pointer_deref(e),
        Expr::AddrOf(e) => visitor.visit_addr_of(e),
        Expr::FromIntToLoc(e) => visitor.visit_from_int_to_loc(e),
        Expr::Location(e) => visitor.visit_location(e),
        Expr::ListComprehension(e) => visitor.visit_list_comprehension(e),
    }
}

/// Dispatch a statement to its variant method.
pub fn walk_stmt<'ast, V: Visitor<'ast>>(visitor: &mut V, stmt: &'ast Stmt) {
    match stmt {
        Stmt::Block(s) => visitor.visit_block(s),
        Stmt::Expr(s) => visitor.visit_expr_stmt(s),
        Stmt::If(s) => visitor.visit_if(s),
        Stmt::While(s) => visitor.visit_while(s),
        Stmt::For(s) => visitor.visit_for(s),
        Stmt::Return(s) => visitor.visit_return(s),
        Stmt::Break(s) => visitor.visit_break(s),
        Stmt::Continue(s) => visitor.visit_continue(s),
        Stmt::Try(s) => visitor.visit_try(s),
        Stmt::Decl(d) => walk_decl(visitor, d),
    }
}

/// Dispatch a declaration to its variant method.
pub fn walk_decl<'ast, V: Visitor<'ast>>(visitor: &mut V, decl: &'ast Decl) {
    match decl {
        Decl::Variable(d) => visitor.visit_variable_decl(d),
        Decl::Function(d) => visitor.visit_function_decl(d),
        Decl::Struct(d) => visitor.visit_struct_decl(d),
        Decl::Class(d) => visitor.visit_class_decl(d),
        Decl::Impl(d) => visitor.visit_impl_decl(d),
        Decl::Enum(d) => visitor.visit_enum_decl(d),
        Decl::Field(d) => visitor.visit_field_decl(d),
        Decl::TypeAlias(d) => visitor.visit_type_alias_decl(d),
        Decl::Trait(d) => visitor.visit_trait_decl(d),
        Decl::Import(d) => visitor.visit_import_decl(d),
        Decl::Template(d) => visitor.visit_template_decl(d),
    }
}

/// Dispatch a type node to the type method.
pub fn walk_type<'ast, V: Visitor<'ast>>(visitor: &mut V, ty: &'ast TypeNode) {
    visitor.visit_type(ty);
}

/// Dispatch a pattern to its variant method.
pub fn walk_pattern<'ast, V: Visitor<'ast>>(visitor: &mut V, pattern: &'ast Pattern) {
    match pattern {
        Pattern::Wildcard(p) => visitor.visit_wildcard_pattern(p),
        Pattern::Identifier(p) => visitor.visit_ident_pattern(p),
        Pattern::Literal(p) => visitor.visit_literal_pattern(p),
        Pattern::Tuple(p) => visitor.visit_tuple_pattern(p),
    }
}

/// Convenience entry point: visit a whole module.
pub fn walk_module<'ast, V: Visitor<'ast>>(visitor: &mut V, module: &'ast Module) {
    visitor.visit_module(module);
}
