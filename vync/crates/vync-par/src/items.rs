//! Declaration parsing: functions, structs, classes, impls, enums, traits,
//! type aliases, templates, imports and `smuggle`.

use vync_lex::TokenKind;

use crate::ast::*;
use crate::{ParseError, Parser};

impl Parser {
    /// Whether the next significant token begins a declaration.
    ///
    /// Variable declarations are not listed: they are reachable through the
    /// statement parser, which top-level parsing falls back to.
    pub(crate) fn at_declaration(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::KwFn
                | TokenKind::KwAsync
                | TokenKind::KwExtern
                | TokenKind::KwStruct
                | TokenKind::KwClass
                | TokenKind::KwImpl
                | TokenKind::KwEnum
                | TokenKind::KwTrait
                | TokenKind::KwType
                | TokenKind::KwTemplate
                | TokenKind::KwImport
                | TokenKind::KwSmuggle
        )
    }

    /// Parse one declaration, dispatching on the leading keyword.
    pub fn parse_declaration(&mut self) -> Result<Decl, ParseError> {
        match self.peek().kind {
            TokenKind::KwFn | TokenKind::KwAsync | TokenKind::KwExtern => {
                Ok(Decl::Function(self.parse_function_decl()?))
            },
            TokenKind::KwStruct => self.parse_struct_decl(),
            TokenKind::KwClass => self.parse_class_decl(),
            TokenKind::KwImpl => self.parse_impl_decl(),
            TokenKind::KwEnum => self.parse_enum_decl(),
            TokenKind::KwTrait => self.parse_trait_decl(),
            TokenKind::KwType => self.parse_type_alias_decl(),
            TokenKind::KwTemplate => self.parse_template_decl(),
            TokenKind::KwImport | TokenKind::KwSmuggle => self.parse_import_decl(),
            _ => {
                let found = self.peek().clone();
                Err(self.error(
                    &found,
                    format!("expected declaration, found {}", found.kind),
                ))
            },
        }
    }

    // =========================================================================
    // FUNCTIONS
    // =========================================================================

    /// `[async] [extern] fn name<G>(params) [-> Ret] [throws E] [body]`.
    ///
    /// A function without a body is an extern/forward declaration.
    pub(crate) fn parse_function_decl(&mut self) -> Result<FunctionDecl, ParseError> {
        let start = self.peek().loc;
        let mut is_async = false;
        let mut is_extern = false;
        loop {
            if self.eat(TokenKind::KwAsync) {
                is_async = true;
            } else if self.eat(TokenKind::KwExtern) {
                is_extern = true;
            } else {
                break;
            }
        }

        self.expect(TokenKind::KwFn)?;
        let name = self.parse_function_name()?;
        self.parse_function_rest(name, is_async, is_extern, start)
    }

    /// A plain identifier, or `operator` followed by an operator symbol
    /// forming a name such as `operator+`.
    fn parse_function_name(&mut self) -> Result<Ident, ParseError> {
        if self.check(TokenKind::KwOperator) {
            let keyword = self.consume();
            let symbol = self.peek().clone();
            if !is_overloadable_operator(symbol.kind) {
                return Err(self.error(&symbol, "expected operator symbol after 'operator'"));
            }
            self.consume();
            return Ok(Ident {
                name: format!("operator{}", symbol.lexeme),
                loc: keyword.loc,
            });
        }
        let token = self.expect(TokenKind::Ident)?;
        Ok(Ident {
            name: token.lexeme,
            loc: token.loc,
        })
    }

    /// Signature and optional body, shared by named and operator functions.
    fn parse_function_rest(
        &mut self,
        name: Ident,
        is_async: bool,
        is_extern: bool,
        loc: vync_util::SourceLocation,
    ) -> Result<FunctionDecl, ParseError> {
        let generics = self.parse_generic_params()?;

        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let pname = self.expect(TokenKind::Ident)?;
                self.expect(TokenKind::Colon)?;
                let ty = self.parse_type()?;
                params.push(Param {
                    name: Ident {
                        name: pname.lexeme,
                        loc: pname.loc,
                    },
                    ty,
                    loc: pname.loc,
                });
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;

        let ret_type = if self.eat(TokenKind::Arrow) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let throws = if self.eat_contextual("throws") {
            Some(self.parse_type()?)
        } else {
            None
        };

        let body = if self.check(TokenKind::LBrace) || self.check(TokenKind::Indent) {
            Some(self.parse_block()?)
        } else {
            None
        };

        Ok(FunctionDecl {
            name,
            generics,
            params,
            ret_type,
            throws,
            body,
            is_async,
            is_extern,
            loc,
        })
    }

    /// `<T: Bound1 + Bound2, U, ...>`, or nothing.
    pub(crate) fn parse_generic_params(&mut self) -> Result<Vec<GenericParam>, ParseError> {
        let mut params = Vec::new();
        if !self.eat(TokenKind::Lt) {
            return Ok(params);
        }
        loop {
            let name = self.expect(TokenKind::Ident)?;
            let mut bounds = Vec::new();
            if self.eat(TokenKind::Colon) {
                bounds.push(self.parse_type()?);
                while self.eat(TokenKind::Plus) {
                    bounds.push(self.parse_type()?);
                }
            }
            params.push(GenericParam {
                name: name.lexeme,
                bounds,
                loc: name.loc,
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::Gt)?;
        Ok(params)
    }

    // =========================================================================
    // STRUCTS AND CLASSES
    // =========================================================================

    /// `struct Name<G> { field: Type, ... }`, trailing comma allowed.
    fn parse_struct_decl(&mut self) -> Result<Decl, ParseError> {
        let keyword = self.expect(TokenKind::KwStruct)?;
        let name = self.expect(TokenKind::Ident)?;
        let generics = self.parse_generic_params()?;

        self.expect(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        loop {
            if self.check(TokenKind::RBrace) {
                break;
            }
            let fname = self.expect(TokenKind::Ident)?;
            self.expect(TokenKind::Colon)?;
            let ty = self.parse_type()?;
            fields.push(FieldDecl {
                name: Ident {
                    name: fname.lexeme,
                    loc: fname.loc,
                },
                ty: Some(ty),
                init: None,
                is_const: false,
                loc: fname.loc,
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;

        Ok(Decl::Struct(StructDecl {
            name: Ident {
                name: name.lexeme,
                loc: name.loc,
            },
            generics,
            fields,
            loc: keyword.loc,
        }))
    }

    /// `class Name<G> { fields and methods }`.
    ///
    /// Fields may be prefixed with `var`/`let`/`const` and carry an optional
    /// initializer; methods are `fn`-form or `operator`-form.
    fn parse_class_decl(&mut self) -> Result<Decl, ParseError> {
        let keyword = self.expect(TokenKind::KwClass)?;
        let name = self.expect(TokenKind::Ident)?;
        let generics = self.parse_generic_params()?;

        self.expect(TokenKind::LBrace)?;
        let mut members = Vec::new();
        loop {
            while self.eat(TokenKind::Semicolon) || self.eat(TokenKind::Comma) {}
            if self.check(TokenKind::RBrace) || self.check(TokenKind::Eof) {
                break;
            }

            match self.peek().kind {
                TokenKind::KwFn | TokenKind::KwAsync | TokenKind::KwExtern => {
                    members.push(Decl::Function(self.parse_function_decl()?));
                },
                TokenKind::KwOperator => {
                    let start = self.peek().loc;
                    let op_name = self.parse_function_name()?;
                    let method = self.parse_function_rest(op_name, false, false, start)?;
                    members.push(Decl::Function(method));
                },
                _ => members.push(Decl::Field(self.parse_class_field()?)),
            }
        }
        self.expect(TokenKind::RBrace)?;

        Ok(Decl::Class(ClassDecl {
            name: Ident {
                name: name.lexeme,
                loc: name.loc,
            },
            generics,
            members,
            loc: keyword.loc,
        }))
    }

    /// `[var|let|const] name[: Type][= init]` inside a class body.
    fn parse_class_field(&mut self) -> Result<FieldDecl, ParseError> {
        let mut is_const = false;
        if self.check(TokenKind::KwVar) || self.check(TokenKind::KwLet) {
            self.consume();
        } else if self.eat(TokenKind::KwConst) {
            is_const = true;
        }

        let name = self.expect(TokenKind::Ident)?;
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

        Ok(FieldDecl {
            name: Ident {
                name: name.lexeme,
                loc: name.loc,
            },
            ty,
            init,
            is_const,
            loc: name.loc,
        })
    }

    // =========================================================================
    // IMPLS, ENUMS, TRAITS
    // =========================================================================

    /// `impl [<G>] Target [for Trait] { methods }`.
    fn parse_impl_decl(&mut self) -> Result<Decl, ParseError> {
        let keyword = self.expect(TokenKind::KwImpl)?;
        let generics = self.parse_generic_params()?;
        let target = self.parse_type()?;
        let trait_ref = if self.eat(TokenKind::KwFor) {
            Some(self.parse_type()?)
        } else {
            None
        };

        self.expect(TokenKind::LBrace)?;
        let mut methods = Vec::new();
        loop {
            while self.eat(TokenKind::Semicolon) {}
            if self.check(TokenKind::RBrace) || self.check(TokenKind::Eof) {
                break;
            }
            methods.push(self.parse_function_decl()?);
        }
        self.expect(TokenKind::RBrace)?;

        Ok(Decl::Impl(ImplDecl {
            generics,
            target,
            trait_ref,
            methods,
            loc: keyword.loc,
        }))
    }

    /// `enum Name<G> { Variant, Variant(Type, ...), ... }`.
    fn parse_enum_decl(&mut self) -> Result<Decl, ParseError> {
        let keyword = self.expect(TokenKind::KwEnum)?;
        let name = self.expect(TokenKind::Ident)?;
        let generics = self.parse_generic_params()?;

        self.expect(TokenKind::LBrace)?;
        let mut variants = Vec::new();
        loop {
            if self.check(TokenKind::RBrace) {
                break;
            }
            let vname = self.expect(TokenKind::Ident)?;
            let mut fields = Vec::new();
            if self.eat(TokenKind::LParen) {
                loop {
                    fields.push(self.parse_type()?);
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RParen)?;
            }
            variants.push(EnumVariant {
                name: Ident {
                    name: vname.lexeme,
                    loc: vname.loc,
                },
                fields,
                loc: vname.loc,
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;

        Ok(Decl::Enum(EnumDecl {
            name: Ident {
                name: name.lexeme,
                loc: name.loc,
            },
            generics,
            variants,
            loc: keyword.loc,
        }))
    }

    /// `trait Name<G> { method signatures, optionally with bodies }`.
    fn parse_trait_decl(&mut self) -> Result<Decl, ParseError> {
        let keyword = self.expect(TokenKind::KwTrait)?;
        let name = self.expect(TokenKind::Ident)?;
        let generics = self.parse_generic_params()?;

        self.expect(TokenKind::LBrace)?;
        let mut methods = Vec::new();
        loop {
            while self.eat(TokenKind::Semicolon) {}
            if self.check(TokenKind::RBrace) || self.check(TokenKind::Eof) {
                break;
            }
            methods.push(self.parse_function_decl()?);
        }
        self.expect(TokenKind::RBrace)?;

        Ok(Decl::Trait(TraitDecl {
            name: Ident {
                name: name.lexeme,
                loc: name.loc,
            },
            generics,
            methods,
            loc: keyword.loc,
        }))
    }

    // =========================================================================
    // TYPE ALIASES, TEMPLATES, IMPORTS
    // =========================================================================

    /// `type Name<G> = Type;`.
    fn parse_type_alias_decl(&mut self) -> Result<Decl, ParseError> {
        let keyword = self.expect(TokenKind::KwType)?;
        let name = self.expect(TokenKind::Ident)?;
        let generics = self.parse_generic_params()?;
        self.expect(TokenKind::Eq)?;
        let ty = self.parse_type()?;
        self.eat(TokenKind::Semicolon);

        Ok(Decl::TypeAlias(TypeAliasDecl {
            name: Ident {
                name: name.lexeme,
                loc: name.loc,
            },
            generics,
            ty,
            loc: keyword.loc,
        }))
    }

    /// `template Name<G> { <one declaration> }`.
    fn parse_template_decl(&mut self) -> Result<Decl, ParseError> {
        let keyword = self.expect(TokenKind::KwTemplate)?;
        let name = self.expect(TokenKind::Ident)?;
        let generics = self.parse_generic_params()?;

        self.expect(TokenKind::LBrace)?;
        let decl = self.parse_declaration()?;
        self.expect(TokenKind::RBrace)?;

        Ok(Decl::Template(TemplateDecl {
            name: Ident {
                name: name.lexeme,
                loc: name.loc,
            },
            generics,
            decl: Box::new(decl),
            loc: keyword.loc,
        }))
    }

    /// `import Path::Sub [as Alias];` - `smuggle` parses identically and is
    /// tagged on the node.
    fn parse_import_decl(&mut self) -> Result<Decl, ParseError> {
        let keyword = self.consume();
        let kind = if keyword.kind == TokenKind::KwSmuggle {
            ImportKind::Smuggle
        } else {
            ImportKind::Import
        };

        let first = self.expect(TokenKind::Ident)?;
        let mut path = vec![first.lexeme];
        while self.eat(TokenKind::ColonColon) {
            let segment = self.expect(TokenKind::Ident)?;
            path.push(segment.lexeme);
        }

        let alias = if self.eat(TokenKind::KwAs) {
            Some(self.expect(TokenKind::Ident)?.lexeme)
        } else {
            None
        };
        self.eat(TokenKind::Semicolon);

        Ok(Decl::Import(ImportDecl {
            kind,
            path,
            alias,
            loc: keyword.loc,
        }))
    }
}

/// Operators a class or function may overload via `operator` names.
fn is_overloadable_operator(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Star
            | TokenKind::Slash
            | TokenKind::Percent
            | TokenKind::EqEq
            | TokenKind::NotEq
            | TokenKind::Lt
            | TokenKind::Gt
            | TokenKind::LtEq
            | TokenKind::GtEq
            | TokenKind::Shl
            | TokenKind::Shr
            | TokenKind::Amp
            | TokenKind::Pipe
            | TokenKind::Caret
    )
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use vync_lex::tokenize;
    use vync_util::FileId;

    fn parse_decl(source: &str) -> Decl {
        let tokens = tokenize(source, FileId::DUMMY).unwrap();
        let mut parser = Parser::new(tokens);
        parser.parse_declaration().unwrap()
    }

    fn parse_decl_err(source: &str) -> ParseError {
        let tokens = tokenize(source, FileId::DUMMY).unwrap();
        Parser::new(tokens).parse_declaration().unwrap_err()
    }

    // =========================================================================
    // FUNCTIONS
    // =========================================================================

    #[test]
    fn test_simple_function() {
        match parse_decl("fn add(a: Int, b: Int) -> Int { return a + b }") {
            Decl::Function(f) => {
                assert_eq!(f.name.name, "add");
                assert_eq!(f.params.len(), 2);
                assert!(f.ret_type.is_some());
                assert!(f.body.is_some());
                assert!(!f.is_async && !f.is_extern);
            },
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_async_extern_modifiers() {
        match parse_decl("async fn poll() { }") {
            Decl::Function(f) => assert!(f.is_async),
            other => panic!("expected function, got {:?}", other),
        }
        match parse_decl("extern fn puts(s: String) -> Int") {
            Decl::Function(f) => {
                assert!(f.is_extern);
                assert!(f.body.is_none(), "extern functions have no body");
            },
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_forward_declaration_has_no_body() {
        match parse_decl("fn later(x: Int) -> Int") {
            Decl::Function(f) => assert!(f.body.is_none()),
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_operator_function_name() {
        match parse_decl("fn operator+(a: Vec2, b: Vec2) -> Vec2 { return a }") {
            Decl::Function(f) => assert_eq!(f.name.name, "operator+"),
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_generic_params_with_bounds() {
        match parse_decl("fn max<T: Ord + Copy>(a: T, b: T) -> T { return a }") {
            Decl::Function(f) => {
                assert_eq!(f.generics.len(), 1);
                assert_eq!(f.generics[0].name, "T");
                assert_eq!(f.generics[0].bounds.len(), 2);
            },
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_throws_clause_is_stored() {
        match parse_decl("fn risky() -> Int throws IoError { return 0 }") {
            Decl::Function(f) => assert!(f.throws.is_some()),
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_indented_function_body() {
        match parse_decl("fn main()\n  const x = 1\n") {
            Decl::Function(f) => {
                let body = f.body.expect("indented body");
                assert_eq!(body.body.len(), 1);
            },
            other => panic!("expected function, got {:?}", other),
        }
    }

    // =========================================================================
    // STRUCTS AND CLASSES
    // =========================================================================

    #[test]
    fn test_struct_fields() {
        match parse_decl("struct Point { x: Float, y: Float }") {
            Decl::Struct(s) => {
                assert_eq!(s.name.name, "Point");
                assert_eq!(s.fields.len(), 2);
            },
            other => panic!("expected struct, got {:?}", other),
        }
    }

    #[test]
    fn test_struct_trailing_comma() {
        match parse_decl("struct P { x: Int, }") {
            Decl::Struct(s) => assert_eq!(s.fields.len(), 1),
            other => panic!("expected struct, got {:?}", other),
        }
    }

    #[test]
    fn test_generic_struct() {
        match parse_decl("struct Pair<A, B> { first: A, second: B }") {
            Decl::Struct(s) => assert_eq!(s.generics.len(), 2),
            other => panic!("expected struct, got {:?}", other),
        }
    }

    #[test]
    fn test_class_members() {
        let source = "class Counter {\n  var count: Int = 0\n  fn increment() { count = count + 1 }\n}";
        match parse_decl(source) {
            Decl::Class(c) => {
                assert_eq!(c.members.len(), 2);
                assert!(matches!(c.members[0], Decl::Field(_)));
                assert!(matches!(c.members[1], Decl::Function(_)));
            },
            other => panic!("expected class, got {:?}", other),
        }
    }

    #[test]
    fn test_class_const_field() {
        match parse_decl("class C { const max: Int = 10 }") {
            Decl::Class(c) => match &c.members[0] {
                Decl::Field(f) => assert!(f.is_const),
                other => panic!("expected field, got {:?}", other),
            },
            other => panic!("expected class, got {:?}", other),
        }
    }

    #[test]
    fn test_class_operator_method() {
        match parse_decl("class Vec2 { operator+(other: Vec2) -> Vec2 { return other } }") {
            Decl::Class(c) => match &c.members[0] {
                Decl::Function(f) => assert_eq!(f.name.name, "operator+"),
                other => panic!("expected method, got {:?}", other),
            },
            other => panic!("expected class, got {:?}", other),
        }
    }

    // =========================================================================
    // IMPLS, ENUMS, TRAITS
    // =========================================================================

    #[test]
    fn test_impl_block() {
        match parse_decl("impl Point { fn norm(p: Point) -> Float { return 0.0 } }") {
            Decl::Impl(i) => {
                assert!(i.trait_ref.is_none());
                assert_eq!(i.methods.len(), 1);
            },
            other => panic!("expected impl, got {:?}", other),
        }
    }

    #[test]
    fn test_impl_for_trait() {
        match parse_decl("impl<T> Stack<T> for Container { fn size(s: Stack<T>) -> Int { return 0 } }") {
            Decl::Impl(i) => {
                assert_eq!(i.generics.len(), 1);
                assert!(i.trait_ref.is_some());
            },
            other => panic!("expected impl, got {:?}", other),
        }
    }

    #[test]
    fn test_enum_variants() {
        match parse_decl("enum Shape { Circle(Float), Rect(Float, Float), Empty }") {
            Decl::Enum(e) => {
                assert_eq!(e.variants.len(), 3);
                assert_eq!(e.variants[0].fields.len(), 1);
                assert_eq!(e.variants[1].fields.len(), 2);
                assert!(e.variants[2].fields.is_empty());
            },
            other => panic!("expected enum, got {:?}", other),
        }
    }

    #[test]
    fn test_trait_with_signatures() {
        match parse_decl("trait Printable { fn print(x: Int); fn pretty(x: Int) -> String }") {
            Decl::Trait(t) => {
                assert_eq!(t.methods.len(), 2);
                assert!(t.methods[0].body.is_none());
            },
            other => panic!("expected trait, got {:?}", other),
        }
    }

    // =========================================================================
    // ALIASES, TEMPLATES, IMPORTS
    // =========================================================================

    #[test]
    fn test_type_alias() {
        match parse_decl("type Ints = [Int];") {
            Decl::TypeAlias(a) => assert_eq!(a.name.name, "Ints"),
            other => panic!("expected type alias, got {:?}", other),
        }
    }

    #[test]
    fn test_generic_type_alias() {
        match parse_decl("type Table<V> = Map<String, V>;") {
            Decl::TypeAlias(a) => assert_eq!(a.generics.len(), 1),
            other => panic!("expected type alias, got {:?}", other),
        }
    }

    #[test]
    fn test_template_wraps_one_declaration() {
        match parse_decl("template Boxed<T> { struct Box { value: T } }") {
            Decl::Template(t) => {
                assert_eq!(t.name.name, "Boxed");
                assert!(matches!(*t.decl, Decl::Struct(_)));
            },
            other => panic!("expected template, got {:?}", other),
        }
    }

    #[test]
    fn test_import_with_alias() {
        match parse_decl("import std::io as io;") {
            Decl::Import(i) => {
                assert_eq!(i.kind, ImportKind::Import);
                assert_eq!(i.path, vec!["std".to_string(), "io".to_string()]);
                assert_eq!(i.alias.as_deref(), Some("io"));
            },
            other => panic!("expected import, got {:?}", other),
        }
    }

    #[test]
    fn test_smuggle_parses_like_import() {
        match parse_decl("smuggle net::socket") {
            Decl::Import(i) => {
                assert_eq!(i.kind, ImportKind::Smuggle);
                assert_eq!(i.path.len(), 2);
                assert!(i.alias.is_none());
            },
            other => panic!("expected import, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_operator_symbol() {
        let err = parse_decl_err("fn operator fn() { }");
        assert!(err.message.contains("operator symbol"));
    }
}
