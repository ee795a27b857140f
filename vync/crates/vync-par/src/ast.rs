//! AST node definitions for the Vyn language.
//!
//! Five node families, each a tagged enum: expressions, statements,
//! declarations, type expressions and patterns, plus the [`Module`] root.
//! Every node carries a [`SourceLocation`] used only for diagnostics.
//!
//! Ownership is a strict tree: the module owns its statements, every other
//! node is owned by exactly one parent, and there are no parent pointers.
//! Traversal that needs parent context passes it down explicitly (see the
//! `visitor` module).

use vync_util::SourceLocation;

/// AST root: the ordered top-level statements of one source file.
#[derive(Debug, Clone)]
pub struct Module {
    /// Top-level statements and declarations in source order.
    pub body: Vec<Stmt>,
    /// Location of the first token of the file.
    pub loc: SourceLocation,
}

// =============================================================================
// EXPRESSIONS
// =============================================================================

/// An expression: produces a value.
#[derive(Debug, Clone)]
pub enum Expr {
    /// Integer literal, e.g. `42`
    Int(IntLit),
    /// Float literal, e.g. `3.14`
    Float(FloatLit),
    /// String literal
    Str(StrLit),
    /// Character literal
    Char(CharLit),
    /// `true` / `false`
    Bool(BoolLit),
    /// `nil` / `null` - polymorphic null
    Nil(NilLit),
    /// Array literal `[a, b, c]`
    Array(ArrayLit),
    /// Object literal `{ x: 1, y: 2 }`
    Object(ObjectLit),
    /// Name reference
    Ident(Ident),
    /// Prefix operator application
    Unary(UnaryExpr),
    /// Infix operator application
    Binary(BinaryExpr),
    /// Call `callee(args)`
    Call(CallExpr),
    /// Member access `object.property`, dotted or computed
    Member(MemberExpr),
    /// Index access `object[index]`
    ArrayElement(ArrayElementExpr),
    /// Assignment `target = value`
    Assign(AssignExpr),
    /// `borrow e` (mutable) or `view e` (immutable)
    Borrow(BorrowExpr),
    /// `at(p)` - dereference a raw location
    PointerDeref(PointerDerefExpr),
    /// `addr(x)` - address of an l-value
    AddrOf(AddrOfExpr),
    /// `from(i)` - reinterpret an integer as a raw location
    FromIntToLoc(FromIntToLocExpr),
    /// `loc(e)` - the raw location of an l-value
    Location(LocationExpr),
    /// `[elem for x in iterable if cond]`
    ListComprehension(ListComprehensionExpr),
}

impl Expr {
    /// Location of the expression's introducing token.
    pub fn loc(&self) -> SourceLocation {
        match self {
            Expr::Int(e) => e.loc,
            Expr::Float(e) => e.loc,
            Expr::Str(e) => e.loc,
            Expr::Char(e) => e.loc,
            Expr::Bool(e) => e.loc,
            Expr::Nil(e) => e.loc,
            Expr::Array(e) => e.loc,
            Expr::Object(e) => e.loc,
            Expr::Ident(e) => e.loc,
            Expr::Unary(e) => e.loc,
            Expr::Binary(e) => e.loc,
            Expr::Call(e) => e.loc,
            Expr::Member(e) => e.loc,
            Expr::ArrayElement(e) => e.loc,
            Expr::Assign(e) => e.loc,
            Expr::Borrow(e) => e.loc,
            Expr::PointerDeref(e) => e.loc,
            Expr::AddrOf(e) => e.loc,
            Expr::FromIntToLoc(e) => e.loc,
            Expr::Location(e) => e.loc,
            Expr::ListComprehension(e) => e.loc,
        }
    }
}

/// Integer literal.
#[derive(Debug, Clone)]
pub struct IntLit {
    pub value: i64,
    pub loc: SourceLocation,
}

/// Float literal.
#[derive(Debug, Clone)]
pub struct FloatLit {
    pub value: f64,
    pub loc: SourceLocation,
}

/// String literal; the value is escape-processed.
#[derive(Debug, Clone)]
pub struct StrLit {
    pub value: String,
    pub loc: SourceLocation,
}

/// Character literal.
#[derive(Debug, Clone)]
pub struct CharLit {
    pub value: char,
    pub loc: SourceLocation,
}

/// Boolean literal.
#[derive(Debug, Clone)]
pub struct BoolLit {
    pub value: bool,
    pub loc: SourceLocation,
}

/// The polymorphic null literal.
#[derive(Debug, Clone)]
pub struct NilLit {
    pub loc: SourceLocation,
}

/// Array literal.
#[derive(Debug, Clone)]
pub struct ArrayLit {
    pub elements: Vec<Expr>,
    pub loc: SourceLocation,
}

/// Object literal field.
#[derive(Debug, Clone)]
pub struct ObjectField {
    pub name: String,
    pub value: Expr,
    pub loc: SourceLocation,
}

/// Object literal.
#[derive(Debug, Clone)]
pub struct ObjectLit {
    pub fields: Vec<ObjectField>,
    pub loc: SourceLocation,
}

/// Identifier reference.
#[derive(Debug, Clone)]
pub struct Ident {
    pub name: String,
    pub loc: SourceLocation,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `-`
    Neg,
    /// `~`
    BitNot,
}

/// Prefix operator application.
#[derive(Debug, Clone)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: Box<Expr>,
    pub loc: SourceLocation,
}

/// Binary operators, lowest nothing implied about precedence here; the
/// parser owns the precedence table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

/// Infix operator application.
#[derive(Debug, Clone)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
    pub loc: SourceLocation,
}

/// Call expression.
#[derive(Debug, Clone)]
pub struct CallExpr {
    pub callee: Box<Expr>,
    pub args: Vec<Expr>,
    pub loc: SourceLocation,
}

/// Member access.
///
/// Dotted access (`a.b`, `t.0`) has `computed == false` and an identifier
/// property. Computed access carries an arbitrary property expression.
#[derive(Debug, Clone)]
pub struct MemberExpr {
    pub object: Box<Expr>,
    pub property: Box<Expr>,
    pub computed: bool,
    pub loc: SourceLocation,
}

/// Index access `object[index]`.
#[derive(Debug, Clone)]
pub struct ArrayElementExpr {
    pub object: Box<Expr>,
    pub index: Box<Expr>,
    pub loc: SourceLocation,
}

/// Assignment. Only identifiers and member expressions are legal targets;
/// the parser enforces this at the operator location.
#[derive(Debug, Clone)]
pub struct AssignExpr {
    pub target: Box<Expr>,
    pub value: Box<Expr>,
    pub loc: SourceLocation,
}

/// Borrow flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowKind {
    /// `borrow e` - exclusive, mutable
    Mutable,
    /// `view e` - shared, immutable
    Immutable,
}

/// Borrow expression.
#[derive(Debug, Clone)]
pub struct BorrowExpr {
    pub kind: BorrowKind,
    pub expr: Box<Expr>,
    pub loc: SourceLocation,
}

/// `at(p)` - read or write through a raw location.
#[derive(Debug, Clone)]
pub struct PointerDerefExpr {
    pub pointer: Box<Expr>,
    pub loc: SourceLocation,
}

/// `addr(x)` - address of an addressable entity.
#[derive(Debug, Clone)]
pub struct AddrOfExpr {
    pub place: Box<Expr>,
    pub loc: SourceLocation,
}

/// `from(i)` - integer reinterpreted as a raw location.
#[derive(Debug, Clone)]
pub struct FromIntToLocExpr {
    pub address: Box<Expr>,
    pub loc: SourceLocation,
}

/// `loc(e)` - the raw location of an l-value, as a generic location value.
#[derive(Debug, Clone)]
pub struct LocationExpr {
    pub place: Box<Expr>,
    pub loc: SourceLocation,
}

/// `[element for variable in iterable if condition]`.
#[derive(Debug, Clone)]
pub struct ListComprehensionExpr {
    pub element: Box<Expr>,
    pub variable: Ident,
    pub iterable: Box<Expr>,
    pub condition: Option<Box<Expr>>,
    pub loc: SourceLocation,
}

// =============================================================================
// STATEMENTS
// =============================================================================

/// A statement: executes. Declarations are statements.
#[derive(Debug, Clone)]
pub enum Stmt {
    Block(Block),
    Expr(ExprStmt),
    If(IfStmt),
    While(WhileStmt),
    For(ForStmt),
    Return(ReturnStmt),
    Break(BreakStmt),
    Continue(ContinueStmt),
    Try(TryStmt),
    Decl(Decl),
}

impl Stmt {
    /// Location of the statement's introducing token.
    pub fn loc(&self) -> SourceLocation {
        match self {
            Stmt::Block(s) => s.loc,
            Stmt::Expr(s) => s.loc,
            Stmt::If(s) => s.loc,
            Stmt::While(s) => s.loc,
            Stmt::For(s) => s.loc,
            Stmt::Return(s) => s.loc,
            Stmt::Break(s) => s.loc,
            Stmt::Continue(s) => s.loc,
            Stmt::Try(s) => s.loc,
            Stmt::Decl(d) => d.loc(),
        }
    }
}

/// A block of statements, brace- or indent-delimited.
///
/// `is_scoped` marks `scoped { .. }` regions, the only context where raw
/// location intrinsics may be used.
#[derive(Debug, Clone)]
pub struct Block {
    pub body: Vec<Stmt>,
    pub is_scoped: bool,
    pub loc: SourceLocation,
}

/// Expression in statement position.
#[derive(Debug, Clone)]
pub struct ExprStmt {
    pub expr: Expr,
    pub loc: SourceLocation,
}

/// `if cond block [else block-or-if]`. else-if is the nested `Stmt::If`.
#[derive(Debug, Clone)]
pub struct IfStmt {
    pub cond: Expr,
    pub then_branch: Block,
    pub else_branch: Option<Box<Stmt>>,
    pub loc: SourceLocation,
}

/// `while cond block`.
#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub cond: Expr,
    pub body: Block,
    pub loc: SourceLocation,
}

/// C-style `for (init; cond; update) block`; every clause optional.
#[derive(Debug, Clone)]
pub struct ForStmt {
    pub init: Option<Box<Stmt>>,
    pub cond: Option<Expr>,
    pub update: Option<Expr>,
    pub body: Block,
    pub loc: SourceLocation,
}

/// `return [expr]`.
#[derive(Debug, Clone)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub loc: SourceLocation,
}

/// `break`.
#[derive(Debug, Clone)]
pub struct BreakStmt {
    pub loc: SourceLocation,
}

/// `continue`.
#[derive(Debug, Clone)]
pub struct ContinueStmt {
    pub loc: SourceLocation,
}

/// Catch clause of a try statement.
#[derive(Debug, Clone)]
pub struct CatchClause {
    pub param: Option<Pattern>,
    pub body: Block,
    pub loc: SourceLocation,
}

/// `try block [catch (pattern) block] [finally block]`.
#[derive(Debug, Clone)]
pub struct TryStmt {
    pub body: Block,
    pub catch: Option<CatchClause>,
    pub finally: Option<Block>,
    pub loc: SourceLocation,
}

// =============================================================================
// DECLARATIONS
// =============================================================================

/// A declaration: introduces a named entity.
#[derive(Debug, Clone)]
pub enum Decl {
    Variable(VariableDecl),
    Function(FunctionDecl),
    Struct(StructDecl),
    Class(ClassDecl),
    Impl(ImplDecl),
    Enum(EnumDecl),
    Field(FieldDecl),
    TypeAlias(TypeAliasDecl),
    Trait(TraitDecl),
    Import(ImportDecl),
    Template(TemplateDecl),
}

impl Decl {
    /// Location of the declaration's introducing token.
    pub fn loc(&self) -> SourceLocation {
        match self {
            Decl::Variable(d) => d.loc,
            Decl::Function(d) => d.loc,
            Decl::Struct(d) => d.loc,
            Decl::Class(d) => d.loc,
            Decl::Impl(d) => d.loc,
            Decl::Enum(d) => d.loc,
            Decl::Field(d) => d.loc,
            Decl::TypeAlias(d) => d.loc,
            Decl::Trait(d) => d.loc,
            Decl::Import(d) => d.loc,
            Decl::Template(d) => d.loc,
        }
    }
}

/// Binding keyword of a variable declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// `let` - immutable binding
    Let,
    /// `var` / `mut` - mutable binding
    Var,
    /// `const` - compile-time constant, initializer required
    Const,
}

/// Local or global variable declaration.
#[derive(Debug, Clone)]
pub struct VariableDecl {
    pub binding: BindingKind,
    pub pattern: Pattern,
    pub ty: Option<TypeNode>,
    pub init: Option<Expr>,
    /// `binding == Const`; a const declaration requires an initializer.
    pub is_const: bool,
    pub loc: SourceLocation,
}

/// Generic parameter with optional trait bounds, `T: Bound1 + Bound2`.
#[derive(Debug, Clone)]
pub struct GenericParam {
    pub name: String,
    pub bounds: Vec<TypeNode>,
    pub loc: SourceLocation,
}

/// Function parameter `name: Type`.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: Ident,
    pub ty: TypeNode,
    pub loc: SourceLocation,
}

/// Function declaration. A function without a body is an extern/forward
/// declaration.
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    /// Plain name, or an operator name such as `operator+`.
    pub name: Ident,
    pub generics: Vec<GenericParam>,
    pub params: Vec<Param>,
    pub ret_type: Option<TypeNode>,
    /// Parsed and stored; carries no semantics yet.
    pub throws: Option<TypeNode>,
    pub body: Option<Block>,
    pub is_async: bool,
    pub is_extern: bool,
    pub loc: SourceLocation,
}

/// Struct declaration: a brace-delimited field list.
#[derive(Debug, Clone)]
pub struct StructDecl {
    pub name: Ident,
    pub generics: Vec<GenericParam>,
    pub fields: Vec<FieldDecl>,
    pub loc: SourceLocation,
}

/// Field declaration, used by structs and classes.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: Ident,
    pub ty: Option<TypeNode>,
    pub init: Option<Expr>,
    pub is_const: bool,
    pub loc: SourceLocation,
}

/// Class declaration: fields and methods.
#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: Ident,
    pub generics: Vec<GenericParam>,
    /// `Decl::Field` and `Decl::Function` members in source order.
    pub members: Vec<Decl>,
    pub loc: SourceLocation,
}

/// Implementation block `impl [<G>] Target [for Trait] { methods }`.
#[derive(Debug, Clone)]
pub struct ImplDecl {
    pub generics: Vec<GenericParam>,
    pub target: TypeNode,
    pub trait_ref: Option<TypeNode>,
    pub methods: Vec<FunctionDecl>,
    pub loc: SourceLocation,
}

/// Enum variant: an identifier with optional associated types.
#[derive(Debug, Clone)]
pub struct EnumVariant {
    pub name: Ident,
    pub fields: Vec<TypeNode>,
    pub loc: SourceLocation,
}

/// Enum declaration.
#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub name: Ident,
    pub generics: Vec<GenericParam>,
    pub variants: Vec<EnumVariant>,
    pub loc: SourceLocation,
}

/// `type Name<G> = Type;`.
#[derive(Debug, Clone)]
pub struct TypeAliasDecl {
    pub name: Ident,
    pub generics: Vec<GenericParam>,
    pub ty: TypeNode,
    pub loc: SourceLocation,
}

/// Trait declaration: method signatures, optionally with default bodies.
#[derive(Debug, Clone)]
pub struct TraitDecl {
    pub name: Ident,
    pub generics: Vec<GenericParam>,
    pub methods: Vec<FunctionDecl>,
    pub loc: SourceLocation,
}

/// `import` vs `smuggle`. Both parse identically; the distinction is kept
/// on the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Import,
    Smuggle,
}

/// `import Path::Sub [as Alias];`.
#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub kind: ImportKind,
    pub path: Vec<String>,
    pub alias: Option<String>,
    pub loc: SourceLocation,
}

/// `template Name<G> { <one declaration> }`.
#[derive(Debug, Clone)]
pub struct TemplateDecl {
    pub name: Ident,
    pub generics: Vec<GenericParam>,
    pub decl: Box<Decl>,
    pub loc: SourceLocation,
}

// =============================================================================
// TYPE EXPRESSIONS
// =============================================================================

/// Ownership wrapper kinds; uniformly a pointer at the IR level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipKind {
    /// `my<T>` - unique ownership
    My,
    /// `our<T>` - shared ownership
    Our,
    /// `their<T>` - non-owning borrow
    Their,
    /// `ptr<T>` - raw pointer
    Ptr,
}

/// The category of a type expression.
#[derive(Debug, Clone)]
pub enum TypeKind {
    /// Named type, built-in or user-defined, with optional generic args.
    Identifier {
        name: String,
        generic_args: Vec<TypeNode>,
    },
    /// Anonymous product type `(A, B)`.
    Tuple(Vec<TypeNode>),
    /// `[T]` or `[T; n]`; no size expression means unsized/dynamic.
    Array {
        element: Box<TypeNode>,
        size: Option<Box<Expr>>,
    },
    /// `fn(A, B) -> R`.
    FunctionSignature {
        params: Vec<TypeNode>,
        ret: Box<TypeNode>,
    },
    /// `my<T>` / `our<T>` / `their<T>` / `ptr<T>`.
    OwnershipWrapped {
        kind: OwnershipKind,
        inner: Box<TypeNode>,
    },
}

/// A source-level type expression with its postfix modifiers.
#[derive(Debug, Clone)]
pub struct TypeNode {
    pub kind: TypeKind,
    /// `T const` - the pointed-to or held data is read-only.
    pub data_is_const: bool,
    /// `T?`
    pub is_optional: bool,
    /// `T*`
    pub is_pointer: bool,
    pub loc: SourceLocation,
}

impl TypeNode {
    /// A plain named type with no modifiers.
    pub fn named(name: impl Into<String>, loc: SourceLocation) -> Self {
        Self {
            kind: TypeKind::Identifier {
                name: name.into(),
                generic_args: Vec::new(),
            },
            data_is_const: false,
            is_optional: false,
            is_pointer: false,
            loc,
        }
    }
}

// =============================================================================
// PATTERNS
// =============================================================================

/// A match/destructure shape.
#[derive(Debug, Clone)]
pub enum Pattern {
    Wildcard(WildcardPattern),
    Identifier(IdentPattern),
    Literal(LiteralPattern),
    Tuple(TuplePattern),
}

impl Pattern {
    /// Location of the pattern's first token.
    pub fn loc(&self) -> SourceLocation {
        match self {
            Pattern::Wildcard(p) => p.loc,
            Pattern::Identifier(p) => p.loc,
            Pattern::Literal(p) => p.loc,
            Pattern::Tuple(p) => p.loc,
        }
    }

    /// Name bound by a simple identifier pattern, if it is one.
    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Pattern::Identifier(p) => Some(&p.name),
            _ => None,
        }
    }
}

/// `_`
#[derive(Debug, Clone)]
pub struct WildcardPattern {
    pub loc: SourceLocation,
}

/// A binding pattern.
#[derive(Debug, Clone)]
pub struct IdentPattern {
    pub name: String,
    pub loc: SourceLocation,
}

/// A literal pattern.
#[derive(Debug, Clone)]
pub struct LiteralPattern {
    pub value: Expr,
    pub loc: SourceLocation,
}

/// `(a, b, _)`
#[derive(Debug, Clone)]
pub struct TuplePattern {
    pub elements: Vec<Pattern>,
    pub loc: SourceLocation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expr_loc_dispatch() {
        let loc = SourceLocation::new(vync_util::FileId(0), 3, 9);
        let expr = Expr::Int(IntLit { value: 7, loc });
        assert_eq!(expr.loc(), loc);

        let bin = Expr::Binary(BinaryExpr {
            op: BinaryOp::Add,
            left: Box::new(Expr::Int(IntLit { value: 1, loc })),
            right: Box::new(Expr::Int(IntLit { value: 2, loc })),
            loc,
        });
        assert_eq!(bin.loc(), loc);
    }

    #[test]
    fn test_pattern_as_identifier() {
        let loc = SourceLocation::DUMMY;
        let p = Pattern::Identifier(IdentPattern {
            name: "x".into(),
            loc,
        });
        assert_eq!(p.as_identifier(), Some("x"));
        assert_eq!(Pattern::Wildcard(WildcardPattern { loc }).as_identifier(), None);
    }

    #[test]
    fn test_named_type_helper() {
        let ty = TypeNode::named("Int", SourceLocation::DUMMY);
        assert!(matches!(ty.kind, TypeKind::Identifier { ref name, .. } if name == "Int"));
        assert!(!ty.is_pointer && !ty.is_optional && !ty.data_is_const);
    }
}
