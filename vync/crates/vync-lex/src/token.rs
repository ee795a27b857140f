//! Token model for the Vyn language.
//!
//! A token is a tagged record of `(kind, lexeme, location)`. Kinds partition
//! into literals, identifiers, keywords, operators/punctuation, and the
//! synthetic kinds `Newline`, `Indent` and `Dedent` the lexer produces for
//! indentation-sensitive blocks, plus `Comment` and `Eof`.
//!
//! Tokens are immutable after production; the parser only reads them.

use std::fmt;

use vync_util::SourceLocation;

/// The kind of a lexical token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // =========================================================================
    // LITERALS AND IDENTIFIERS
    // =========================================================================
    /// Integer literal, e.g. `42`
    Int,
    /// Floating point literal, e.g. `3.14`
    Float,
    /// String literal; the lexeme holds the unquoted, escape-processed value
    Str,
    /// Character literal; the lexeme holds the single processed character
    Char,
    /// Identifier
    Ident,

    // =========================================================================
    // KEYWORDS
    // =========================================================================
    KwLet,
    KwVar,
    KwConst,
    KwMut,
    KwFn,
    KwIf,
    KwElse,
    KwWhile,
    KwFor,
    KwIn,
    KwReturn,
    KwBreak,
    KwContinue,
    KwTrue,
    KwFalse,
    /// Both `nil` and `null` spellings map here
    KwNil,
    KwStruct,
    KwEnum,
    KwTrait,
    KwImpl,
    KwType,
    KwModule,
    KwUse,
    KwPub,
    KwTry,
    KwCatch,
    KwFinally,
    KwDefer,
    KwMatch,
    KwScoped,
    KwRef,
    KwExtern,
    KwAs,
    KwClass,
    KwTemplate,
    KwImport,
    KwSmuggle,
    KwAwait,
    KwAsync,
    KwOperator,
    /// Ownership wrappers: unique owner
    KwMy,
    /// Ownership wrappers: shared owner
    KwOur,
    /// Ownership wrappers: non-owning borrow
    KwTheir,
    /// Ownership wrappers: raw pointer
    KwPtr,

    // =========================================================================
    // OPERATORS
    // =========================================================================
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `=`
    Eq,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `!`
    Bang,
    /// `&`
    Amp,
    /// `|`
    Pipe,
    /// `^`
    Caret,
    /// `~`
    Tilde,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `..`
    DotDot,

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `:`
    Colon,
    /// `::`
    ColonColon,
    /// `;`
    Semicolon,
    /// `->`
    Arrow,
    /// `=>`
    FatArrow,
    /// `?`
    Question,
    /// `_`
    Underscore,

    // =========================================================================
    // SYNTHETIC
    // =========================================================================
    /// End-of-line marker on lines that carry content
    Newline,
    /// Rise in leading whitespace at a block boundary
    Indent,
    /// Fall in leading whitespace at a block boundary
    Dedent,
    /// `//` or `#` end-of-line comment, retained
    Comment,
    /// End of input
    Eof,
}

impl TokenKind {
    /// True for tokens the parser treats as whitespace.
    ///
    /// `Indent` and `Dedent` are significant; `Comment` and `Newline` are
    /// transparent to all parser cursor operations.
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Comment | TokenKind::Newline)
    }

    /// True for literal-introducing kinds.
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::Int
                | TokenKind::Float
                | TokenKind::Str
                | TokenKind::Char
                | TokenKind::KwTrue
                | TokenKind::KwFalse
                | TokenKind::KwNil
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Int => "integer literal",
            TokenKind::Float => "float literal",
            TokenKind::Str => "string literal",
            TokenKind::Char => "character literal",
            TokenKind::Ident => "identifier",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::Eq => "'='",
            TokenKind::EqEq => "'=='",
            TokenKind::NotEq => "'!='",
            TokenKind::Lt => "'<'",
            TokenKind::Gt => "'>'",
            TokenKind::LtEq => "'<='",
            TokenKind::GtEq => "'>='",
            TokenKind::AndAnd => "'&&'",
            TokenKind::OrOr => "'||'",
            TokenKind::Bang => "'!'",
            TokenKind::Amp => "'&'",
            TokenKind::Pipe => "'|'",
            TokenKind::Caret => "'^'",
            TokenKind::Tilde => "'~'",
            TokenKind::Shl => "'<<'",
            TokenKind::Shr => "'>>'",
            TokenKind::DotDot => "'..'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::Colon => "':'",
            TokenKind::ColonColon => "'::'",
            TokenKind::Semicolon => "';'",
            TokenKind::Arrow => "'->'",
            TokenKind::FatArrow => "'=>'",
            TokenKind::Question => "'?'",
            TokenKind::Underscore => "'_'",
            TokenKind::Newline => "newline",
            TokenKind::Indent => "indent",
            TokenKind::Dedent => "dedent",
            TokenKind::Comment => "comment",
            TokenKind::Eof => "end of file",
            // Keywords display as their source spelling
            kw => return write!(f, "'{}'", keyword_spelling(*kw).unwrap_or("keyword")),
        };
        write!(f, "{}", name)
    }
}

/// A lexical token: kind, source lexeme and starting location.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// Token kind.
    pub kind: TokenKind,
    /// Source text of the token. Synthetic tokens carry an empty lexeme;
    /// string and character literals carry their escape-processed value.
    pub lexeme: String,
    /// Location of the token's first character.
    pub loc: SourceLocation,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, loc: SourceLocation) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            loc,
        }
    }
}

/// Resolve an identifier against the fixed keyword table.
///
/// Returns `None` for ordinary identifiers. `borrow`, `view`, `at`, `addr`,
/// `from` and `loc` are contextual and deliberately absent; the parser
/// recognizes them by lexeme.
pub fn keyword_from_ident(word: &str) -> Option<TokenKind> {
    let kind = match word {
        "let" => TokenKind::KwLet,
        "var" => TokenKind::KwVar,
        "const" => TokenKind::KwConst,
        "mut" => TokenKind::KwMut,
        "fn" => TokenKind::KwFn,
        "if" => TokenKind::KwIf,
        "else" => TokenKind::KwElse,
        "while" => TokenKind::KwWhile,
        "for" => TokenKind::KwFor,
        "in" => TokenKind::KwIn,
        "return" => TokenKind::KwReturn,
        "break" => TokenKind::KwBreak,
        "continue" => TokenKind::KwContinue,
        "true" => TokenKind::KwTrue,
        "false" => TokenKind::KwFalse,
        "nil" | "null" => TokenKind::KwNil,
        "struct" => TokenKind::KwStruct,
        "enum" => TokenKind::KwEnum,
        "trait" => TokenKind::KwTrait,
        "impl" => TokenKind::KwImpl,
        "type" => TokenKind::KwType,
        "module" => TokenKind::KwModule,
        "use" => TokenKind::KwUse,
        "pub" => TokenKind::KwPub,
        "try" => TokenKind::KwTry,
        "catch" => TokenKind::KwCatch,
        "finally" => TokenKind::KwFinally,
        "defer" => TokenKind::KwDefer,
        "match" => TokenKind::KwMatch,
        "scoped" => TokenKind::KwScoped,
        "ref" => TokenKind::KwRef,
        "extern" => TokenKind::KwExtern,
        "as" => TokenKind::KwAs,
        "class" => TokenKind::KwClass,
        "template" => TokenKind::KwTemplate,
        "import" => TokenKind::KwImport,
        "smuggle" => TokenKind::KwSmuggle,
        "await" => TokenKind::KwAwait,
        "async" => TokenKind::KwAsync,
        "operator" => TokenKind::KwOperator,
        "my" => TokenKind::KwMy,
        "our" => TokenKind::KwOur,
        "their" => TokenKind::KwTheir,
        "ptr" => TokenKind::KwPtr,
        _ => return None,
    };
    Some(kind)
}

/// Source spelling of a keyword kind, if `kind` is a keyword.
pub fn keyword_spelling(kind: TokenKind) -> Option<&'static str> {
    let s = match kind {
        TokenKind::KwLet => "let",
        TokenKind::KwVar => "var",
        TokenKind::KwConst => "const",
        TokenKind::KwMut => "mut",
        TokenKind::KwFn => "fn",
        TokenKind::KwIf => "if",
        TokenKind::KwElse => "else",
        TokenKind::KwWhile => "while",
        TokenKind::KwFor => "for",
        TokenKind::KwIn => "in",
        TokenKind::KwReturn => "return",
        TokenKind::KwBreak => "break",
        TokenKind::KwContinue => "continue",
        TokenKind::KwTrue => "true",
        TokenKind::KwFalse => "false",
        TokenKind::KwNil => "nil",
        TokenKind::KwStruct => "struct",
        TokenKind::KwEnum => "enum",
        TokenKind::KwTrait => "trait",
        TokenKind::KwImpl => "impl",
        TokenKind::KwType => "type",
        TokenKind::KwModule => "module",
        TokenKind::KwUse => "use",
        TokenKind::KwPub => "pub",
        TokenKind::KwTry => "try",
        TokenKind::KwCatch => "catch",
        TokenKind::KwFinally => "finally",
        TokenKind::KwDefer => "defer",
        TokenKind::KwMatch => "match",
        TokenKind::KwScoped => "scoped",
        TokenKind::KwRef => "ref",
        TokenKind::KwExtern => "extern",
        TokenKind::KwAs => "as",
        TokenKind::KwClass => "class",
        TokenKind::KwTemplate => "template",
        TokenKind::KwImport => "import",
        TokenKind::KwSmuggle => "smuggle",
        TokenKind::KwAwait => "await",
        TokenKind::KwAsync => "async",
        TokenKind::KwOperator => "operator",
        TokenKind::KwMy => "my",
        TokenKind::KwOur => "our",
        TokenKind::KwTheir => "their",
        TokenKind::KwPtr => "ptr",
        _ => return None,
    };
    Some(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(keyword_from_ident("fn"), Some(TokenKind::KwFn));
        assert_eq!(keyword_from_ident("smuggle"), Some(TokenKind::KwSmuggle));
        assert_eq!(keyword_from_ident("my"), Some(TokenKind::KwMy));
        assert_eq!(keyword_from_ident("main"), None);
    }

    #[test]
    fn test_nil_spellings() {
        assert_eq!(keyword_from_ident("nil"), Some(TokenKind::KwNil));
        assert_eq!(keyword_from_ident("null"), Some(TokenKind::KwNil));
    }

    #[test]
    fn test_contextual_names_are_identifiers() {
        for word in ["borrow", "view", "at", "addr", "from", "loc"] {
            assert_eq!(keyword_from_ident(word), None, "{} must stay contextual", word);
        }
    }

    #[test]
    fn test_trivia() {
        assert!(TokenKind::Comment.is_trivia());
        assert!(TokenKind::Newline.is_trivia());
        assert!(!TokenKind::Indent.is_trivia());
        assert!(!TokenKind::Dedent.is_trivia());
        assert!(!TokenKind::Eof.is_trivia());
    }

    #[test]
    fn test_keyword_spelling_roundtrip() {
        for word in ["let", "template", "their", "operator", "scoped"] {
            let kind = keyword_from_ident(word).unwrap();
            assert_eq!(keyword_spelling(kind), Some(word));
        }
    }
}
