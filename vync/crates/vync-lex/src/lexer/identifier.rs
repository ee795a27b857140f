//! Identifier and keyword lexing.

use crate::lexer::Lexer;
use crate::token::{keyword_from_ident, TokenKind};

impl<'a> Lexer<'a> {
    /// Lex an identifier, keyword, or lone underscore.
    ///
    /// Identifiers start with a letter or underscore and continue with
    /// letters, digits or underscores. Keywords are resolved by exact match
    /// against the fixed keyword table.
    pub(crate) fn lex_identifier(&mut self) {
        let loc = self.loc();
        let word = self
            .cursor
            .consume_while(|c| c.is_ascii_alphanumeric() || c == '_');

        let kind = if word == "_" {
            TokenKind::Underscore
        } else {
            keyword_from_ident(word).unwrap_or(TokenKind::Ident)
        };
        self.push(kind, word, loc);
    }
}
