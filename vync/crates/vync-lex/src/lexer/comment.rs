//! End-of-line comment lexing.
//!
//! `//` and `#` both introduce comments running to the end of the line.
//! Comments are retained as `Comment` tokens; the parser treats them as
//! whitespace.

use crate::lexer::Lexer;
use crate::token::TokenKind;

impl<'a> Lexer<'a> {
    /// Lex a `#` comment.
    pub(crate) fn lex_hash_comment(&mut self) {
        let loc = self.loc();
        let start = self.cursor.position();
        self.cursor.consume_while(|c| c != '\n');
        let text = self.cursor.slice_from(start);
        self.push(TokenKind::Comment, text, loc);
    }

    /// Lex a `//` comment.
    pub(crate) fn lex_line_comment(&mut self) {
        let loc = self.loc();
        let start = self.cursor.position();
        self.cursor.consume_while(|c| c != '\n');
        let text = self.cursor.slice_from(start);
        self.push(TokenKind::Comment, text, loc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Token;
    use vync_util::FileId;

    fn lex(source: &str) -> Vec<Token> {
        Lexer::new(source, FileId::DUMMY).tokenize().unwrap()
    }

    #[test]
    fn test_hash_comment_retained() {
        let tokens = lex("# a note");
        assert_eq!(tokens[0].kind, TokenKind::Comment);
        assert_eq!(tokens[0].lexeme, "# a note");
    }

    #[test]
    fn test_slash_comment_retained() {
        let tokens = lex("// hello");
        assert_eq!(tokens[0].kind, TokenKind::Comment);
        assert_eq!(tokens[0].lexeme, "// hello");
    }

    #[test]
    fn test_comment_after_code() {
        let tokens = lex("let x = 1 // binding");
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::KwLet,
                TokenKind::Ident,
                TokenKind::Eq,
                TokenKind::Int,
                TokenKind::Comment,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_slash_alone_is_division() {
        let tokens = lex("a / b");
        assert_eq!(tokens[1].kind, TokenKind::Slash);
    }
}
