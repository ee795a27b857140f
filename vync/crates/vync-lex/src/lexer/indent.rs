//! Newline handling and the INDENT/DEDENT discipline.
//!
//! On every newline outside brackets the lexer measures the leading spaces
//! of the following line against the indent stack:
//!
//! - deeper than the stack top: push the new width, emit `Indent`;
//! - shallower: pop and emit one `Dedent` per level until the top is no
//!   deeper; if the remaining top does not equal the new width, the dedent
//!   is inconsistent and lexing fails;
//! - equal: no synthetic token.
//!
//! `Newline` is emitted only for lines that carry real content (not blank,
//! not comment-only) and only when no `Indent`/`Dedent` was emitted for the
//! same line. Inside brackets indentation is ignored entirely and only the
//! content-carrying `Newline` survives.

use vync_util::SourceLocation;

use crate::error::LexError;
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

impl<'a> Lexer<'a> {
    /// Consume a `'\n'` and process the line that follows it.
    pub(crate) fn handle_newline(&mut self) -> Result<(), LexError> {
        self.cursor.advance(); // the '\n' itself; cursor is now at column 1

        let line = self.cursor.line();

        // Measure leading spaces without consuming them.
        let mut spaces = 0usize;
        loop {
            match self.cursor.peek_char(spaces) {
                ' ' => spaces += 1,
                '\t' => {
                    return Err(LexError::TabIndent {
                        line,
                        column: 1 + spaces as u32,
                    })
                },
                _ => break,
            }
        }

        let has_content = !self.rest_is_blank_or_comment(spaces);
        let loc = SourceLocation::new(self.file, line, 1);

        if self.nesting > 0 {
            // Inside brackets indentation carries no meaning; a NEWLINE is
            // still useful to the parser as a statement separator when the
            // line has content.
            if has_content {
                self.tokens.push(Token::new(TokenKind::Newline, "", loc));
            }
            self.skip_spaces(spaces);
            return Ok(());
        }

        let width = spaces as u32;
        let top = self.indent_stack.last().copied().unwrap_or(0);
        let mut emitted_indent_or_dedent = false;

        if width > top {
            self.indent_stack.push(width);
            self.tokens.push(Token::new(TokenKind::Indent, "", loc));
            emitted_indent_or_dedent = true;
        } else if width < top {
            while self.indent_stack.last().copied().unwrap_or(0) > width
                && self.indent_stack.len() > 1
            {
                self.indent_stack.pop();
                self.tokens.push(Token::new(TokenKind::Dedent, "", loc));
                emitted_indent_or_dedent = true;
            }
            if self.indent_stack.last().copied().unwrap_or(0) != width {
                return Err(LexError::InconsistentDedent { found: width, line });
            }
        }

        if !emitted_indent_or_dedent && has_content {
            self.tokens.push(Token::new(TokenKind::Newline, "", loc));
        }

        self.skip_spaces(spaces);
        Ok(())
    }

    /// Whether the line is blank or comment-only from `offset` spaces in.
    fn rest_is_blank_or_comment(&self, offset: usize) -> bool {
        match self.cursor.peek_char(offset) {
            '\0' => true,
            '\n' | '\r' => true,
            '#' => true,
            '/' => self.cursor.peek_char(offset + 1) == '/',
            _ => false,
        }
    }

    fn skip_spaces(&mut self, count: usize) {
        for _ in 0..count {
            self.cursor.advance();
        }
    }
}
