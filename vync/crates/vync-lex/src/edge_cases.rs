//! Lexer edge cases and universal properties.

use proptest::prelude::*;

use crate::token::TokenKind;
use crate::tokenize;
use vync_util::FileId;

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source, FileId::DUMMY)
        .unwrap()
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

// =============================================================================
// INDENT/DEDENT BALANCE
// =============================================================================

#[test]
fn test_balance_on_nested_blocks() {
    let source = "a\n  b\n    c\n      d\nend\n";
    let tokens = kinds(source);
    let indents = tokens.iter().filter(|k| **k == TokenKind::Indent).count();
    let dedents = tokens.iter().filter(|k| **k == TokenKind::Dedent).count();
    assert_eq!(indents, dedents);
}

#[test]
fn test_balance_when_eof_closes_levels() {
    let tokens = kinds("a\n  b\n    c");
    let indents = tokens.iter().filter(|k| **k == TokenKind::Indent).count();
    let dedents = tokens.iter().filter(|k| **k == TokenKind::Dedent).count();
    assert_eq!(indents, 2);
    assert_eq!(dedents, 2);
}

proptest! {
    /// For any successfully lexed source built from monotone indent steps,
    /// INDENT and DEDENT counts agree.
    #[test]
    fn prop_indent_dedent_balance(depths in proptest::collection::vec(0usize..5, 1..20)) {
        // Map each step to an indentation that is always reachable: depth
        // changes of more than one level down still dedent consistently
        // because each level is two spaces.
        let mut source = String::new();
        let mut current = 0usize;
        for depth in depths {
            // A new line may go at most one level deeper than the current one.
            let depth = depth.min(current + 1);
            current = depth;
            source.push_str(&"  ".repeat(depth));
            source.push_str("x\n");
        }

        let tokens = tokenize(&source, FileId::DUMMY).unwrap();
        let indents = tokens.iter().filter(|t| t.kind == TokenKind::Indent).count();
        let dedents = tokens.iter().filter(|t| t.kind == TokenKind::Dedent).count();
        prop_assert_eq!(indents, dedents);
    }

    /// Lexing never panics on arbitrary ASCII input; it either produces a
    /// token vector ending in Eof or reports a typed error.
    #[test]
    fn prop_lexer_total(source in "[ -~\n]{0,200}") {
        match tokenize(&source, FileId::DUMMY) {
            Ok(tokens) => prop_assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof)),
            Err(_) => {}
        }
    }
}

// =============================================================================
// LEX-PRINT ROUND TRIP
// =============================================================================

#[test]
fn test_lexeme_concatenation_reconstructs_source() {
    // For a single-line source without strings or comments, joining lexemes
    // with single spaces reproduces the input modulo whitespace width.
    let source = "let total = base + rate * 100";
    let tokens = tokenize(source, FileId::DUMMY).unwrap();
    let printed: Vec<&str> = tokens
        .iter()
        .filter(|t| t.kind != TokenKind::Eof)
        .map(|t| t.lexeme.as_str())
        .collect();
    assert_eq!(printed.join(" "), source);
}

// =============================================================================
// MIXED DELIMITER STYLES
// =============================================================================

#[test]
fn test_braces_and_indentation_together() {
    let source = "fn f() {\n  let x = 1\n}\n";
    let tokens = kinds(source);
    // Braces suppress indentation tracking entirely.
    assert!(!tokens.contains(&TokenKind::Indent));
    assert!(tokens.contains(&TokenKind::LBrace));
    assert!(tokens.contains(&TokenKind::RBrace));
}

#[test]
fn test_deep_dedent_emits_one_per_level() {
    let source = "a\n  b\n    c\na\n";
    let tokens = kinds(source);
    let mut dedents = 0;
    for window in tokens.windows(2) {
        if window[0] == TokenKind::Dedent && window[1] == TokenKind::Dedent {
            dedents += 1;
        }
    }
    // Falling from level 2 to level 0 produces two adjacent DEDENTs.
    assert!(dedents >= 1);
}
