//! Lexically scoped symbol tables.
//!
//! Scopes form a parent-pointer chain of ribs. Lookups walk outward;
//! insertions affect only the innermost rib. Ribs are created on block and
//! function entry and released in strict LIFO order.

use vync_par::ast::TypeNode;
use vync_util::{FxHashMap, SourceLocation};

/// What a name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function,
    Type,
}

/// A symbol record.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub kind: SymbolKind,
    /// Declared type annotation, when the source carried one.
    pub declared_type: Option<TypeNode>,
    /// Whether assignment through this binding is legal.
    pub is_mutable: bool,
    /// Where the symbol was declared.
    pub decl_loc: SourceLocation,
}

/// A single scope.
#[derive(Debug, Default)]
struct Rib {
    bindings: FxHashMap<String, Symbol>,
    parent: Option<usize>,
}

/// Scope tree for name resolution.
pub struct ScopeTree {
    ribs: Vec<Rib>,
    current: usize,
}

impl ScopeTree {
    /// Create a tree holding only the global scope.
    pub fn new() -> Self {
        Self {
            ribs: vec![Rib::default()],
            current: 0,
        }
    }

    /// Enter a new innermost scope.
    pub fn enter_scope(&mut self) {
        let rib = Rib {
            bindings: FxHashMap::default(),
            parent: Some(self.current),
        };
        self.ribs.push(rib);
        self.current = self.ribs.len() - 1;
    }

    /// Leave the innermost scope. The global scope is never popped.
    pub fn exit_scope(&mut self) {
        if let Some(parent) = self.ribs[self.current].parent {
            self.current = parent;
        }
    }

    /// Id of the innermost scope.
    pub fn current_scope(&self) -> usize {
        self.current
    }

    /// Insert into the innermost scope.
    ///
    /// Returns the previous declaration's location if the name was already
    /// bound in this scope.
    pub fn declare(&mut self, name: &str, symbol: Symbol) -> Option<SourceLocation> {
        let rib = &mut self.ribs[self.current];
        if let Some(existing) = rib.bindings.get(name) {
            let prev = existing.decl_loc;
            rib.bindings.insert(name.to_string(), symbol);
            return Some(prev);
        }
        rib.bindings.insert(name.to_string(), symbol);
        None
    }

    /// Resolve a name, walking outward through the parent chain.
    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        let mut rib_id = self.current;
        loop {
            let rib = &self.ribs[rib_id];
            if let Some(symbol) = rib.bindings.get(name) {
                return Some(symbol);
            }
            match rib.parent {
                Some(parent) => rib_id = parent,
                None => return None,
            }
        }
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variable() -> Symbol {
        Symbol {
            kind: SymbolKind::Variable,
            declared_type: None,
            is_mutable: true,
            decl_loc: SourceLocation::DUMMY,
        }
    }

    #[test]
    fn test_declare_and_resolve() {
        let mut scopes = ScopeTree::new();
        assert!(scopes.declare("x", variable()).is_none());
        assert!(scopes.resolve("x").is_some());
        assert!(scopes.resolve("y").is_none());
    }

    #[test]
    fn test_lookup_walks_outward() {
        let mut scopes = ScopeTree::new();
        scopes.declare("outer", variable());
        scopes.enter_scope();
        assert!(scopes.resolve("outer").is_some());
    }

    #[test]
    fn test_inner_scope_shadows() {
        let mut scopes = ScopeTree::new();
        scopes.declare(
            "x",
            Symbol {
                is_mutable: false,
                ..variable()
            },
        );
        scopes.enter_scope();
        scopes.declare("x", variable());
        assert!(scopes.resolve("x").map(|s| s.is_mutable).unwrap_or(false));
        scopes.exit_scope();
        assert!(!scopes.resolve("x").map(|s| s.is_mutable).unwrap_or(true));
    }

    #[test]
    fn test_redeclaration_reports_previous_location() {
        let mut scopes = ScopeTree::new();
        assert!(scopes.declare("x", variable()).is_none());
        assert!(scopes.declare("x", variable()).is_some());
    }

    #[test]
    fn test_scope_exit_drops_bindings() {
        let mut scopes = ScopeTree::new();
        scopes.enter_scope();
        scopes.declare("tmp", variable());
        scopes.exit_scope();
        assert!(scopes.resolve("tmp").is_none());
    }

    #[test]
    fn test_global_scope_never_popped() {
        let mut scopes = ScopeTree::new();
        scopes.exit_scope();
        scopes.declare("x", variable());
        assert!(scopes.resolve("x").is_some());
    }
}
