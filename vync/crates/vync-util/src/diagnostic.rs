//! Diagnostic module - Error and warning reporting infrastructure.
//!
//! Semantic analysis and code generation are best-effort: they keep walking
//! the tree after an error so one compilation surfaces as many problems as
//! possible. The [`Handler`] collects those diagnostics; the driver renders
//! each one as a single line
//!
//! ```text
//! Error at <file>:<line>:<column>: <message>
//! ```
//!
//! # Examples
//!
//! ```
//! use vync_util::diagnostic::{Handler, Level};
//! use vync_util::span::SourceLocation;
//!
//! let handler = Handler::new();
//! handler.error("undeclared identifier 'x'", SourceLocation::DUMMY);
//!
//! assert!(handler.has_errors());
//! assert_eq!(handler.error_count(), 1);
//! ```

use std::cell::RefCell;
use std::fmt;

use crate::span::SourceLocation;

/// Diagnostic severity level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// An error that makes the compilation fail.
    Error,
    /// A warning that does not prevent compilation.
    Warning,
    /// Additional information attached to another diagnostic.
    Note,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "Error"),
            Level::Warning => write!(f, "Warning"),
            Level::Note => write!(f, "Note"),
        }
    }
}

/// A diagnostic message with severity and location.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// Severity level.
    pub level: Level,
    /// Main diagnostic message.
    pub message: String,
    /// Source location the diagnostic is pinned to.
    pub loc: SourceLocation,
}

impl Diagnostic {
    /// Create a new diagnostic.
    pub fn new(level: Level, message: impl Into<String>, loc: SourceLocation) -> Self {
        Self {
            level,
            message: message.into(),
            loc,
        }
    }

    /// Create an error diagnostic.
    pub fn error(message: impl Into<String>, loc: SourceLocation) -> Self {
        Self::new(Level::Error, message, loc)
    }

    /// Create a warning diagnostic.
    pub fn warning(message: impl Into<String>, loc: SourceLocation) -> Self {
        Self::new(Level::Warning, message, loc)
    }
}

/// Handler for collecting and querying diagnostics.
///
/// Uses interior mutability so that phases holding `&Handler` can report
/// errors while borrowing the AST immutably.
#[derive(Default)]
pub struct Handler {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl Handler {
    /// Create a new handler.
    pub fn new() -> Self {
        Self {
            diagnostics: RefCell::new(Vec::new()),
        }
    }

    /// Report an error.
    pub fn error(&self, message: impl Into<String>, loc: SourceLocation) {
        self.emit(Diagnostic::error(message, loc));
    }

    /// Report a warning.
    pub fn warning(&self, message: impl Into<String>, loc: SourceLocation) {
        self.emit(Diagnostic::warning(message, loc));
    }

    /// Emit a pre-built diagnostic.
    pub fn emit(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    /// Check if any errors have been reported.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .borrow()
            .iter()
            .any(|d| d.level == Level::Error)
    }

    /// Number of errors reported so far.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == Level::Error)
            .count()
    }

    /// Number of warnings reported so far.
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == Level::Warning)
            .count()
    }

    /// Snapshot of all diagnostics in emission order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Clear all diagnostics.
    pub fn clear(&self) {
        self.diagnostics.borrow_mut().clear();
    }
}
