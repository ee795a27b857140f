//! vync-util - Core Utilities and Foundation Types
//!
//! This crate provides the foundation types shared by every phase of the
//! Vyn compiler:
//!
//! - `span` - Source locations (`FileId`, `SourceLocation`, `SourceMap`)
//! - `diagnostic` - Diagnostic accumulation (`Diagnostic`, `Level`, `Handler`)
//!
//! Fatal errors (lexical, syntactic) are represented as typed error values
//! in their own crates and propagate with `?`. Semantic and code-generation
//! errors are advisory: they accumulate in a [`Handler`] so that a single
//! compilation surfaces as many problems as possible.

pub mod diagnostic;
pub mod span;

pub use diagnostic::{Diagnostic, Handler, Level};
pub use span::{FileId, SourceLocation, SourceMap};

// Re-export commonly used hash containers
pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;
