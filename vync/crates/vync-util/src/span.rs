//! Span module - Source location tracking.
//!
//! This module provides types for identifying positions in source code:
//! a [`FileId`] naming a loaded file, a [`SourceLocation`] carrying the
//! 1-based line and column of a token or AST node, and a [`SourceMap`]
//! resolving file ids back to paths for diagnostic rendering.
//!
//! Locations are used solely for diagnostics, never for semantic decisions.

use std::path::{Path, PathBuf};

/// A unique identifier for a source file.
///
/// FileIds are assigned sequentially as files are added to the [`SourceMap`].
///
/// # Examples
///
/// ```
/// use vync_util::span::FileId;
///
/// let id = FileId(0);
/// assert_eq!(id.index(), 0);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub usize);

impl FileId {
    /// A dummy FileId for tests.
    pub const DUMMY: FileId = FileId(0);

    /// Create a new FileId.
    #[inline]
    pub const fn new(id: usize) -> Self {
        Self(id)
    }

    /// Get the raw index value.
    #[inline]
    pub const fn index(&self) -> usize {
        self.0
    }
}

/// A position in source code.
///
/// Every token and every AST node carries one of these. Lines and columns
/// are 1-based; line 0 marks the dummy location used in tests.
///
/// # Examples
///
/// ```
/// use vync_util::span::{FileId, SourceLocation};
///
/// let loc = SourceLocation::new(FileId(0), 3, 7);
/// assert_eq!(loc.line, 3);
/// assert_eq!(loc.column, 7);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SourceLocation {
    /// File identifier, resolved through the [`SourceMap`].
    pub file: FileId,
    /// Line number (1-based).
    pub line: u32,
    /// Column number (1-based).
    pub column: u32,
}

impl SourceLocation {
    /// Dummy location for tests.
    pub const DUMMY: SourceLocation = SourceLocation {
        file: FileId::DUMMY,
        line: 0,
        column: 0,
    };

    /// Create a new location.
    #[inline]
    pub fn new(file: FileId, line: u32, column: u32) -> Self {
        Self { file, line, column }
    }
}

/// A loaded source file.
pub struct SourceFile {
    /// Path the file was loaded from (`<stdin>` for piped input).
    pub path: PathBuf,
    /// Full file contents.
    pub content: String,
}

/// Registry of all loaded source files.
///
/// The driver owns one `SourceMap` per compilation session; diagnostics
/// carry a [`FileId`] and are resolved to a path only when rendered.
///
/// # Examples
///
/// ```
/// use vync_util::span::SourceMap;
///
/// let mut map = SourceMap::new();
/// let id = map.add_file("main.vyn", "fn main() {}".to_string());
/// assert_eq!(map.path_of(id).to_str(), Some("main.vyn"));
/// ```
#[derive(Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

impl SourceMap {
    /// Create an empty source map.
    pub fn new() -> Self {
        Self { files: Vec::new() }
    }

    /// Register a file and return its id.
    pub fn add_file(&mut self, path: impl Into<PathBuf>, content: String) -> FileId {
        let id = FileId(self.files.len());
        self.files.push(SourceFile {
            path: path.into(),
            content,
        });
        id
    }

    /// Get the file registered under `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this map.
    pub fn file(&self, id: FileId) -> &SourceFile {
        &self.files[id.index()]
    }

    /// Path of the file registered under `id`.
    pub fn path_of(&self, id: FileId) -> &Path {
        &self.files[id.index()].path
    }

    /// Number of registered files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no files have been registered.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
