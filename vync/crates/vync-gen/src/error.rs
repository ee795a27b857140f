//! Error types for LLVM code generation.
//!
//! Most code generation problems are advisory diagnostics accumulated in
//! the shared handler; the variants here are the hard failures that abort
//! emission (a module that does not verify, an output file that cannot be
//! written).

use thiserror::Error;

/// Error type for LLVM code generation.
#[derive(Debug, Error)]
pub enum CodeGenError {
    /// An LLVM builder operation failed.
    #[error("LLVM operation failed: {0}")]
    LlvmOperationFailed(String),

    /// The finished module did not pass `verifyModule`.
    #[error("module verification failed: {0}")]
    VerificationFailed(String),

    /// Code generation produced diagnostics; the IR is not usable.
    #[error("code generation failed with {0} error(s)")]
    DiagnosticsEmitted(usize),

    /// Writing the textual IR failed.
    #[error("failed to write IR: {0}")]
    WriteFailed(String),
}

/// Result type alias for code generation operations.
pub type Result<T> = std::result::Result<T, CodeGenError>;
