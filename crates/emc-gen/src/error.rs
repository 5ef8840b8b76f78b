//! Error types for LLVM code generation.
//!
//! Semantic analysis gates code generation, so most of these indicate
//! either an argument-count mismatch (checked here against the IR
//! signature) or an internal inconsistency. Verification failures are
//! fatal: they mean the compiler produced invalid IR.

use thiserror::Error;

/// Error type for LLVM code generation
#[derive(Debug, Error)]
pub enum CodeGenError {
    /// A type name with no LLVM lowering
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// Call to a function that exists in no scope
    #[error("unknown function referenced: {0}")]
    FunctionNotFound(String),

    /// Call arity does not match the function's IR signature
    #[error("incorrect number of arguments passed to {name}: expected {expected}, got {got}")]
    ArgumentCountMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    /// Variable missing from the value map
    #[error("unknown variable name: {0}")]
    UndefinedSymbol(String),

    /// Global initialiser that is not a constant expression
    #[error("global variable initialiser must be a constant: {0}")]
    NonConstantInitializer(String),

    /// Construct with no code generation support
    #[error("{0}")]
    Unsupported(String),

    /// IR verification failed; indicates a compiler bug
    #[error("IR verification failed: {0}")]
    VerificationFailed(String),

    /// LLVM builder operation failed
    #[error("LLVM operation failed: {0}")]
    Builder(#[from] inkwell::builder::BuilderError),

    /// Target machine or emission failure
    #[error("compilation error: {0}")]
    CompilationError(String),

    /// Internal error - indicates a bug
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for code generation operations
pub type Result<T> = std::result::Result<T, CodeGenError>;
