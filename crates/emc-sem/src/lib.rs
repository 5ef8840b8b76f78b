//! emc-sem - Semantic analysis for EMLang.
//!
//! Walks the AST once, resolving names against a lexically scoped symbol
//! stack, checking types, and classifying lvalues and constants. Results
//! land in a [`TypeTable`] side table keyed by expression node id; the AST
//! itself is never mutated.
//!
//! The type system is nominal with a fixed vocabulary. Internally types are
//! the structured [`Ty`] sum; the canonical string form (`int32`, `int32*`,
//! `str`, ...) appears only at the parsing boundary and in diagnostics.
//!
//! Analysis never aborts: each error is accumulated through the shared
//! handler and the walk continues with [`Ty::Error`], which is compatible
//! with nothing and so stops cascades without stopping the traversal.

mod analyzer;
pub mod builtins;
mod scope;
mod types;

pub use analyzer::{Analyzer, TypeTable};
pub use builtins::{builtins, Builtin, BuiltinParam};
pub use scope::{ScopeStack, Symbol};
pub use types::{IntWidth, Ty};
