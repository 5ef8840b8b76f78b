//! emc-util - Foundation types for the EMLang compiler.
//!
//! This crate holds the pieces every pipeline stage needs: source spans,
//! the diagnostic handler, and the hash-map types used for symbol tables
//! and value maps.

pub mod diagnostic;
pub mod span;

pub use diagnostic::{Diagnostic, Handler, Level};
pub use span::Span;

// Re-export commonly used types
pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;
