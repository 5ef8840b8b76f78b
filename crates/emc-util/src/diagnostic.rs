//! Diagnostic module - Error and warning reporting infrastructure.
//!
//! Every compilation stage reports problems through a shared [`Handler`].
//! Diagnostics accumulate instead of aborting: the lexer keeps scanning past
//! a bad character, the parser recovers at statement boundaries, and the
//! analyzer continues with an error placeholder type. The driver inspects
//! [`Handler::has_errors`] between stages and decides whether to go on.
//!
//! # Examples
//!
//! ```
//! use emc_util::{Handler, Diagnostic, Span};
//!
//! let handler = Handler::new();
//! handler.emit(Diagnostic::error("unexpected token", Span::point(3, 1)));
//!
//! if handler.has_errors() {
//!     eprintln!("compilation failed with {} errors", handler.error_count());
//! }
//! ```

use crate::span::Span;
use std::cell::RefCell;
use std::fmt;

/// Diagnostic severity level
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// An error that prevents compilation
    Error,
    /// A problem that does not prevent compilation
    Warning,
    /// Additional information
    Info,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "Error"),
            Level::Warning => write!(f, "Warning"),
            Level::Info => write!(f, "Info"),
        }
    }
}

/// A diagnostic message with severity and location
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    /// Severity level
    pub level: Level,
    /// Main diagnostic message
    pub message: String,
    /// Source location
    pub span: Span,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(level: Level, message: impl Into<String>, span: Span) -> Self {
        Self {
            level,
            message: message.into(),
            span,
        }
    }

    /// Create an error diagnostic
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self::new(Level::Error, message, span)
    }

    /// Create a warning diagnostic
    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Self::new(Level::Warning, message, span)
    }

    /// Create an info diagnostic
    pub fn info(message: impl Into<String>, span: Span) -> Self {
        Self::new(Level::Info, message, span)
    }
}

/// Handler for collecting and querying diagnostics
///
/// The handler is shared by reference across the whole pipeline, so it uses
/// interior mutability. It is not a singleton; the driver owns exactly one per
/// compilation.
#[derive(Default)]
pub struct Handler {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl Handler {
    /// Create a new empty handler
    pub fn new() -> Self {
        Self {
            diagnostics: RefCell::new(Vec::new()),
        }
    }

    /// Record a diagnostic
    pub fn emit(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    /// Record an error at the given span
    pub fn error(&self, message: impl Into<String>, span: Span) {
        self.emit(Diagnostic::error(message, span));
    }

    /// Record a warning at the given span
    pub fn warning(&self, message: impl Into<String>, span: Span) {
        self.emit(Diagnostic::warning(message, span));
    }

    /// Check if any errors have been recorded
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .borrow()
            .iter()
            .any(|d| d.level == Level::Error)
    }

    /// Number of recorded errors
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == Level::Error)
            .count()
    }

    /// Number of recorded warnings
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == Level::Warning)
            .count()
    }

    /// Snapshot of all recorded diagnostics in emission order
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Discard all recorded diagnostics
    pub fn clear(&self) {
        self.diagnostics.borrow_mut().clear();
    }
}

/// Render a single diagnostic in the form
/// `<Severity> at <line>:<column>: <message>` followed by an indented source
/// snippet with a caret under the offending column, when the span carries a
/// real position and the source line is available.
pub fn render_diagnostic(diag: &Diagnostic, source: &str) -> String {
    let mut out = String::new();
    if diag.span.line > 0 {
        out.push_str(&format!(
            "{} at {}:{}: {}",
            diag.level, diag.span.line, diag.span.column, diag.message
        ));
        if let Some(line_text) = source.lines().nth(diag.span.line as usize - 1) {
            out.push('\n');
            out.push_str("    ");
            out.push_str(line_text);
            out.push('\n');
            out.push_str("    ");
            for _ in 1..diag.span.column {
                out.push(' ');
            }
            out.push('^');
        }
    } else {
        out.push_str(&format!("{}: {}", diag.level, diag.message));
    }
    out
}

/// Render the closing summary line, e.g. `2 errors, 1 warning`.
pub fn render_summary(handler: &Handler) -> String {
    let errors = handler.error_count();
    let warnings = handler.warning_count();
    let plural = |n: usize| if n == 1 { "" } else { "s" };
    format!(
        "{} error{}, {} warning{}",
        errors,
        plural(errors),
        warnings,
        plural(warnings)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_display() {
        assert_eq!(format!("{}", Level::Error), "Error");
        assert_eq!(format!("{}", Level::Warning), "Warning");
        assert_eq!(format!("{}", Level::Info), "Info");
    }

    #[test]
    fn test_handler_starts_empty() {
        let handler = Handler::new();
        assert!(!handler.has_errors());
        assert_eq!(handler.error_count(), 0);
        assert_eq!(handler.warning_count(), 0);
    }

    #[test]
    fn test_handler_error() {
        let handler = Handler::new();
        handler.error("bad token", Span::point(1, 1));
        assert!(handler.has_errors());
        assert_eq!(handler.error_count(), 1);
    }

    #[test]
    fn test_handler_warning_is_not_error() {
        let handler = Handler::new();
        handler.warning("unused variable", Span::point(1, 1));
        assert!(!handler.has_errors());
        assert_eq!(handler.warning_count(), 1);
    }

    #[test]
    fn test_handler_order_preserved() {
        let handler = Handler::new();
        handler.error("first", Span::point(1, 1));
        handler.warning("second", Span::point(2, 1));
        handler.error("third", Span::point(3, 1));

        let diags = handler.diagnostics();
        assert_eq!(diags.len(), 3);
        assert_eq!(diags[0].message, "first");
        assert_eq!(diags[2].message, "third");
    }

    #[test]
    fn test_handler_clear() {
        let handler = Handler::new();
        handler.error("oops", Span::point(1, 1));
        handler.clear();
        assert!(!handler.has_errors());
    }

    #[test]
    fn test_render_diagnostic_with_snippet() {
        let source = "let x = 1;\nlet y = @;\n";
        let diag = Diagnostic::error("unexpected character '@'", Span::new(19, 20, 2, 9));
        let rendered = render_diagnostic(&diag, source);
        assert_eq!(
            rendered,
            "Error at 2:9: unexpected character '@'\n    let y = @;\n            ^"
        );
    }

    #[test]
    fn test_render_diagnostic_without_position() {
        let diag = Diagnostic::error("missing main", Span::DUMMY);
        assert_eq!(render_diagnostic(&diag, ""), "Error: missing main");
    }

    #[test]
    fn test_render_summary() {
        let handler = Handler::new();
        handler.error("a", Span::point(1, 1));
        handler.error("b", Span::point(2, 1));
        handler.warning("c", Span::point(3, 1));
        assert_eq!(render_summary(&handler), "2 errors, 1 warning");
    }

    #[test]
    fn test_render_summary_singular() {
        let handler = Handler::new();
        handler.error("a", Span::point(1, 1));
        assert_eq!(render_summary(&handler), "1 error, 0 warnings");
    }
}
