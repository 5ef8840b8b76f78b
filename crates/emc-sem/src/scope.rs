//! Symbol table and scope stack.
//!
//! Scopes nest lexically and live on a stack: entering a function or block
//! pushes, leaving pops, and popping destroys the scope together with its
//! symbols. Definition is local to the innermost scope; lookup walks
//! outward. Shadowing across scope boundaries is allowed, redefinition
//! within one scope is not.

use emc_util::FxHashMap;

use crate::types::Ty;

/// A named entity: variable, constant, or function.
#[derive(Clone, Debug, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub ty: Ty,
    pub is_const: bool,
    pub is_function: bool,
    /// Declaration site (0:0 for pre-registered built-ins)
    pub line: u32,
    pub column: u32,
}

/// One lexical scope's symbols.
#[derive(Debug, Default)]
struct Scope {
    symbols: FxHashMap<String, Symbol>,
}

/// Stack of nested scopes. The bottom scope is the global scope and is
/// never popped.
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    /// Creates a stack holding only the global scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    /// Pushes a fresh innermost scope.
    pub fn enter_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Pops the innermost scope, destroying its symbols. The global scope
    /// stays.
    pub fn exit_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Defines a symbol in the innermost scope.
    ///
    /// Returns false when the name is already taken in that scope; the
    /// existing symbol is left untouched.
    pub fn define(&mut self, symbol: Symbol) -> bool {
        let scope = self.scopes.last_mut().expect("scope stack is never empty");
        if scope.symbols.contains_key(&symbol.name) {
            return false;
        }
        scope.symbols.insert(symbol.name.clone(), symbol);
        true
    }

    /// Resolves a name by walking from the innermost scope outward.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.symbols.get(name))
    }

    /// Checks only the innermost scope.
    pub fn in_current_scope(&self, name: &str) -> bool {
        self.scopes
            .last()
            .map(|scope| scope.symbols.contains_key(name))
            .unwrap_or(false)
    }

    /// Current nesting depth (1 = global only).
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}
