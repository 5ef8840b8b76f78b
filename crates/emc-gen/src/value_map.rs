//! Value map: names to IR addresses and source types.
//!
//! Two columns per variable: the IR address (an alloca for locals and
//! parameters, a global for module-level variables) and the source type.
//! The second column exists because opaque-pointer IR cannot answer "what
//! does this point to" - pointee types are recovered from here, never from
//! the IR.
//!
//! Scoping is save/restore around function bodies: the generator snapshots
//! the map before emitting a body and restores it afterwards, so locals
//! never leak across functions.

use inkwell::values::PointerValue;

use emc_sem::Ty;
use emc_util::FxHashMap;

/// One variable slot: address plus source type.
#[derive(Clone, Debug)]
pub struct VarSlot<'ctx> {
    pub ptr: PointerValue<'ctx>,
    pub ty: Ty,
}

/// Name-to-value mapping for the current emission context.
#[derive(Default)]
pub struct ValueMap<'ctx> {
    variables: FxHashMap<String, VarSlot<'ctx>>,
}

impl<'ctx> ValueMap<'ctx> {
    pub fn new() -> Self {
        Self {
            variables: FxHashMap::default(),
        }
    }

    /// Registers (or shadows) a variable.
    pub fn add_variable(&mut self, name: &str, ptr: PointerValue<'ctx>, ty: Ty) {
        self.variables.insert(name.to_string(), VarSlot { ptr, ty });
    }

    /// Looks up a variable's address and source type.
    pub fn get_variable(&self, name: &str) -> Option<&VarSlot<'ctx>> {
        self.variables.get(name)
    }

    /// Looks up only the source type.
    pub fn variable_type(&self, name: &str) -> Option<&Ty> {
        self.variables.get(name).map(|slot| &slot.ty)
    }

    /// Snapshot of the map, taken before entering a function body.
    pub fn save_scope(&self) -> FxHashMap<String, VarSlot<'ctx>> {
        self.variables.clone()
    }

    /// Restores a snapshot, dropping everything defined since.
    pub fn restore_scope(&mut self, saved: FxHashMap<String, VarSlot<'ctx>>) {
        self.variables = saved;
    }
}
