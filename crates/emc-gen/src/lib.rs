//! emc-gen - LLVM IR code generation for EMLang.
//!
//! Lowers an analyzed (error-free) program to a verified LLVM module via
//! `inkwell`. The generator is one recursive set of methods over the AST
//! enums, split across the `decl`, `stmt`, and `expr` modules, all sharing
//! a [`CodeGenerator`] that owns the module, the builder, and the value
//! map.
//!
//! Invariants the emission maintains:
//! - every alloca sits in its function's entry block, so mem2reg can
//!   promote them;
//! - basic blocks are created in visit order, so the IR is deterministic
//!   for a given source;
//! - every function is verified after emission and the whole module before
//!   handoff - a verification failure is a fatal internal error, never a
//!   recoverable diagnostic.

mod decl;
pub mod error;
mod expr;
mod stmt;
mod types;
mod value_map;

pub use error::{CodeGenError, Result};

use std::path::Path;

use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::targets::{
    CodeModel, FileType, InitializationConfig, RelocMode, Target, TargetMachine,
};
use inkwell::values::{BasicValueEnum, FunctionValue, PointerValue};
use inkwell::OptimizationLevel;

use emc_par::{Program, Stmt};
use emc_sem::Ty;
use emc_util::FxHashMap;

use crate::types::TypeLowering;
use crate::value_map::ValueMap;

/// Source-level signature of a generated or declared function, kept so
/// call sites can coerce arguments and type their results.
#[derive(Clone, Debug)]
pub(crate) struct FnSig {
    pub params: Vec<Ty>,
    pub return_type: Ty,
}

/// Code generator for one module.
pub struct CodeGenerator<'ctx> {
    pub(crate) context: &'ctx Context,
    pub(crate) module: Module<'ctx>,
    pub(crate) builder: Builder<'ctx>,
    pub(crate) types: TypeLowering<'ctx>,
    pub(crate) values: ValueMap<'ctx>,
    /// Call name -> source signature, for user functions, externs, and
    /// built-ins declared so far
    pub(crate) signatures: FxHashMap<String, FnSig>,
    pub(crate) current_function: Option<FunctionValue<'ctx>>,
    pub(crate) current_return: Ty,
    opt_level: OptimizationLevel,
}

impl<'ctx> CodeGenerator<'ctx> {
    /// Creates a generator whose module carries the host target triple and
    /// data layout. Target registry initialization is idempotent.
    pub fn new(context: &'ctx Context, module_name: &str, opt_level: OptimizationLevel) -> Self {
        Target::initialize_all(&InitializationConfig::default());

        let module = context.create_module(module_name);
        let triple = TargetMachine::get_default_triple();
        module.set_triple(&triple);

        if let Ok(target) = Target::from_triple(&triple) {
            if let Some(machine) = target.create_target_machine(
                &triple,
                "generic",
                "",
                opt_level,
                RelocMode::Default,
                CodeModel::Default,
            ) {
                module.set_data_layout(&machine.get_target_data().get_data_layout());
            }
        }

        Self {
            context,
            module,
            builder: context.create_builder(),
            types: TypeLowering::new(context),
            values: ValueMap::new(),
            signatures: FxHashMap::default(),
            current_function: None,
            current_return: Ty::Void,
            opt_level,
        }
    }

    /// Lowers a whole program and verifies the finished module.
    ///
    /// Top-level statements must be declarations; executable code lives in
    /// functions.
    pub fn generate(&mut self, program: &Program) -> Result<()> {
        for stmt in &program.statements {
            match stmt {
                Stmt::FnDecl(decl) => self.gen_function(decl)?,
                Stmt::ExternFnDecl(decl) => {
                    self.gen_extern_function(decl)?;
                },
                Stmt::VarDecl(decl) => self.gen_global_var(decl)?,
                other => {
                    return Err(CodeGenError::Unsupported(format!(
                        "top-level statement at line {} must be a declaration",
                        other.span().line
                    )))
                },
            }
        }

        self.verify_module()
    }

    /// Runs the module verifier; failure is fatal.
    pub fn verify_module(&self) -> Result<()> {
        self.module
            .verify()
            .map_err(|message| CodeGenError::VerificationFailed(message.to_string()))
    }

    /// Textual IR for `--emit-llvm` and tests.
    pub fn emit_ir(&self) -> String {
        self.module.print_to_string().to_string()
    }

    /// The underlying module (handed to the back-end after verification).
    pub fn module(&self) -> &Module<'ctx> {
        &self.module
    }

    /// Writes textual IR to a file.
    pub fn write_ir_file(&self, path: &Path) -> Result<()> {
        self.module
            .print_to_file(path)
            .map_err(|e| CodeGenError::CompilationError(e.to_string()))
    }

    /// Writes a native object file via the target machine.
    pub fn write_object_file(&self, path: &Path) -> Result<()> {
        let triple = self.module.get_triple();
        let target = Target::from_triple(&triple)
            .map_err(|e| CodeGenError::CompilationError(format!("failed to get target: {}", e)))?;

        let machine = target
            .create_target_machine(
                &triple,
                "generic",
                "",
                self.opt_level,
                RelocMode::Default,
                CodeModel::Default,
            )
            .ok_or_else(|| {
                CodeGenError::CompilationError("failed to create target machine".to_string())
            })?;

        machine
            .write_to_file(&self.module, FileType::Object, path)
            .map_err(|e| {
                CodeGenError::CompilationError(format!("failed to write object file: {}", e))
            })
    }

    // =========================================================================
    // Shared emission helpers
    // =========================================================================

    /// Builds an alloca in the current function's entry block, never in the
    /// middle of a body. Keeping every alloca in the entry block is what
    /// lets mem2reg promote them.
    pub(crate) fn create_entry_alloca(
        &self,
        ty: inkwell::types::BasicTypeEnum<'ctx>,
        name: &str,
    ) -> Result<PointerValue<'ctx>> {
        let function = self
            .current_function
            .ok_or_else(|| CodeGenError::Internal("alloca outside of a function".to_string()))?;
        let entry = function
            .get_first_basic_block()
            .ok_or_else(|| CodeGenError::Internal("function has no entry block".to_string()))?;

        let entry_builder = self.context.create_builder();
        match entry.get_first_instruction() {
            Some(first) => entry_builder.position_before(&first),
            None => entry_builder.position_at_end(entry),
        }
        Ok(entry_builder.build_alloca(ty, name)?)
    }

    /// True when the builder's current block already ends in a terminator;
    /// statements emitted after that point would be dead.
    pub(crate) fn current_block_terminated(&self) -> bool {
        self.builder
            .get_insert_block()
            .and_then(|block| block.get_terminator())
            .is_some()
    }

    /// Unwraps an expression result that must carry a value (void calls are
    /// the only valueless expressions, and the analyzer keeps them out of
    /// value positions).
    pub(crate) fn expect_value(
        pair: (Option<BasicValueEnum<'ctx>>, Ty),
    ) -> Result<(BasicValueEnum<'ctx>, Ty)> {
        match pair.0 {
            Some(value) => Ok((value, pair.1)),
            None => Err(CodeGenError::Internal(
                "void expression used as a value".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emc_par::parse_source;
    use emc_sem::Analyzer;
    use emc_util::Handler;

    /// Full front half of the pipeline plus codegen; returns the IR text.
    fn compile(source: &str) -> String {
        let handler = Handler::new();
        let program = parse_source(source, &handler);
        assert!(!handler.has_errors(), "parse: {:?}", handler.diagnostics());
        let mut analyzer = Analyzer::new(&handler);
        assert!(analyzer.analyze(&program), "sem: {:?}", handler.diagnostics());

        let context = Context::create();
        let mut gen = CodeGenerator::new(&context, "test", OptimizationLevel::None);
        gen.generate(&program).expect("codegen failed");
        gen.emit_ir()
    }

    #[test]
    fn test_empty_module() {
        let ir = compile("");
        assert!(ir.contains("test"));
    }

    #[test]
    fn test_arithmetic_function() {
        let ir = compile("function main(): int32 { return 1 + 2 * 3; }");
        assert!(ir.contains("define i32 @main"));
        // The builder constant-folds literal arithmetic, so the body is
        // either the folded constant or the raw add/mul pair
        assert!(ir.contains("ret i32 7") || (ir.contains("mul") && ir.contains("add")));
    }

    #[test]
    fn test_parameters_get_entry_allocas(){
        let ir = compile("function add(a: int32, b: int32): int32 { return a + b; }");
        assert!(ir.contains("define i32 @add(i32 %a, i32 %b)"));
        assert!(ir.contains("alloca i32"));
        assert!(ir.contains("store i32 %a"));
    }

    #[test]
    fn test_void_function_gets_implicit_return() {
        let ir = compile("function f() { let x: int32 = 1; }");
        assert!(ir.contains("define void @f"));
        assert!(ir.contains("ret void"));
    }

    #[test]
    fn test_while_loop_has_three_blocks() {
        let ir = compile(
            "function main(): int32 { let i: int32 = 0; while (i < 10) { i = i + 1; } return i; }",
        );
        assert!(ir.contains("while.cond"));
        assert!(ir.contains("while.body"));
        assert!(ir.contains("while.exit"));
    }

    #[test]
    fn test_for_lowered_as_while() {
        let ir = compile(
            "function main(): int32 { let s: int32 = 0; for (let i: int32 = 0; i < 4; i = i + 1) { s = s + i; } return s; }",
        );
        assert!(ir.contains("for.cond"));
        assert!(ir.contains("for.body"));
        assert!(ir.contains("for.exit"));
    }

    #[test]
    fn test_if_else_blocks() {
        let ir = compile(
            "function f(c: bool): int32 { if (c) { return 1; } else { return 2; } }",
        );
        assert!(ir.contains("then"));
        assert!(ir.contains("else"));
        assert!(ir.contains("br i1"));
    }

    #[test]
    fn test_numeric_condition_coerced_to_i1() {
        let ir = compile("function f(n: int32) { if (n) { } }");
        assert!(ir.contains("icmp ne i32"));
    }

    #[test]
    fn test_global_variable_private_linkage() {
        let ir = compile("let g: int32 = 7;\nfunction main(): int32 { return g; }");
        assert!(ir.contains("@g = private global i32 7"));
    }

    #[test]
    fn test_global_const_flag() {
        let ir = compile("const k: int32 = 3;\nfunction main(): int32 { return k; }");
        assert!(ir.contains("@k = private constant i32 3"));
    }

    #[test]
    fn test_extern_function_declaration() {
        let ir = compile(
            "extern function puts(s: str): int32;\nfunction main(): int32 { return puts(\"hi\"); }",
        );
        assert!(ir.contains("declare i32 @puts(ptr"));
    }

    #[test]
    fn test_builtin_declared_on_first_use() {
        let ir = compile("function main() { emlang_print_int(42); }");
        assert!(ir.contains("declare void @emlang_print_int(i32"));
    }

    #[test]
    fn test_builtin_alias_uses_link_name() {
        let ir = compile("function main() { emlang_print(\"hi\"); }");
        // The registry name is emlang_print, the link name differs
        assert!(ir.contains("@emlang_print_str"));
        assert!(!ir.contains("declare void @emlang_print("));
    }

    #[test]
    fn test_unused_builtins_not_declared() {
        let ir = compile("function main() { }");
        assert!(!ir.contains("emlang_malloc"));
    }

    #[test]
    fn test_string_literal_global() {
        let ir = compile("function main() { emlang_print_str(\"hello\"); }");
        assert!(ir.contains("hello"));
        assert!(ir.contains("ptr"));
    }

    #[test]
    fn test_pointer_round_trip() {
        let ir = compile(
            "function main(): int32 { let x: int32 = 5; let p: int32* = &x; *p = 7; return *p; }",
        );
        // Dereference loads use the pointee type recovered from the value
        // map, not from the opaque pointer
        assert!(ir.contains("load ptr"));
        assert!(ir.contains("load i32"));
    }

    #[test]
    fn test_short_circuit_and() {
        let ir = compile(
            "function f(a: bool, b: bool): bool { return a && b; }",
        );
        assert!(ir.contains("and.rhs"));
        assert!(ir.contains("phi i1"));
    }

    #[test]
    fn test_short_circuit_or() {
        let ir = compile("function f(a: bool, b: bool): bool { return a || b; }");
        assert!(ir.contains("or.rhs"));
        assert!(ir.contains("phi i1"));
    }

    #[test]
    fn test_cast_int_widening_is_sext() {
        let ir = compile("function f(x: int32): int64 { return x as int64; }");
        assert!(ir.contains("sext i32"));
    }

    #[test]
    fn test_cast_unsigned_widening_is_zext() {
        let ir = compile("function f(x: uint32): uint64 { return x as uint64; }");
        assert!(ir.contains("zext i32"));
    }

    #[test]
    fn test_cast_int_to_double() {
        let ir = compile("function f(x: int32): double { return x as double; }");
        assert!(ir.contains("sitofp i32"));
    }

    #[test]
    fn test_cast_double_to_int_narrowing() {
        let ir = compile("function f(x: double): int32 { return x as int32; }");
        assert!(ir.contains("fptosi double"));
    }

    #[test]
    fn test_unsigned_division() {
        let ir = compile("function f(a: uint32, b: uint32): uint32 { return a / b; }");
        assert!(ir.contains("udiv"));
    }

    #[test]
    fn test_signed_division() {
        let ir = compile("function f(a: int32, b: int32): int32 { return a / b; }");
        assert!(ir.contains("sdiv"));
    }

    #[test]
    fn test_unsigned_comparison_predicate() {
        let ir = compile("function f(a: uint32, b: uint32): bool { return a < b; }");
        assert!(ir.contains("icmp ult"));
    }

    #[test]
    fn test_float_comparison_ordered() {
        let ir = compile("function f(a: double, b: double): bool { return a < b; }");
        assert!(ir.contains("fcmp olt"));
    }

    #[test]
    fn test_array_literal_and_index() {
        let ir = compile(
            "function main(): int32 { let xs = [10, 20, 30]; return xs[1]; }",
        );
        assert!(ir.contains("alloca [3 x i64]"));
        assert!(ir.contains("getelementptr"));
    }

    #[test]
    fn test_widening_assignment() {
        let ir = compile("function f(a: int16): int64 { let x: int64 = a; return x; }");
        assert!(ir.contains("sext i16"));
    }

    #[test]
    fn test_division_by_zero_constant_not_folded() {
        let ir = compile("function f(): int32 { return 1 / 0; }");
        // Passes through to IR untouched
        assert!(ir.contains("div"));
    }

    #[test]
    fn test_deterministic_output() {
        let source =
            "function main(): int32 { let i: int32 = 0; while (i < 3) { i = i + 1; } return i; }";
        assert_eq!(compile(source), compile(source));
    }

    #[test]
    fn test_top_level_statement_rejected() {
        let handler = Handler::new();
        let program = parse_source("function f() {}\nemlang_println();", &handler);
        let mut analyzer = Analyzer::new(&handler);
        assert!(analyzer.analyze(&program));

        let context = Context::create();
        let mut gen = CodeGenerator::new(&context, "test", OptimizationLevel::None);
        assert!(gen.generate(&program).is_err());
    }

    #[test]
    fn test_argument_count_mismatch() {
        let handler = Handler::new();
        let program = parse_source("function main() { emlang_print_int(1, 2); }", &handler);
        let mut analyzer = Analyzer::new(&handler);
        assert!(analyzer.analyze(&program));

        let context = Context::create();
        let mut gen = CodeGenerator::new(&context, "test", OptimizationLevel::None);
        let err = gen.generate(&program).unwrap_err();
        assert!(err.to_string().contains("incorrect number of arguments"));
    }
}
