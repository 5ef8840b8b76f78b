//! Declaration lowering: functions, extern functions, global variables,
//! and on-demand built-in declarations.

use inkwell::module::Linkage;
use inkwell::values::{BasicValueEnum, FunctionValue};

use emc_par::{Expr, ExternFnDecl, FnDecl, LitKind, UnOp, VarDecl};
use emc_sem::{builtins, Ty};

use crate::error::{CodeGenError, Result};
use crate::{CodeGenerator, FnSig};

impl<'ctx> CodeGenerator<'ctx> {
    /// Lowers a function definition.
    ///
    /// Parameters get entry-block allocas with the incoming value stored,
    /// so every name uniformly denotes an address. A void function falling
    /// off the end gets an implicit `ret void`; a non-void one gets
    /// `unreachable`, which keeps the IR valid without inventing a value.
    /// The function verifier runs before returning - failure is fatal.
    pub(crate) fn gen_function(&mut self, decl: &FnDecl) -> Result<()> {
        let param_tys = self.parse_param_types(&decl.params)?;
        let return_ty = self.parse_return_type(decl.return_type.as_deref())?;

        let fn_type = self.types.fn_type(&return_ty, &param_tys)?;
        let function = self
            .module
            .add_function(&decl.name, fn_type, Some(Linkage::External));
        self.signatures.insert(
            decl.name.clone(),
            FnSig {
                params: param_tys.clone(),
                return_type: return_ty.clone(),
            },
        );

        for (arg, param) in function.get_param_iter().zip(&decl.params) {
            arg.set_name(&param.name);
        }

        let entry = self.context.append_basic_block(function, "entry");
        self.builder.position_at_end(entry);

        let saved_values = self.values.save_scope();
        let previous_function = self.current_function.replace(function);
        let previous_return = std::mem::replace(&mut self.current_return, return_ty.clone());

        for (arg, (param, ty)) in function
            .get_param_iter()
            .zip(decl.params.iter().zip(&param_tys))
        {
            let slot = self.create_entry_alloca(self.types.basic(ty)?, &param.name)?;
            self.builder.build_store(slot, arg)?;
            self.values.add_variable(&param.name, slot, ty.clone());
        }

        for stmt in &decl.body.statements {
            if self.current_block_terminated() {
                break;
            }
            self.gen_stmt(stmt)?;
        }

        if !self.current_block_terminated() {
            if return_ty.is_unit() {
                self.builder.build_return(None)?;
            } else {
                self.builder.build_unreachable()?;
            }
        }

        self.current_function = previous_function;
        self.current_return = previous_return;
        self.values.restore_scope(saved_values);

        if !function.verify(true) {
            return Err(CodeGenError::VerificationFailed(format!(
                "function {}",
                decl.name
            )));
        }

        Ok(())
    }

    /// Lowers an extern function declaration: signature only, no body.
    pub(crate) fn gen_extern_function(
        &mut self,
        decl: &ExternFnDecl,
    ) -> Result<FunctionValue<'ctx>> {
        let param_tys = self.parse_param_types(&decl.params)?;
        let return_ty = self.parse_return_type(decl.return_type.as_deref())?;

        let fn_type = self.types.fn_type(&return_ty, &param_tys)?;
        let function = self
            .module
            .add_function(&decl.name, fn_type, Some(Linkage::External));

        for (arg, param) in function.get_param_iter().zip(&decl.params) {
            arg.set_name(&param.name);
        }

        self.signatures.insert(
            decl.name.clone(),
            FnSig {
                params: param_tys,
                return_type: return_ty,
            },
        );

        Ok(function)
    }

    /// Resolves a call name against the built-in registry, declaring the
    /// extern on first use under its link name.
    pub(crate) fn builtin_function(&mut self, name: &str) -> Result<Option<FunctionValue<'ctx>>> {
        let registry = builtins();
        let Some(builtin) = registry.get(name) else {
            return Ok(None);
        };

        let params: Vec<Ty> = builtin.params.iter().map(|p| p.ty.clone()).collect();
        if !self.signatures.contains_key(name) {
            self.signatures.insert(
                name.to_string(),
                FnSig {
                    params: params.clone(),
                    return_type: builtin.return_type.clone(),
                },
            );
        }

        if let Some(function) = self.module.get_function(builtin.link_name) {
            return Ok(Some(function));
        }

        let fn_type = self.types.fn_type(&builtin.return_type, &params)?;
        let function =
            self.module
                .add_function(builtin.link_name, fn_type, Some(Linkage::External));
        Ok(Some(function))
    }

    /// Lowers a module-level variable.
    ///
    /// The initialiser must be a constant expression (a literal, possibly
    /// negated); the global gets private linkage and mirrors the `const`
    /// flag of the declaration. A missing initialiser becomes a zero/null
    /// default.
    pub(crate) fn gen_global_var(&mut self, decl: &VarDecl) -> Result<()> {
        let ty = self.global_type(decl)?;
        let lowered = self.types.basic(&ty)?;

        let init: BasicValueEnum<'ctx> = match &decl.initializer {
            Some(expr) => self.const_initializer(expr, &ty, &decl.name)?,
            None => self.types.zero_value(&ty)?,
        };

        let global = self.module.add_global(lowered, None, &decl.name);
        global.set_linkage(Linkage::Private);
        global.set_constant(decl.is_const);
        global.set_initializer(&init);

        self.values
            .add_variable(&decl.name, global.as_pointer_value(), ty);
        Ok(())
    }

    /// Declared type of a global, or the type inferred from its literal
    /// initialiser.
    fn global_type(&self, decl: &VarDecl) -> Result<Ty> {
        if let Some(name) = decl.ty.as_deref() {
            return Ty::parse(name).ok_or_else(|| CodeGenError::UnknownType(name.to_string()));
        }
        match decl.initializer.as_ref() {
            Some(Expr::Literal(lit)) => Ok(match lit.kind {
                LitKind::Int | LitKind::Float => Ty::Number,
                LitKind::Char => Ty::Char,
                LitKind::Str => Ty::Str,
                LitKind::Bool => Ty::Bool,
                LitKind::Null => Ty::Null,
            }),
            Some(Expr::Unary(unary)) if unary.op == UnOp::Neg => Ok(Ty::Number),
            _ => Err(CodeGenError::NonConstantInitializer(decl.name.clone())),
        }
    }

    /// Builds an LLVM constant from a literal (or negated literal)
    /// initialiser expression.
    fn const_initializer(
        &mut self,
        expr: &Expr,
        ty: &Ty,
        var_name: &str,
    ) -> Result<BasicValueEnum<'ctx>> {
        match expr {
            Expr::Literal(lit) => self.const_literal(&lit.value, lit.kind, ty, var_name),
            Expr::Unary(unary) if unary.op == UnOp::Neg => {
                if let Expr::Literal(lit) = unary.operand.as_ref() {
                    let negated = format!("-{}", lit.value);
                    self.const_literal(&negated, lit.kind, ty, var_name)
                } else {
                    Err(CodeGenError::NonConstantInitializer(var_name.to_string()))
                }
            },
            _ => Err(CodeGenError::NonConstantInitializer(var_name.to_string())),
        }
    }

    fn const_literal(
        &mut self,
        text: &str,
        kind: LitKind,
        ty: &Ty,
        var_name: &str,
    ) -> Result<BasicValueEnum<'ctx>> {
        let lowered = self.types.basic(ty)?;
        let value = match kind {
            LitKind::Int => {
                let value: i64 = text.parse().map_err(|_| {
                    CodeGenError::Internal(format!("unparsable integer literal: {}", text))
                })?;
                match lowered {
                    inkwell::types::BasicTypeEnum::IntType(int_ty) => {
                        int_ty.const_int(value as u64, true).into()
                    },
                    inkwell::types::BasicTypeEnum::FloatType(float_ty) => {
                        float_ty.const_float(value as f64).into()
                    },
                    _ => return Err(CodeGenError::NonConstantInitializer(var_name.to_string())),
                }
            },
            LitKind::Float => {
                let value: f64 = text.parse().map_err(|_| {
                    CodeGenError::Internal(format!("unparsable float literal: {}", text))
                })?;
                match lowered {
                    inkwell::types::BasicTypeEnum::FloatType(float_ty) => {
                        float_ty.const_float(value).into()
                    },
                    _ => return Err(CodeGenError::NonConstantInitializer(var_name.to_string())),
                }
            },
            LitKind::Bool => self
                .context
                .bool_type()
                .const_int(u64::from(text == "true"), false)
                .into(),
            LitKind::Char => {
                let c = text.chars().next().unwrap_or('\0');
                self.context.i32_type().const_int(c as u64, false).into()
            },
            LitKind::Str => self.module_string_constant(text).into(),
            LitKind::Null => self
                .context
                .ptr_type(inkwell::AddressSpace::default())
                .const_null()
                .into(),
        };
        Ok(value)
    }

    /// Creates a private NUL-terminated string constant and returns a
    /// pointer to its first byte. Used for global initialisers, where the
    /// builder has no insertion point.
    pub(crate) fn module_string_constant(
        &mut self,
        text: &str,
    ) -> inkwell::values::PointerValue<'ctx> {
        let string = self.context.const_string(text.as_bytes(), true);
        let global = self.module.add_global(string.get_type(), None, ".str");
        global.set_linkage(Linkage::Private);
        global.set_constant(true);
        global.set_initializer(&string);
        global.as_pointer_value()
    }

    fn parse_param_types(&self, params: &[emc_par::Param]) -> Result<Vec<Ty>> {
        params
            .iter()
            .map(|p| Ty::parse(&p.ty).ok_or_else(|| CodeGenError::UnknownType(p.ty.clone())))
            .collect()
    }

    fn parse_return_type(&self, name: Option<&str>) -> Result<Ty> {
        match name {
            Some(name) => {
                Ty::parse(name).ok_or_else(|| CodeGenError::UnknownType(name.to_string()))
            },
            None => Ok(Ty::Void),
        }
    }
}
