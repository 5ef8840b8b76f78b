//! Expression lowering.
//!
//! Every expression produces an `(IR value, source type)` pair; void calls
//! are the one exception and produce no value. Operand coercions follow
//! the implicit-conversion rules the analyzer already validated, so a
//! failed coercion here is an internal error, not a user diagnostic.
//!
//! Numeric literals are abstract (`number`) until context pins them down:
//! an integer literal is emitted at 32 bits when its value fits and 64
//! otherwise, and [`CodeGenerator::coerce`] moves it to whatever width the
//! surrounding declaration, call, or return demands.

use inkwell::values::{BasicMetadataValueEnum, BasicValueEnum, IntValue};
use inkwell::{FloatPredicate, IntPredicate};

use emc_par::{
    ArrayExpr, AssignExpr, BinOp, BinaryExpr, CallExpr, CastExpr, Expr, IndexExpr, LitKind,
    LiteralExpr, UnOp,
};
use emc_sem::Ty;

use crate::error::{CodeGenError, Result};
use crate::CodeGenerator;

/// Expression result: IR value (absent for void calls) plus source type.
pub(crate) type ExprValue<'ctx> = (Option<BasicValueEnum<'ctx>>, Ty);

impl<'ctx> CodeGenerator<'ctx> {
    pub(crate) fn gen_expr(&mut self, expr: &Expr) -> Result<ExprValue<'ctx>> {
        match expr {
            Expr::Literal(lit) => self.gen_literal(lit),
            Expr::Identifier(ident) => {
                let slot = self
                    .values
                    .get_variable(&ident.name)
                    .cloned()
                    .ok_or_else(|| CodeGenError::UndefinedSymbol(ident.name.clone()))?;
                // Arrays flow as their address; everything else loads
                if matches!(slot.ty, Ty::Array(..)) {
                    return Ok((Some(slot.ptr.into()), slot.ty));
                }
                let value =
                    self.builder
                        .build_load(self.types.basic(&slot.ty)?, slot.ptr, &ident.name)?;
                Ok((Some(value), slot.ty))
            },
            Expr::Binary(binary) => self.gen_binary(binary),
            Expr::Unary(unary) => {
                let (value, ty) = Self::expect_value(self.gen_expr(&unary.operand)?)?;
                let result: BasicValueEnum<'ctx> = match (unary.op, value) {
                    (UnOp::Neg, BasicValueEnum::IntValue(v)) => {
                        self.builder.build_int_neg(v, "negtmp")?.into()
                    },
                    (UnOp::Neg, BasicValueEnum::FloatValue(v)) => {
                        self.builder.build_float_neg(v, "fnegtmp")?.into()
                    },
                    (UnOp::Not, BasicValueEnum::IntValue(v)) => {
                        self.builder.build_not(v, "nottmp")?.into()
                    },
                    (UnOp::BitNot, BasicValueEnum::IntValue(v)) => {
                        self.builder.build_not(v, "invtmp")?.into()
                    },
                    _ => {
                        return Err(CodeGenError::Internal(format!(
                            "invalid operand for unary {}",
                            unary.op.symbol()
                        )))
                    },
                };
                let ty = if unary.op == UnOp::Not { Ty::Bool } else { ty };
                Ok((Some(result), ty))
            },
            Expr::Assign(assign) => self.gen_assign(assign),
            Expr::Call(call) => self.gen_call(call),
            Expr::Member(member) => Err(CodeGenError::Unsupported(format!(
                "member access is not supported (line {})",
                member.span.line
            ))),
            Expr::Index(index) => self.gen_index(index),
            Expr::Array(array) => self.gen_array(array),
            Expr::Object(object) => Err(CodeGenError::Unsupported(format!(
                "object literals are not supported (line {})",
                object.span.line
            ))),
            Expr::Cast(cast) => self.gen_cast(cast),
            Expr::Deref(deref) => {
                let (value, ty) = Self::expect_value(self.gen_expr(&deref.operand)?)?;
                let pointee = ty.pointee().cloned().ok_or_else(|| {
                    CodeGenError::Internal(format!("dereference of non-pointer type {}", ty))
                })?;
                let loaded = self.builder.build_load(
                    self.types.basic(&pointee)?,
                    value.into_pointer_value(),
                    "deref",
                )?;
                Ok((Some(loaded), pointee))
            },
            Expr::AddrOf(addr) => match addr.operand.as_ref() {
                Expr::Identifier(ident) => {
                    let slot = self
                        .values
                        .get_variable(&ident.name)
                        .cloned()
                        .ok_or_else(|| CodeGenError::UndefinedSymbol(ident.name.clone()))?;
                    Ok((Some(slot.ptr.into()), slot.ty.pointer_to()))
                },
                _ => Err(CodeGenError::Unsupported(
                    "address-of is only supported on variables".to_string(),
                )),
            },
        }
    }

    fn gen_literal(&mut self, lit: &LiteralExpr) -> Result<ExprValue<'ctx>> {
        let pair: ExprValue<'ctx> = match lit.kind {
            LitKind::Int => {
                let value: i64 = lit.value.parse().map_err(|_| {
                    CodeGenError::Internal(format!("unparsable integer literal: {}", lit.value))
                })?;
                let constant: BasicValueEnum<'ctx> =
                    if i32::try_from(value).is_ok() {
                        self.context.i32_type().const_int(value as u64, true).into()
                    } else {
                        self.context.i64_type().const_int(value as u64, true).into()
                    };
                (Some(constant), Ty::Number)
            },
            LitKind::Float => {
                let value: f64 = lit.value.parse().map_err(|_| {
                    CodeGenError::Internal(format!("unparsable float literal: {}", lit.value))
                })?;
                (Some(self.context.f64_type().const_float(value).into()), Ty::Number)
            },
            LitKind::Char => {
                let c = lit.value.chars().next().unwrap_or('\0');
                (
                    Some(self.context.i32_type().const_int(c as u64, false).into()),
                    Ty::Char,
                )
            },
            LitKind::Str => {
                let global = self.builder.build_global_string_ptr(&lit.value, "str")?;
                (Some(global.as_pointer_value().into()), Ty::Str)
            },
            LitKind::Bool => (
                Some(
                    self.context
                        .bool_type()
                        .const_int(u64::from(lit.value == "true"), false)
                        .into(),
                ),
                Ty::Bool,
            ),
            LitKind::Null => (
                Some(
                    self.context
                        .ptr_type(inkwell::AddressSpace::default())
                        .const_null()
                        .into(),
                ),
                Ty::Null,
            ),
        };
        Ok(pair)
    }

    // =========================================================================
    // Binary operations
    // =========================================================================

    fn gen_binary(&mut self, binary: &BinaryExpr) -> Result<ExprValue<'ctx>> {
        // Logical operators short-circuit; everything else evaluates both
        // sides up front
        if matches!(binary.op, BinOp::And | BinOp::Or) {
            return self.gen_logical(binary);
        }

        let (lhs, lhs_ty) = Self::expect_value(self.gen_expr(&binary.left)?)?;
        let (rhs, rhs_ty) = Self::expect_value(self.gen_expr(&binary.right)?)?;

        if matches!(binary.op, BinOp::Eq | BinOp::Ne)
            && !(lhs_ty.is_numeric() && rhs_ty.is_numeric())
        {
            return self.gen_non_numeric_equality(binary.op, lhs, &lhs_ty, rhs, &rhs_ty);
        }

        let common = Ty::common_type(&lhs_ty, &rhs_ty).ok_or_else(|| {
            CodeGenError::Internal(format!("no common type for {} and {}", lhs_ty, rhs_ty))
        })?;
        let (lhs, rhs, is_float, signed) = self.unify_numeric(lhs, &lhs_ty, rhs, &rhs_ty, &common)?;

        let comparison = |pred_s: IntPredicate, pred_u: IntPredicate, pred_f: FloatPredicate| {
            if is_float {
                Err(pred_f)
            } else if signed {
                Ok(pred_s)
            } else {
                Ok(pred_u)
            }
        };

        use BinOp::*;
        let value: BasicValueEnum<'ctx> = match binary.op {
            Add => {
                if is_float {
                    self.builder
                        .build_float_add(lhs.into_float_value(), rhs.into_float_value(), "addtmp")?
                        .into()
                } else {
                    self.builder
                        .build_int_add(lhs.into_int_value(), rhs.into_int_value(), "addtmp")?
                        .into()
                }
            },
            Sub => {
                if is_float {
                    self.builder
                        .build_float_sub(lhs.into_float_value(), rhs.into_float_value(), "subtmp")?
                        .into()
                } else {
                    self.builder
                        .build_int_sub(lhs.into_int_value(), rhs.into_int_value(), "subtmp")?
                        .into()
                }
            },
            Mul => {
                if is_float {
                    self.builder
                        .build_float_mul(lhs.into_float_value(), rhs.into_float_value(), "multmp")?
                        .into()
                } else {
                    self.builder
                        .build_int_mul(lhs.into_int_value(), rhs.into_int_value(), "multmp")?
                        .into()
                }
            },
            Div => {
                if is_float {
                    self.builder
                        .build_float_div(lhs.into_float_value(), rhs.into_float_value(), "divtmp")?
                        .into()
                } else if signed {
                    self.builder
                        .build_int_signed_div(lhs.into_int_value(), rhs.into_int_value(), "divtmp")?
                        .into()
                } else {
                    self.builder
                        .build_int_unsigned_div(
                            lhs.into_int_value(),
                            rhs.into_int_value(),
                            "divtmp",
                        )?
                        .into()
                }
            },
            Mod => {
                if is_float {
                    self.builder
                        .build_float_rem(lhs.into_float_value(), rhs.into_float_value(), "modtmp")?
                        .into()
                } else if signed {
                    self.builder
                        .build_int_signed_rem(lhs.into_int_value(), rhs.into_int_value(), "modtmp")?
                        .into()
                } else {
                    self.builder
                        .build_int_unsigned_rem(
                            lhs.into_int_value(),
                            rhs.into_int_value(),
                            "modtmp",
                        )?
                        .into()
                }
            },

            Lt => {
                return self.gen_comparison(
                    comparison(IntPredicate::SLT, IntPredicate::ULT, FloatPredicate::OLT),
                    lhs,
                    rhs,
                )
            },
            Le => {
                return self.gen_comparison(
                    comparison(IntPredicate::SLE, IntPredicate::ULE, FloatPredicate::OLE),
                    lhs,
                    rhs,
                )
            },
            Gt => {
                return self.gen_comparison(
                    comparison(IntPredicate::SGT, IntPredicate::UGT, FloatPredicate::OGT),
                    lhs,
                    rhs,
                )
            },
            Ge => {
                return self.gen_comparison(
                    comparison(IntPredicate::SGE, IntPredicate::UGE, FloatPredicate::OGE),
                    lhs,
                    rhs,
                )
            },
            Eq => {
                return self.gen_comparison(
                    comparison(IntPredicate::EQ, IntPredicate::EQ, FloatPredicate::OEQ),
                    lhs,
                    rhs,
                )
            },
            Ne => {
                return self.gen_comparison(
                    comparison(IntPredicate::NE, IntPredicate::NE, FloatPredicate::ONE),
                    lhs,
                    rhs,
                )
            },

            BitAnd => self
                .builder
                .build_and(lhs.into_int_value(), rhs.into_int_value(), "andtmp")?
                .into(),
            BitOr => self
                .builder
                .build_or(lhs.into_int_value(), rhs.into_int_value(), "ortmp")?
                .into(),
            BitXor => self
                .builder
                .build_xor(lhs.into_int_value(), rhs.into_int_value(), "xortmp")?
                .into(),
            Shl => self
                .builder
                .build_left_shift(lhs.into_int_value(), rhs.into_int_value(), "shltmp")?
                .into(),
            Shr => self
                .builder
                .build_right_shift(lhs.into_int_value(), rhs.into_int_value(), signed, "shrtmp")?
                .into(),

            And | Or => unreachable!("logical operators short-circuit above"),
        };

        Ok((Some(value), common))
    }

    fn gen_comparison(
        &mut self,
        predicate: std::result::Result<IntPredicate, FloatPredicate>,
        lhs: BasicValueEnum<'ctx>,
        rhs: BasicValueEnum<'ctx>,
    ) -> Result<ExprValue<'ctx>> {
        let value = match predicate {
            Ok(int_pred) => self.builder.build_int_compare(
                int_pred,
                lhs.into_int_value(),
                rhs.into_int_value(),
                "cmptmp",
            )?,
            Err(float_pred) => self.builder.build_float_compare(
                float_pred,
                lhs.into_float_value(),
                rhs.into_float_value(),
                "cmptmp",
            )?,
        };
        Ok((Some(value.into()), Ty::Bool))
    }

    /// Equality over bool, char, string, and pointer/null operands.
    /// Pointers compare by address after `ptrtoint`.
    fn gen_non_numeric_equality(
        &mut self,
        op: BinOp,
        lhs: BasicValueEnum<'ctx>,
        lhs_ty: &Ty,
        rhs: BasicValueEnum<'ctx>,
        rhs_ty: &Ty,
    ) -> Result<ExprValue<'ctx>> {
        // A single-character string literal may meet a char
        let (lhs, rhs) = if *lhs_ty == Ty::Char && *rhs_ty == Ty::Str {
            (lhs, self.coerce(rhs, rhs_ty, &Ty::Char)?)
        } else if *lhs_ty == Ty::Str && *rhs_ty == Ty::Char {
            (self.coerce(lhs, lhs_ty, &Ty::Char)?, rhs)
        } else {
            (lhs, rhs)
        };

        let predicate = if op == BinOp::Eq {
            IntPredicate::EQ
        } else {
            IntPredicate::NE
        };

        let value = match (lhs, rhs) {
            (BasicValueEnum::PointerValue(l), BasicValueEnum::PointerValue(r)) => {
                let l = self
                    .builder
                    .build_ptr_to_int(l, self.context.i64_type(), "ptraddr")?;
                let r = self
                    .builder
                    .build_ptr_to_int(r, self.context.i64_type(), "ptraddr")?;
                self.builder.build_int_compare(predicate, l, r, "cmptmp")?
            },
            (BasicValueEnum::IntValue(l), BasicValueEnum::IntValue(r)) => {
                self.builder.build_int_compare(predicate, l, r, "cmptmp")?
            },
            _ => {
                return Err(CodeGenError::Internal(format!(
                    "cannot compare {} and {}",
                    lhs_ty, rhs_ty
                )))
            },
        };
        Ok((Some(value.into()), Ty::Bool))
    }

    /// Short-circuit `&&`/`||` with basic blocks and a phi node.
    fn gen_logical(&mut self, binary: &BinaryExpr) -> Result<ExprValue<'ctx>> {
        let function = self.expect_function()?;
        let prefix = if binary.op == BinOp::And { "and" } else { "or" };

        let (lhs, lhs_ty) = Self::expect_value(self.gen_expr(&binary.left)?)?;
        let lhs_bool = self.to_bool(lhs, &lhs_ty)?;
        let lhs_block = self
            .builder
            .get_insert_block()
            .ok_or_else(|| CodeGenError::Internal("builder has no insert block".to_string()))?;

        let rhs_block = self
            .context
            .append_basic_block(function, &format!("{}.rhs", prefix));
        let merge_block = self
            .context
            .append_basic_block(function, &format!("{}.end", prefix));

        // && only evaluates the rhs when the lhs is true; || when false
        if binary.op == BinOp::And {
            self.builder
                .build_conditional_branch(lhs_bool, rhs_block, merge_block)?;
        } else {
            self.builder
                .build_conditional_branch(lhs_bool, merge_block, rhs_block)?;
        }

        self.builder.position_at_end(rhs_block);
        let (rhs, rhs_ty) = Self::expect_value(self.gen_expr(&binary.right)?)?;
        let rhs_bool = self.to_bool(rhs, &rhs_ty)?;
        let rhs_end = self
            .builder
            .get_insert_block()
            .ok_or_else(|| CodeGenError::Internal("builder has no insert block".to_string()))?;
        self.builder.build_unconditional_branch(merge_block)?;

        self.builder.position_at_end(merge_block);
        let phi = self
            .builder
            .build_phi(self.context.bool_type(), &format!("{}.result", prefix))?;
        let short_circuit = self
            .context
            .bool_type()
            .const_int(u64::from(binary.op == BinOp::Or), false);
        phi.add_incoming(&[(&short_circuit, lhs_block), (&rhs_bool, rhs_end)]);

        Ok((Some(phi.as_basic_value()), Ty::Bool))
    }

    // =========================================================================
    // Assignment, calls, indexing
    // =========================================================================

    fn gen_assign(&mut self, assign: &AssignExpr) -> Result<ExprValue<'ctx>> {
        // Resolve the target to an address; no load happens here
        let (target_ptr, target_ty) = match assign.target.as_ref() {
            Expr::Identifier(ident) => {
                let slot = self
                    .values
                    .get_variable(&ident.name)
                    .cloned()
                    .ok_or_else(|| CodeGenError::UndefinedSymbol(ident.name.clone()))?;
                (slot.ptr, slot.ty)
            },
            Expr::Deref(deref) => {
                let (value, ty) = Self::expect_value(self.gen_expr(&deref.operand)?)?;
                let pointee = ty.pointee().cloned().ok_or_else(|| {
                    CodeGenError::Internal(format!("assignment through non-pointer type {}", ty))
                })?;
                (value.into_pointer_value(), pointee)
            },
            other => {
                return Err(CodeGenError::Unsupported(format!(
                    "invalid assignment target (line {})",
                    other.span().line
                )))
            },
        };

        let (value, value_ty) = Self::expect_value(self.gen_expr(&assign.value)?)?;
        let coerced = self.coerce(value, &value_ty, &target_ty)?;
        self.builder.build_store(target_ptr, coerced)?;

        // The assignment's value is the stored value
        Ok((Some(coerced), target_ty))
    }

    /// Calls resolve against the module first (user functions and externs),
    /// then against the built-in registry, declaring the extern on first
    /// use. Arity is checked here against the recorded signature; arguments
    /// coerce to their parameter types.
    fn gen_call(&mut self, call: &CallExpr) -> Result<ExprValue<'ctx>> {
        let function = match self.module.get_function(&call.callee) {
            Some(function) => function,
            None => self
                .builtin_function(&call.callee)?
                .ok_or_else(|| CodeGenError::FunctionNotFound(call.callee.clone()))?,
        };

        let sig = self
            .signatures
            .get(&call.callee)
            .cloned()
            .ok_or_else(|| {
                CodeGenError::Internal(format!("no signature recorded for {}", call.callee))
            })?;

        if sig.params.len() != call.arguments.len() {
            return Err(CodeGenError::ArgumentCountMismatch {
                name: call.callee.clone(),
                expected: sig.params.len(),
                got: call.arguments.len(),
            });
        }

        let mut args: Vec<BasicMetadataValueEnum<'ctx>> = Vec::with_capacity(call.arguments.len());
        for (arg, param_ty) in call.arguments.iter().zip(&sig.params) {
            let (value, value_ty) = Self::expect_value(self.gen_expr(arg)?)?;
            let coerced = self.coerce(value, &value_ty, param_ty)?;
            args.push(coerced.into());
        }

        let name = if sig.return_type.is_unit() { "" } else { "calltmp" };
        let call_site = self.builder.build_call(function, &args, name)?;

        if sig.return_type.is_unit() {
            Ok((None, Ty::Void))
        } else {
            Ok((
                Some(call_site.try_as_basic_value().unwrap_basic()),
                sig.return_type,
            ))
        }
    }

    /// Array indexing GEPs `[0, i]` over the array type; pointer indexing
    /// GEPs `[i]` over the pointee. Element types come from the source type,
    /// never from the opaque pointer.
    fn gen_index(&mut self, index: &IndexExpr) -> Result<ExprValue<'ctx>> {
        let (object, object_ty) = Self::expect_value(self.gen_expr(&index.object)?)?;
        let (idx, _) = Self::expect_value(self.gen_expr(&index.index)?)?;
        let idx = idx.into_int_value();

        match object_ty {
            Ty::Array(element, len) => {
                let array_ty = self.types.basic(&Ty::Array(element.clone(), len))?;
                let zero = self.context.i32_type().const_zero();
                let slot = unsafe {
                    self.builder.build_in_bounds_gep(
                        array_ty,
                        object.into_pointer_value(),
                        &[zero, idx],
                        "arrayidx",
                    )?
                };
                let value = self
                    .builder
                    .build_load(self.types.basic(&element)?, slot, "arrayload")?;
                Ok((Some(value), *element))
            },
            Ty::Ptr(pointee) => {
                let element_ty = self.types.basic(&pointee)?;
                let slot = unsafe {
                    self.builder.build_in_bounds_gep(
                        element_ty,
                        object.into_pointer_value(),
                        &[idx],
                        "ptridx",
                    )?
                };
                let value = self.builder.build_load(element_ty, slot, "ptrload")?;
                Ok((Some(value), *pointee))
            },
            other => Err(CodeGenError::Internal(format!("cannot index into {}", other))),
        }
    }

    /// Array literal: entry-block alloca of `[N x T]`, element stores, and
    /// the alloca pointer as the result.
    fn gen_array(&mut self, array: &ArrayExpr) -> Result<ExprValue<'ctx>> {
        if array.elements.is_empty() {
            return Err(CodeGenError::Unsupported(
                "empty array literals are not supported".to_string(),
            ));
        }

        let mut values = Vec::with_capacity(array.elements.len());
        let mut element_ty = None;
        for element in &array.elements {
            let (value, ty) = Self::expect_value(self.gen_expr(element)?)?;
            if element_ty.is_none() {
                element_ty = Some(ty);
            }
            values.push(value);
        }
        let element_ty = element_ty.expect("non-empty by check above");

        // Abstract number elements commit to a concrete width here so the
        // stored slots and later index loads agree
        let element_ty = if element_ty == Ty::Number {
            if values[0].is_float_value() {
                Ty::Double
            } else {
                Ty::Int(emc_sem::IntWidth::W64)
            }
        } else {
            element_ty
        };

        let element_llvm = self.types.basic(&element_ty)?;
        let array_llvm = match element_llvm {
            inkwell::types::BasicTypeEnum::IntType(t) => t.array_type(values.len() as u32),
            inkwell::types::BasicTypeEnum::FloatType(t) => t.array_type(values.len() as u32),
            inkwell::types::BasicTypeEnum::PointerType(t) => t.array_type(values.len() as u32),
            other => {
                return Err(CodeGenError::Unsupported(format!(
                    "array of {:?} elements",
                    other
                )))
            },
        };

        let alloca = self.create_entry_alloca(array_llvm.into(), "arraytmp")?;

        for (i, value) in values.into_iter().enumerate() {
            // Abstract number literals may differ in width; settle on the
            // first element's width
            let value = match (value, element_llvm) {
                (BasicValueEnum::IntValue(v), inkwell::types::BasicTypeEnum::IntType(t))
                    if v.get_type().get_bit_width() != t.get_bit_width() =>
                {
                    if v.get_type().get_bit_width() < t.get_bit_width() {
                        self.builder.build_int_s_extend(v, t, "sext")?.into()
                    } else {
                        self.builder.build_int_truncate(v, t, "trunc")?.into()
                    }
                },
                (value, _) => value,
            };

            let zero = self.context.i32_type().const_zero();
            let index = self.context.i32_type().const_int(i as u64, false);
            let slot = unsafe {
                self.builder
                    .build_in_bounds_gep(array_llvm, alloca, &[zero, index], "arrayelem")?
            };
            self.builder.build_store(slot, value)?;
        }

        let len = array.elements.len();
        Ok((Some(alloca.into()), Ty::Array(Box::new(element_ty), len)))
    }

    // =========================================================================
    // Casts and coercions
    // =========================================================================

    /// Explicit cast dispatch on (source kind, target kind).
    fn gen_cast(&mut self, cast: &CastExpr) -> Result<ExprValue<'ctx>> {
        let (value, from) = Self::expect_value(self.gen_expr(&cast.operand)?)?;
        let to = Ty::parse(&cast.target_type)
            .ok_or_else(|| CodeGenError::UnknownType(cast.target_type.clone()))?;
        let result = self.gen_cast_value(value, &from, &to)?;
        Ok((Some(result), to))
    }

    fn gen_cast_value(
        &mut self,
        value: BasicValueEnum<'ctx>,
        from: &Ty,
        to: &Ty,
    ) -> Result<BasicValueEnum<'ctx>> {
        if from == to {
            return Ok(value);
        }

        // `char` casts like an unsigned 32-bit scalar
        let src_signed = from.is_signed_integer();

        let result: BasicValueEnum<'ctx> = match (value, self.types.basic(to)?) {
            (BasicValueEnum::IntValue(v), inkwell::types::BasicTypeEnum::IntType(t)) => {
                let src_bits = v.get_type().get_bit_width();
                let dst_bits = t.get_bit_width();
                if src_bits < dst_bits {
                    if src_signed {
                        self.builder.build_int_s_extend(v, t, "sext")?.into()
                    } else {
                        self.builder.build_int_z_extend(v, t, "zext")?.into()
                    }
                } else if src_bits > dst_bits {
                    self.builder.build_int_truncate(v, t, "trunc")?.into()
                } else {
                    v.into()
                }
            },
            (BasicValueEnum::IntValue(v), inkwell::types::BasicTypeEnum::FloatType(t)) => {
                if src_signed {
                    self.builder.build_signed_int_to_float(v, t, "sitofp")?.into()
                } else {
                    self.builder
                        .build_unsigned_int_to_float(v, t, "uitofp")?
                        .into()
                }
            },
            (BasicValueEnum::FloatValue(v), inkwell::types::BasicTypeEnum::IntType(t)) => {
                if to.is_signed_integer() {
                    self.builder.build_float_to_signed_int(v, t, "fptosi")?.into()
                } else {
                    self.builder
                        .build_float_to_unsigned_int(v, t, "fptoui")?
                        .into()
                }
            },
            (BasicValueEnum::FloatValue(v), inkwell::types::BasicTypeEnum::FloatType(t)) => {
                let src_bits = if v.get_type() == self.context.f64_type() { 64 } else { 32 };
                let dst_bits = if t == self.context.f64_type() { 64 } else { 32 };
                if src_bits < dst_bits {
                    self.builder.build_float_ext(v, t, "fpext")?.into()
                } else if src_bits > dst_bits {
                    self.builder.build_float_trunc(v, t, "fptrunc")?.into()
                } else {
                    v.into()
                }
            },
            (BasicValueEnum::PointerValue(v), inkwell::types::BasicTypeEnum::PointerType(_)) => {
                // Opaque pointers: a pointer cast is a no-op
                v.into()
            },
            (BasicValueEnum::IntValue(v), inkwell::types::BasicTypeEnum::PointerType(t)) => {
                self.builder.build_int_to_ptr(v, t, "inttoptr")?.into()
            },
            (BasicValueEnum::PointerValue(v), inkwell::types::BasicTypeEnum::IntType(t)) => {
                self.builder.build_ptr_to_int(v, t, "ptrtoint")?.into()
            },
            _ => {
                return Err(CodeGenError::Internal(format!(
                    "unsupported cast from {} to {}",
                    from, to
                )))
            },
        };
        Ok(result)
    }

    /// Implicit coercion along the rules the analyzer validated: identity,
    /// abstract `number` to any concrete numeric, in-family integer
    /// widening, float-to-double, null-to-pointer, and the string-to-char
    /// literal pair.
    pub(crate) fn coerce(
        &mut self,
        value: BasicValueEnum<'ctx>,
        from: &Ty,
        to: &Ty,
    ) -> Result<BasicValueEnum<'ctx>> {
        if from == to || *to == Ty::Number {
            return Ok(value);
        }

        if *from == Ty::Number {
            let target = self.types.basic(to)?;
            let result: BasicValueEnum<'ctx> = match (value, target) {
                (BasicValueEnum::IntValue(v), inkwell::types::BasicTypeEnum::IntType(t)) => {
                    let src_bits = v.get_type().get_bit_width();
                    let dst_bits = t.get_bit_width();
                    if src_bits < dst_bits {
                        self.builder.build_int_s_extend(v, t, "sext")?.into()
                    } else if src_bits > dst_bits {
                        // A number literal adopting a narrower concrete
                        // type; range-checked during analysis
                        self.builder.build_int_truncate(v, t, "trunc")?.into()
                    } else {
                        v.into()
                    }
                },
                (BasicValueEnum::IntValue(v), inkwell::types::BasicTypeEnum::FloatType(t)) => {
                    self.builder.build_signed_int_to_float(v, t, "sitofp")?.into()
                },
                (BasicValueEnum::FloatValue(v), inkwell::types::BasicTypeEnum::FloatType(t)) => {
                    if t == self.context.f32_type() {
                        self.builder.build_float_trunc(v, t, "fptrunc")?.into()
                    } else {
                        v.into()
                    }
                },
                (BasicValueEnum::FloatValue(v), inkwell::types::BasicTypeEnum::IntType(t)) => {
                    self.builder.build_float_to_signed_int(v, t, "fptosi")?.into()
                },
                _ => {
                    return Err(CodeGenError::Internal(format!(
                        "cannot coerce number literal to {}",
                        to
                    )))
                },
            };
            return Ok(result);
        }

        let result: BasicValueEnum<'ctx> = match (from, to) {
            (Ty::Int(a), Ty::Int(b)) => {
                let target = self.types.int_type(*b);
                let v = value.into_int_value();
                if a.bits() < b.bits() {
                    self.builder.build_int_s_extend(v, target, "sext")?.into()
                } else if a.bits() > b.bits() {
                    self.builder.build_int_truncate(v, target, "trunc")?.into()
                } else {
                    value
                }
            },
            (Ty::UInt(a), Ty::UInt(b)) => {
                let target = self.types.int_type(*b);
                let v = value.into_int_value();
                if a.bits() < b.bits() {
                    self.builder.build_int_z_extend(v, target, "zext")?.into()
                } else if a.bits() > b.bits() {
                    self.builder.build_int_truncate(v, target, "trunc")?.into()
                } else {
                    value
                }
            },
            (Ty::Float, Ty::Double) => self
                .builder
                .build_float_ext(value.into_float_value(), self.context.f64_type(), "fpext")?
                .into(),
            (Ty::Double, Ty::Float) => self
                .builder
                .build_float_trunc(value.into_float_value(), self.context.f32_type(), "fptrunc")?
                .into(),
            (Ty::Null, Ty::Ptr(_)) | (Ty::Ptr(_), Ty::Null) | (Ty::Ptr(_), Ty::Ptr(_)) => value,
            (Ty::Str, Ty::Char) => {
                // Single-character string literal meeting a char: read its
                // first byte
                let byte = self.builder.build_load(
                    self.context.i8_type(),
                    value.into_pointer_value(),
                    "strchar",
                )?;
                self.builder
                    .build_int_z_extend(
                        byte.into_int_value(),
                        self.context.i32_type(),
                        "chr",
                    )?
                    .into()
            },
            _ => {
                return Err(CodeGenError::Internal(format!(
                    "cannot coerce {} to {}",
                    from, to
                )))
            },
        };
        Ok(result)
    }

    /// Truthiness coercion to `i1` for conditions: bool passes through,
    /// numerics compare against zero, pointers test non-null.
    pub(crate) fn to_bool(
        &mut self,
        value: BasicValueEnum<'ctx>,
        ty: &Ty,
    ) -> Result<IntValue<'ctx>> {
        match value {
            BasicValueEnum::IntValue(v) => {
                if ty.is_boolean() {
                    Ok(v)
                } else {
                    Ok(self.builder.build_int_compare(
                        IntPredicate::NE,
                        v,
                        v.get_type().const_zero(),
                        "tobool",
                    )?)
                }
            },
            BasicValueEnum::FloatValue(v) => Ok(self.builder.build_float_compare(
                FloatPredicate::ONE,
                v,
                v.get_type().const_zero(),
                "tobool",
            )?),
            BasicValueEnum::PointerValue(v) => Ok(self.builder.build_is_not_null(v, "tobool")?),
            _ => Err(CodeGenError::Internal(format!(
                "condition of type {} has no truth value",
                ty
            ))),
        }
    }

    /// Brings two numeric operands to their common representation.
    ///
    /// When both sides are abstract literals the common type stays
    /// `number`; the operands then meet at the wider of their emitted
    /// widths (or at f64 when a float literal is involved) so the operation
    /// is well-typed without committing to a declared type.
    fn unify_numeric(
        &mut self,
        lhs: BasicValueEnum<'ctx>,
        lhs_ty: &Ty,
        rhs: BasicValueEnum<'ctx>,
        rhs_ty: &Ty,
        common: &Ty,
    ) -> Result<(BasicValueEnum<'ctx>, BasicValueEnum<'ctx>, bool, bool)> {
        if *common == Ty::Number {
            return match (lhs, rhs) {
                (BasicValueEnum::IntValue(l), BasicValueEnum::IntValue(r)) => {
                    let (l, r) = if l.get_type().get_bit_width() < r.get_type().get_bit_width() {
                        (
                            self.builder.build_int_s_extend(l, r.get_type(), "sext")?,
                            r,
                        )
                    } else if l.get_type().get_bit_width() > r.get_type().get_bit_width() {
                        (
                            l,
                            self.builder.build_int_s_extend(r, l.get_type(), "sext")?,
                        )
                    } else {
                        (l, r)
                    };
                    Ok((l.into(), r.into(), false, true))
                },
                (BasicValueEnum::FloatValue(l), BasicValueEnum::FloatValue(r)) => {
                    Ok((l.into(), r.into(), true, true))
                },
                (BasicValueEnum::IntValue(l), BasicValueEnum::FloatValue(r)) => {
                    let l = self.builder.build_signed_int_to_float(
                        l,
                        self.context.f64_type(),
                        "sitofp",
                    )?;
                    Ok((l.into(), r.into(), true, true))
                },
                (BasicValueEnum::FloatValue(l), BasicValueEnum::IntValue(r)) => {
                    let r = self.builder.build_signed_int_to_float(
                        r,
                        self.context.f64_type(),
                        "sitofp",
                    )?;
                    Ok((l.into(), r.into(), true, true))
                },
                _ => Err(CodeGenError::Internal(
                    "non-numeric operands in numeric operation".to_string(),
                )),
            };
        }

        let l = self.coerce(lhs, lhs_ty, common)?;
        let r = self.coerce(rhs, rhs_ty, common)?;
        let is_float = common.is_floating_point();
        let signed = common.is_signed_integer();
        Ok((l, r, is_float, signed))
    }
}
