//! Type lowering from EMLang types to LLVM types.
//!
//! Signedness is a property of operations, not of the lowered types, so
//! signed and unsigned integers of one width share an LLVM integer type.
//! Pointers are opaque; the pointee lives in the value map's source-type
//! column, never in the IR.
//!
//! Choices documented here because the source vocabulary leaves them open:
//! `char` lowers to a 32-bit integer (full Unicode scalar range, matching
//! the `\u{...}` escapes); `isize`/`usize` lower to 64-bit integers on every
//! supported target; the abstract `number` type lowers to a 64-bit integer
//! so unannotated variables never truncate their literal.

use inkwell::context::Context;
use inkwell::types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum, FunctionType};
use inkwell::values::BasicValueEnum;
use inkwell::AddressSpace;

use emc_sem::{IntWidth, Ty};

use crate::error::{CodeGenError, Result};

/// Maps EMLang types onto LLVM types for one context.
pub struct TypeLowering<'ctx> {
    context: &'ctx Context,
}

impl<'ctx> TypeLowering<'ctx> {
    pub fn new(context: &'ctx Context) -> Self {
        Self { context }
    }

    /// Lowers a type that can hold a value. `void` has no value
    /// representation and is rejected here; function returns handle it via
    /// [`fn_type`](Self::fn_type).
    pub fn basic(&self, ty: &Ty) -> Result<BasicTypeEnum<'ctx>> {
        let lowered = match ty {
            Ty::Int(width) | Ty::UInt(width) => self.int_type(*width).into(),
            Ty::Number => self.context.i64_type().into(),
            Ty::Float => self.context.f32_type().into(),
            Ty::Double => self.context.f64_type().into(),
            Ty::Bool => self.context.bool_type().into(),
            Ty::Char => self.context.i32_type().into(),
            Ty::Str | Ty::Null | Ty::Ptr(_) => {
                self.context.ptr_type(AddressSpace::default()).into()
            },
            Ty::Array(element, len) => {
                let element_ty = self.basic(element)?;
                element_ty.array_type(*len as u32).into()
            },
            Ty::Void | Ty::Error => return Err(CodeGenError::UnknownType(ty.to_string())),
        };
        Ok(lowered)
    }

    /// Integer type for a width.
    pub fn int_type(&self, width: IntWidth) -> inkwell::types::IntType<'ctx> {
        match width {
            IntWidth::W8 => self.context.i8_type(),
            IntWidth::W16 => self.context.i16_type(),
            IntWidth::W32 => self.context.i32_type(),
            IntWidth::W64 | IntWidth::Size => self.context.i64_type(),
        }
    }

    /// Builds a function type from source parameter and return types.
    pub fn fn_type(&self, return_ty: &Ty, params: &[Ty]) -> Result<FunctionType<'ctx>> {
        let mut param_types: Vec<BasicMetadataTypeEnum<'ctx>> = Vec::with_capacity(params.len());
        for param in params {
            param_types.push(self.basic(param)?.into());
        }

        let fn_type = if return_ty.is_unit() {
            self.context.void_type().fn_type(&param_types, false)
        } else {
            self.basic(return_ty)?.fn_type(&param_types, false)
        };
        Ok(fn_type)
    }

    /// Zero/null default value for a type, used when a declaration has no
    /// initialiser.
    pub fn zero_value(&self, ty: &Ty) -> Result<BasicValueEnum<'ctx>> {
        let value = match self.basic(ty)? {
            BasicTypeEnum::IntType(t) => t.const_zero().into(),
            BasicTypeEnum::FloatType(t) => t.const_zero().into(),
            BasicTypeEnum::PointerType(t) => t.const_null().into(),
            BasicTypeEnum::ArrayType(t) => t.const_zero().into(),
            other => {
                return Err(CodeGenError::Internal(format!(
                    "no zero value for {:?}",
                    other
                )))
            },
        };
        Ok(value)
    }
}
