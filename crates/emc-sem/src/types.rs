//! The EMLang type system.
//!
//! Types form a small nominal vocabulary: sized signed and unsigned
//! integers, two float widths, `bool`, `char`, `str`, `void`, the pointer
//! constructor `T*`, and fixed-size arrays produced by array literals. Two
//! special members exist only inside the compiler: [`Ty::Number`], the type
//! of an unannotated numeric literal (implicitly convertible to every
//! concrete numeric type), and [`Ty::Error`], the recovery placeholder that
//! is compatible with nothing.
//!
//! All classification and conversion logic lives here, on the structured
//! form. The canonical string spelling is produced by `Display` and
//! consumed by [`Ty::parse`]; nothing else in the compiler manipulates type
//! strings.

use std::fmt;

/// Bit width of an integer type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
    /// Pointer-sized (`isize`/`usize`)
    Size,
}

impl IntWidth {
    /// Width in bits; pointer-sized counts as 64 on every supported target.
    pub fn bits(self) -> u32 {
        match self {
            IntWidth::W8 => 8,
            IntWidth::W16 => 16,
            IntWidth::W32 => 32,
            IntWidth::W64 => 64,
            IntWidth::Size => 64,
        }
    }

    /// Ordering rank for widening decisions within one family.
    fn rank(self) -> u32 {
        self.bits()
    }
}

/// A type in the EMLang type system
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ty {
    /// Recovery placeholder; compatible with nothing
    Error,
    /// Abstract type of an unannotated numeric literal
    Number,
    /// Signed integer of the given width
    Int(IntWidth),
    /// Unsigned integer of the given width
    UInt(IntWidth),
    /// 32-bit floating point (`float`)
    Float,
    /// 64-bit floating point (`double`)
    Double,
    Bool,
    Char,
    Str,
    Void,
    /// Type of the `null` literal; converts to any pointer type
    Null,
    /// Pointer to a pointee type
    Ptr(Box<Ty>),
    /// Fixed-size array, produced by array literals
    Array(Box<Ty>, usize),
}

impl Ty {
    /// Parse a canonical type string (optionally with `*` suffixes).
    ///
    /// Accepts the canonical vocabulary plus the legacy spellings the parser
    /// also canonicalises, so the two layers agree on what a name means.
    pub fn parse(name: &str) -> Option<Ty> {
        if let Some(base) = name.strip_suffix('*') {
            return Ty::parse(base).map(|t| Ty::Ptr(Box::new(t)));
        }

        let ty = match name {
            "int8" | "i8" => Ty::Int(IntWidth::W8),
            "int16" | "i16" => Ty::Int(IntWidth::W16),
            "int32" | "i32" | "int" => Ty::Int(IntWidth::W32),
            "int64" | "i64" => Ty::Int(IntWidth::W64),
            "isize" => Ty::Int(IntWidth::Size),
            "uint8" | "u8" => Ty::UInt(IntWidth::W8),
            "uint16" | "u16" => Ty::UInt(IntWidth::W16),
            "uint32" | "u32" => Ty::UInt(IntWidth::W32),
            "uint64" | "u64" => Ty::UInt(IntWidth::W64),
            "usize" => Ty::UInt(IntWidth::Size),
            "float" | "f32" => Ty::Float,
            "double" | "f64" => Ty::Double,
            "bool" | "boolean" => Ty::Bool,
            "char" => Ty::Char,
            "str" | "string" => Ty::Str,
            "void" | "unit" | "()" => Ty::Void,
            "null" => Ty::Null,
            "number" => Ty::Number,
            _ => return None,
        };
        Some(ty)
    }

    // =========================================================================
    // Classification predicates
    // =========================================================================

    pub fn is_signed_integer(&self) -> bool {
        matches!(self, Ty::Int(_) | Ty::Number)
    }

    pub fn is_unsigned_integer(&self) -> bool {
        matches!(self, Ty::UInt(_))
    }

    pub fn is_integer(&self) -> bool {
        self.is_signed_integer() || self.is_unsigned_integer()
    }

    pub fn is_floating_point(&self) -> bool {
        matches!(self, Ty::Float | Ty::Double)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_floating_point()
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Ty::Bool)
    }

    pub fn is_char(&self) -> bool {
        matches!(self, Ty::Char)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Ty::Str)
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Ty::Void)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Ty::Ptr(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Ty::Error)
    }

    /// Pointee of a pointer type
    pub fn pointee(&self) -> Option<&Ty> {
        match self {
            Ty::Ptr(inner) => Some(inner),
            _ => None,
        }
    }

    /// Pointer to this type
    pub fn pointer_to(&self) -> Ty {
        Ty::Ptr(Box::new(self.clone()))
    }

    /// Element type of an array
    pub fn element(&self) -> Option<&Ty> {
        match self {
            Ty::Array(inner, _) => Some(inner),
            _ => None,
        }
    }

    // =========================================================================
    // Conversions and compatibility
    // =========================================================================

    /// Implicit conversion: identity, `number` to any concrete numeric,
    /// widening within one integer family, `float` to `double`, and `null`
    /// to any pointer type.
    pub fn implicitly_converts_to(&self, to: &Ty) -> bool {
        if self == to {
            return true;
        }

        match (self, to) {
            (Ty::Number, t) if t.is_numeric() => true,
            (Ty::Int(from), Ty::Int(to)) => from.rank() < to.rank(),
            (Ty::UInt(from), Ty::UInt(to)) => from.rank() < to.rank(),
            (Ty::Float, Ty::Double) => true,
            (Ty::Null, Ty::Ptr(_)) => true,
            _ => false,
        }
    }

    /// Assignment compatibility: `expected` can absorb `actual`.
    ///
    /// Identity, implicit conversion, plus the literal-target pairs: a
    /// single-character string literal may initialise a `char`, and null and
    /// pointers compare both ways. Anything else needs an explicit cast.
    pub fn compatible(expected: &Ty, actual: &Ty) -> bool {
        if expected == actual {
            return true;
        }
        if actual.implicitly_converts_to(expected) {
            return true;
        }
        match (expected, actual) {
            (Ty::Char, Ty::Str) => true,
            (Ty::Null, Ty::Ptr(_)) => true,
            (Ty::Ptr(_), Ty::Null) => true,
            _ => false,
        }
    }

    /// Common type of two operands in a binary operation.
    ///
    /// Within one numeric family the larger width wins; the signed and
    /// unsigned families never mix implicitly (an abstract `number` operand
    /// adopts the other side's type). Pointer/null pairs yield the pointer.
    pub fn common_type(a: &Ty, b: &Ty) -> Option<Ty> {
        if a == b {
            return Some(a.clone());
        }
        if a.implicitly_converts_to(b) {
            return Some(b.clone());
        }
        if b.implicitly_converts_to(a) {
            return Some(a.clone());
        }

        match (a, b) {
            (Ty::Int(x), Ty::Int(y)) => {
                Some(Ty::Int(if x.rank() >= y.rank() { *x } else { *y }))
            },
            (Ty::UInt(x), Ty::UInt(y)) => {
                Some(Ty::UInt(if x.rank() >= y.rank() { *x } else { *y }))
            },
            (Ty::Float, Ty::Double) | (Ty::Double, Ty::Float) => Some(Ty::Double),
            (Ty::Ptr(_), Ty::Null) => Some(a.clone()),
            (Ty::Null, Ty::Ptr(_)) => Some(b.clone()),
            _ => None,
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Error => write!(f, "error"),
            Ty::Number => write!(f, "number"),
            Ty::Int(IntWidth::W8) => write!(f, "int8"),
            Ty::Int(IntWidth::W16) => write!(f, "int16"),
            Ty::Int(IntWidth::W32) => write!(f, "int32"),
            Ty::Int(IntWidth::W64) => write!(f, "int64"),
            Ty::Int(IntWidth::Size) => write!(f, "isize"),
            Ty::UInt(IntWidth::W8) => write!(f, "uint8"),
            Ty::UInt(IntWidth::W16) => write!(f, "uint16"),
            Ty::UInt(IntWidth::W32) => write!(f, "uint32"),
            Ty::UInt(IntWidth::W64) => write!(f, "uint64"),
            Ty::UInt(IntWidth::Size) => write!(f, "usize"),
            Ty::Float => write!(f, "float"),
            Ty::Double => write!(f, "double"),
            Ty::Bool => write!(f, "bool"),
            Ty::Char => write!(f, "char"),
            Ty::Str => write!(f, "str"),
            Ty::Void => write!(f, "void"),
            Ty::Null => write!(f, "null"),
            Ty::Ptr(inner) => write!(f, "{}*", inner),
            Ty::Array(inner, n) => write!(f, "{}[{}]", inner, n),
        }
    }
}
