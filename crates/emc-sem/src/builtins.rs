//! Built-in runtime function registry.
//!
//! The runtime library exposes a fixed catalogue of C-ABI functions. The
//! analyzer pre-registers every entry as a function symbol in the global
//! scope; the code generator emits a matching extern declaration the first
//! time one is called, using the entry's link name (which can differ from
//! the registry name, as with `emlang_print`).
//!
//! The registry is a pure function returning an immutable, insertion-ordered
//! table; there is no process-wide mutable state.

use indexmap::IndexMap;

use crate::types::{IntWidth, Ty};

/// Parameter of a built-in function
#[derive(Clone, Debug)]
pub struct BuiltinParam {
    pub name: &'static str,
    pub ty: Ty,
}

/// One entry in the runtime catalogue
#[derive(Clone, Debug)]
pub struct Builtin {
    /// Name visible to EMLang programs
    pub name: &'static str,
    pub params: Vec<BuiltinParam>,
    pub return_type: Ty,
    /// Symbol name resolved at link time
    pub link_name: &'static str,
}

fn param(name: &'static str, ty: Ty) -> BuiltinParam {
    BuiltinParam { name, ty }
}

fn i32_ty() -> Ty {
    Ty::Int(IntWidth::W32)
}

fn void_ptr() -> Ty {
    Ty::Ptr(Box::new(Ty::Void))
}

/// The runtime catalogue, in registration order.
pub fn builtins() -> IndexMap<&'static str, Builtin> {
    let mut table = IndexMap::new();

    let mut add = |name: &'static str,
                   params: Vec<BuiltinParam>,
                   return_type: Ty,
                   link_name: &'static str| {
        table.insert(
            name,
            Builtin {
                name,
                params,
                return_type,
                link_name,
            },
        );
    };

    // I/O
    add(
        "emlang_print",
        vec![param("s", Ty::Str)],
        Ty::Void,
        "emlang_print_str",
    );
    add(
        "emlang_print_int",
        vec![param("value", i32_ty())],
        Ty::Void,
        "emlang_print_int",
    );
    add(
        "emlang_print_str",
        vec![param("s", Ty::Str)],
        Ty::Void,
        "emlang_print_str",
    );
    add(
        "emlang_print_char",
        vec![param("c", Ty::Char)],
        Ty::Void,
        "emlang_print_char",
    );
    add(
        "emlang_print_float",
        vec![param("value", Ty::Float)],
        Ty::Void,
        "emlang_print_float",
    );
    add("emlang_println", vec![], Ty::Void, "emlang_println");

    // Input
    add("emlang_read_int", vec![], i32_ty(), "emlang_read_int");
    add("emlang_read_char", vec![], Ty::Char, "emlang_read_char");
    add("emlang_read_float", vec![], Ty::Float, "emlang_read_float");

    // Memory
    add(
        "emlang_malloc",
        vec![param("size", i32_ty())],
        void_ptr(),
        "emlang_malloc",
    );
    add(
        "emlang_free",
        vec![param("ptr", void_ptr())],
        Ty::Void,
        "emlang_free",
    );
    add(
        "emlang_memset",
        vec![
            param("ptr", void_ptr()),
            param("value", i32_ty()),
            param("size", i32_ty()),
        ],
        void_ptr(),
        "emlang_memset",
    );

    // Strings
    add(
        "emlang_strlen",
        vec![param("s", Ty::Str)],
        i32_ty(),
        "emlang_strlen",
    );
    add(
        "emlang_strcmp",
        vec![param("a", Ty::Str), param("b", Ty::Str)],
        i32_ty(),
        "emlang_strcmp",
    );

    // Math
    add(
        "emlang_pow",
        vec![param("base", i32_ty()), param("exp", i32_ty())],
        i32_ty(),
        "emlang_pow",
    );
    add(
        "emlang_sqrt",
        vec![param("x", i32_ty())],
        i32_ty(),
        "emlang_sqrt",
    );
    add(
        "emlang_sin",
        vec![param("x", Ty::Double)],
        Ty::Double,
        "emlang_sin",
    );
    add(
        "emlang_cos",
        vec![param("x", Ty::Double)],
        Ty::Double,
        "emlang_cos",
    );
    add(
        "emlang_abs",
        vec![param("x", i32_ty())],
        i32_ty(),
        "emlang_abs",
    );
    add(
        "emlang_min",
        vec![param("a", i32_ty()), param("b", i32_ty())],
        i32_ty(),
        "emlang_min",
    );
    add(
        "emlang_max",
        vec![param("a", i32_ty()), param("b", i32_ty())],
        i32_ty(),
        "emlang_max",
    );

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_is_deterministic() {
        let a: Vec<&str> = builtins().keys().copied().collect();
        let b: Vec<&str> = builtins().keys().copied().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_print_alias_link_name() {
        let table = builtins();
        let print = &table["emlang_print"];
        assert_eq!(print.link_name, "emlang_print_str");
        assert_eq!(print.return_type, Ty::Void);
    }

    #[test]
    fn test_known_entries() {
        let table = builtins();
        for name in [
            "emlang_print_int",
            "emlang_println",
            "emlang_read_int",
            "emlang_malloc",
            "emlang_free",
            "emlang_strlen",
            "emlang_strcmp",
            "emlang_pow",
            "emlang_sqrt",
            "emlang_sin",
            "emlang_cos",
            "emlang_abs",
            "emlang_min",
            "emlang_max",
        ] {
            assert!(table.contains_key(name), "missing builtin {}", name);
        }
    }

    #[test]
    fn test_malloc_signature() {
        let table = builtins();
        let malloc = &table["emlang_malloc"];
        assert_eq!(malloc.params.len(), 1);
        assert_eq!(malloc.return_type.to_string(), "void*");
    }
}
