//! AST pretty-printer.
//!
//! Produces a deterministic indented dump of a [`Program`]: same AST in,
//! byte-identical text out. Source tooling renders from this; tests use it
//! to check structural equality and run-to-run determinism.

use crate::ast::*;

/// Render a program as indented text, one node per line.
pub fn dump_program(program: &Program) -> String {
    let mut out = String::new();
    for stmt in &program.statements {
        dump_stmt(stmt, 0, &mut out);
    }
    out
}

fn indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn line(depth: usize, text: &str, out: &mut String) {
    indent(depth, out);
    out.push_str(text);
    out.push('\n');
}

fn dump_stmt(stmt: &Stmt, depth: usize, out: &mut String) {
    match stmt {
        Stmt::Block(b) => {
            line(depth, "Block", out);
            for s in &b.statements {
                dump_stmt(s, depth + 1, out);
            }
        },
        Stmt::If(i) => {
            line(depth, "If", out);
            dump_expr(&i.condition, depth + 1, out);
            line(depth + 1, "Then", out);
            dump_stmt(&i.then_branch, depth + 2, out);
            if let Some(else_branch) = &i.else_branch {
                line(depth + 1, "Else", out);
                dump_stmt(else_branch, depth + 2, out);
            }
        },
        Stmt::While(w) => {
            line(depth, "While", out);
            dump_expr(&w.condition, depth + 1, out);
            dump_stmt(&w.body, depth + 1, out);
        },
        Stmt::For(f) => {
            line(depth, "For", out);
            if let Some(init) = &f.init {
                line(depth + 1, "Init", out);
                dump_stmt(init, depth + 2, out);
            }
            if let Some(cond) = &f.condition {
                line(depth + 1, "Cond", out);
                dump_expr(cond, depth + 2, out);
            }
            if let Some(incr) = &f.increment {
                line(depth + 1, "Incr", out);
                dump_expr(incr, depth + 2, out);
            }
            dump_stmt(&f.body, depth + 1, out);
        },
        Stmt::Return(r) => {
            line(depth, "Return", out);
            if let Some(value) = &r.value {
                dump_expr(value, depth + 1, out);
            }
        },
        Stmt::Expr(e) => {
            line(depth, "ExprStmt", out);
            dump_expr(&e.expr, depth + 1, out);
        },
        Stmt::VarDecl(v) => {
            let keyword = if v.is_const { "Const" } else { "Let" };
            let ty = v.ty.as_deref().unwrap_or("<inferred>");
            line(depth, &format!("{} {}: {}", keyword, v.name, ty), out);
            if let Some(init) = &v.initializer {
                dump_expr(init, depth + 1, out);
            }
        },
        Stmt::FnDecl(f) => {
            let params: Vec<String> = f
                .params
                .iter()
                .map(|p| format!("{}: {}", p.name, p.ty))
                .collect();
            let ret = f.return_type.as_deref().unwrap_or("void");
            line(
                depth,
                &format!("Function {}({}): {}", f.name, params.join(", "), ret),
                out,
            );
            for s in &f.body.statements {
                dump_stmt(s, depth + 1, out);
            }
        },
        Stmt::ExternFnDecl(f) => {
            let params: Vec<String> = f
                .params
                .iter()
                .map(|p| format!("{}: {}", p.name, p.ty))
                .collect();
            let ret = f.return_type.as_deref().unwrap_or("void");
            line(
                depth,
                &format!("ExternFunction {}({}): {}", f.name, params.join(", "), ret),
                out,
            );
        },
    }
}

fn dump_expr(expr: &Expr, depth: usize, out: &mut String) {
    match expr {
        Expr::Literal(l) => {
            let kind = match l.kind {
                LitKind::Int => "Int",
                LitKind::Float => "Float",
                LitKind::Char => "Char",
                LitKind::Str => "Str",
                LitKind::Bool => "Bool",
                LitKind::Null => "Null",
            };
            line(depth, &format!("Literal {} {:?}", kind, l.value), out);
        },
        Expr::Identifier(i) => line(depth, &format!("Identifier {}", i.name), out),
        Expr::Binary(b) => {
            line(depth, &format!("Binary {}", b.op.symbol()), out);
            dump_expr(&b.left, depth + 1, out);
            dump_expr(&b.right, depth + 1, out);
        },
        Expr::Unary(u) => {
            line(depth, &format!("Unary {}", u.op.symbol()), out);
            dump_expr(&u.operand, depth + 1, out);
        },
        Expr::Assign(a) => {
            line(depth, "Assign", out);
            dump_expr(&a.target, depth + 1, out);
            dump_expr(&a.value, depth + 1, out);
        },
        Expr::Call(c) => {
            line(depth, &format!("Call {}", c.callee), out);
            for arg in &c.arguments {
                dump_expr(arg, depth + 1, out);
            }
        },
        Expr::Member(m) => {
            line(depth, &format!("Member .{}", m.member), out);
            dump_expr(&m.object, depth + 1, out);
        },
        Expr::Index(i) => {
            line(depth, "Index", out);
            dump_expr(&i.object, depth + 1, out);
            dump_expr(&i.index, depth + 1, out);
        },
        Expr::Array(a) => {
            line(depth, &format!("Array[{}]", a.elements.len()), out);
            for element in &a.elements {
                dump_expr(element, depth + 1, out);
            }
        },
        Expr::Object(o) => {
            line(depth, "Object", out);
            for (key, value) in &o.fields {
                line(depth + 1, &format!("Field {}", key), out);
                dump_expr(value, depth + 2, out);
            }
        },
        Expr::Cast(c) => {
            line(depth, &format!("Cast as {}", c.target_type), out);
            dump_expr(&c.operand, depth + 1, out);
        },
        Expr::Deref(d) => {
            line(depth, "Deref", out);
            dump_expr(&d.operand, depth + 1, out);
        },
        Expr::AddrOf(a) => {
            line(depth, "AddrOf", out);
            dump_expr(&a.operand, depth + 1, out);
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_source;
    use emc_util::Handler;

    fn dump(source: &str) -> String {
        let handler = Handler::new();
        let program = parse_source(source, &handler);
        assert!(!handler.has_errors());
        dump_program(&program)
    }

    #[test]
    fn test_dump_var_decl() {
        let text = dump("let x: int32 = 42;");
        assert_eq!(text, "Let x: int32\n  Literal Int \"42\"\n");
    }

    #[test]
    fn test_dump_function_shape() {
        let text = dump("function add(a: int32, b: int32): int32 { return a + b; }");
        assert!(text.starts_with("Function add(a: int32, b: int32): int32\n"));
        assert!(text.contains("  Return\n    Binary +\n"));
    }

    #[test]
    fn test_dump_deterministic() {
        let source = "function f() { let x = 1; if (x < 2) { x = x + 1; } }";
        assert_eq!(dump(source), dump(source));
    }

    #[test]
    fn test_dump_empty_program() {
        assert_eq!(dump(""), "");
    }
}
