//! The semantic analyzer.
//!
//! A single AST walk that resolves names, checks types, and validates
//! lvalue/constness rules and control-flow placement. The walk mutates only
//! the scope stack, the error handler, and the [`TypeTable`] side table;
//! the AST is read-only.
//!
//! Recovery: when a node cannot be given a valid type, it is annotated
//! [`Ty::Error`] and the walk continues. `Ty::Error` is compatible with
//! nothing, so one bad expression produces one diagnostic instead of a
//! cascade.

use emc_par::{
    BinOp, BlockStmt, Expr, ExternFnDecl, FnDecl, ForStmt, IfStmt, LitKind, NodeId, Program,
    ReturnStmt, Stmt, UnOp, VarDecl, WhileStmt,
};
use emc_util::{FxHashMap, Handler, Span};

use crate::builtins::builtins;
use crate::scope::{ScopeStack, Symbol};
use crate::types::Ty;

/// Side table of analysis results, keyed by expression node id.
#[derive(Debug, Default)]
pub struct TypeTable {
    types: FxHashMap<NodeId, Ty>,
}

impl TypeTable {
    /// Records the type of an expression node.
    fn record(&mut self, id: NodeId, ty: Ty) {
        self.types.insert(id, ty);
    }

    /// Looks up the annotated type of an expression node.
    pub fn get(&self, id: NodeId) -> Option<&Ty> {
        self.types.get(&id)
    }

    /// True when no annotated expression carries the error type.
    pub fn all_typed(&self) -> bool {
        self.types.values().all(|ty| !ty.is_error())
    }

    /// Number of annotated expressions.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Semantic analyzer over one program.
pub struct Analyzer<'a> {
    scopes: ScopeStack,
    handler: &'a Handler,
    types: TypeTable,
    /// Declared return type of the function being analyzed; None at top
    /// level.
    current_return: Option<Ty>,
    had_error: bool,
}

impl<'a> Analyzer<'a> {
    /// Creates an analyzer with built-ins pre-registered in the global
    /// scope.
    pub fn new(handler: &'a Handler) -> Self {
        let mut scopes = ScopeStack::new();
        for (name, builtin) in builtins() {
            scopes.define(Symbol {
                name: name.to_string(),
                ty: builtin.return_type.clone(),
                is_const: true,
                is_function: true,
                line: 0,
                column: 0,
            });
        }

        Self {
            scopes,
            handler,
            types: TypeTable::default(),
            current_return: None,
            had_error: false,
        }
    }

    /// Analyzes a program; true iff no semantic errors were recorded.
    pub fn analyze(&mut self, program: &Program) -> bool {
        for stmt in &program.statements {
            self.analyze_stmt(stmt);
        }
        !self.had_error
    }

    /// The analysis side table, for downstream consumers and tests.
    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    /// Consumes the analyzer, yielding the side table.
    pub fn into_types(self) -> TypeTable {
        self.types
    }

    fn error(&mut self, message: impl Into<String>, span: Span) {
        self.had_error = true;
        self.handler.error(message, span);
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn analyze_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(block) => self.analyze_block(block),
            Stmt::If(s) => self.analyze_if(s),
            Stmt::While(s) => self.analyze_while(s),
            Stmt::For(s) => self.analyze_for(s),
            Stmt::Return(s) => self.analyze_return(s),
            Stmt::Expr(s) => {
                self.analyze_expr(&s.expr);
            },
            Stmt::VarDecl(s) => self.analyze_var_decl(s),
            Stmt::FnDecl(s) => self.analyze_fn_decl(s),
            Stmt::ExternFnDecl(s) => self.analyze_extern_fn_decl(s),
        }
    }

    fn analyze_block(&mut self, block: &BlockStmt) {
        self.scopes.enter_scope();
        for stmt in &block.statements {
            self.analyze_stmt(stmt);
        }
        self.scopes.exit_scope();
    }

    fn analyze_if(&mut self, stmt: &IfStmt) {
        let cond_ty = self.analyze_expr(&stmt.condition);
        self.check_condition(&cond_ty, stmt.condition.span());

        self.scopes.enter_scope();
        self.analyze_stmt(&stmt.then_branch);
        self.scopes.exit_scope();

        if let Some(else_branch) = &stmt.else_branch {
            self.scopes.enter_scope();
            self.analyze_stmt(else_branch);
            self.scopes.exit_scope();
        }
    }

    fn analyze_while(&mut self, stmt: &WhileStmt) {
        let cond_ty = self.analyze_expr(&stmt.condition);
        self.check_condition(&cond_ty, stmt.condition.span());

        self.scopes.enter_scope();
        self.analyze_stmt(&stmt.body);
        self.scopes.exit_scope();
    }

    fn analyze_for(&mut self, stmt: &ForStmt) {
        // The head introduces its own scope so the induction variable dies
        // with the loop
        self.scopes.enter_scope();

        if let Some(init) = &stmt.init {
            self.analyze_stmt(init);
        }
        if let Some(cond) = &stmt.condition {
            let cond_ty = self.analyze_expr(cond);
            self.check_condition(&cond_ty, cond.span());
        }
        if let Some(incr) = &stmt.increment {
            self.analyze_expr(incr);
        }

        self.scopes.enter_scope();
        self.analyze_stmt(&stmt.body);
        self.scopes.exit_scope();

        self.scopes.exit_scope();
    }

    fn analyze_return(&mut self, stmt: &ReturnStmt) {
        let expected = match self.current_return.clone() {
            Some(ty) => ty,
            None => {
                self.error("return statement outside of function", stmt.span);
                if let Some(value) = &stmt.value {
                    self.analyze_expr(value);
                }
                return;
            },
        };

        match &stmt.value {
            Some(value) => {
                let value_ty = self.analyze_expr(value);
                if !value_ty.is_error()
                    && !expected.is_error()
                    && !Ty::compatible(&expected, &value_ty)
                {
                    self.error(
                        format!(
                            "return type mismatch: expected {}, got {}",
                            expected, value_ty
                        ),
                        value.span(),
                    );
                }
            },
            None => {
                if !expected.is_unit() {
                    self.error(
                        format!("function must return a value of type {}", expected),
                        stmt.span,
                    );
                }
            },
        }
    }

    fn analyze_var_decl(&mut self, decl: &VarDecl) {
        if self.scopes.in_current_scope(&decl.name) {
            self.error(
                format!("duplicate symbol in this scope: {}", decl.name),
                decl.span,
            );
            return;
        }

        let declared = decl.ty.as_deref().map(|name| match Ty::parse(name) {
            Some(ty) => ty,
            None => {
                self.error(format!("unknown type: {}", name), decl.span);
                Ty::Error
            },
        });

        let init_ty = decl.initializer.as_ref().map(|init| self.analyze_expr(init));

        if let (Some(declared), Some(init_ty)) = (&declared, &init_ty) {
            if !declared.is_error() && !init_ty.is_error() {
                if !Ty::compatible(declared, init_ty) {
                    self.error(
                        format!(
                            "type mismatch in variable declaration: expected {}, got {}",
                            declared, init_ty
                        ),
                        decl.span,
                    );
                } else {
                    self.check_literal_width(decl, declared);
                }
            }
        }

        let resolved = match (declared, init_ty) {
            (Some(ty), _) => ty,
            (None, Some(ty)) => ty,
            (None, None) => {
                self.error(
                    format!(
                        "variable '{}' needs a type annotation or an initializer",
                        decl.name
                    ),
                    decl.span,
                );
                Ty::Error
            },
        };

        self.scopes.define(Symbol {
            name: decl.name.clone(),
            ty: resolved,
            is_const: decl.is_const,
            is_function: false,
            line: decl.span.line,
            column: decl.span.column,
        });
    }

    /// An integer literal initializer must fit the declared type's width;
    /// overflow is an error, never a silent truncation.
    fn check_literal_width(&mut self, decl: &VarDecl, declared: &Ty) {
        let Some(Expr::Literal(lit)) = decl.initializer.as_ref() else {
            return;
        };
        if lit.kind != LitKind::Int {
            return;
        }
        let Ok(value) = lit.value.parse::<i64>() else {
            return; // already reported by literal analysis
        };
        if !int_literal_fits(value, declared) {
            self.error(
                format!("integer literal {} out of range for {}", value, declared),
                lit.span,
            );
        }
    }

    fn analyze_fn_decl(&mut self, decl: &FnDecl) {
        if self.scopes.in_current_scope(&decl.name) {
            self.error(format!("duplicate symbol: {}", decl.name), decl.span);
            return;
        }

        let return_ty = match decl.return_type.as_deref() {
            Some(name) => match Ty::parse(name) {
                Some(ty) => ty,
                None => {
                    self.error(format!("unknown type: {}", name), decl.span);
                    Ty::Error
                },
            },
            None => Ty::Void,
        };

        // The function symbol lives in the enclosing scope; recursion works
        // because it is defined before the body is analyzed
        self.scopes.define(Symbol {
            name: decl.name.clone(),
            ty: return_ty.clone(),
            is_const: false,
            is_function: true,
            line: decl.span.line,
            column: decl.span.column,
        });

        self.scopes.enter_scope();

        for param in &decl.params {
            let param_ty = match Ty::parse(&param.ty) {
                Some(ty) => ty,
                None => {
                    self.error(format!("unknown type: {}", param.ty), param.span);
                    Ty::Error
                },
            };
            let defined = self.scopes.define(Symbol {
                name: param.name.clone(),
                ty: param_ty,
                is_const: false,
                is_function: false,
                line: param.span.line,
                column: param.span.column,
            });
            if !defined {
                self.error(
                    format!("duplicate parameter name: {}", param.name),
                    param.span,
                );
            }
        }

        let previous_return = self.current_return.replace(return_ty);
        self.analyze_block(&decl.body);
        self.current_return = previous_return;

        self.scopes.exit_scope();
    }

    fn analyze_extern_fn_decl(&mut self, decl: &ExternFnDecl) {
        if self.scopes.in_current_scope(&decl.name) {
            self.error(format!("duplicate symbol: {}", decl.name), decl.span);
            return;
        }

        for param in &decl.params {
            if Ty::parse(&param.ty).is_none() {
                self.error(format!("unknown type: {}", param.ty), param.span);
            }
        }

        let return_ty = match decl.return_type.as_deref() {
            Some(name) => match Ty::parse(name) {
                Some(ty) => ty,
                None => {
                    self.error(format!("unknown type: {}", name), decl.span);
                    Ty::Error
                },
            },
            None => Ty::Void,
        };

        self.scopes.define(Symbol {
            name: decl.name.clone(),
            ty: return_ty,
            is_const: false,
            is_function: true,
            line: decl.span.line,
            column: decl.span.column,
        });
    }

    /// Conditions use C-style truthiness: bool, any numeric, or a pointer.
    fn check_condition(&mut self, ty: &Ty, span: Span) {
        if ty.is_error() {
            return;
        }
        if !(ty.is_boolean() || ty.is_numeric() || ty.is_pointer()) {
            self.error(
                format!("condition must be bool, numeric, or pointer, got {}", ty),
                span,
            );
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    /// Analyzes an expression, records its type in the side table, and
    /// returns it.
    fn analyze_expr(&mut self, expr: &Expr) -> Ty {
        let ty = self.expr_type(expr);
        self.types.record(expr.id(), ty.clone());
        ty
    }

    fn expr_type(&mut self, expr: &Expr) -> Ty {
        match expr {
            Expr::Literal(lit) => match lit.kind {
                LitKind::Int => {
                    if lit.value.parse::<i64>().is_err() {
                        self.error(
                            format!("integer literal out of range: {}", lit.value),
                            lit.span,
                        );
                        Ty::Error
                    } else {
                        Ty::Number
                    }
                },
                LitKind::Float => match lit.value.parse::<f64>() {
                    Ok(v) if v.is_finite() => Ty::Number,
                    _ => {
                        self.error(
                            format!("invalid floating point literal: {}", lit.value),
                            lit.span,
                        );
                        Ty::Error
                    },
                },
                LitKind::Char => Ty::Char,
                LitKind::Str => Ty::Str,
                LitKind::Bool => Ty::Bool,
                LitKind::Null => Ty::Null,
            },

            Expr::Identifier(ident) => match self.scopes.lookup(&ident.name) {
                Some(symbol) => symbol.ty.clone(),
                None => {
                    self.error(format!("undefined identifier: {}", ident.name), ident.span);
                    Ty::Error
                },
            },

            Expr::Binary(binary) => {
                let left = self.analyze_expr(&binary.left);
                let right = self.analyze_expr(&binary.right);
                self.binary_type(binary.op, &left, &right, binary.span)
            },

            Expr::Unary(unary) => {
                let operand = self.analyze_expr(&unary.operand);
                if operand.is_error() {
                    return Ty::Error;
                }
                match unary.op {
                    UnOp::Neg => {
                        if operand.is_numeric() {
                            operand
                        } else {
                            self.error(
                                format!("unary minus requires a numeric operand, got {}", operand),
                                unary.span,
                            );
                            Ty::Error
                        }
                    },
                    UnOp::Not => {
                        if operand.is_boolean() {
                            Ty::Bool
                        } else {
                            self.error(
                                format!("logical not requires a boolean operand, got {}", operand),
                                unary.span,
                            );
                            Ty::Error
                        }
                    },
                    UnOp::BitNot => {
                        if operand.is_integer() {
                            operand
                        } else {
                            self.error(
                                format!(
                                    "bitwise invert requires an integer operand, got {}",
                                    operand
                                ),
                                unary.span,
                            );
                            Ty::Error
                        }
                    },
                }
            },

            Expr::Assign(assign) => self.assign_type(assign),

            Expr::Call(call) => {
                let result = match self.scopes.lookup(&call.callee) {
                    Some(symbol) if symbol.is_function => symbol.ty.clone(),
                    Some(_) => {
                        self.error(format!("not a function: {}", call.callee), call.span);
                        Ty::Error
                    },
                    None => {
                        self.error(format!("undefined function: {}", call.callee), call.span);
                        Ty::Error
                    },
                };
                // Arity and argument types are checked at codegen against
                // the function's IR signature
                for arg in &call.arguments {
                    self.analyze_expr(arg);
                }
                result
            },

            Expr::Member(member) => {
                self.analyze_expr(&member.object);
                self.error(
                    "member access requires struct types, which are not supported",
                    member.span,
                );
                Ty::Error
            },

            Expr::Index(index) => {
                let object = self.analyze_expr(&index.object);
                let idx = self.analyze_expr(&index.index);
                if !idx.is_error() && !idx.is_integer() {
                    self.error(
                        format!("array index must be an integer, got {}", idx),
                        index.index.span(),
                    );
                }
                match object {
                    Ty::Array(element, _) => *element,
                    Ty::Ptr(pointee) => *pointee,
                    Ty::Error => Ty::Error,
                    other => {
                        self.error(format!("cannot index into {}", other), index.span);
                        Ty::Error
                    },
                }
            },

            Expr::Array(array) => {
                if array.elements.is_empty() {
                    self.error("empty array literals are not supported", array.span);
                    return Ty::Error;
                }
                let mut element_ty = self.analyze_expr(&array.elements[0]);
                for element in &array.elements[1..] {
                    let ty = self.analyze_expr(element);
                    if element_ty.is_error() || ty.is_error() {
                        element_ty = Ty::Error;
                        continue;
                    }
                    match Ty::common_type(&element_ty, &ty) {
                        Some(common) => element_ty = common,
                        None => {
                            self.error(
                                format!(
                                    "array elements have incompatible types: {} and {}",
                                    element_ty, ty
                                ),
                                element.span(),
                            );
                            element_ty = Ty::Error;
                        },
                    }
                }
                if element_ty.is_error() {
                    Ty::Error
                } else {
                    Ty::Array(Box::new(element_ty), array.elements.len())
                }
            },

            Expr::Object(object) => {
                for (_, value) in &object.fields {
                    self.analyze_expr(value);
                }
                self.error("object literals are not supported", object.span);
                Ty::Error
            },

            Expr::Cast(cast) => {
                let operand = self.analyze_expr(&cast.operand);
                let target = match Ty::parse(&cast.target_type) {
                    Some(ty) => ty,
                    None => {
                        self.error(
                            format!("unknown type in cast: {}", cast.target_type),
                            cast.span,
                        );
                        return Ty::Error;
                    },
                };
                if operand.is_error() {
                    return Ty::Error;
                }
                let castable = |ty: &Ty| ty.is_numeric() || ty.is_char();
                let allowed = (castable(&operand) && castable(&target))
                    || (operand.is_pointer() && target.is_pointer())
                    || (operand.is_integer() && target.is_pointer())
                    || (operand.is_pointer() && target.is_integer());
                if !allowed {
                    self.error(
                        format!("invalid cast from {} to {}", operand, target),
                        cast.span,
                    );
                    return Ty::Error;
                }
                target
            },

            Expr::Deref(deref) => {
                let operand = self.analyze_expr(&deref.operand);
                match operand {
                    Ty::Ptr(pointee) => *pointee,
                    Ty::Error => Ty::Error,
                    other => {
                        self.error(
                            format!("cannot dereference non-pointer type: {}", other),
                            deref.span,
                        );
                        Ty::Error
                    },
                }
            },

            Expr::AddrOf(addr) => match addr.operand.as_ref() {
                Expr::Identifier(ident) => {
                    let ty = match self.scopes.lookup(&ident.name) {
                        Some(symbol) if symbol.is_function => {
                            self.error(
                                format!("cannot take the address of a function: {}", ident.name),
                                addr.span,
                            );
                            Ty::Error
                        },
                        Some(symbol) => symbol.ty.pointer_to(),
                        None => {
                            self.error(
                                format!("undefined identifier: {}", ident.name),
                                ident.span,
                            );
                            Ty::Error
                        },
                    };
                    // Annotate the inner identifier as well
                    let inner = match &ty {
                        Ty::Ptr(pointee) => (**pointee).clone(),
                        _ => Ty::Error,
                    };
                    self.types.record(ident.id, inner);
                    ty
                },
                other => {
                    self.analyze_expr(other);
                    self.error("address-of requires an lvalue", addr.span);
                    Ty::Error
                },
            },
        }
    }

    fn binary_type(&mut self, op: BinOp, left: &Ty, right: &Ty, span: Span) -> Ty {
        if left.is_error() || right.is_error() {
            return Ty::Error;
        }

        match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
                if !left.is_numeric() || !right.is_numeric() {
                    self.error(
                        format!(
                            "arithmetic operations require numeric types, got {} and {}",
                            left, right
                        ),
                        span,
                    );
                    return Ty::Error;
                }
                match Ty::common_type(left, right) {
                    Some(common) => common,
                    None => {
                        self.error(
                            format!(
                                "operands of '{}' have no common type: {} and {}",
                                op.symbol(),
                                left,
                                right
                            ),
                            span,
                        );
                        Ty::Error
                    },
                }
            },

            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                if left.is_numeric() && right.is_numeric() {
                    if Ty::common_type(left, right).is_none() {
                        self.error(
                            format!(
                                "operands of '{}' have no common type: {} and {}",
                                op.symbol(),
                                left,
                                right
                            ),
                            span,
                        );
                        return Ty::Error;
                    }
                    Ty::Bool
                } else {
                    self.error(
                        format!(
                            "comparison operations require numeric types, got {} and {}",
                            left, right
                        ),
                        span,
                    );
                    Ty::Error
                }
            },

            BinOp::Eq | BinOp::Ne => {
                if Ty::compatible(left, right) || Ty::compatible(right, left) {
                    Ty::Bool
                } else {
                    self.error(
                        format!(
                            "equality operations require compatible types, got {} and {}",
                            left, right
                        ),
                        span,
                    );
                    Ty::Error
                }
            },

            BinOp::And | BinOp::Or => {
                if left.is_boolean() && right.is_boolean() {
                    Ty::Bool
                } else {
                    self.error(
                        format!(
                            "logical operations require boolean operands, got {} and {}",
                            left, right
                        ),
                        span,
                    );
                    Ty::Error
                }
            },

            BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor | BinOp::Shl | BinOp::Shr => {
                if !left.is_integer() || !right.is_integer() {
                    self.error(
                        format!(
                            "bitwise operations require integer types, got {} and {}",
                            left, right
                        ),
                        span,
                    );
                    return Ty::Error;
                }
                match Ty::common_type(left, right) {
                    Some(common) => common,
                    None => {
                        self.error(
                            format!(
                                "operands of '{}' have no common type: {} and {}",
                                op.symbol(),
                                left,
                                right
                            ),
                            span,
                        );
                        Ty::Error
                    },
                }
            },
        }
    }

    fn assign_type(&mut self, assign: &emc_par::AssignExpr) -> Ty {
        let target_ty = match assign.target.as_ref() {
            Expr::Identifier(ident) => {
                let ty = match self.scopes.lookup(&ident.name) {
                    Some(symbol) if symbol.is_function => {
                        self.error(
                            format!("cannot assign to function: {}", ident.name),
                            ident.span,
                        );
                        Ty::Error
                    },
                    Some(symbol) if symbol.is_const => {
                        self.error(format!("cannot assign to const: {}", ident.name), ident.span);
                        Ty::Error
                    },
                    Some(symbol) => symbol.ty.clone(),
                    None => {
                        self.error(format!("undefined identifier: {}", ident.name), ident.span);
                        Ty::Error
                    },
                };
                self.types.record(ident.id, ty.clone());
                ty
            },
            Expr::Deref(_) => self.analyze_expr(&assign.target),
            other => {
                // The parser already reported the invalid target; just keep
                // the walk going
                self.analyze_expr(other);
                Ty::Error
            },
        };

        let value_ty = self.analyze_expr(&assign.value);

        if !target_ty.is_error()
            && !value_ty.is_error()
            && !Ty::compatible(&target_ty, &value_ty)
        {
            self.error(
                format!(
                    "type mismatch in assignment: expected {}, got {}",
                    target_ty, value_ty
                ),
                assign.span,
            );
        }

        target_ty
    }
}

/// Range check for an integer literal against a declared integer type.
fn int_literal_fits(value: i64, ty: &Ty) -> bool {
    match ty {
        Ty::Int(width) => match width.bits() {
            8 => (i8::MIN as i64..=i8::MAX as i64).contains(&value),
            16 => (i16::MIN as i64..=i16::MAX as i64).contains(&value),
            32 => (i32::MIN as i64..=i32::MAX as i64).contains(&value),
            _ => true,
        },
        Ty::UInt(width) => {
            value >= 0
                && match width.bits() {
                    8 => value <= u8::MAX as i64,
                    16 => value <= u16::MAX as i64,
                    32 => value <= u32::MAX as i64,
                    _ => true,
                }
        },
        _ => true,
    }
}
