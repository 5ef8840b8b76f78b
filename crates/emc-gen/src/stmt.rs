//! Statement lowering.
//!
//! Blocks are lexical, not control flow: emitting a block keeps the
//! current basic block. Control flow statements create their blocks in
//! visit order and always leave the builder positioned at their exit
//! (unless every path terminated, in which case the enclosing loop stops
//! emitting dead statements).

use emc_par::{BlockStmt, ForStmt, IfStmt, ReturnStmt, Stmt, VarDecl, WhileStmt};
use emc_sem::Ty;

use crate::error::{CodeGenError, Result};
use crate::CodeGenerator;

impl<'ctx> CodeGenerator<'ctx> {
    pub(crate) fn gen_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Block(block) => self.gen_block(block),
            Stmt::If(s) => self.gen_if(s),
            Stmt::While(s) => self.gen_while(s),
            Stmt::For(s) => self.gen_for(s),
            Stmt::Return(s) => self.gen_return(s),
            Stmt::Expr(s) => {
                self.gen_expr(&s.expr)?;
                Ok(())
            },
            Stmt::VarDecl(decl) => self.gen_local_var(decl),
            Stmt::FnDecl(decl) => {
                // Nested function: emit it, then restore the insertion
                // point into the enclosing body
                let saved_block = self.builder.get_insert_block();
                self.gen_function(decl)?;
                if let Some(block) = saved_block {
                    self.builder.position_at_end(block);
                }
                Ok(())
            },
            Stmt::ExternFnDecl(decl) => {
                self.gen_extern_function(decl)?;
                Ok(())
            },
        }
    }

    /// Emits each child in order in the current insertion block. Statements
    /// after a terminator are dead and skipped.
    fn gen_block(&mut self, block: &BlockStmt) -> Result<()> {
        for stmt in &block.statements {
            if self.current_block_terminated() {
                break;
            }
            self.gen_stmt(stmt)?;
        }
        Ok(())
    }

    /// Entry-block alloca, initialiser (or zero default), store, register.
    fn gen_local_var(&mut self, decl: &VarDecl) -> Result<()> {
        let declared = match decl.ty.as_deref() {
            Some(name) => {
                Some(Ty::parse(name).ok_or_else(|| CodeGenError::UnknownType(name.to_string()))?)
            },
            None => None,
        };

        let init = match &decl.initializer {
            Some(expr) => Some(Self::expect_value(self.gen_expr(expr)?)?),
            None => None,
        };

        let ty = match (&declared, &init) {
            (Some(ty), _) => ty.clone(),
            (None, Some((_, init_ty))) => init_ty.clone(),
            (None, None) => {
                return Err(CodeGenError::Internal(format!(
                    "variable {} has neither type nor initializer",
                    decl.name
                )))
            },
        };

        // An array literal already lives in its own entry-block alloca; the
        // variable binds that address directly instead of copying
        if matches!(ty, Ty::Array(..)) {
            if let Some((value, _)) = &init {
                self.values
                    .add_variable(&decl.name, value.into_pointer_value(), ty);
                return Ok(());
            }
        }

        let slot = self.create_entry_alloca(self.types.basic(&ty)?, &decl.name)?;

        let value = match init {
            Some((value, from)) => self.coerce(value, &from, &ty)?,
            None => self.types.zero_value(&ty)?,
        };
        self.builder.build_store(slot, value)?;

        self.values.add_variable(&decl.name, slot, ty);
        Ok(())
    }

    /// Conditional branch over `then`/`else`, joining in a merge block.
    /// When both branches terminate the merge block is never created.
    fn gen_if(&mut self, stmt: &IfStmt) -> Result<()> {
        let (cond_value, cond_ty) = Self::expect_value(self.gen_expr(&stmt.condition)?)?;
        let cond = self.to_bool(cond_value, &cond_ty)?;

        let function = self.expect_function()?;

        match &stmt.else_branch {
            Some(else_branch) => {
                let then_block = self.context.append_basic_block(function, "then");
                let else_block = self.context.append_basic_block(function, "else");
                self.builder
                    .build_conditional_branch(cond, then_block, else_block)?;

                self.builder.position_at_end(then_block);
                self.gen_stmt(&stmt.then_branch)?;
                let then_end = self.builder.get_insert_block();
                let then_terminated = self.current_block_terminated();

                self.builder.position_at_end(else_block);
                self.gen_stmt(else_branch)?;
                let else_end = self.builder.get_insert_block();
                let else_terminated = self.current_block_terminated();

                if !then_terminated || !else_terminated {
                    let merge_block = self.context.append_basic_block(function, "ifcont");
                    if !then_terminated {
                        if let Some(block) = then_end {
                            self.builder.position_at_end(block);
                            self.builder.build_unconditional_branch(merge_block)?;
                        }
                    }
                    if !else_terminated {
                        if let Some(block) = else_end {
                            self.builder.position_at_end(block);
                            self.builder.build_unconditional_branch(merge_block)?;
                        }
                    }
                    self.builder.position_at_end(merge_block);
                }
            },
            None => {
                let then_block = self.context.append_basic_block(function, "then");
                let merge_block = self.context.append_basic_block(function, "ifcont");
                self.builder
                    .build_conditional_branch(cond, then_block, merge_block)?;

                self.builder.position_at_end(then_block);
                self.gen_stmt(&stmt.then_branch)?;
                if !self.current_block_terminated() {
                    self.builder.build_unconditional_branch(merge_block)?;
                }
                self.builder.position_at_end(merge_block);
            },
        }

        Ok(())
    }

    /// `cond`/`body`/`exit` block triple with a back edge from body to
    /// cond.
    fn gen_while(&mut self, stmt: &WhileStmt) -> Result<()> {
        let function = self.expect_function()?;

        let cond_block = self.context.append_basic_block(function, "while.cond");
        let body_block = self.context.append_basic_block(function, "while.body");
        let exit_block = self.context.append_basic_block(function, "while.exit");

        self.builder.build_unconditional_branch(cond_block)?;

        self.builder.position_at_end(cond_block);
        let (cond_value, cond_ty) = Self::expect_value(self.gen_expr(&stmt.condition)?)?;
        let cond = self.to_bool(cond_value, &cond_ty)?;
        self.builder
            .build_conditional_branch(cond, body_block, exit_block)?;

        self.builder.position_at_end(body_block);
        self.gen_stmt(&stmt.body)?;
        if !self.current_block_terminated() {
            self.builder.build_unconditional_branch(cond_block)?;
        }

        self.builder.position_at_end(exit_block);
        Ok(())
    }

    /// Lowered as `init; while (cond) { body; incr; }`. The init runs in
    /// the current block; the increment sits before the back edge. A
    /// missing condition is an always-true loop.
    fn gen_for(&mut self, stmt: &ForStmt) -> Result<()> {
        let function = self.expect_function()?;

        if let Some(init) = &stmt.init {
            self.gen_stmt(init)?;
        }

        let cond_block = self.context.append_basic_block(function, "for.cond");
        let body_block = self.context.append_basic_block(function, "for.body");
        let exit_block = self.context.append_basic_block(function, "for.exit");

        self.builder.build_unconditional_branch(cond_block)?;

        self.builder.position_at_end(cond_block);
        let cond = match &stmt.condition {
            Some(condition) => {
                let (value, ty) = Self::expect_value(self.gen_expr(condition)?)?;
                self.to_bool(value, &ty)?
            },
            None => self.context.bool_type().const_int(1, false),
        };
        self.builder
            .build_conditional_branch(cond, body_block, exit_block)?;

        self.builder.position_at_end(body_block);
        self.gen_stmt(&stmt.body)?;
        if !self.current_block_terminated() {
            if let Some(increment) = &stmt.increment {
                self.gen_expr(increment)?;
            }
            self.builder.build_unconditional_branch(cond_block)?;
        }

        self.builder.position_at_end(exit_block);
        Ok(())
    }

    /// Return coerces its value to the function return type and terminates
    /// the current block.
    fn gen_return(&mut self, stmt: &ReturnStmt) -> Result<()> {
        match &stmt.value {
            Some(expr) => {
                let (value, ty) = Self::expect_value(self.gen_expr(expr)?)?;
                let return_ty = self.current_return.clone();
                let coerced = self.coerce(value, &ty, &return_ty)?;
                self.builder.build_return(Some(&coerced))?;
            },
            None => {
                self.builder.build_return(None)?;
            },
        }
        Ok(())
    }

    pub(crate) fn expect_function(&self) -> Result<inkwell::values::FunctionValue<'ctx>> {
        self.current_function.ok_or_else(|| {
            CodeGenError::Internal("statement emitted outside of a function".to_string())
        })
    }
}
