use super::ast::{self, Expr, Stmt};
use super::ir::{BlockId, Function, Instr, Ty, UnOp, Value};
use super::symbol_table::SymbolTable;
use crate::CompileError;

/// Lower one frontend function to an IR function with a wired CFG.
pub fn lower(func: &ast::Function) -> Result<Function, CompileError> {
    let mut g = Gen::new(func);
    g.lower_body(&func.body)?;
    g.finish()
}

struct Gen {
    func: Function,
    /// Block currently receiving instructions.
    current: BlockId,
    symbols: SymbolTable,
    label_count: usize,
}

impl Gen {
    fn new(src: &ast::Function) -> Self {
        let mut symbols = SymbolTable::new();
        let params: Vec<Value> = src.params.iter().map(|p| symbols.define(p)).collect();
        let func = Function::new(src.name.clone(), params);
        let current = func.entry;
        Self {
            func,
            current,
            symbols,
            label_count: 0,
        }
    }

    fn finish(mut self) -> Result<Function, CompileError> {
        if !self.current_ends_in_return() {
            self.emit(Instr::Return(None));
        }
        self.func.connect_blocks();
        log::debug!(
            "lowered `{}`: {} blocks, {} instructions",
            self.func.name,
            self.func.blocks.len(),
            self.func.blocks.iter().map(|b| b.instrs.len()).sum::<usize>()
        );
        Ok(self.func)
    }

    /// Fresh label, prefixed with the function name so labels stay unique
    /// across a multi-function program.
    fn new_label(&mut self, hint: &str) -> String {
        let l = format!("{}_{}{}", self.func.name, hint, self.label_count);
        self.label_count += 1;
        l
    }

    fn emit(&mut self, instr: Instr) {
        self.func.push(self.current, instr);
    }

    fn start_block(&mut self, label: String) {
        self.current = self.func.new_block(label);
    }

    fn current_ends_in_return(&self) -> bool {
        matches!(
            self.func.block(self.current).instrs.last(),
            Some(Instr::Return(_))
        )
    }

    fn lower_body(&mut self, stmts: &[Stmt]) -> Result<(), CompileError> {
        for s in stmts {
            self.lower_stmt(s)?;
        }
        Ok(())
    }

    fn lower_stmt(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        match stmt {
            Stmt::Assign { name, value } => {
                let source = self.eval(value)?;
                let target = self.symbols.define(name);
                self.emit(Instr::Assign { source, target });
            }
            Stmt::Expr(e) => {
                // A call in statement position discards its result.
                if let Expr::Call { name, args } = e {
                    let args = args
                        .iter()
                        .map(|a| self.eval(a))
                        .collect::<Result<Vec<_>, _>>()?;
                    self.emit(Instr::Call {
                        function: name.clone(),
                        args,
                        result: None,
                    });
                } else {
                    self.eval(e)?;
                }
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => self.lower_if(condition, then_branch, else_branch.as_deref())?,
            Stmt::While { condition, body } => self.lower_while(condition, body)?,
            Stmt::Return(value) => {
                let value = match value {
                    Some(e) => Some(self.eval(e)?),
                    None => None,
                };
                self.emit(Instr::Return(value));
            }
            Stmt::Block(stmts) => self.lower_body(stmts)?,
            Stmt::For { .. } => {
                return Err(CompileError::UnsupportedConstruct {
                    function: self.func.name.clone(),
                    construct: "for",
                });
            }
        }
        Ok(())
    }

    fn lower_if(
        &mut self,
        condition: &Expr,
        then_branch: &[Stmt],
        else_branch: Option<&[Stmt]>,
    ) -> Result<(), CompileError> {
        let cond = self.eval(condition)?;
        let then_label = self.new_label("then");
        let else_label = else_branch.map(|_| self.new_label("else"));
        let end_label = self.new_label("endif");

        let false_target = else_label.clone().unwrap_or_else(|| end_label.clone());
        self.emit(Instr::CondJump {
            condition: cond,
            true_label: then_label.clone(),
            false_label: false_target,
        });

        self.start_block(then_label);
        self.lower_body(then_branch)?;
        if !self.current_ends_in_return() {
            self.emit(Instr::Jump(end_label.clone()));
        }

        if let (Some(label), Some(stmts)) = (else_label, else_branch) {
            self.start_block(label);
            self.lower_body(stmts)?;
            if !self.current_ends_in_return() {
                self.emit(Instr::Jump(end_label.clone()));
            }
        }

        self.start_block(end_label);
        Ok(())
    }

    fn lower_while(&mut self, condition: &Expr, body: &[Stmt]) -> Result<(), CompileError> {
        let loop_label = self.new_label("loop");
        let body_label = self.new_label("body");
        let end_label = self.new_label("end");

        self.emit(Instr::Jump(loop_label.clone()));

        // The condition re-evaluates on every iteration, so it gets its
        // own block that both the entry and the loop back edge target.
        self.start_block(loop_label.clone());
        let cond = self.eval(condition)?;
        self.emit(Instr::CondJump {
            condition: cond,
            true_label: body_label.clone(),
            false_label: end_label.clone(),
        });

        self.start_block(body_label);
        self.lower_body(body)?;
        if !self.current_ends_in_return() {
            self.emit(Instr::Jump(loop_label));
        }

        self.start_block(end_label);
        Ok(())
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value, CompileError> {
        match expr {
            Expr::Literal(n) => Ok(Value::word(*n)),
            Expr::Ident(name) => {
                self.symbols
                    .lookup(name)
                    .ok_or_else(|| CompileError::UndefinedName {
                        function: self.func.name.clone(),
                        name: name.clone(),
                    })
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                let ty = if op.is_comparison() { Ty::Bool } else { Ty::Word };
                let result = self.func.new_temp(ty);
                self.emit(Instr::BinaryOp {
                    op: *op,
                    left,
                    right,
                    result: result.clone(),
                });
                Ok(result)
            }
            Expr::Unary { op, operand } => {
                let operand = self.eval(operand)?;
                let ty = match op {
                    UnOp::Neg => Ty::Word,
                    UnOp::Not => Ty::Bool,
                };
                let result = self.func.new_temp(ty);
                self.emit(Instr::UnaryOp {
                    op: *op,
                    operand,
                    result: result.clone(),
                });
                Ok(result)
            }
            Expr::Call { name, args } => {
                let args = args
                    .iter()
                    .map(|a| self.eval(a))
                    .collect::<Result<Vec<_>, _>>()?;
                let result = self.func.new_temp(Ty::Word);
                self.emit(Instr::Call {
                    function: name.clone(),
                    args,
                    result: Some(result.clone()),
                });
                Ok(result)
            }
        }
    }
}
