//! Code generation: one IR function plus its allocation map becomes a
//! flat AM8 instruction stream.
//!
//! Blocks are emitted in arena order. Every non-constant operand resolves
//! through the allocation map to a register or a frame-relative memory
//! operand; constants become immediates in place.

use super::instruction::{AsmItem, Instruction, Opcode, Operand};
use super::regalloc::{Allocation, AllocationMap};
use super::target::{Register, WORD_SIZE};
use crate::ir::{BinOp, Function, Instr, UnOp, Value};
use crate::CompileError;

/// Lower one function to AM8 assembly items.
pub fn emit_function(func: &Function, alloc: &AllocationMap) -> Result<Vec<AsmItem>, CompileError> {
    Codegen::new(func, alloc).run()
}

struct Codegen<'a> {
    func: &'a Function,
    alloc: &'a AllocationMap,
    out: Vec<AsmItem>,
    /// Distinct variables with an allocation; sizes the named frame area.
    num_vars: usize,
    /// Counter for comparison-materialization labels.
    set_labels: usize,
}

impl<'a> Codegen<'a> {
    fn new(func: &'a Function, alloc: &'a AllocationMap) -> Self {
        let num_vars = alloc
            .keys()
            .filter(|v| matches!(v, Value::Variable { .. }))
            .count();
        Self {
            func,
            alloc,
            out: Vec::new(),
            num_vars,
            set_labels: 0,
        }
    }

    fn run(mut self) -> Result<Vec<AsmItem>, CompileError> {
        self.emit_prologue()?;
        for (bi, block) in self.func.blocks.iter().enumerate() {
            // The entry block's label is the function label, emitted with
            // the prologue.
            if bi != self.func.entry.0 {
                self.out.push(AsmItem::Label(block.label.clone()));
            }
            for instr in &block.instrs {
                self.emit_instr(instr)?;
            }
        }
        Ok(self.out)
    }

    fn emit(&mut self, instr: Instruction) {
        self.out.push(AsmItem::Instr(instr));
    }

    /// Bytes reserved below the frame pointer: the named variable area
    /// followed by the spill slots.
    fn frame_bytes(&self) -> i64 {
        let slots = self
            .alloc
            .values()
            .filter_map(|a| match a {
                Allocation::Slot(s) => Some(s + 1),
                Allocation::Reg(_) => None,
            })
            .max()
            .unwrap_or(0);
        (self.num_vars + slots) as i64 * WORD_SIZE
    }

    /// Resolve a value to a machine operand via the allocation map.
    fn operand(&self, v: &Value) -> Result<Operand, CompileError> {
        match v {
            Value::Constant { literal, .. } => Ok(Operand::Imm(*literal)),
            _ => match self.alloc.get(v) {
                Some(Allocation::Reg(r)) => Ok(Operand::Reg(*r)),
                Some(Allocation::Slot(s)) => Ok(Operand::frame(
                    -((self.num_vars + s + 1) as i64) * WORD_SIZE,
                )),
                None => Err(CompileError::UnsupportedInstruction {
                    function: self.func.name.clone(),
                    message: format!("value `{v}` reached codegen without an allocation"),
                }),
            },
        }
    }

    /// Data movement, with the opcode picked by operand shape.
    fn emit_move(&mut self, dst: Operand, src: Operand) {
        let opcode = match (&dst, &src) {
            (Operand::Mem(_), _) => Opcode::Store,
            (Operand::Reg(_), Operand::Mem(_)) => Opcode::Load,
            _ => Opcode::Move,
        };
        self.emit(Instruction::new(opcode, vec![dst, src]));
    }

    fn emit_prologue(&mut self) -> Result<(), CompileError> {
        self.out.push(AsmItem::Label(self.func.name.clone()));
        self.emit(Instruction::push(Operand::Reg(Register::Fp)));
        self.emit(Instruction::new(
            Opcode::Move,
            vec![Operand::Reg(Register::Fp), Operand::Reg(Register::Sp)],
        ));
        self.emit(Instruction::new(
            Opcode::Sub,
            vec![
                Operand::Reg(Register::Sp),
                Operand::Reg(Register::Sp),
                Operand::Imm(self.frame_bytes()),
            ],
        ));
        // The saved FP and the return address sit between FP and the
        // incoming arguments, hence the offset of two words.
        for (i, p) in self.func.params.iter().enumerate() {
            let home = Operand::frame((2 + i as i64) * WORD_SIZE);
            let dst = self.operand(p)?;
            self.emit_move(dst, home);
        }
        Ok(())
    }

    fn emit_epilogue(&mut self) {
        self.emit(Instruction::new(
            Opcode::Move,
            vec![Operand::Reg(Register::Sp), Operand::Reg(Register::Fp)],
        ));
        self.emit(Instruction::pop(Register::Fp));
        self.emit(Instruction::ret());
    }

    fn new_set_label(&mut self) -> String {
        let l = format!("{}_set{}", self.func.name, self.set_labels);
        self.set_labels += 1;
        l
    }

    fn emit_instr(&mut self, instr: &Instr) -> Result<(), CompileError> {
        match instr {
            Instr::BinaryOp {
                op,
                left,
                right,
                result,
            } => {
                let l = self.operand(left)?;
                let r = self.operand(right)?;
                let d = self.operand(result)?;
                match lower_binop(*op) {
                    BinLowering::Alu(opcode) => {
                        self.emit(Instruction::new(opcode, vec![d, l, r]));
                    }
                    BinLowering::Cmp(jump) => {
                        // No SETcc on AM8: assume true, branch over the clear.
                        let done = self.new_set_label();
                        self.emit_move(d.clone(), Operand::Imm(1));
                        self.emit(Instruction::new(Opcode::Cmp, vec![l, r]));
                        self.emit(Instruction::new(jump, vec![Operand::label(done.clone())]));
                        self.emit_move(d, Operand::Imm(0));
                        self.out.push(AsmItem::Label(done));
                    }
                }
            }
            Instr::UnaryOp {
                op,
                operand,
                result,
            } => {
                let s = self.operand(operand)?;
                let d = self.operand(result)?;
                match op {
                    UnOp::Neg => {
                        self.emit(Instruction::new(Opcode::Sub, vec![d, Operand::Imm(0), s]));
                    }
                    UnOp::Not => {
                        self.emit(Instruction::new(Opcode::Not, vec![d, s]));
                    }
                }
            }
            Instr::Assign { source, target } => {
                let s = self.operand(source)?;
                let d = self.operand(target)?;
                self.emit_move(d, s);
            }
            Instr::Label(l) => {
                self.out.push(AsmItem::Label(l.clone()));
            }
            Instr::Jump(l) => {
                self.emit(Instruction::jmp(l.clone()));
            }
            Instr::CondJump {
                condition,
                true_label,
                false_label,
            } => {
                let c = self.operand(condition)?;
                self.emit(Instruction::new(Opcode::Cmp, vec![c, Operand::Imm(0)]));
                self.emit(Instruction::new(
                    Opcode::Jne,
                    vec![Operand::label(true_label.clone())],
                ));
                self.emit(Instruction::jmp(false_label.clone()));
            }
            Instr::Call {
                function,
                args,
                result,
            } => {
                for a in args.iter().rev() {
                    let op = self.operand(a)?;
                    self.emit(Instruction::push(op));
                }
                self.emit(Instruction::call(function.clone()));
                if !args.is_empty() {
                    self.emit(Instruction::new(
                        Opcode::Add,
                        vec![
                            Operand::Reg(Register::Sp),
                            Operand::Reg(Register::Sp),
                            Operand::Imm(args.len() as i64 * WORD_SIZE),
                        ],
                    ));
                }
                if let Some(res) = result {
                    let d = self.operand(res)?;
                    self.emit_move(d, Operand::Reg(Register::RETURN_REG));
                }
            }
            Instr::Return(value) => {
                if let Some(v) = value {
                    let s = self.operand(v)?;
                    self.emit_move(Operand::Reg(Register::RETURN_REG), s);
                }
                self.emit_epilogue();
            }
        }
        Ok(())
    }
}

enum BinLowering {
    /// A single three-operand ALU instruction.
    Alu(Opcode),
    /// A comparison, materialized via CMP plus this conditional jump.
    Cmp(Opcode),
}

fn lower_binop(op: BinOp) -> BinLowering {
    match op {
        BinOp::Add => BinLowering::Alu(Opcode::Add),
        BinOp::Sub => BinLowering::Alu(Opcode::Sub),
        BinOp::Mul => BinLowering::Alu(Opcode::Mul),
        BinOp::Div => BinLowering::Alu(Opcode::Div),
        BinOp::Mod => BinLowering::Alu(Opcode::Mod),
        BinOp::And => BinLowering::Alu(Opcode::And),
        BinOp::Or => BinLowering::Alu(Opcode::Or),
        BinOp::Xor => BinLowering::Alu(Opcode::Xor),
        BinOp::Eq => BinLowering::Cmp(Opcode::Jeq),
        BinOp::Ne => BinLowering::Cmp(Opcode::Jne),
        BinOp::Lt => BinLowering::Cmp(Opcode::Jlt),
        BinOp::Le => BinLowering::Cmp(Opcode::Jle),
        BinOp::Gt => BinLowering::Cmp(Opcode::Jgt),
        BinOp::Ge => BinLowering::Cmp(Opcode::Jge),
    }
}
