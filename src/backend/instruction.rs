//! AM8 machine-instruction types and assembly output items.
//!
//! This module defines the fixed opcode set, operand kinds (`Operand`,
//! `Mem`), the generic `Instruction` shape, and the structured assembly
//! output types (`AsmItem`, `Program`) used throughout the backend.

use super::target::Register;
use std::fmt;

// ============================================================================
// Opcodes
// ============================================================================

/// The fixed AM8 opcode set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Not,
    Xor,
    Cmp,
    Jmp,
    Jeq,
    Jne,
    Jlt,
    Jle,
    Jgt,
    Jge,
    Load,
    Store,
    Move,
    Push,
    Pop,
    Call,
    Ret,
    Halt,
    Nop,
}

impl Opcode {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Mod => "MOD",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Not => "NOT",
            Opcode::Xor => "XOR",
            Opcode::Cmp => "CMP",
            Opcode::Jmp => "JMP",
            Opcode::Jeq => "JEQ",
            Opcode::Jne => "JNE",
            Opcode::Jlt => "JLT",
            Opcode::Jle => "JLE",
            Opcode::Jgt => "JGT",
            Opcode::Jge => "JGE",
            Opcode::Load => "LOAD",
            Opcode::Store => "STORE",
            Opcode::Move => "MOVE",
            Opcode::Push => "PUSH",
            Opcode::Pop => "POP",
            Opcode::Call => "CALL",
            Opcode::Ret => "RET",
            Opcode::Halt => "HALT",
            Opcode::Nop => "NOP",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

// ============================================================================
// Operands
// ============================================================================

/// A memory operand: a frame-pointer-relative slot or a symbolic label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mem {
    /// Offset from the frame pointer, in bytes. Negative offsets address
    /// the local/spill area, positive offsets the incoming arguments.
    Frame(i64),
    /// Symbolic label reference (jump and call targets).
    Label(String),
}

impl fmt::Display for Mem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mem::Frame(off) if *off < 0 => write!(f, "[FP{off}]"),
            Mem::Frame(off) => write!(f, "[FP+{off}]"),
            Mem::Label(l) => write!(f, "{l}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Reg(Register),
    Imm(i64),
    Mem(Mem),
}

impl Operand {
    pub fn label(l: impl Into<String>) -> Self {
        Operand::Mem(Mem::Label(l.into()))
    }

    pub fn frame(offset: i64) -> Self {
        Operand::Mem(Mem::Frame(offset))
    }

    pub fn is_mem(&self) -> bool {
        matches!(self, Operand::Mem(_))
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Reg(r) => write!(f, "{r}"),
            Operand::Imm(n) => write!(f, "#{n}"),
            Operand::Mem(m) => write!(f, "{m}"),
        }
    }
}

// ============================================================================
// Instructions
// ============================================================================

/// A single AM8 instruction: an opcode applied to zero or more operands.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub operands: Vec<Operand>,
}

// ── Convenience constructors ────────────────────────────────────────────

impl Instruction {
    pub fn new(opcode: Opcode, operands: Vec<Operand>) -> Self {
        Self { opcode, operands }
    }

    /// `JMP label`
    pub fn jmp(label: impl Into<String>) -> Self {
        Self::new(Opcode::Jmp, vec![Operand::label(label)])
    }

    /// `PUSH op`
    pub fn push(op: Operand) -> Self {
        Self::new(Opcode::Push, vec![op])
    }

    /// `POP Rd`
    pub fn pop(r: Register) -> Self {
        Self::new(Opcode::Pop, vec![Operand::Reg(r)])
    }

    /// `CALL label`
    pub fn call(label: impl Into<String>) -> Self {
        Self::new(Opcode::Call, vec![Operand::label(label)])
    }

    /// `RET`
    pub fn ret() -> Self {
        Self::new(Opcode::Ret, Vec::new())
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  {}", self.opcode)?;
        for (i, op) in self.operands.iter().enumerate() {
            if i == 0 {
                write!(f, " {op}")?;
            } else {
                write!(f, ",{op}")?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// AsmItem / Program — structured assembly output
// ============================================================================

/// A structured assembly output element: either a label marking a position
/// in the instruction stream, or an instruction proper.
#[derive(Debug, Clone)]
pub enum AsmItem {
    Label(String),
    Instr(Instruction),
}

impl fmt::Display for AsmItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsmItem::Label(l) => write!(f, "{l}:"),
            AsmItem::Instr(i) => write!(f, "{i}"),
        }
    }
}

/// Flat assembly output for a compilation unit.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub items: Vec<AsmItem>,
}

impl Program {
    /// The instruction stream without its label markers.
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.items.iter().filter_map(|item| match item {
            AsmItem::Instr(i) => Some(i),
            AsmItem::Label(_) => None,
        })
    }

    pub fn to_lines(&self) -> Vec<String> {
        self.items.iter().map(|item| item.to_string()).collect()
    }

    /// Human-readable assembly text: a direct, lossless projection of the
    /// item list.
    pub fn to_text(&self) -> String {
        let mut text = self.to_lines().join("\n");
        text.push('\n');
        text
    }
}
