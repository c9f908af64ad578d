// A block-structured IR: tagged values, tagged instructions, and basic
// blocks held in a per-function arena addressed by index.

use std::collections::HashMap;
use std::fmt;

/// Minimal type tags. Comparisons and logical negation produce `Bool`,
/// everything else is a machine `Word`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ty {
    Word,
    Bool,
}

/// An IR value. Two values are equal iff their variant and identifying
/// fields match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// A literal. Materialized as an immediate operand at use sites;
    /// never a register-allocation candidate.
    Constant { literal: i64, ty: Ty },
    /// A source-level binding. May be assigned more than once.
    Variable { name: String, ty: Ty },
    /// Compiler-introduced. Defined exactly once within its function.
    Temporary { id: u32, ty: Ty },
}

impl Value {
    pub fn word(literal: i64) -> Self {
        Value::Constant {
            literal,
            ty: Ty::Word,
        }
    }

    pub fn var(name: impl Into<String>) -> Self {
        Value::Variable {
            name: name.into(),
            ty: Ty::Word,
        }
    }

    /// Constants never receive a register or a spill slot.
    pub fn is_allocatable(&self) -> bool {
        !matches!(self, Value::Constant { .. })
    }

    pub fn ty(&self) -> Ty {
        match self {
            Value::Constant { ty, .. } | Value::Variable { ty, .. } | Value::Temporary { ty, .. } => {
                *ty
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Constant { literal, .. } => write!(f, "{literal}"),
            Value::Variable { name, .. } => write!(f, "{name}"),
            Value::Temporary { id, .. } => write!(f, "t{id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinOp {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::And => "&",
            BinOp::Or => "|",
            BinOp::Xor => "^",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

impl fmt::Display for UnOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", match self {
            UnOp::Neg => "-",
            UnOp::Not => "!",
        })
    }
}

/// An IR instruction.
#[derive(Debug, Clone)]
pub enum Instr {
    /// `result = left op right`
    BinaryOp {
        op: BinOp,
        left: Value,
        right: Value,
        result: Value,
    },
    /// `result = op operand`
    UnaryOp {
        op: UnOp,
        operand: Value,
        result: Value,
    },
    /// `target = source`
    Assign { source: Value, target: Value },
    /// A pure CFG anchor; no uses, no definition.
    Label(String),
    /// Unconditional transfer.
    Jump(String),
    /// Two-way branch on a value.
    CondJump {
        condition: Value,
        true_label: String,
        false_label: String,
    },
    /// Call with optional result.
    Call {
        function: String,
        args: Vec<Value>,
        result: Option<Value>,
    },
    /// Return with optional value.
    Return(Option<Value>),
}

impl Instr {
    /// Values this instruction reads.
    pub fn uses(&self) -> Vec<Value> {
        match self {
            Instr::BinaryOp { left, right, .. } => vec![left.clone(), right.clone()],
            Instr::UnaryOp { operand, .. } => vec![operand.clone()],
            Instr::Assign { source, .. } => vec![source.clone()],
            Instr::Label(_) | Instr::Jump(_) => Vec::new(),
            Instr::CondJump { condition, .. } => vec![condition.clone()],
            Instr::Call { args, .. } => args.clone(),
            Instr::Return(value) => value.iter().cloned().collect(),
        }
    }

    /// The value this instruction writes, if any.
    pub fn defines(&self) -> Option<Value> {
        match self {
            Instr::BinaryOp { result, .. } | Instr::UnaryOp { result, .. } => Some(result.clone()),
            Instr::Assign { target, .. } => Some(target.clone()),
            Instr::Call { result, .. } => result.clone(),
            Instr::Label(_) | Instr::Jump(_) | Instr::CondJump { .. } | Instr::Return(_) => None,
        }
    }

    /// Whether this instruction ends a basic block.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Instr::Jump(_) | Instr::CondJump { .. } | Instr::Return(_)
        )
    }
}

struct Args<'a>(&'a [Value]);

impl fmt::Display for Args<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::BinaryOp {
                op,
                left,
                right,
                result,
            } => write!(f, "{result} = {left} {op} {right}"),
            Instr::UnaryOp {
                op,
                operand,
                result,
            } => write!(f, "{result} = {op}{operand}"),
            Instr::Assign { source, target } => write!(f, "{target} = {source}"),
            Instr::Label(l) => write!(f, "{l}:"),
            Instr::Jump(l) => write!(f, "goto {l}"),
            Instr::CondJump {
                condition,
                true_label,
                false_label,
            } => write!(f, "if {condition} goto {true_label} else {false_label}"),
            Instr::Call {
                function,
                args,
                result,
            } => match result {
                Some(r) => write!(f, "{r} = call {function}({})", Args(args)),
                None => write!(f, "call {function}({})", Args(args)),
            },
            Instr::Return(value) => match value {
                Some(v) => write!(f, "return {v}"),
                None => write!(f, "return"),
            },
        }
    }
}

/// Index of a basic block in its function's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub usize);

/// An owned, ordered instruction sequence plus derived CFG edges.
///
/// Blocks are owned by exactly one [`Function`] and referenced elsewhere
/// only by [`BlockId`]; loops make the block graph cyclic, so edges are
/// indices rather than references.
#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub label: String,
    pub instrs: Vec<Instr>,
    pub preds: Vec<BlockId>,
    pub succs: Vec<BlockId>,
}

impl BasicBlock {
    fn new(label: String) -> Self {
        Self {
            label,
            instrs: Vec::new(),
            preds: Vec::new(),
            succs: Vec::new(),
        }
    }

    pub fn terminator(&self) -> Option<&Instr> {
        self.instrs.last().filter(|i| i.is_terminator())
    }
}

/// One function's IR: parameters, the block arena, and the function-scoped
/// temporary counter.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    /// Parameters, as `Value::Variable`s.
    pub params: Vec<Value>,
    pub blocks: Vec<BasicBlock>,
    pub entry: BlockId,
    next_temp: u32,
}

impl Function {
    /// Create a function whose entry block is labelled with the function
    /// name (it doubles as the call target).
    pub fn new(name: impl Into<String>, params: Vec<Value>) -> Self {
        let name = name.into();
        let entry_block = BasicBlock::new(name.clone());
        Self {
            name,
            params,
            blocks: vec![entry_block],
            entry: BlockId(0),
            next_temp: 0,
        }
    }

    pub fn new_block(&mut self, label: impl Into<String>) -> BlockId {
        let id = BlockId(self.blocks.len());
        self.blocks.push(BasicBlock::new(label.into()));
        id
    }

    pub fn new_temp(&mut self, ty: Ty) -> Value {
        let id = self.next_temp;
        self.next_temp += 1;
        Value::Temporary { id, ty }
    }

    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.0]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut BasicBlock {
        &mut self.blocks[id.0]
    }

    pub fn push(&mut self, id: BlockId, instr: Instr) {
        self.blocks[id.0].instrs.push(instr);
    }

    /// Derive predecessor/successor edges from block terminators.
    ///
    /// A block without an explicit terminator falls through to the next
    /// block in arena order; the fallthrough becomes an explicit edge here,
    /// so liveness never has to reason about implicit control flow.
    pub fn connect_blocks(&mut self) {
        let all_succs: Vec<Vec<BlockId>> = {
            let by_label: HashMap<&str, BlockId> = self
                .blocks
                .iter()
                .enumerate()
                .map(|(i, b)| (b.label.as_str(), BlockId(i)))
                .collect();

            self.blocks
                .iter()
                .enumerate()
                .map(|(i, block)| {
                    let mut succs = Vec::new();
                    match block.terminator() {
                        Some(Instr::Jump(l)) => {
                            if let Some(&t) = by_label.get(l.as_str()) {
                                succs.push(t);
                            }
                        }
                        Some(Instr::CondJump {
                            true_label,
                            false_label,
                            ..
                        }) => {
                            if let Some(&t) = by_label.get(true_label.as_str()) {
                                succs.push(t);
                            }
                            if let Some(&t) = by_label.get(false_label.as_str()) {
                                if !succs.contains(&t) {
                                    succs.push(t);
                                }
                            }
                        }
                        Some(Instr::Return(_)) => {}
                        _ => {
                            if i + 1 < self.blocks.len() {
                                succs.push(BlockId(i + 1));
                            }
                        }
                    }
                    succs
                })
                .collect()
        };

        for block in &mut self.blocks {
            block.preds.clear();
            block.succs.clear();
        }
        for (i, succs) in all_succs.into_iter().enumerate() {
            for &s in &succs {
                let pred = BlockId(i);
                if !self.blocks[s.0].preds.contains(&pred) {
                    self.blocks[s.0].preds.push(pred);
                }
            }
            self.blocks[i].succs = succs;
        }
    }

    /// Render the IR as text, one instruction per line. Debug aid.
    pub fn to_lines(&self) -> Vec<String> {
        let mut out = Vec::new();
        for block in &self.blocks {
            out.push(format!("{}:", block.label));
            for instr in &block.instrs {
                out.push(format!("  {instr}"));
            }
        }
        out
    }
}
