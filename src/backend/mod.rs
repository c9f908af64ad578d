//! AM8 backend — lowers IR functions to AM8 machine instructions.
//!
//! Module layout:
//! - `target`       — register set and machine constants
//! - `instruction`  — typed machine instructions and assembly output items
//! - `liveness`     — dataflow-based liveness analysis
//! - `interference` — interference graph construction
//! - `regalloc`     — graph-coloring register allocation
//! - `codegen`      — code generation driver (IR → instructions)

pub mod codegen;
pub mod instruction;
pub mod interference;
pub mod liveness;
pub mod regalloc;
pub mod target;

use crate::ir::Function;
use crate::CompileError;
use instruction::AsmItem;
use target::Register;

/// Run the per-function backend pipeline: liveness → interference →
/// allocation → code generation. The IR is read-only throughout; the
/// allocation map is a side table consumed only by codegen.
pub fn lower_function(func: &Function) -> Result<Vec<AsmItem>, CompileError> {
    let liveness = liveness::analyze(func);
    let graph = interference::build(func, &liveness);
    let alloc = regalloc::allocate(&graph, Register::GP_REGS.len());
    codegen::emit_function(func, &alloc)
}
