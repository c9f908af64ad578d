//! Backend core for the AM8 toy compiler.
//!
//! Lowers a frontend-produced AST (`ir::ast`) through a block-structured
//! intermediate representation to AM8 machine instructions:
//!
//! 1. IR generation (`ir::ir_generator`) — one IR function per source
//!    function, basic blocks wired into a CFG.
//! 2. Liveness analysis (`backend::liveness`) — per-block live-in/live-out
//!    sets via iterative backward dataflow.
//! 3. Interference graph (`backend::interference`) — undirected graph over
//!    simultaneously-live values.
//! 4. Register allocation (`backend::regalloc`) — graph coloring onto the
//!    8 general-purpose registers, overflow into spill slots.
//! 5. Code generation (`backend::codegen`) — flat AM8 instruction stream
//!    with prologue/epilogue and call sequences.
//!
//! The lexer, parser, and assembly text emission live outside this crate;
//! `ir::ast` is the input contract and `backend::instruction::Program` the
//! output contract.

pub mod backend;
pub mod ir;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompileError {
    /// An identifier was used before any assignment or parameter bound it.
    #[error("undefined name `{name}` in function `{function}`")]
    UndefinedName { function: String, name: String },

    /// The frontend handed us an AST node this backend does not lower.
    #[error("unsupported construct `{construct}` in function `{function}`")]
    UnsupportedConstruct {
        function: String,
        construct: &'static str,
    },

    /// Internal consistency failure: an IR value reached code generation
    /// without a lowering. Indicates a generator/allocator contract
    /// violation, not a user error.
    #[error("internal error lowering function `{function}`: {message}")]
    UnsupportedInstruction { function: String, message: String },
}

/// Compile a single source function down to AM8 assembly items.
pub fn compile_function(
    func: &ir::ast::Function,
) -> Result<Vec<backend::instruction::AsmItem>, CompileError> {
    let ir_func = ir::ir_generator::lower(func)?;
    backend::lower_function(&ir_func)
}

/// Compile a whole program, one function at a time.
///
/// Functions are independent: a failing function aborts only itself and
/// contributes a diagnostic. Returns the concatenated program when every
/// function compiled, otherwise all collected diagnostics.
pub fn compile_program(
    funcs: &[ir::ast::Function],
) -> Result<backend::instruction::Program, Vec<CompileError>> {
    let mut program = backend::instruction::Program::default();
    let mut errors = Vec::new();
    for func in funcs {
        match compile_function(func) {
            Ok(items) => program.items.extend(items),
            Err(e) => {
                log::debug!("skipping function `{}`: {}", func.name, e);
                errors.push(e);
            }
        }
    }
    if errors.is_empty() {
        Ok(program)
    } else {
        Err(errors)
    }
}
