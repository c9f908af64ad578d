//! Intermediate representation.
//!
//! This module contains the IR value/instruction model, the AST input
//! contract, the AST-to-IR generator, and the per-function symbol table.

pub mod ast;
pub mod ir;
pub mod ir_generator;
pub mod symbol_table;

pub use ir::*;
