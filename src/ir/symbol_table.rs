use super::ir::{Ty, Value};
use std::collections::HashMap;

/// Function-scoped mapping from source identifiers to the `Variable`
/// values denoting them. Variables enter the table on first assignment or
/// as parameters; there is no nested scoping below the function level.
#[derive(Debug, Default)]
pub struct SymbolTable {
    vars: HashMap<String, Value>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }

    /// Bind `name`, returning the existing variable on re-assignment.
    pub fn define(&mut self, name: &str) -> Value {
        self.vars
            .entry(name.to_string())
            .or_insert_with(|| Value::Variable {
                name: name.to_string(),
                ty: Ty::Word,
            })
            .clone()
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.vars.get(name).cloned()
    }
}
