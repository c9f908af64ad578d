// Input contract: the tree shape the (external) frontend hands to the IR
// generator. The frontend guarantees well-formedness; the generator only
// checks name resolution and construct support.

use super::ir::{BinOp, UnOp};

#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    /// `name = value`
    Assign { name: String, value: Expr },
    /// Expression evaluated for effect (e.g. a call with ignored result).
    Expr(Expr),
    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
    },
    While { condition: Expr, body: Vec<Stmt> },
    Return(Option<Expr>),
    Block(Vec<Stmt>),
    /// Counted loop from richer frontends; this backend does not lower it.
    For {
        var: String,
        from: Expr,
        to: Expr,
        body: Vec<Stmt>,
    },
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal(i64),
    Ident(String),
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary { op: UnOp, operand: Box<Expr> },
    Call { name: String, args: Vec<Expr> },
}
