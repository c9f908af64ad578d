//! Interference graph construction from liveness results.
//!
//! Two values interfere when one is defined at a point where the other is
//! live across that definition; interfering values must not share a
//! register.

use super::liveness::LivenessInfo;
use crate::ir::{Function, Value};
use std::collections::{BTreeSet, HashMap};

/// Undirected interference graph over allocation candidates (variables and
/// temporaries; never constants).
///
/// Nodes are interned in first-encounter order and addressed by index;
/// adjacency sets are ordered. All downstream iteration is over indices,
/// which is what makes the allocator deterministic.
#[derive(Debug, Default)]
pub struct InterferenceGraph {
    nodes: Vec<Value>,
    index: HashMap<Value, usize>,
    adj: Vec<BTreeSet<usize>>,
}

impl InterferenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a value as a graph node, returning its index. Isolated
    /// values stay in the graph with no edges; they still receive a
    /// register during allocation.
    pub fn add_node(&mut self, v: &Value) -> usize {
        if let Some(&i) = self.index.get(v) {
            return i;
        }
        let i = self.nodes.len();
        self.nodes.push(v.clone());
        self.index.insert(v.clone(), i);
        self.adj.push(BTreeSet::new());
        i
    }

    pub fn add_edge(&mut self, u: &Value, v: &Value) {
        if u == v {
            return;
        }
        let ui = self.add_node(u);
        let vi = self.add_node(v);
        self.adj[ui].insert(vi);
        self.adj[vi].insert(ui);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, i: usize) -> &Value {
        &self.nodes[i]
    }

    pub fn degree(&self, i: usize) -> usize {
        self.adj[i].len()
    }

    pub fn neighbors(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        self.adj[i].iter().copied()
    }

    pub fn interferes(&self, u: &Value, v: &Value) -> bool {
        match (self.index.get(u), self.index.get(v)) {
            (Some(&ui), Some(&vi)) => self.adj[ui].contains(&vi),
            _ => false,
        }
    }

    /// All edges, each reported once with u < v by node index.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.adj
            .iter()
            .enumerate()
            .flat_map(|(u, ns)| ns.iter().filter(move |&&v| u < v).map(move |&v| (u, v)))
    }
}

/// Build the interference graph for one function.
///
/// Each block is walked in reverse starting from its live-out set. At a
/// definition of `d`, an edge is added between `d` and every other value
/// currently live; `d` then leaves the live set (its lifetime ends at its
/// definition, scanning backward) and the instruction's uses enter it.
pub fn build(func: &Function, liveness: &LivenessInfo) -> InterferenceGraph {
    let mut graph = InterferenceGraph::new();

    // Intern every candidate in program order first, so node indices (and
    // with them the allocator's tie-breaks) never depend on hash-set
    // iteration order. Parameters are candidates even when the body never
    // touches them; the prologue still has to put them somewhere.
    for p in &func.params {
        graph.add_node(p);
    }
    for block in &func.blocks {
        for instr in &block.instrs {
            if let Some(d) = instr.defines() {
                graph.add_node(&d);
            }
            for u in instr.uses() {
                if u.is_allocatable() {
                    graph.add_node(&u);
                }
            }
        }
    }

    for (bi, block) in func.blocks.iter().enumerate() {
        let mut live = liveness.live_out[bi].clone();
        for instr in block.instrs.iter().rev() {
            if let Some(d) = instr.defines() {
                for v in &live {
                    if *v != d {
                        graph.add_edge(&d, v);
                    }
                }
                live.remove(&d);
            }
            for u in instr.uses() {
                if u.is_allocatable() {
                    live.insert(u);
                }
            }
        }
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::liveness;
    use crate::ir::{BinOp, Instr, Ty, Value};

    // a = 1; b = 2; c = a + b; return c
    fn straight_line() -> Function {
        let a = Value::var("a");
        let b = Value::var("b");
        let c = Value::var("c");
        let mut f = Function::new("f", vec![]);
        let t = f.new_temp(Ty::Word);
        let entry = f.entry;
        f.push(
            entry,
            Instr::Assign {
                source: Value::word(1),
                target: a.clone(),
            },
        );
        f.push(
            entry,
            Instr::Assign {
                source: Value::word(2),
                target: b.clone(),
            },
        );
        f.push(
            entry,
            Instr::BinaryOp {
                op: BinOp::Add,
                left: a,
                right: b,
                result: t.clone(),
            },
        );
        f.push(
            entry,
            Instr::Assign {
                source: t,
                target: c.clone(),
            },
        );
        f.push(entry, Instr::Return(Some(c)));
        f.connect_blocks();
        f
    }

    #[test]
    fn simultaneously_live_values_interfere() {
        let f = straight_line();
        let info = liveness::analyze(&f);
        let graph = build(&f, &info);

        // a and b are both live at the add.
        assert!(graph.interferes(&Value::var("a"), &Value::var("b")));
        // c is defined after a's last use; they never overlap.
        assert!(!graph.interferes(&Value::var("c"), &Value::var("a")));
    }

    #[test]
    fn constants_are_not_nodes() {
        let f = straight_line();
        let info = liveness::analyze(&f);
        let graph = build(&f, &info);
        for i in 0..graph.len() {
            assert!(graph.node(i).is_allocatable());
        }
    }

    #[test]
    fn dead_definition_is_an_isolated_node() {
        // x is assigned and never read; it still needs a home.
        let x = Value::var("x");
        let mut f = Function::new("g", vec![]);
        let entry = f.entry;
        f.push(
            entry,
            Instr::Assign {
                source: Value::word(5),
                target: x.clone(),
            },
        );
        f.push(entry, Instr::Return(None));
        f.connect_blocks();

        let info = liveness::analyze(&f);
        let graph = build(&f, &info);
        let i = (0..graph.len())
            .find(|&i| graph.node(i) == &x)
            .expect("x should be a graph node");
        assert_eq!(graph.degree(i), 0);
    }
}
