//! Liveness analysis over an IR function's control-flow graph.
//!
//! Computes per-block live-in/live-out value sets by iterative backward
//! dataflow. The results feed interference graph construction; nothing
//! here mutates the IR.

use crate::ir::{BasicBlock, Function, Value};
use std::collections::HashSet;

/// Per-block liveness sets, indexed by block arena position.
pub struct LivenessInfo {
    pub live_in: Vec<HashSet<Value>>,
    pub live_out: Vec<HashSet<Value>>,
}

/// Values read before any local redefinition, and values defined anywhere,
/// for one block. Scans in order, tracking local definitions so a use
/// after a local definition does not count as upward-exposed.
fn use_def(block: &BasicBlock) -> (HashSet<Value>, HashSet<Value>) {
    let mut uses = HashSet::new();
    let mut defs = HashSet::new();
    for instr in &block.instrs {
        for u in instr.uses() {
            if u.is_allocatable() && !defs.contains(&u) {
                uses.insert(u);
            }
        }
        if let Some(d) = instr.defines() {
            defs.insert(d);
        }
    }
    (uses, defs)
}

/// Compute liveness for a function whose CFG edges are already wired.
///
/// Iterates over all blocks in reverse arena order until a full pass
/// changes nothing; the value domain is finite and the update monotone,
/// so this terminates.
pub fn analyze(func: &Function) -> LivenessInfo {
    let n = func.blocks.len();
    let mut use_sets = Vec::with_capacity(n);
    let mut def_sets = Vec::with_capacity(n);
    for block in &func.blocks {
        let (u, d) = use_def(block);
        use_sets.push(u);
        def_sets.push(d);
    }

    let mut live_in: Vec<HashSet<Value>> = vec![HashSet::new(); n];
    let mut live_out: Vec<HashSet<Value>> = vec![HashSet::new(); n];

    let mut passes = 0;
    let mut changed = true;
    while changed {
        changed = false;
        passes += 1;
        for bi in (0..n).rev() {
            // live_out[B] = ∪ live_in[S] over successors S
            let mut new_out = HashSet::new();
            for succ in &func.blocks[bi].succs {
                new_out.extend(live_in[succ.0].iter().cloned());
            }

            // live_in[B] = use[B] ∪ (live_out[B] − def[B])
            let mut new_in = use_sets[bi].clone();
            for v in &new_out {
                if !def_sets[bi].contains(v) {
                    new_in.insert(v.clone());
                }
            }

            if new_in != live_in[bi] || new_out != live_out[bi] {
                changed = true;
                live_in[bi] = new_in;
                live_out[bi] = new_out;
            }
        }
    }

    log::debug!(
        "liveness for `{}` converged after {} passes",
        func.name,
        passes
    );
    LivenessInfo { live_in, live_out }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BinOp, Instr, Ty};

    // A hand-built loop:
    //   f(x):        goto f_loop
    //   f_loop:      t0 = x < 10; if t0 goto f_body else f_end
    //   f_body:      x = x + 1; goto f_loop
    //   f_end:       return x
    fn loop_function() -> Function {
        let x = Value::var("x");
        let mut f = Function::new("f", vec![x.clone()]);
        let t0 = f.new_temp(Ty::Bool);
        let t1 = f.new_temp(Ty::Word);

        f.push(f.entry, Instr::Jump("f_loop".into()));

        let cond = f.new_block("f_loop");
        f.push(
            cond,
            Instr::BinaryOp {
                op: BinOp::Lt,
                left: x.clone(),
                right: Value::word(10),
                result: t0.clone(),
            },
        );
        f.push(
            cond,
            Instr::CondJump {
                condition: t0,
                true_label: "f_body".into(),
                false_label: "f_end".into(),
            },
        );

        let body = f.new_block("f_body");
        f.push(
            body,
            Instr::BinaryOp {
                op: BinOp::Add,
                left: x.clone(),
                right: Value::word(1),
                result: t1.clone(),
            },
        );
        f.push(
            body,
            Instr::Assign {
                source: t1,
                target: x.clone(),
            },
        );
        f.push(body, Instr::Jump("f_loop".into()));

        let end = f.new_block("f_end");
        f.push(end, Instr::Return(Some(x)));

        f.connect_blocks();
        f
    }

    #[test]
    fn variable_live_around_loop() {
        let f = loop_function();
        let info = analyze(&f);
        let x = Value::var("x");

        // x is live into every block of the loop.
        for bi in 0..f.blocks.len() {
            assert!(
                info.live_in[bi].contains(&x),
                "x should be live into block {} ({})",
                bi,
                f.blocks[bi].label
            );
        }
    }

    #[test]
    fn temporary_dies_inside_its_block() {
        let f = loop_function();
        let info = analyze(&f);
        let t0 = Value::Temporary { id: 0, ty: Ty::Bool };

        // The branch condition never escapes the condition block.
        for bi in 0..f.blocks.len() {
            assert!(!info.live_out[bi].contains(&t0));
        }
    }

    #[test]
    fn constants_never_live() {
        let f = loop_function();
        let info = analyze(&f);
        for bi in 0..f.blocks.len() {
            assert!(info.live_in[bi].iter().all(Value::is_allocatable));
            assert!(info.live_out[bi].iter().all(Value::is_allocatable));
        }
    }
}
