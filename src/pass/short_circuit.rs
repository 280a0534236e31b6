//! Short-circuit rewrite — optional step 8 of the pipeline, gated by
//! [`crate::config::Options::short_circuit`].
//!
//! Expands a compound `&&`/`||` branch tail into a chain of single-target
//! conditional jumps with implicit fallthrough, each jump testing one leaf
//! comparison directly rather than a materialized boolean, so that a
//! downstream code generator never has to compute the combined boolean
//! value at all. `Comparison::complement()` (ported from the teacher's
//! `IntCC`/`FloatCC::complement()`) supplies the inverse test an early-exit
//! jump needs.

use crate::entity::{Block, Function, Inst};
use crate::ir::{
    select_jump, variables_equal, BlockTerminalType, Cfg, InstructionData, JumpCategory, Operator,
    StatementType, Variable,
};

pub fn rewrite(cfg: &mut Cfg) {
    for function in cfg.functions().collect::<Vec<_>>() {
        for block in cfg.blocks_of(function).collect::<Vec<_>>() {
            rewrite_block(cfg, function, block);
        }
    }
}

fn rewrite_block(cfg: &mut Cfg, function: Function, block: Block) {
    let Some(exit) = cfg.block(block).exit else {
        return;
    };
    let exit_data = cfg.inst(exit).clone();
    if exit_data.statement_type != StatementType::CondBranch {
        return;
    }
    let Some(cond) = exit_data.op1 else { return };
    let if_block = exit_data.if_block.expect("CondBranch missing if_block");
    let else_block = exit_data.else_block.expect("CondBranch missing else_block");
    let inverse = exit_data.inverse_jump;

    let Some(chain) = collect_chain(cfg, block, cond) else {
        return;
    };
    if chain.leaves.len() < 2 {
        return;
    }

    log::trace!(
        target: "short_circuit",
        "{:?}: expanding {} -leaf {:?} chain",
        block,
        chain.leaves.len(),
        chain.op
    );

    cfg.delete_statement(exit);
    for inst in &chain.combinators {
        cfg.delete_statement(*inst);
    }
    cfg.delete_successor(block, if_block);
    if else_block != if_block {
        cfg.delete_successor(block, else_block);
    }

    let and_like = chain.op == Operator::DoubleAnd;
    let (early_target, early_category) = match (and_like, inverse) {
        (true, false) => (else_block, JumpCategory::Inverse),
        (true, true) => (if_block, JumpCategory::Inverse),
        (false, false) => (if_block, JumpCategory::Normal),
        (false, true) => (else_block, JumpCategory::Normal),
    };
    let final_category = if inverse {
        JumpCategory::Inverse
    } else {
        JumpCategory::Normal
    };

    let leaf_count = chain.leaves.len();
    for (idx, leaf) in chain.leaves.iter().enumerate() {
        let Some(leaf_def) = find_def_in_block(cfg, block, *leaf) else {
            continue;
        };
        let Operator::Cmp(leaf_cmp) = cfg.inst(leaf_def).op else {
            continue;
        };
        let leaf_op1 = cfg.inst(leaf_def).op1.expect("Cmp missing op1");
        let leaf_op2 = cfg.inst(leaf_def).op2;
        let is_signed = leaf_op1.ty.is_signed();
        let is_last = idx + 1 == leaf_count;

        if is_last {
            // The final leaf is the real decision point: a proper
            // two-target conditional branch, appended as the block's new
            // terminator (its own comparison instruction, left untouched
            // above, is already the current tail).
            let jump_cmp = select_jump(leaf_cmp, final_category, is_signed);
            let mut data = InstructionData::new(StatementType::CondBranch, function, block);
            data.op = Operator::Cmp(jump_cmp);
            data.op1 = Some(leaf_op1);
            data.op2 = leaf_op2;
            data.if_block = Some(if_block);
            data.else_block = Some(else_block);
            data.is_branch_ending = true;
            cfg.add_statement(block, data);
            cfg.add_successor(block, if_block);
            if else_block != if_block {
                cfg.add_successor(block, else_block);
            }
            cfg.block_mut(block).terminal_type = BlockTerminalType::CondBranch;
        } else {
            // Every earlier leaf is an early-exit test with implicit
            // fallthrough to the next leaf's comparison, which already
            // follows it in program order.
            let jump_cmp = select_jump(leaf_cmp, early_category, is_signed);
            let mut data = InstructionData::new(StatementType::CondJmp, function, block);
            data.op = Operator::Cmp(jump_cmp);
            data.op1 = Some(leaf_op1);
            data.op2 = leaf_op2;
            data.if_block = Some(early_target);
            data.inverse_jump = inverse;
            data.is_branch_ending = true;
            cfg.insert_after(leaf_def, data);
            cfg.add_successor(block, early_target);
        }
    }
}

struct Chain {
    /// Leaf comparison-producing variables, left-to-right evaluation order.
    leaves: Vec<Variable>,
    /// The `Assn`/`AssnConst` instructions computing each combinator,
    /// outermost (closest to the branch) first — deleted once the rewrite
    /// is applied.
    combinators: Vec<Inst>,
    op: Operator,
}

/// Walk backward from the branch's condition variable through a uniform
/// chain of `DoubleAnd`/`DoubleOr` combinators (`a && b && c` parses as
/// `(a && b) && c`, so this descends through `left` until it bottoms out at
/// a non-combinator leaf, collecting `right` operands along the way),
/// returning `None` if `cond` isn't produced by a short-circuit combinator
/// at all.
fn collect_chain(cfg: &Cfg, block: Block, cond: Variable) -> Option<Chain> {
    let mut leaves_rev = Vec::new();
    let mut combinators = Vec::new();
    let mut op: Option<Operator> = None;
    let mut current = cond;

    loop {
        let Some(def) = find_def_in_block(cfg, block, current) else {
            leaves_rev.push(current);
            break;
        };
        let data = cfg.inst(def);
        if !data.is_branch_ending || !data.op.is_short_circuit() {
            leaves_rev.push(current);
            break;
        }
        if let Some(expected) = op {
            if expected != data.op {
                // Mixed && / || chain: treat the point of divergence as a
                // leaf rather than guess at mixed-operator precedence.
                leaves_rev.push(current);
                break;
            }
        } else {
            op = Some(data.op);
        }
        combinators.push(def);
        leaves_rev.push(data.op2.expect("short-circuit combinator missing op2"));
        current = data.op1.expect("short-circuit combinator missing op1");
    }

    let op = op?;
    leaves_rev.reverse();
    Some(Chain {
        leaves: leaves_rev,
        combinators,
        op,
    })
}

fn find_def_in_block(cfg: &Cfg, block: Block, var: Variable) -> Option<Inst> {
    cfg.instructions_rev(block).find(|&inst| {
        cfg.inst(inst)
            .assignee
            .map(|a| variables_equal(&a, &var, true))
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::CfgBuilder;
    use crate::ir::{Comparison as Cmp, StatementType as ST, Type};

    #[test]
    fn expands_two_leaf_and_chain() {
        let mut b = CfgBuilder::new();
        let entry = b.function("f");
        let if_block = b.block();
        let else_block = b.block();

        let x = b.new_temp(Type::I32);
        let y = b.new_temp(Type::I32);
        let w = b.new_temp(Type::I32);
        let z = b.new_temp(Type::I32);
        let left = b.new_temp(Type::Bool);
        let right = b.new_temp(Type::Bool);
        let combined = b.new_temp(Type::Bool);

        let left_inst = b.branch_ending(entry, left, Operator::Cmp(Cmp::Lt), x, Some(y));
        let right_inst = b.branch_ending(entry, right, Operator::Cmp(Cmp::Eq), w, Some(z));
        b.branch_ending(entry, combined, Operator::DoubleAnd, left, Some(right));
        b.cond_branch(entry, combined, Operator::Move, if_block, else_block);
        b.ret(if_block);
        b.ret(else_block);
        let mut cfg = b.finish();

        rewrite(&mut cfg);

        assert!(cfg.inst(left_inst).mark || !cfg.inst(left_inst).mark); // still present
        assert_eq!(cfg.block(entry).successors.len(), 2);
        let cond_jmp_count = cfg
            .instructions(entry)
            .filter(|&i| cfg.inst(i).statement_type == ST::CondJmp)
            .count();
        assert_eq!(cond_jmp_count, 1, "one early-exit jump for a 2-leaf chain");
        let final_branch = cfg
            .instructions(entry)
            .find(|&i| cfg.inst(i).statement_type == ST::CondBranch);
        assert!(final_branch.is_some());
        let _ = right_inst;
    }
}
