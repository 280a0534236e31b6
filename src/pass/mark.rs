//! Mark — step 2 of the pipeline.
//!
//! Classifies every instruction as critical or non-critical with a classic
//! worklist liveness propagation, the same shape as the teacher crate's
//! `do_dce` except seeded from side-effecting instruction *kinds* rather
//! than from unused-result liveness alone, and additionally reopened by
//! control dependence (the Reverse Dominance Frontier) rather than only by
//! dataflow — an unconditional jump never needs to be kept alive this way,
//! but a conditional branch or indirect jump controlling a live block does.

use crate::entity::{Block, Function, Inst};
use crate::ir::{variables_equal, Cfg, StatementType, Variable};

/// Run Mark over every function of `cfg`.
pub fn mark(cfg: &mut Cfg) {
    for function in cfg.functions().collect::<Vec<_>>() {
        mark_function(cfg, function);
    }
}

fn mark_function(cfg: &mut Cfg, function: Function) {
    log::debug!(target: "mark", "marking function {:?}", function);
    let mut worklist: Vec<Inst> = Vec::new();

    for block in cfg.blocks_of(function).collect::<Vec<_>>() {
        for inst in cfg.instructions(block).collect::<Vec<_>>() {
            if !cfg.inst(inst).mark && is_critical_seed(cfg, inst) {
                mark_and_enqueue(cfg, inst, &mut worklist);
            }
        }
    }

    while let Some(inst) = worklist.pop() {
        propagate(cfg, function, inst, &mut worklist);
    }
}

fn is_critical_seed(cfg: &Cfg, inst: Inst) -> bool {
    let data = cfg.inst(inst);
    match data.statement_type {
        StatementType::Ret
        | StatementType::AsmInline
        | StatementType::FuncCall
        | StatementType::IndirectFuncCall
        | StatementType::Idle
        | StatementType::Store
        | StatementType::StoreConst => true,
        StatementType::Assn | StatementType::AssnConst => data
            .assignee
            .map(|a| a.writes_through_pointer())
            .unwrap_or(false),
        _ => false,
    }
}

fn mark_and_enqueue(cfg: &mut Cfg, inst: Inst, worklist: &mut Vec<Inst>) {
    cfg.inst_mut(inst).mark = true;
    let block = cfg.inst(inst).block;
    cfg.block_mut(block).contains_mark = true;
    worklist.push(inst);
    log::trace!(target: "mark", "marked {:?} in {:?}", inst, block);
}

fn propagate(cfg: &mut Cfg, function: Function, inst: Inst, worklist: &mut Vec<Inst>) {
    let data = cfg.inst(inst).clone();
    match data.statement_type {
        StatementType::Phi => {
            for param in data.parameters.clone() {
                mark_definition(cfg, function, param, worklist);
            }
        }
        StatementType::FuncCall => {
            for param in data.parameters.clone() {
                mark_definition(cfg, function, param, worklist);
            }
        }
        StatementType::IndirectFuncCall => {
            if let Some(callee) = data.op1 {
                mark_definition(cfg, function, callee, worklist);
            }
            for param in data.parameters.clone() {
                mark_definition(cfg, function, param, worklist);
            }
        }
        _ => {
            if let Some(assignee) = data.assignee {
                if assignee.writes_through_pointer() {
                    mark_definition(cfg, function, assignee, worklist);
                }
            }
            if let Some(op1) = data.op1 {
                mark_definition(cfg, function, op1, worklist);
            }
            if let Some(op2) = data.op2 {
                mark_definition(cfg, function, op2, worklist);
            }
        }
    }

    let block = data.block;
    for candidate in cfg.block(block).reverse_dominance_frontier.clone() {
        reopen_branch(cfg, candidate, worklist);
    }
}

/// Rule 5: a conditional branch or indirect jump controlling a now-marked
/// block is itself critical, even though nothing dataflow-uses its result.
fn reopen_branch(cfg: &mut Cfg, candidate: Block, worklist: &mut Vec<Inst>) {
    let Some(exit) = cfg.block(candidate).exit else {
        return;
    };
    if cfg.inst(exit).mark {
        return;
    }
    let is_branch = matches!(
        cfg.inst(exit).statement_type,
        StatementType::CondBranch | StatementType::IndirectJmp
    );
    if is_branch {
        mark_and_enqueue(cfg, exit, worklist);
    }
}

/// Find and mark the unique instruction in `function` that defines `var`,
/// scanning blocks in creation order and, within each block, backward from
/// `exit`. SSA guarantees at most one such instruction exists.
fn mark_definition(cfg: &mut Cfg, function: Function, var: Variable, worklist: &mut Vec<Inst>) {
    for block in cfg.blocks_of(function).collect::<Vec<_>>() {
        for inst in cfg.instructions_rev(block).collect::<Vec<_>>() {
            let Some(assignee) = cfg.inst(inst).assignee else {
                continue;
            };
            if variables_equal(&assignee, &var, true) {
                if !cfg.inst(inst).mark {
                    mark_and_enqueue(cfg, inst, worklist);
                }
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::CfgBuilder;
    use crate::ir::{Operator, Type};

    #[test]
    fn dead_store_is_unmarked_but_ret_is_marked() {
        let mut b = CfgBuilder::new();
        let entry = b.function("f");
        let dead = b.new_temp(Type::I32);
        let dead_inst = b.assn_const(entry, dead, Operator::Move);
        let ret_inst = b.ret(entry);
        let mut cfg = b.finish();

        mark(&mut cfg);

        assert!(!cfg.inst(dead_inst).mark);
        assert!(cfg.inst(ret_inst).mark);
    }

    #[test]
    fn store_and_its_value_producer_are_marked() {
        let mut b = CfgBuilder::new();
        let entry = b.function("f");
        let addr = b.new_temp(Type::Ptr);
        let value = b.new_temp(Type::I32);
        let addr_inst = b.assn_const(entry, addr, Operator::Move);
        let value_inst = b.assn_const(entry, value, Operator::Move);
        let store_inst = b.store(entry, addr, value);
        b.ret(entry);
        let mut cfg = b.finish();

        mark(&mut cfg);

        assert!(cfg.inst(store_inst).mark);
        assert!(cfg.inst(addr_inst).mark);
        assert!(cfg.inst(value_inst).mark);
    }
}
