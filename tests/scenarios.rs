//! The six labeled optimization scenarios.

use ssa_opt::ir::builder::CfgBuilder;
use ssa_opt::ir::{Comparison, Operator, StatementType, Type};
use ssa_opt::{optimize, Options};

#[test]
fn dead_store_is_eliminated() {
    let mut b = CfgBuilder::new();
    let entry = b.function("f");
    let dead = b.new_temp(Type::I32);
    b.assn_const(entry, dead, Operator::Move);
    b.ret(entry);
    let cfg = b.finish();

    let cfg = optimize(cfg, &Options::new());

    assert_eq!(cfg.instructions(entry).count(), 1);
    let only = cfg.instructions(entry).next().unwrap();
    assert_eq!(cfg.inst(only).statement_type, StatementType::Ret);
}

#[test]
fn empty_pass_through_block_is_elided() {
    let mut b = CfgBuilder::new();
    let entry = b.function("f");
    let empty = b.block();
    let target = b.block();
    b.jump(entry, empty);
    b.jump(empty, target);
    b.ret(target);
    let cfg = b.finish();

    let cfg = optimize(cfg, &Options::new());

    assert!(!cfg.created_blocks().contains(&empty));
    assert_eq!(cfg.block(entry).successors, vec![target]);
}

#[test]
fn linear_single_predecessor_merge() {
    let mut b = CfgBuilder::new();
    let entry = b.function("f");
    let next = b.block();
    let x = b.new_temp(Type::I32);
    b.jump(entry, next);
    b.assn_const(next, x, Operator::Move);
    b.store(next, x, x);
    b.ret(next);
    let cfg = b.finish();

    let cfg = optimize(cfg, &Options::new());

    assert!(!cfg.created_blocks().contains(&next));
    let insts: Vec<_> = cfg.instructions(entry).collect();
    assert_eq!(cfg.inst(*insts.last().unwrap()).statement_type, StatementType::Ret);
}

#[test]
fn identical_branch_targets_become_a_jump() {
    let mut b = CfgBuilder::new();
    let entry = b.function("f");
    let join = b.block();
    let cond = b.new_temp(Type::Bool);
    let x = b.new_temp(Type::I32);
    let y = b.new_temp(Type::I32);
    b.cmp(entry, cond, Comparison::Ne, x, y);
    b.cond_branch(entry, cond, Operator::Cmp(Comparison::Ne), join, join);
    b.ret(join);
    let cfg = b.finish();

    let cfg = optimize(cfg, &Options::new());

    let exit = cfg.block(entry).exit.expect("entry must still have a terminator");
    assert_eq!(cfg.inst(exit).statement_type, StatementType::Ret);
}

#[test]
fn short_circuit_and_expands_into_chained_jumps() {
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

    b.branch_ending(entry, left, Operator::Cmp(Comparison::Lt), x, Some(y));
    b.branch_ending(entry, right, Operator::Cmp(Comparison::Eq), w, Some(z));
    b.branch_ending(entry, combined, Operator::DoubleAnd, left, Some(right));
    b.cond_branch(entry, combined, Operator::Move, if_block, else_block);
    b.ret(if_block);
    b.ret(else_block);
    let cfg = b.finish();

    let cfg = optimize(cfg, &Options::new().with_short_circuit(true));

    let cond_jmp_count = cfg
        .instructions(entry)
        .filter(|&i| cfg.inst(i).statement_type.is_cond_jmp())
        .count();
    assert_eq!(cond_jmp_count, 1, "a two-leaf && chain needs exactly one early exit");
    let final_branch_count = cfg
        .instructions(entry)
        .filter(|&i| cfg.inst(i).statement_type == StatementType::CondBranch)
        .count();
    assert_eq!(final_branch_count, 1);
}

#[test]
fn unreachable_block_is_removed() {
    let mut b = CfgBuilder::new();
    let entry = b.function("f");
    let orphan = b.block();
    b.ret(entry);
    let x = b.new_temp(Type::I32);
    b.assn_const(orphan, x, Operator::Move);
    b.ret(orphan);
    let cfg = b.finish();

    let cfg = optimize(cfg, &Options::new());

    assert!(!cfg.created_blocks().contains(&orphan));
}

#[test]
fn jump_table_deletion_prunes_its_sole_target() {
    // entry -> dispatch -(indirect jump, single-entry table)-> island -> join: ret.
    // The indirect jump never gets reopened (its table has one entry, so it
    // never contributes to any block's reverse dominance frontier) and stays
    // dead; Sweep must drop the table's edge along with the instruction, or
    // `island` keeps a phantom predecessor and survives unreachable-block
    // removal.
    let mut b = CfgBuilder::new();
    let entry = b.function("f");
    let dispatch = b.block();
    let island = b.block();
    let join = b.block();

    let addr = b.new_temp(Type::I32);
    let dead = b.new_temp(Type::I32);
    b.jump(entry, dispatch);
    b.indirect_jump(dispatch, addr, vec![island]);
    b.assn_const(island, dead, Operator::Move);
    b.jump(island, join);
    b.ret(join);
    let cfg = b.finish();

    let cfg = optimize(cfg, &Options::new());

    assert!(!cfg.created_blocks().contains(&island));
    assert!(cfg.block(dispatch).jump_table.is_none());
}
