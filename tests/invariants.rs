//! Universal invariants that must hold after `optimize` runs over a variety
//! of hand-built CFG shapes, independent of any one rewrite scenario.

use ssa_opt::ir::builder::CfgBuilder;
use ssa_opt::ir::{BlockType, Comparison, Operator, Type};
use ssa_opt::{optimize_checked, Options};

#[test]
fn diamond_with_dead_branch_stays_well_formed() {
    let mut b = CfgBuilder::new();
    let entry = b.function("f");
    let left = b.block();
    let right = b.block();
    let join = b.block();

    let cond = b.new_temp(Type::Bool);
    let x = b.new_temp(Type::I32);
    let y = b.new_temp(Type::I32);
    b.cmp(entry, cond, Comparison::Lt, x, y);
    b.cond_branch(entry, cond, Operator::Cmp(Comparison::Lt), left, right);
    let dead = b.new_temp(Type::I32);
    b.assn_const(left, dead, Operator::Move);
    b.jump(left, join);
    b.jump(right, join);
    b.ret(join);
    let cfg = b.finish();

    let cfg = optimize_checked(cfg, &Options::new()).expect("well-formed CFG should optimize cleanly");

    for &block in cfg.created_blocks() {
        for &succ in &cfg.block(block).successors {
            assert!(
                cfg.block(succ).predecessors.contains(&block),
                "edge symmetry violated at {:?} -> {:?}",
                block,
                succ
            );
        }
    }
}

#[test]
fn func_entry_block_type_survives_every_rewrite() {
    let mut b = CfgBuilder::new();
    let entry = b.function("f");
    let empty = b.block();
    b.jump(entry, empty);
    b.ret(empty);
    let cfg = b.finish();

    let cfg = optimize_checked(cfg, &Options::new()).unwrap();

    let function = cfg.functions().next().unwrap();
    let surviving_entry = cfg.function_data(function).entry;
    assert_eq!(cfg.block(surviving_entry).block_type, BlockType::FuncEntry);
}

#[test]
fn clean_reaches_a_fixed_point() {
    // A chain of three empty pass-through blocks should collapse entirely,
    // and re-running optimize on the already-optimized result changes
    // nothing further.
    let mut b = CfgBuilder::new();
    let entry = b.function("f");
    let a = b.block();
    let c = b.block();
    let d = b.block();
    b.jump(entry, a);
    b.jump(a, c);
    b.jump(c, d);
    b.ret(d);
    let cfg = b.finish();

    let once = optimize_checked(cfg, &Options::new()).unwrap();
    let block_count_once = once.created_blocks().len();
    let twice = optimize_checked(once, &Options::new()).unwrap();
    assert_eq!(block_count_once, twice.created_blocks().len());
}
