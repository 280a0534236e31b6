//! Sweep — step 3 of the pipeline.
//!
//! Deletes everything Mark left unmarked. A conditional branch that turns
//! out to be dead can't simply be deleted outright — something still has
//! to reach the code after it — so it's rewritten to an unconditional jump
//! at its *nearest marked postdominator*, found with a BFS that is itself
//! informed by whatever postdominance info the CFG already carries (the
//! pipeline's dominance-rebuild step, §4.5, refreshes that info for
//! whoever runs next; see `crate::optimize` for why a recompute also runs
//! once up front).

use std::collections::VecDeque;

use crate::entity::Block;
use crate::ir::{BlockTerminalType, Cfg, StatementType};

pub fn sweep(cfg: &mut Cfg) {
    for block in cfg.created_blocks().to_vec() {
        sweep_block(cfg, block);
    }
}

fn sweep_block(cfg: &mut Cfg, block: Block) {
    let insts: Vec<_> = cfg.instructions(block).collect();
    for inst in insts {
        if cfg.inst(inst).mark {
            continue;
        }
        match cfg.inst(inst).statement_type {
            StatementType::Jmp => {
                // Scaffolding Clean still needs; preserved unchanged.
            }
            StatementType::CondBranch => {
                let if_block = cfg.inst(inst).if_block.expect("CondBranch missing if_block");
                let else_block = cfg.inst(inst).else_block.expect("CondBranch missing else_block");
                // Must run before the edges below are torn down: the BFS walks
                // outward from `block` over its current successors.
                let target = nearest_marked_postdominator(cfg, block);
                cfg.delete_statement(inst);
                cfg.delete_successor(block, if_block);
                if else_block != if_block {
                    cfg.delete_successor(block, else_block);
                }
                log::trace!(target: "sweep", "{:?}: dead branch -> jmp {:?}", block, target);
                cfg.emit_jump(block, target, None, true, false);
                cfg.block_mut(block).terminal_type = BlockTerminalType::Jmp;
            }
            StatementType::IndirectJmp => {
                let target = nearest_marked_postdominator(cfg, block);
                if let Some(table) = cfg.block(block).jump_table.clone() {
                    for node in table.nodes {
                        cfg.delete_successor(block, node);
                    }
                    cfg.block_mut(block).jump_table = None;
                }
                cfg.delete_statement(inst);
                log::trace!(target: "sweep", "{:?}: dead indirect jump -> jmp {:?}", block, target);
                cfg.emit_jump(block, target, None, true, false);
                cfg.block_mut(block).terminal_type = BlockTerminalType::Jmp;
            }
            _ => {
                cfg.delete_statement(inst);
            }
        }
    }
}

/// BFS from `start` over successors, looking for the first block that is:
/// a postdominator of `start` (per `start`'s cached `postdominators` set),
/// marked (`contains_mark`), and not `start` itself.
fn nearest_marked_postdominator(cfg: &mut Cfg, start: Block) -> Block {
    for &blk in cfg.created_blocks() {
        cfg.block_mut(blk).visited = false;
    }
    let mut queue = VecDeque::new();
    queue.push_back(start);
    cfg.block_mut(start).visited = true;

    while let Some(current) = queue.pop_front() {
        if current != start
            && cfg.block(start).postdominators.contains(&current)
            && cfg.block(current).contains_mark
        {
            return current;
        }
        for succ in cfg.block(current).successors.clone() {
            if !cfg.block(succ).visited {
                cfg.block_mut(succ).visited = true;
                queue.push_back(succ);
            }
        }
    }
    unreachable!(
        "no marked postdominator reachable from {:?}; Ret is never swept and postdominates every block that reaches it",
        start
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control_relations;
    use crate::ir::builder::CfgBuilder;
    use crate::ir::{Comparison, Operator, StatementType as ST, Type};
    use crate::pass::mark::mark;

    #[test]
    fn dead_conditional_branch_becomes_jump_to_ret() {
        let mut b = CfgBuilder::new();
        let entry = b.function("f");
        let left = b.block();
        let right = b.block();
        let join = b.block();

        let cond = b.new_temp(Type::Bool);
        let x = b.new_temp(Type::I32);
        let y = b.new_temp(Type::I32);
        b.cmp(entry, cond, Comparison::Eq, x, y);
        b.cond_branch(entry, cond, Operator::Cmp(Comparison::Eq), left, right);
        b.jump(left, join);
        b.jump(right, join);
        b.ret(join);
        let mut cfg = b.finish();

        control_relations::recompute(&mut cfg, entry);
        mark(&mut cfg);
        sweep(&mut cfg);

        let exit = cfg.block(entry).exit.unwrap();
        assert_eq!(cfg.inst(exit).statement_type, ST::Jmp);
        assert_eq!(cfg.block(entry).successors.len(), 1);
    }
}
