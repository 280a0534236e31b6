//! Clean — step 4 of the pipeline.
//!
//! Four branch-reduction rewrites (R1-R4), applied over a post-order
//! traversal of each function, repeated to a fixed point. `branch_reduce`
//! tries at most one rewrite per visited block per sweep; a block touched
//! by a rewrite is revisited on the next sweep rather than immediately,
//! keeping each rewrite's bookkeeping simple at the cost of extra passes
//! over an already-cheap traversal.

use crate::control_relations::post_order;
use crate::entity::{Block, Inst};
use crate::ir::{BlockType, Cfg, StatementType};

pub fn clean(cfg: &mut Cfg) {
    for function in cfg.functions().collect::<Vec<_>>() {
        let entry = cfg.function_data(function).entry;
        loop {
            let order = post_order(cfg, entry);
            let mut changed = false;
            for block in order {
                if !cfg.created_blocks().contains(&block) {
                    continue;
                }
                if branch_reduce(cfg, block) {
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
    }
}

fn branch_reduce(cfg: &mut Cfg, block: Block) -> bool {
    let Some(exit) = cfg.block(block).exit else {
        return false;
    };
    let exit_data = cfg.inst(exit).clone();

    match exit_data.statement_type {
        StatementType::CondBranch => {
            let if_block = exit_data.if_block.expect("CondBranch missing if_block");
            let else_block = exit_data.else_block.expect("CondBranch missing else_block");
            if if_block == else_block {
                apply_r1(cfg, block, if_block);
                return true;
            }
            false
        }
        StatementType::Jmp => {
            let target = exit_data.if_block.expect("Jmp missing if_block");

            if is_only_jump(cfg, block) && cfg.block(block).block_type != BlockType::FuncEntry {
                apply_r2(cfg, block, target);
                return true;
            }
            if cfg.block(target).predecessors == [block] {
                apply_r3(cfg, block, exit, target);
                return true;
            }
            if begins_branch_ending_ends_cond_branch(cfg, target) {
                apply_r4(cfg, block, exit, target);
                return true;
            }
            false
        }
        _ => false,
    }
}

fn is_only_jump(cfg: &Cfg, block: Block) -> bool {
    let data = cfg.block(block);
    data.leader == data.exit
}

fn begins_branch_ending_ends_cond_branch(cfg: &Cfg, block: Block) -> bool {
    let Some(leader) = cfg.block(block).leader else {
        return false;
    };
    let Some(exit) = cfg.block(block).exit else {
        return false;
    };
    cfg.inst(leader).is_branch_ending && cfg.inst(exit).statement_type == StatementType::CondBranch
}

/// R1: a conditional branch whose two targets are identical never actually
/// branches; reduce it to an unconditional jump.
fn apply_r1(cfg: &mut Cfg, block: Block, target: Block) {
    log::trace!(target: "clean", "R1: {:?} has identical targets {:?}", block, target);
    if let Some(exit) = cfg.block(block).exit {
        cfg.delete_statement(exit);
    }
    while let Some(exit) = cfg.block(block).exit {
        if cfg.inst(exit).is_branch_ending {
            cfg.delete_statement(exit);
        } else {
            break;
        }
    }
    cfg.delete_successor(block, target);
    cfg.emit_jump(block, target, None, true, false);
}

/// R2: an empty block (nothing but its own jump) is elided; every
/// predecessor is redirected straight to its target.
fn apply_r2(cfg: &mut Cfg, elided: Block, target: Block) {
    log::trace!(target: "clean", "R2: eliding empty block {:?} -> {:?}", elided, target);
    for pred in cfg.block(elided).predecessors.clone() {
        redirect_branch_target(cfg, pred, elided, target);
    }
    cfg.delete_successor(elided, target);
    cfg.remove_block(elided);
}

/// R3: `i` is `j`'s only predecessor; fold `j`'s contents into `i`.
fn apply_r3(cfg: &mut Cfg, i: Block, jump_inst: Inst, j: Block) {
    log::trace!(target: "clean", "R3: merging {:?} into {:?}", j, i);
    cfg.delete_statement(jump_inst);
    cfg.delete_successor(i, j);
    combine(cfg, i, j);
}

/// R4: `j` is a short, branch-ending block with other predecessors besides
/// `i`; duplicate its contents into `i` rather than merge, since `j` must
/// stay alive for those other predecessors.
fn apply_r4(cfg: &mut Cfg, i: Block, jump_inst: Inst, j: Block) {
    log::trace!(target: "clean", "R4: hoisting {:?} into {:?}", j, i);
    cfg.delete_statement(jump_inst);
    cfg.delete_successor(i, j);

    for inst in cfg.instructions(j).collect::<Vec<_>>() {
        let copy = cfg.copy_instruction(inst);
        cfg.add_statement(i, copy);
    }
    cfg.block_mut(i).terminal_type = cfg.block(j).terminal_type;
    if let Some(jt) = cfg.block(j).jump_table.clone() {
        cfg.block_mut(i).jump_table = Some(jt);
    }
    for succ in cfg.block(j).successors.clone() {
        cfg.add_successor(i, succ);
    }
}

/// §4.3.1: splice `j` onto the tail of `i`, take over its edges, and retire
/// it.
fn combine(cfg: &mut Cfg, i: Block, j: Block) {
    if let Some(j_leader) = cfg.block(j).leader {
        match cfg.block(i).exit {
            Some(i_exit) => {
                cfg.inst_mut(i_exit).next = Some(j_leader);
                cfg.inst_mut(j_leader).prev = Some(i_exit);
            }
            None => cfg.block_mut(i).leader = Some(j_leader),
        }
        cfg.block_mut(i).exit = cfg.block(j).exit;

        let mut cursor = Some(j_leader);
        while let Some(inst) = cursor {
            cfg.inst_mut(inst).block = i;
            cursor = cfg.inst(inst).next;
        }
    }

    for s in cfg.block(j).successors.clone() {
        cfg.add_successor_only(i, s);
        for pred in cfg.block_mut(s).predecessors.iter_mut() {
            if *pred == j {
                *pred = i;
            }
        }
    }

    if cfg.block(i).block_type != BlockType::FuncEntry {
        cfg.block_mut(i).block_type = cfg.block(j).block_type;
    }
    cfg.block_mut(i).terminal_type = cfg.block(j).terminal_type;
    if let Some(jt) = cfg.block_mut(j).jump_table.take() {
        cfg.block_mut(i).jump_table = Some(jt);
    }

    let merged_freq = cfg
        .block(i)
        .estimated_execution_frequency
        .max(cfg.block(j).estimated_execution_frequency);
    cfg.block_mut(i).estimated_execution_frequency = merged_freq;

    cfg.remove_block(j);
}

/// §4.3.2: rewire predecessor `p`'s edge/branch-target/jump-table entries
/// pointing at the about-to-be-elided `e` so they point at `r` instead.
fn redirect_branch_target(cfg: &mut Cfg, p: Block, e: Block, r: Block) {
    cfg.delete_successor(p, e);
    let mut gains_r = false;

    if let Some(jt) = cfg.block_mut(p).jump_table.as_mut() {
        if jt.contains(e) {
            jt.replace(e, r);
            gains_r = true;
        }
    }

    if let Some(exit) = cfg.block(p).exit {
        let data = cfg.inst_mut(exit);
        if data.if_block == Some(e) {
            data.if_block = Some(r);
            gains_r = true;
        }
        if data.else_block == Some(e) {
            data.else_block = Some(r);
            gains_r = true;
        }
    }

    if gains_r {
        cfg.add_successor(p, r);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::CfgBuilder;
    use crate::ir::StatementType as ST;

    #[test]
    fn r2_elides_empty_pass_through_block() {
        let mut b = CfgBuilder::new();
        let entry = b.function("f");
        let empty = b.block();
        let target = b.block();
        b.jump(entry, empty);
        b.jump(empty, target);
        b.ret(target);
        let mut cfg = b.finish();

        clean(&mut cfg);

        assert!(!cfg.created_blocks().contains(&empty));
        assert_eq!(cfg.block(entry).successors, vec![target]);
        assert_eq!(cfg.block(target).predecessors, vec![entry]);
    }

    #[test]
    fn r3_merges_single_predecessor_successor() {
        let mut b = CfgBuilder::new();
        let entry = b.function("f");
        let next = b.block();
        b.jump(entry, next);
        b.ret(next);
        let mut cfg = b.finish();

        clean(&mut cfg);

        assert!(!cfg.created_blocks().contains(&next));
        let exit = cfg.block(entry).exit.unwrap();
        assert_eq!(cfg.inst(exit).statement_type, ST::Ret);
    }
}
