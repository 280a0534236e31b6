//! Dominance, postdominance, and dominance-frontier computation.
//!
//! Ported from the teacher crate's `dominator_tree.rs`, which builds a
//! dominator tree with the iterative reverse-postorder algorithm of Cooper,
//! Harvey & Kennedy, *"A Simple, Fast Dominance Algorithm"*. Unlike the
//! teacher, this module does not cache a persistent tree structure across
//! incremental edits — `pass::dominance` always throws away every block's
//! dominance fields and calls [`recompute`] from scratch, so there is no
//! `DominatorTree` type here, just the bookkeeping fields already living on
//! `BlockData`.
//!
//! Postdominance is obtained by running the identical algorithm over the
//! graph with every edge reversed, rooted at a virtual exit node that is
//! never materialized as a real `Block` — it only ever exists as the
//! implicit root of the reverse postorder walk below.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::entity::Block;
use crate::ir::{BlockTerminalType, Cfg};

/// Depth-first postorder of the blocks reachable from `entry` via
/// `successors`, matching the teacher's `compute_postorder`. Unreachable
/// blocks are simply absent from the result.
pub fn post_order(cfg: &Cfg, entry: Block) -> Vec<Block> {
    let mut order = Vec::new();
    let mut visited = FxHashSet::default();
    // (block, next successor index to visit) explicit stack, avoiding
    // recursion depth proportional to CFG depth.
    let mut stack: Vec<(Block, usize)> = vec![(entry, 0)];
    visited.insert(entry);

    while let Some(&mut (block, ref mut idx)) = stack.last_mut() {
        let successors = &cfg.block(block).successors;
        if *idx < successors.len() {
            let next = successors[*idx];
            *idx += 1;
            if visited.insert(next) {
                stack.push((next, 0));
            }
        } else {
            order.push(block);
            stack.pop();
        }
    }
    order
}

/// Postorder of the *reversed* graph (walking `predecessors`), starting from
/// every block in `roots` simultaneously — used for the postdominance walk,
/// which may need to start from several `Ret` blocks at once.
fn reverse_post_order(cfg: &Cfg, roots: &[Block]) -> Vec<Block> {
    let mut order = Vec::new();
    let mut visited = FxHashSet::default();
    let mut stack: Vec<(Block, usize)> = Vec::new();

    for &root in roots {
        if !visited.insert(root) {
            continue;
        }
        stack.push((root, 0));
        while let Some(&mut (block, ref mut idx)) = stack.last_mut() {
            let predecessors = &cfg.block(block).predecessors;
            if *idx < predecessors.len() {
                let next = predecessors[*idx];
                *idx += 1;
                if visited.insert(next) {
                    stack.push((next, 0));
                }
            } else {
                order.push(block);
                stack.pop();
            }
        }
    }
    order
}

/// Cooper/Harvey/Kennedy fixed-point intersection, shared by the forward and
/// reverse passes below. `preds_of` yields the predecessors to intersect
/// over (real predecessors for dominance, successors for postdominance);
/// `postorder` must list every block to process with `roots` already
/// excluded, in postorder (so reversed gives reverse postorder).
fn compute_idom<F>(postorder: &[Block], roots: &FxHashSet<Block>, preds_of: F) -> FxHashMap<Block, Block>
where
    F: Fn(Block) -> Vec<Block>,
{
    // rpo_number: higher means earlier in reverse postorder (i.e. processed
    // first), matching the teacher's monotonic-but-sparse numbering intent
    // without needing the STRIDE gap (no incremental updates here).
    let mut rpo_number: FxHashMap<Block, usize> = FxHashMap::default();
    for (i, &b) in postorder.iter().rev().enumerate() {
        rpo_number.insert(b, i);
    }

    let mut idom: FxHashMap<Block, Block> = FxHashMap::default();

    fn intersect(
        mut a: Block,
        mut b: Block,
        idom: &FxHashMap<Block, Block>,
        rpo_number: &FxHashMap<Block, usize>,
    ) -> Block {
        while a != b {
            while rpo_number[&a] > rpo_number[&b] {
                a = idom[&a];
            }
            while rpo_number[&b] > rpo_number[&a] {
                b = idom[&b];
            }
        }
        a
    }

    let mut changed = true;
    while changed {
        changed = false;
        // Reverse postorder: highest rpo_number (earliest) first.
        for &block in postorder.iter().rev() {
            if roots.contains(&block) {
                continue;
            }
            let preds = preds_of(block);
            let mut new_idom: Option<Block> = None;
            for p in preds {
                if !rpo_number.contains_key(&p) || !idom.contains_key(&p) && !roots.contains(&p) {
                    continue;
                }
                new_idom = Some(match new_idom {
                    None => p,
                    Some(cur) => intersect(cur, p, &idom, &rpo_number),
                });
            }
            if let Some(new_idom) = new_idom {
                if idom.get(&block) != Some(&new_idom) {
                    idom.insert(block, new_idom);
                    changed = true;
                }
            }
        }
    }
    idom
}

/// Discard and recompute every dominance-related field (`idom`, `ipdom`,
/// `dominators`, `postdominators`, `dominator_children`,
/// `dominance_frontier`, `reverse_dominance_frontier`) for every block of
/// `function`, starting from `entry`.
pub fn recompute(cfg: &mut Cfg, entry: Block) {
    let function = cfg.block(entry).function;
    for block in cfg.blocks_of(function).collect::<Vec<_>>() {
        cfg.block_mut(block).clear_dominance_info();
    }

    let forward_order = post_order(cfg, entry);
    let reachable: FxHashSet<Block> = forward_order.iter().copied().collect();
    if reachable.is_empty() {
        return;
    }

    let mut entry_root = FxHashSet::default();
    entry_root.insert(entry);
    let fwd_idom = compute_idom(&forward_order, &entry_root, |b| cfg.block(b).predecessors.clone());

    for &block in &forward_order {
        if let Some(&idom) = fwd_idom.get(&block) {
            cfg.block_mut(block).idom = Some(idom);
        }
        let mut dominators = FxHashSet::default();
        let mut cur = block;
        dominators.insert(cur);
        while let Some(&idom) = fwd_idom.get(&cur) {
            dominators.insert(idom);
            cur = idom;
        }
        cfg.block_mut(block).dominators = dominators;
    }
    for &block in &forward_order {
        if let Some(&idom) = fwd_idom.get(&block) {
            cfg.block_mut(idom).dominator_children.push(block);
        }
    }

    // Postdominance: reverse every edge, root the walk at every block whose
    // terminator is `Ret`, or (if none reached) every block with no
    // successors, standing in for the virtual exit node.
    let mut exit_roots: Vec<Block> = forward_order
        .iter()
        .copied()
        .filter(|&b| cfg.block(b).terminal_type == BlockTerminalType::Ret)
        .collect();
    if exit_roots.is_empty() {
        exit_roots = forward_order
            .iter()
            .copied()
            .filter(|&b| cfg.block(b).successors.is_empty())
            .collect();
    }

    let reverse_order = reverse_post_order(cfg, &exit_roots);
    let exit_root_set: FxHashSet<Block> = exit_roots.iter().copied().collect();
    let rev_idom = compute_idom(&reverse_order, &exit_root_set, |b| cfg.block(b).successors.clone());

    for &block in &reverse_order {
        if let Some(&ipdom) = rev_idom.get(&block) {
            cfg.block_mut(block).ipdom = Some(ipdom);
        }
        let mut postdominators = FxHashSet::default();
        let mut cur = block;
        postdominators.insert(cur);
        while let Some(&ipdom) = rev_idom.get(&cur) {
            postdominators.insert(ipdom);
            cur = ipdom;
        }
        cfg.block_mut(block).postdominators = postdominators;
    }

    // Dominance frontiers: standard Cooper/Harvey/Kennedy algorithm. For
    // every block with >= 2 predecessors, walk up from each predecessor to
    // (not including) the block's idom, adding the block to every visited
    // ancestor's frontier.
    for &block in &forward_order {
        let predecessors = cfg.block(block).predecessors.clone();
        if predecessors.len() < 2 {
            continue;
        }
        let idom = cfg.block(block).idom;
        for pred in predecessors {
            if !reachable.contains(&pred) {
                continue;
            }
            let mut runner = pred;
            while Some(runner) != idom {
                cfg.block_mut(runner).dominance_frontier.insert(block);
                match cfg.block(runner).idom {
                    Some(next) => runner = next,
                    None => break,
                }
            }
        }
    }

    // Reverse dominance frontier: the same walk over the reversed graph
    // (successors-as-predecessors, ipdom in place of idom).
    for &block in &reverse_order {
        let successors = cfg.block(block).successors.clone();
        if successors.len() < 2 {
            continue;
        }
        let ipdom = cfg.block(block).ipdom;
        for succ in successors {
            if !exit_root_set.contains(&succ) && !reverse_order.contains(&succ) {
                continue;
            }
            let mut runner = succ;
            while Some(runner) != ipdom {
                cfg.block_mut(runner).reverse_dominance_frontier.insert(block);
                match cfg.block(runner).ipdom {
                    Some(next) => runner = next,
                    None => break,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::CfgBuilder;

    #[test]
    fn diamond_dominance() {
        // entry -> a, entry -> b, a -> merge, b -> merge, merge -> ret.
        let mut b = CfgBuilder::new();
        let entry = b.function("f");
        let a = b.block();
        let c = b.block();
        let merge = b.block();
        let ret = b.block();
        b.jump(entry, a);
        b.jump(entry, c);
        b.jump(a, merge);
        b.jump(c, merge);
        b.jump(merge, ret);
        b.ret(ret);
        let mut cfg = b.finish();

        recompute(&mut cfg, entry);

        assert_eq!(cfg.block(merge).idom, Some(entry));
        assert!(cfg.block(entry).dominance_frontier.is_empty());
        assert!(cfg.block(a).dominance_frontier.contains(&merge));
        assert!(cfg.block(c).dominance_frontier.contains(&merge));
        assert!(cfg.block(merge).dominators.contains(&entry));
        assert!(cfg.block(merge).dominators.contains(&merge));
    }

    #[test]
    fn straight_line_postdominance() {
        let mut b = CfgBuilder::new();
        let entry = b.function("f");
        let mid = b.block();
        b.jump(entry, mid);
        b.ret(mid);
        let mut cfg = b.finish();

        recompute(&mut cfg, entry);

        assert_eq!(cfg.block(entry).ipdom, Some(mid));
        assert!(cfg.block(entry).postdominators.contains(&mid));
    }

    #[test]
    fn recompute_does_not_clear_other_functions() {
        let mut b = CfgBuilder::new();
        let entry_f = b.function("f");
        let mid_f = b.block();
        b.jump(entry_f, mid_f);
        b.ret(mid_f);

        let entry_g = b.function("g");
        let mid_g = b.block();
        b.jump(entry_g, mid_g);
        b.ret(mid_g);
        let mut cfg = b.finish();

        recompute(&mut cfg, entry_f);
        recompute(&mut cfg, entry_g);

        assert_eq!(cfg.block(entry_f).ipdom, Some(mid_f));
        assert!(cfg.block(entry_f).postdominators.contains(&mid_f));
        assert_eq!(cfg.block(mid_f).idom, Some(entry_f));
        assert_eq!(cfg.block(entry_g).ipdom, Some(mid_g));
    }
}
