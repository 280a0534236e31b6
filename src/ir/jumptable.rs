//! Jump tables for indirect switch dispatch.

use crate::entity::Block;

/// Associates an ordered sequence of successor blocks with an indirect jump.
///
/// `nodes[k]` is the target block for case `k`. The optimizer never builds
/// or interprets case values; it only ever needs the set of blocks a jump
/// table can transfer control to, which must always equal the indirect
/// jump's block's `successors`.
#[derive(Debug, Clone, Default)]
pub struct JumpTable {
    pub nodes: Vec<Block>,
}

impl JumpTable {
    pub fn new(nodes: Vec<Block>) -> Self {
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Block> + '_ {
        self.nodes.iter().copied()
    }

    /// Replace every occurrence of `from` with `to`. Used by branch-target
    /// replacement (Clean rule R2) when an empty block is elided.
    pub fn replace(&mut self, from: Block, to: Block) {
        for node in &mut self.nodes {
            if *node == from {
                *node = to;
            }
        }
    }

    pub fn contains(&self, block: Block) -> bool {
        self.nodes.contains(&block)
    }
}
