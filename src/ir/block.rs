//! Basic blocks.

use rustc_hash::FxHashSet;

use super::jumptable::JumpTable;
use crate::entity::{Block, Function, Inst};

/// Kind of block, preserved across every rewrite for `FuncEntry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    FuncEntry,
    Plain,
    LoopHeader,
    SwitchDispatch,
}

/// The shape of a block's terminator, tracked redundantly alongside the
/// exit instruction's `StatementType` so that `combine` can propagate it
/// without re-deriving it from the (possibly just-spliced) instruction
/// list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTerminalType {
    Ret,
    Jmp,
    CondBranch,
    IndirectJmp,
    /// Newly created or not-yet-terminated block.
    Unterminated,
}

/// A basic block: a doubly-linked instruction list plus the dominance and
/// frequency bookkeeping the optimizer maintains on it.
#[derive(Debug, Clone)]
pub struct BlockData {
    pub leader: Option<Inst>,
    pub exit: Option<Inst>,

    pub predecessors: Vec<Block>,
    pub successors: Vec<Block>,

    pub dominators: FxHashSet<Block>,
    pub postdominators: FxHashSet<Block>,
    pub idom: Option<Block>,
    pub ipdom: Option<Block>,
    pub dominator_children: Vec<Block>,
    pub dominance_frontier: FxHashSet<Block>,
    pub reverse_dominance_frontier: FxHashSet<Block>,

    pub function: Function,
    pub block_type: BlockType,
    pub terminal_type: BlockTerminalType,
    pub jump_table: Option<JumpTable>,

    pub estimated_execution_frequency: u64,

    pub contains_mark: bool,
    pub visited: bool,
}

impl BlockData {
    pub fn new(function: Function, block_type: BlockType) -> Self {
        Self {
            leader: None,
            exit: None,
            predecessors: Vec::new(),
            successors: Vec::new(),
            dominators: FxHashSet::default(),
            postdominators: FxHashSet::default(),
            idom: None,
            ipdom: None,
            dominator_children: Vec::new(),
            dominance_frontier: FxHashSet::default(),
            reverse_dominance_frontier: FxHashSet::default(),
            function,
            block_type,
            terminal_type: BlockTerminalType::Unterminated,
            jump_table: None,
            estimated_execution_frequency: if block_type == BlockType::FuncEntry { 1 } else { 0 },
            contains_mark: false,
            visited: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.leader.is_none()
    }

    pub fn is_func_entry(&self) -> bool {
        self.block_type == BlockType::FuncEntry
    }

    /// Clear every dominance-related field. Used by the dominance rebuild
    /// pass before recomputation.
    pub fn clear_dominance_info(&mut self) {
        self.dominators.clear();
        self.postdominators.clear();
        self.idom = None;
        self.ipdom = None;
        self.dominator_children.clear();
        self.dominance_frontier.clear();
        self.reverse_dominance_frontier.clear();
    }
}
