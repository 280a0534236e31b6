//! The top-level `Cfg`: every block and instruction ever created, the
//! per-function entry points, and the interned local constants.

use cranelift_entity::PrimaryMap;

use super::block::{BlockData, BlockTerminalType, BlockType};
use super::function::FunctionData;
use super::instruction::{InstructionData, StatementType};
use super::local_constants::LocalConstants;
use super::operator::Operator;
use super::variable::Variable;
use crate::entity::{Block, Function, Inst};

/// Owns every block and instruction arena for a compilation unit, plus the
/// per-function entry list and interned local constants.
///
/// Blocks and instructions are never physically deallocated: `blocks`/
/// `insts` are append-only arenas (mirroring the teacher crate's
/// `DataFlowGraph`, which never shrinks either). "Deleting" a block means
/// removing it from `created_blocks`; "deleting" an instruction means
/// unlinking it from its block's doubly-linked list. Both leave the
/// `PrimaryMap` slot allocated but unreachable from any live block.
pub struct Cfg {
    blocks: PrimaryMap<Block, BlockData>,
    insts: PrimaryMap<Inst, InstructionData>,
    functions: PrimaryMap<Function, FunctionData>,

    /// Every block currently considered part of the CFG, in creation
    /// order. Sweep and dominance-rebuild iterate this order; Clean and
    /// unreachable-block removal delete from it.
    created_blocks: Vec<Block>,

    /// One entry per function, in function-creation order.
    function_entry_blocks: Vec<Block>,

    pub local_constants: LocalConstants,
}

impl Cfg {
    pub fn new() -> Self {
        Self {
            blocks: PrimaryMap::new(),
            insts: PrimaryMap::new(),
            functions: PrimaryMap::new(),
            created_blocks: Vec::new(),
            function_entry_blocks: Vec::new(),
            local_constants: LocalConstants::new(),
        }
    }

    // ---- accessors -------------------------------------------------

    pub fn block(&self, b: Block) -> &BlockData {
        &self.blocks[b]
    }

    pub fn block_mut(&mut self, b: Block) -> &mut BlockData {
        &mut self.blocks[b]
    }

    pub fn inst(&self, i: Inst) -> &InstructionData {
        &self.insts[i]
    }

    pub fn inst_mut(&mut self, i: Inst) -> &mut InstructionData {
        &mut self.insts[i]
    }

    pub fn function_data(&self, f: Function) -> &FunctionData {
        &self.functions[f]
    }

    pub fn created_blocks(&self) -> &[Block] {
        &self.created_blocks
    }

    pub fn function_entry_blocks(&self) -> &[Block] {
        &self.function_entry_blocks
    }

    pub fn functions(&self) -> impl Iterator<Item = Function> + '_ {
        self.functions.keys()
    }

    /// All blocks belonging to `function`, restricted to those still
    /// present in `created_blocks`.
    pub fn blocks_of(&self, function: Function) -> impl Iterator<Item = Block> + '_ {
        self.created_blocks
            .iter()
            .copied()
            .filter(move |&b| self.blocks[b].function == function)
    }

    // ---- construction ------------------------------------------------

    /// Create a new function and its (empty) entry block.
    pub fn make_function(&mut self, name: impl Into<String>) -> (Function, Block) {
        let entry_block = self.blocks.next_key();
        let func = self.functions.push(FunctionData::new(name, entry_block));
        let created = self.blocks.push(BlockData::new(func, BlockType::FuncEntry));
        debug_assert_eq!(created, entry_block);
        self.created_blocks.push(entry_block);
        self.function_entry_blocks.push(entry_block);
        (func, entry_block)
    }

    /// Create a new, empty, non-entry block belonging to `function`.
    pub fn make_block(&mut self, function: Function) -> Block {
        let block = self.blocks.push(BlockData::new(function, BlockType::Plain));
        self.created_blocks.push(block);
        block
    }

    // ---- instruction list management ---------------------------------

    /// Append `data` to the tail of `block`'s instruction list, returning
    /// its handle. This is the sole way new instructions enter a block;
    /// every pass that synthesizes a jump goes through this.
    pub fn add_statement(&mut self, block: Block, data: InstructionData) -> Inst {
        let inst = self.insts.push(data);
        self.insts[inst].block = block;
        let prev_exit = self.blocks[block].exit;
        self.insts[inst].prev = prev_exit;
        self.insts[inst].next = None;
        if let Some(prev_exit) = prev_exit {
            self.insts[prev_exit].next = Some(inst);
        } else {
            self.blocks[block].leader = Some(inst);
        }
        self.blocks[block].exit = Some(inst);
        inst
    }

    /// Bookkeeping hook mirroring the distilled spec's external interface
    /// of the same name. This crate does not maintain a cached per-block
    /// use set — `pass::mark`'s definition lookup rescans each block's
    /// instruction list directly rather than consulting one — so this is
    /// an intentional no-op extension point for embedders that do want to
    /// track one.
    #[inline]
    pub fn add_used_variable(&mut self, _block: Block, _var: Variable) {}

    /// See [`Cfg::add_used_variable`].
    #[inline]
    pub fn add_assigned_variable(&mut self, _block: Block, _var: Variable) {}

    /// Unlink and release `inst` from its block's instruction list.
    pub fn delete_statement(&mut self, inst: Inst) {
        let block = self.insts[inst].block;
        let prev = self.insts[inst].prev;
        let next = self.insts[inst].next;
        match prev {
            Some(p) => self.insts[p].next = next,
            None => self.blocks[block].leader = next,
        }
        match next {
            Some(n) => self.insts[n].prev = prev,
            None => self.blocks[block].exit = prev,
        }
    }

    /// Deep-copy `inst`'s data (not its linked-list position) into a new,
    /// unattached instruction. Used by Clean's branch-hoist (R4) and the
    /// short-circuit rewrite, both of which need to relocate an
    /// instruction's *content* into a different block without aliasing the
    /// original.
    pub fn copy_instruction(&mut self, inst: Inst) -> InstructionData {
        let mut copy = self.insts[inst].clone();
        copy.prev = None;
        copy.next = None;
        copy
    }

    /// Iterate `block`'s instructions from leader to exit.
    pub fn instructions(&self, block: Block) -> InstIter<'_> {
        InstIter {
            cfg: self,
            next: self.blocks[block].leader,
        }
    }

    /// Iterate `block`'s instructions from exit to leader.
    pub fn instructions_rev(&self, block: Block) -> InstIterRev<'_> {
        InstIterRev {
            cfg: self,
            next: self.blocks[block].exit,
        }
    }

    // ---- edge management -----------------------------------------------

    /// Add the `a -> b` edge, maintaining both `a.successors` and
    /// `b.predecessors`.
    pub fn add_successor(&mut self, a: Block, b: Block) {
        self.add_successor_only(a, b);
        if !self.blocks[b].predecessors.contains(&a) {
            self.blocks[b].predecessors.push(a);
        }
    }

    /// Add the `a -> b` edge to `a.successors` only, leaving `b`'s
    /// predecessor list untouched. Used when the caller is about to fix up
    /// predecessors in bulk itself (branch-target replacement does this).
    pub fn add_successor_only(&mut self, a: Block, b: Block) {
        if !self.blocks[a].successors.contains(&b) {
            self.blocks[a].successors.push(b);
        }
    }

    /// Remove the `a -> b` edge from both sides.
    pub fn delete_successor(&mut self, a: Block, b: Block) {
        self.blocks[a].successors.retain(|&s| s != b);
        self.blocks[b].predecessors.retain(|&p| p != a);
    }

    /// Construct a free-standing, unattached unconditional jump instruction
    /// targeting `to`. Does not touch any block's instruction list or
    /// successor set — callers splice it in with `add_statement` and wire
    /// up the edge themselves, or use [`Cfg::emit_jump`].
    pub fn emit_jmp_instruction(&self, function: Function, block: Block, to: Block) -> InstructionData {
        let mut data = InstructionData::new(StatementType::Jmp, function, block);
        data.if_block = Some(to);
        data
    }

    /// Append an unconditional jump, or a single-target conditional jump
    /// with implicit fallthrough, to the tail of `from`, updating
    /// successors. `cond.is_some()` produces a [`StatementType::CondJmp`]
    /// (used by `pass::short_circuit`); `cond.is_none()` produces a plain
    /// [`StatementType::Jmp`] and sets `from`'s terminal type, matching the
    /// uses Sweep and Clean make of this helper.
    pub fn emit_jump(
        &mut self,
        from: Block,
        to: Block,
        cond: Option<(Variable, Operator)>,
        is_branch_ending: bool,
        inverse: bool,
    ) -> Inst {
        let function = self.blocks[from].function;
        let conditional = cond.is_some();
        let mut data = InstructionData::new(
            if conditional {
                StatementType::CondJmp
            } else {
                StatementType::Jmp
            },
            function,
            from,
        );
        if let Some((var, op)) = cond {
            data.op1 = Some(var);
            data.op = op;
        }
        data.if_block = Some(to);
        data.inverse_jump = inverse;
        data.is_branch_ending = is_branch_ending;
        let inst = self.add_statement(from, data);
        self.add_successor(from, to);
        if !conditional {
            self.blocks[from].terminal_type = BlockTerminalType::Jmp;
        }
        inst
    }

    /// Insert a freshly constructed instruction immediately after `after`
    /// in `after`'s block, without touching any successor/predecessor
    /// edge. Used by the short-circuit rewrite to place an early-exit
    /// `CondJmp` right after the comparison that feeds it, preserving
    /// evaluation order of any side-effecting sub-expressions.
    pub fn insert_after(&mut self, after: Inst, mut data: InstructionData) -> Inst {
        let block = self.insts[after].block;
        data.block = block;
        let old_next = self.insts[after].next;
        let inst = self.insts.push(data);
        self.insts[inst].prev = Some(after);
        self.insts[inst].next = old_next;
        self.insts[after].next = Some(inst);
        match old_next {
            Some(n) => self.insts[n].prev = Some(inst),
            None => self.blocks[block].exit = Some(inst),
        }
        inst
    }

    /// Append a conditional branch with two distinct targets.
    pub fn emit_cond_branch(
        &mut self,
        from: Block,
        cond: Variable,
        op: Operator,
        if_block: Block,
        else_block: Block,
        is_branch_ending: bool,
        inverse: bool,
    ) -> Inst {
        let function = self.blocks[from].function;
        let mut data = InstructionData::new(StatementType::CondBranch, function, from);
        data.op1 = Some(cond);
        data.op = op;
        data.if_block = Some(if_block);
        data.else_block = Some(else_block);
        data.inverse_jump = inverse;
        data.is_branch_ending = is_branch_ending;
        let inst = self.add_statement(from, data);
        self.add_successor(from, if_block);
        self.add_successor(from, else_block);
        self.blocks[from].terminal_type = BlockTerminalType::CondBranch;
        inst
    }

    /// Append an indirect jump through `table`, wiring up one successor
    /// edge per table entry and installing `table` as `from`'s jump table.
    pub fn emit_indirect_jump(&mut self, from: Block, addr: Variable, table: super::jumptable::JumpTable) -> Inst {
        let function = self.blocks[from].function;
        let mut data = InstructionData::new(StatementType::IndirectJmp, function, from);
        data.op1 = Some(addr);
        let targets = table.nodes.clone();
        self.blocks[from].jump_table = Some(table);
        let inst = self.add_statement(from, data);
        for target in targets {
            self.add_successor(from, target);
        }
        self.blocks[from].terminal_type = BlockTerminalType::IndirectJmp;
        inst
    }

    /// Remove `block` from `created_blocks`. Does not touch edges; callers
    /// are expected to have already deleted every edge referencing it.
    pub fn remove_block(&mut self, block: Block) {
        self.created_blocks.retain(|&b| b != block);
    }
}

impl Default for Cfg {
    fn default() -> Self {
        Self::new()
    }
}

pub struct InstIter<'a> {
    cfg: &'a Cfg,
    next: Option<Inst>,
}

impl<'a> Iterator for InstIter<'a> {
    type Item = Inst;

    fn next(&mut self) -> Option<Inst> {
        let cur = self.next?;
        self.next = self.cfg.insts[cur].next;
        Some(cur)
    }
}

pub struct InstIterRev<'a> {
    cfg: &'a Cfg,
    next: Option<Inst>,
}

impl<'a> Iterator for InstIterRev<'a> {
    type Item = Inst;

    fn next(&mut self) -> Option<Inst> {
        let cur = self.next?;
        self.next = self.cfg.insts[cur].prev;
        Some(cur)
    }
}
