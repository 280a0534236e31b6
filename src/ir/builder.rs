//! Minimal hand-rolled CFG construction harness for tests and embedders,
//! the scaled-down moral equivalent of the teacher crate's `FuncCursor` +
//! `InstBuilder` pair. Only ever compiled under `#[cfg(test)]` or the
//! `testing` feature — this is not a front-end, just enough surface to
//! build a well-formed `Cfg` by hand.

use super::{
    BlockTerminalType, Cfg, Comparison, InstructionData, Operator, StatementType, Type, Variable,
};
use crate::entity::{Block, Function, Inst};

/// Builds a `Cfg` one block/instruction at a time. Each call to
/// [`CfgBuilder::function`] starts a new function and becomes the implicit
/// owner of every block created by [`CfgBuilder::block`] until the next
/// call to `function`.
pub struct CfgBuilder {
    cfg: Cfg,
    current_function: Option<Function>,
    next_temp: u32,
}

impl CfgBuilder {
    pub fn new() -> Self {
        Self {
            cfg: Cfg::new(),
            current_function: None,
            next_temp: 0,
        }
    }

    /// Start a new function, returning its (empty) entry block.
    pub fn function(&mut self, name: &str) -> Block {
        let (function, entry) = self.cfg.make_function(name.to_string());
        self.current_function = Some(function);
        entry
    }

    /// Create a new, empty block belonging to the function started by the
    /// most recent call to [`CfgBuilder::function`].
    pub fn block(&mut self) -> Block {
        let function = self
            .current_function
            .expect("CfgBuilder::block called before CfgBuilder::function");
        self.cfg.make_block(function)
    }

    /// A fresh compiler-generated temporary of the given type.
    pub fn new_temp(&mut self, ty: Type) -> Variable {
        let v = Variable::new_temp(self.next_temp, ty);
        self.next_temp += 1;
        v
    }

    // ---- terminators ---------------------------------------------------

    /// Append an unconditional jump `from -> to`.
    pub fn jump(&mut self, from: Block, to: Block) -> Inst {
        self.cfg.emit_jump(from, to, None, true, false)
    }

    /// Append a two-target conditional branch.
    pub fn cond_branch(
        &mut self,
        from: Block,
        cond: Variable,
        op: Operator,
        if_block: Block,
        else_block: Block,
    ) -> Inst {
        self.cfg
            .emit_cond_branch(from, cond, op, if_block, else_block, true, false)
    }

    /// Append a `ret` terminator.
    pub fn ret(&mut self, block: Block) -> Inst {
        let function = self.cfg.block(block).function;
        let data = InstructionData::new(StatementType::Ret, function, block);
        let inst = self.cfg.add_statement(block, data);
        self.cfg.block_mut(block).terminal_type = BlockTerminalType::Ret;
        inst
    }

    /// Append an indirect jump through a jump table listing `targets`.
    pub fn indirect_jump(&mut self, from: Block, addr: Variable, targets: Vec<Block>) -> Inst {
        self.cfg.emit_indirect_jump(from, addr, super::JumpTable::new(targets))
    }

    // ---- straight-line instructions -------------------------------------

    /// `assignee = op(op1, op2)`.
    pub fn assn(
        &mut self,
        block: Block,
        assignee: Variable,
        op: Operator,
        op1: Variable,
        op2: Option<Variable>,
    ) -> Inst {
        let function = self.cfg.block(block).function;
        let mut data = InstructionData::new(StatementType::Assn, function, block);
        data.assignee = Some(assignee);
        data.op = op;
        data.op1 = Some(op1);
        data.op2 = op2;
        self.cfg.add_statement(block, data)
    }

    /// `assignee = op(<constant>)`, i.e. no source-level operand variables.
    pub fn assn_const(&mut self, block: Block, assignee: Variable, op: Operator) -> Inst {
        let function = self.cfg.block(block).function;
        let mut data = InstructionData::new(StatementType::AssnConst, function, block);
        data.assignee = Some(assignee);
        data.op = op;
        self.cfg.add_statement(block, data)
    }

    /// A compound-boolean branch-ending instruction: `assignee = op1 <op>
    /// op2`, marked `is_branch_ending` so `pass::short_circuit` considers
    /// it, with `op` either a [`Comparison`] or a short-circuit connective.
    pub fn branch_ending(
        &mut self,
        block: Block,
        assignee: Variable,
        op: Operator,
        op1: Variable,
        op2: Option<Variable>,
    ) -> Inst {
        let inst = self.assn(block, assignee, op, op1, op2);
        self.cfg.inst_mut(inst).is_branch_ending = true;
        inst
    }

    /// `store *op1 = op2`.
    pub fn store(&mut self, block: Block, addr: Variable, value: Variable) -> Inst {
        let function = self.cfg.block(block).function;
        let mut data = InstructionData::new(StatementType::Store, function, block);
        data.op1 = Some(addr);
        data.op2 = Some(value);
        self.cfg.add_statement(block, data)
    }

    /// A `Phi` node selecting `parameters[k]` by incoming predecessor `k`.
    pub fn phi(&mut self, block: Block, assignee: Variable, parameters: Vec<Variable>) -> Inst {
        let function = self.cfg.block(block).function;
        let mut data = InstructionData::new(StatementType::Phi, function, block);
        data.assignee = Some(assignee);
        data.parameters = parameters.into();
        self.cfg.add_statement(block, data)
    }

    /// A direct call to a statically known function, with `parameters` as
    /// actual arguments.
    pub fn func_call(&mut self, block: Block, assignee: Option<Variable>, parameters: Vec<Variable>) -> Inst {
        let function = self.cfg.block(block).function;
        let mut data = InstructionData::new(StatementType::FuncCall, function, block);
        data.assignee = assignee;
        data.parameters = parameters.into();
        self.cfg.add_statement(block, data)
    }

    /// A user-requested no-op that must survive optimization.
    pub fn idle(&mut self, block: Block) -> Inst {
        let function = self.cfg.block(block).function;
        let data = InstructionData::new(StatementType::Idle, function, block);
        self.cfg.add_statement(block, data)
    }

    /// Convenience for constructing an `icmp`-shaped comparison.
    pub fn cmp(&mut self, block: Block, assignee: Variable, cmp: Comparison, op1: Variable, op2: Variable) -> Inst {
        self.assn(block, assignee, Operator::Cmp(cmp), op1, Some(op2))
    }

    pub fn cfg(&self) -> &Cfg {
        &self.cfg
    }

    pub fn cfg_mut(&mut self) -> &mut Cfg {
        &mut self.cfg
    }

    pub fn finish(self) -> Cfg {
        self.cfg
    }
}

impl Default for CfgBuilder {
    fn default() -> Self {
        Self::new()
    }
}
