//! Three-address-code instructions.

use smallvec::SmallVec;

use super::operator::Operator;
use super::variable::Variable;
use crate::entity::{Block, Function, Inst};

/// The closed set of instruction shapes the optimizer understands.
///
/// This is deliberately closed (no "other" catch-all): every pass in this
/// crate matches exhaustively on `StatementType`, so adding a new statement
/// shape is a compile error everywhere it needs handling, not a silent gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementType {
    /// Function return.
    Ret,
    /// Opaque inline assembly, never considered dead.
    AsmInline,
    /// Direct call to a statically known function.
    FuncCall,
    /// Call through a function pointer held in `op1`.
    IndirectFuncCall,
    /// User-requested no-op that must survive optimization.
    Idle,
    /// Store `op2` to the address in `op1`.
    Store,
    /// Store an immediate to the address in `op1`.
    StoreConst,
    /// `assignee = op(op1, op2)`.
    Assn,
    /// `assignee = op(op1, <constant>)`.
    AssnConst,
    /// SSA phi node selecting `parameters[k]` by incoming predecessor `k`.
    Phi,
    /// Two-way conditional branch to `if_block`/`else_block`.
    CondBranch,
    /// Unconditional jump to `if_block`.
    Jmp,
    /// A single-target conditional jump with implicit fallthrough to the
    /// next instruction in the same block if the condition does not hold.
    /// Only ever produced by the short-circuit rewrite: its target is
    /// always already one of the block's two pre-existing successors, so
    /// unlike `CondBranch` it never changes `successors` on its own and is
    /// legal to appear mid-block rather than only as a block's terminator.
    CondJmp,
    /// Indirect jump through a jump table.
    IndirectJmp,
    /// Computes the address used by a following `IndirectJmp`.
    IndirectJmpAddr,
}

impl StatementType {
    pub fn is_unconditional_jump(self) -> bool {
        matches!(self, StatementType::Jmp)
    }

    pub fn is_conditional_branch(self) -> bool {
        matches!(self, StatementType::CondBranch)
    }

    pub fn is_cond_jmp(self) -> bool {
        matches!(self, StatementType::CondJmp)
    }

    pub fn is_indirect_jump(self) -> bool {
        matches!(self, StatementType::IndirectJmp)
    }

    pub fn is_branch_target_bearing(self) -> bool {
        matches!(
            self,
            StatementType::CondBranch | StatementType::Jmp | StatementType::IndirectJmp
        )
    }

    pub fn is_call(self) -> bool {
        matches!(self, StatementType::FuncCall | StatementType::IndirectFuncCall)
    }
}

/// A single three-address-code instruction.
///
/// Instructions live in a doubly-linked list per block (`prev`/`next`),
/// which is how a block's `leader`/`exit` pair denotes "empty" (both
/// `None`) without a sentinel node.
#[derive(Debug, Clone)]
pub struct InstructionData {
    pub statement_type: StatementType,
    pub op: Operator,
    pub assignee: Option<Variable>,
    pub op1: Option<Variable>,
    pub op2: Option<Variable>,
    /// Actual arguments (calls) or phi incoming values (phi), in
    /// predecessor/parameter order.
    pub parameters: SmallVec<[Variable; 4]>,
    pub if_block: Option<Block>,
    pub else_block: Option<Block>,
    /// Swaps the sense of a synthesized conditional jump during
    /// short-circuit rewriting; meaningless outside that pass.
    pub inverse_jump: bool,
    pub mark: bool,
    /// Set on instructions that terminate evaluation of a compound boolean
    /// expression feeding a branch — the short-circuit rewrite only looks
    /// at instructions with this flag set when scanning backward from a
    /// conditional branch.
    pub is_branch_ending: bool,
    pub function: Function,
    pub block: Block,
    pub prev: Option<Inst>,
    pub next: Option<Inst>,
}

impl InstructionData {
    pub fn new(
        statement_type: StatementType,
        function: Function,
        block: Block,
    ) -> Self {
        Self {
            statement_type,
            op: Operator::Move,
            assignee: None,
            op1: None,
            op2: None,
            parameters: SmallVec::new(),
            if_block: None,
            else_block: None,
            inverse_jump: false,
            mark: false,
            is_branch_ending: false,
            function,
            block,
            prev: None,
            next: None,
        }
    }

    /// Every three-address variable *used* by this instruction (not
    /// defined). Does not include phi parameters or call arguments, which
    /// live in `parameters`.
    pub fn operands(&self) -> impl Iterator<Item = Variable> + '_ {
        self.op1.into_iter().chain(self.op2)
    }
}
