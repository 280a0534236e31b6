//! Errors reported by the opt-in checked entry point.

use thiserror::Error;

use crate::entity::Block;

/// The first CFG invariant `verify` found violated.
///
/// `optimize` itself never returns this — see the crate root docs. It
/// exists for `optimize_checked` and the test suite, mirroring how the
/// teacher crate's own verifier reports the first broken invariant rather
/// than accumulating every one.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("block {0:?} appears in its successor's predecessor list but not vice versa")]
    AsymmetricSuccessorEdge(Block),

    #[error("block {0:?} appears in its predecessor's successor list but not vice versa")]
    AsymmetricPredecessorEdge(Block),

    #[error("block {block:?} has terminal type {terminal:?} but {count} successors")]
    TerminatorSuccessorMismatch {
        block: Block,
        terminal: &'static str,
        count: usize,
    },

    #[error("block {0:?} has no exit instruction but is not empty")]
    DanglingInstructionList(Block),

    #[error("variable used in block {0:?} has no reaching definition in its function")]
    UndefinedVariable(Block),

    #[error("variable is defined more than once in its function")]
    DuplicateDefinition,

    #[error("function-entry block {0:?} lost its FuncEntry block type")]
    EntryBlockTypeChanged(Block),
}
