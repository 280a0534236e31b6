//! Opaque entity references into the arenas owned by a [`crate::ir::Cfg`].
//!
//! Blocks and instructions form a mutually referencing graph. Rather than use
//! real Rust references (which would make the aliasing patterns in `combine`
//! and branch-target replacement impossible to express safely), every block
//! and instruction is addressed by a small `u32`-wrapping handle indexing
//! into a `PrimaryMap`. See `cranelift_entity` for the mapping types these
//! handles are used with.

use cranelift_entity::entity_impl;

/// A basic block handle. Stable for the lifetime of the [`crate::ir::Cfg`]
/// that created it, even after the block is removed from
/// [`crate::ir::Cfg::created_blocks`] — a removed block's data simply
/// becomes unreachable via any live successor/predecessor list.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Block(u32);
entity_impl!(Block, "block");

/// An instruction handle.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Inst(u32);
entity_impl!(Inst, "inst");

/// A function record handle (one per function-entry block's owning
/// function).
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Function(u32);
entity_impl!(Function, "fn");
