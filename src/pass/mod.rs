//! The optimizer's pipeline passes, run in order by [`crate::optimize`].

pub mod clean;
pub mod dominance;
pub mod frequency;
pub mod mark;
pub mod reset;
pub mod short_circuit;
pub mod sweep;
pub mod unreachable;
