//! Middle-end SSA control-flow-graph optimizer.
//!
//! Consumes a [`Cfg`](ir::Cfg) in SSA form and produces a semantically
//! equivalent one with unreachable and non-effectful code removed,
//! redundant control flow collapsed, dominance relations recomputed, and
//! block execution frequencies re-estimated. [`optimize`] assumes a
//! well-formed CFG and SSA on entry and is documented as infallible;
//! [`optimize_checked`] wraps it with the invariant verifier for callers
//! that want a reported error instead of a panic on a malformed input.

pub mod config;
pub mod control_relations;
pub mod entity;
pub mod error;
pub mod ir;
mod pass;
pub mod verify;

pub use config::Options;
pub use error::VerifyError;
pub use ir::Cfg;

/// Run the full pipeline over `cfg` and return it, rewritten in place.
///
/// Infallible over a well-formed CFG: malformed input (broken SSA, a
/// dangling successor edge) is a caller bug and surfaces as a panic via
/// `debug_assert!`/`unreachable!()` deep in a pass, not a `Result`. Use
/// [`optimize_checked`] to get a `Result` instead.
pub fn optimize(mut cfg: Cfg, options: &Options) -> Cfg {
    if options.verify {
        verify::verify(&cfg).expect("optimize: precondition violated on entry");
    }

    // Sweep's nearest-marked-postdominator search (§4.2) consults whatever
    // postdominance info the CFG already carries; a fresh `Cfg` built by an
    // embedder or test harness has none, so seed it here. The pipeline's
    // own dominance-rebuild step (below) still re-derives it from scratch
    // after Clean and unreachable-block removal, exactly as documented.
    for function in cfg.functions().collect::<Vec<_>>() {
        let entry = cfg.function_data(function).entry;
        control_relations::recompute(&mut cfg, entry);
    }

    pass::reset::reset_visited(&mut cfg);
    pass::mark::mark(&mut cfg);
    pass::sweep::sweep(&mut cfg);
    pass::clean::clean(&mut cfg);
    pass::unreachable::remove_unreachable(&mut cfg);
    pass::dominance::rebuild(&mut cfg);
    pass::frequency::estimate(&mut cfg);

    if options.short_circuit {
        pass::short_circuit::rewrite(&mut cfg);
    }

    if options.verify {
        verify::verify(&cfg).expect("optimize: postcondition violated on exit");
    }

    cfg
}

/// [`optimize`], but reporting the first violated invariant via
/// [`VerifyError`] instead of panicking, both before and after the
/// pipeline runs.
pub fn optimize_checked(cfg: Cfg, options: &Options) -> Result<Cfg, VerifyError> {
    verify::verify(&cfg)?;

    let mut checked_options = *options;
    checked_options.verify = false;
    let cfg = optimize(cfg, &checked_options);

    verify::verify(&cfg)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::CfgBuilder;
    use crate::ir::{Comparison, Operator, Type};

    #[test]
    fn dead_store_is_removed_end_to_end() {
        let mut b = CfgBuilder::new();
        let entry = b.function("f");
        let dead = b.new_temp(Type::I32);
        b.assn_const(entry, dead, Operator::Move);
        b.ret(entry);
        let cfg = b.finish();

        let cfg = optimize(cfg, &Options::new());

        assert!(cfg.instructions(entry).count() == 1, "only ret should survive");
    }

    #[test]
    fn empty_pass_through_is_elided_end_to_end() {
        let mut b = CfgBuilder::new();
        let entry = b.function("f");
        let empty = b.block();
        let target = b.block();
        b.jump(entry, empty);
        b.jump(empty, target);
        b.ret(target);
        let cfg = b.finish();

        let cfg = optimize(cfg, &Options::new());

        assert!(!cfg.created_blocks().contains(&empty));
    }

    #[test]
    fn unreachable_block_is_dropped_end_to_end() {
        let mut b = CfgBuilder::new();
        let entry = b.function("f");
        let orphan = b.block();
        b.ret(entry);
        b.ret(orphan);
        let cfg = b.finish();

        let cfg = optimize(cfg, &Options::new());

        assert!(!cfg.created_blocks().contains(&orphan));
    }

    #[test]
    fn identical_targets_collapse_to_jump_end_to_end() {
        let mut b = CfgBuilder::new();
        let entry = b.function("f");
        let join = b.block();
        let cond = b.new_temp(Type::Bool);
        let x = b.new_temp(Type::I32);
        let y = b.new_temp(Type::I32);
        b.cmp(entry, cond, Comparison::Eq, x, y);
        b.cond_branch(entry, cond, Operator::Cmp(Comparison::Eq), join, join);
        b.ret(join);
        let cfg = b.finish();

        let cfg = optimize(cfg, &Options::new());

        let exit = cfg.block(entry).exit.unwrap();
        assert_eq!(cfg.inst(exit).statement_type, crate::ir::StatementType::Ret);
    }

    #[test]
    fn optimize_checked_reports_asymmetric_edge() {
        let mut b = CfgBuilder::new();
        let entry = b.function("f");
        b.ret(entry);
        let mut cfg = b.finish();
        let other = cfg.make_block(cfg.functions().next().unwrap());
        cfg.block_mut(entry).successors.push(other);

        let result = optimize_checked(cfg, &Options::new());
        assert!(result.is_err());
    }
}
