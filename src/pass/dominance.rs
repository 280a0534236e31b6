//! Dominance rebuild — step 6 of the pipeline.
//!
//! Thin wrapper around [`crate::control_relations::recompute`] that runs it
//! for every function still present in the CFG, after Clean and
//! unreachable-block removal have settled the block set.

use crate::control_relations::recompute;
use crate::ir::Cfg;

pub fn rebuild(cfg: &mut Cfg) {
    for function in cfg.functions().collect::<Vec<_>>() {
        let entry = cfg.function_data(function).entry;
        if !cfg.created_blocks().contains(&entry) {
            continue;
        }
        log::debug!(target: "dominance", "rebuilding dominance for {:?}", function);
        recompute(cfg, entry);
    }
}
