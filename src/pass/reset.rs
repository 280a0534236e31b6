//! Visitation reset — step 1 of the pipeline.

use crate::ir::Cfg;

/// Clear every block's `visited` scratch flag. Run at the start of every
/// pipeline invocation so the BFS helpers Sweep and Clean use (which reuse
/// this flag rather than allocating their own `FxHashSet` each call) start
/// from a known state.
pub fn reset_visited(cfg: &mut Cfg) {
    for &block in cfg.created_blocks() {
        cfg.block_mut(block).visited = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::CfgBuilder;

    #[test]
    fn clears_visited_flags() {
        let mut b = CfgBuilder::new();
        let entry = b.function("f");
        b.ret(entry);
        let mut cfg = b.finish();
        cfg.block_mut(entry).visited = true;
        reset_visited(&mut cfg);
        assert!(!cfg.block(entry).visited);
    }
}
