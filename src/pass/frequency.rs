//! Frequency estimate — step 7 of the pipeline.

use crate::ir::{BlockTerminalType, Cfg};

/// For each non-`Ret` block with at least one predecessor, in
/// `created_blocks` creation order, raise its estimated execution
/// frequency to the (floor) mean of its predecessors' frequencies if that
/// mean is higher. Single forward pass, no fixed point: later blocks see
/// already-updated predecessor values, matching forward-propagating
/// fixed-point-free frequency estimators.
pub fn estimate(cfg: &mut Cfg) {
    for block in cfg.created_blocks().to_vec() {
        if cfg.block(block).terminal_type == BlockTerminalType::Ret {
            continue;
        }
        let predecessors = cfg.block(block).predecessors.clone();
        if predecessors.is_empty() {
            continue;
        }
        let sum: u64 = predecessors
            .iter()
            .map(|&p| cfg.block(p).estimated_execution_frequency)
            .sum();
        let mean = sum / predecessors.len() as u64;
        if mean > cfg.block(block).estimated_execution_frequency {
            cfg.block_mut(block).estimated_execution_frequency = mean;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::CfgBuilder;

    #[test]
    fn propagates_mean_of_predecessors() {
        let mut b = CfgBuilder::new();
        let entry = b.function("f");
        let a = b.block();
        let c = b.block();
        let merge = b.block();
        b.jump(entry, a);
        b.jump(entry, c);
        b.jump(a, merge);
        b.jump(c, merge);
        b.ret(merge);
        let mut cfg = b.finish();

        cfg.block_mut(a).estimated_execution_frequency = 10;
        cfg.block_mut(c).estimated_execution_frequency = 20;

        estimate(&mut cfg);

        assert_eq!(cfg.block(merge).estimated_execution_frequency, 15);
    }
}
