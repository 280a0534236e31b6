//! Unreachable-block removal — step 5 of the pipeline.

use crate::ir::{BlockType, Cfg};

/// Drop every non-entry block with no predecessors. Iterates a snapshot of
/// `created_blocks` since the loop body mutates it.
pub fn remove_unreachable(cfg: &mut Cfg) {
    for block in cfg.created_blocks().to_vec() {
        if cfg.block(block).block_type == BlockType::FuncEntry {
            continue;
        }
        if cfg.block(block).predecessors.is_empty() {
            log::trace!(target: "unreachable", "dropping unreachable block {:?}", block);
            for succ in cfg.block(block).successors.clone() {
                cfg.delete_successor(block, succ);
            }
            cfg.remove_block(block);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::CfgBuilder;

    #[test]
    fn drops_block_with_no_predecessors() {
        let mut b = CfgBuilder::new();
        let entry = b.function("f");
        let reachable = b.block();
        let orphan = b.block();
        b.jump(entry, reachable);
        b.ret(reachable);
        b.ret(orphan);
        let mut cfg = b.finish();

        remove_unreachable(&mut cfg);

        assert!(cfg.created_blocks().contains(&reachable));
        assert!(!cfg.created_blocks().contains(&orphan));
    }

    #[test]
    fn keeps_func_entry_even_with_no_predecessors() {
        let mut b = CfgBuilder::new();
        let entry = b.function("f");
        b.ret(entry);
        let mut cfg = b.finish();

        remove_unreachable(&mut cfg);

        assert!(cfg.created_blocks().contains(&entry));
    }
}
