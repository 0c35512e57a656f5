//! CFG edge utilities used while constructing a [`Function`](crate::Function).

use rustc_hash::FxHashSet;

use crate::{raw_id, BasicBlock, BlockId};

/// Compute the predecessor list for each block (deduplicated).
///
/// Returns a vector indexed by block index, where each entry lists the
/// distinct predecessors in ascending block order. Successor IDs must
/// already be in range.
pub(crate) fn compute_predecessors(blocks: &[BasicBlock]) -> Vec<Vec<BlockId>> {
    let mut predecessors: Vec<Vec<BlockId>> = vec![Vec::new(); blocks.len()];

    for (block_idx, block) in blocks.iter().enumerate() {
        let mut seen = FxHashSet::default();
        for succ in block.terminator.successors() {
            if seen.insert(succ) {
                predecessors[succ.index()].push(BlockId::new(raw_id(block_idx)));
            }
        }
    }

    predecessors
}

/// Find the first terminator edge that leaves the block arena.
///
/// Returns `(block_index, target)` for the offending edge.
pub(crate) fn find_dangling_edge(blocks: &[BasicBlock]) -> Option<(usize, BlockId)> {
    blocks.iter().enumerate().find_map(|(block_idx, block)| {
        block
            .terminator
            .successors()
            .into_iter()
            .find(|succ| succ.index() >= blocks.len())
            .map(|succ| (block_idx, succ))
    })
}
