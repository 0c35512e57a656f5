//! Backward dataflow liveness of named memory locations.
//!
//! Computes, for every basic block `B`:
//!
//! - `UEVar(B)`: names read in `B` before any write to them in `B`;
//! - `VarKill(B)`: names written anywhere in `B`;
//! - `LiveOut(B)`: names that may be read along some path leaving `B`
//!   before being overwritten.
//!
//! # Algorithm
//!
//! 1. **Local scan** (forward, per block). A load from a named location
//!    adds the name to `UEVar` unless the name was already stored to
//!    *earlier in the same block*; a store adds it to `VarKill`. The
//!    suppression test uses the running kill set, not the final one, so
//!    `load x; store x` exposes `x` while `store x; load x` does not.
//! 2. **Worklist fixpoint** (backward). Every `LiveOut` starts empty and
//!    every block starts on the worklist. Popping `B` recomputes
//!
//!    `LiveOut(B) = ∪ UEVar(S) ∪ (LiveOut(S) - VarKill(S))` over successors `S`
//!
//!    and, if it changed, re-queues the predecessors of `B`.
//!
//! `LiveOut` only grows, and is bounded by the finite set of names in the
//! function, so the loop performs at most `|blocks| × |names|` updates.
//! Self loops need no special casing.
//!
//! Unnamed locations have no stable identity across the textual report and
//! are excluded from every set.
//!
//! # References
//!
//! - Cooper & Torczon: "Engineering a Compiler", live-variable analysis
//! - Appel: "Modern Compiler Implementation" §10.1 (dataflow analysis)

use rustc_hash::FxHashSet;

use flow_ir::{BasicBlock, BlockId, Function, Instr};

/// Set of location names. Borrows the names from the analyzed function.
pub type NameSet<'f> = FxHashSet<&'f str>;

/// Liveness sets for one basic block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockLiveness<'f> {
    /// Names read before any write within the block.
    pub ue_var: NameSet<'f>,
    /// Names written anywhere in the block.
    pub var_kill: NameSet<'f>,
    /// Names live on exit from the block.
    pub live_out: NameSet<'f>,
}

impl<'f> BlockLiveness<'f> {
    /// Names live on entry: `UEVar ∪ (LiveOut - VarKill)`.
    ///
    /// This is exactly what the block contributes to each predecessor's
    /// `LiveOut`.
    pub fn live_in(&self) -> NameSet<'f> {
        let mut live_in = self.ue_var.clone();
        live_in.extend(
            self.live_out
                .iter()
                .copied()
                .filter(|name| !self.var_kill.contains(name)),
        );
        live_in
    }
}

/// Work counters from the fixpoint loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LivenessStats {
    /// Blocks popped from the worklist.
    pub block_visits: usize,
    /// Pops that changed a block's `LiveOut`.
    pub updates: usize,
}

/// Liveness for every block of a function, indexed by [`BlockId`].
#[derive(Clone, Debug)]
pub struct Liveness<'f> {
    blocks: Vec<BlockLiveness<'f>>,
    stats: LivenessStats,
}

impl<'f> Liveness<'f> {
    /// Sets for one block.
    pub fn block(&self, id: BlockId) -> &BlockLiveness<'f> {
        &self.blocks[id.index()]
    }

    /// All blocks in function order.
    pub fn blocks(&self) -> &[BlockLiveness<'f>] {
        &self.blocks
    }

    pub fn stats(&self) -> LivenessStats {
        self.stats
    }
}

/// Compute `UEVar`, `VarKill` and `LiveOut` for every block in `func`.
pub fn compute_liveness(func: &Function) -> Liveness<'_> {
    let num_blocks = func.blocks().len();

    tracing::debug!(function = func.name(), num_blocks, "computing liveness");

    // Step 1: block-local sets. LiveOut starts empty.
    let mut blocks: Vec<BlockLiveness<'_>> = func
        .blocks()
        .iter()
        .map(|block| scan_block(func, block))
        .collect();

    // Step 2: worklist fixpoint. Seeded with every block and popped from
    // the back, so the last block is visited first. `queued` keeps each
    // block on the worklist at most once.
    let mut worklist: Vec<BlockId> = func.blocks().iter().map(BasicBlock::id).collect();
    let mut queued = vec![true; num_blocks];
    let mut stats = LivenessStats::default();

    while let Some(id) = worklist.pop() {
        queued[id.index()] = false;
        stats.block_visits += 1;

        let block = func.block(id);
        let mut new_live_out = NameSet::default();
        for succ in block.successors() {
            let succ_sets = &blocks[succ.index()];
            new_live_out.extend(succ_sets.ue_var.iter().copied());
            new_live_out.extend(
                succ_sets
                    .live_out
                    .iter()
                    .copied()
                    .filter(|name| !succ_sets.var_kill.contains(name)),
            );
        }

        let current = &mut blocks[id.index()].live_out;
        if new_live_out == *current {
            continue;
        }
        debug_assert!(
            new_live_out.is_superset(current),
            "LiveOut shrank for block {}",
            id.raw()
        );

        tracing::trace!(
            block = id.raw(),
            before = current.len(),
            after = new_live_out.len(),
            "LiveOut grew"
        );
        *current = new_live_out;
        stats.updates += 1;

        for &pred in block.predecessors() {
            if !queued[pred.index()] {
                queued[pred.index()] = true;
                worklist.push(pred);
            }
        }
    }

    tracing::debug!(
        block_visits = stats.block_visits,
        updates = stats.updates,
        "liveness converged"
    );

    Liveness { blocks, stats }
}

/// Compute `UEVar` and `VarKill` for a single block.
///
/// Walks instructions forward. `VarKill` doubles as the running
/// "killed so far" set: at the time a load is visited it holds exactly the
/// names stored by earlier instructions of this block.
fn scan_block<'f>(func: &'f Function, block: &'f BasicBlock) -> BlockLiveness<'f> {
    let mut sets = BlockLiveness::default();

    for instr in &block.body {
        match instr {
            Instr::Load { src, .. } => {
                if let Some(name) = func.location_name(*src) {
                    if !sets.var_kill.contains(name) {
                        sets.ue_var.insert(name);
                    }
                }
            }
            Instr::Store { dst, .. } => {
                if let Some(name) = func.location_name(*dst) {
                    sets.var_kill.insert(name);
                }
            }
            Instr::Binary { .. } | Instr::Other { .. } => {}
        }
    }

    sets
}
