//! Intraprocedural data-flow analyses over [`flow_ir`] functions.
//!
//! This crate provides:
//!
//! - **Liveness** ([`compute_liveness`]) — per-block upward-exposed uses
//!   (`UEVar`), kills (`VarKill`) and live-out sets of named memory
//!   locations, computed by a backward worklist fixpoint.
//!
//! - **Value numbering** ([`number_values`]) — a single forward pass that
//!   assigns value numbers to loads, stores and arithmetic expressions and
//!   flags expressions that recompute an already-numbered value.
//!
//! - **Reports** ([`report`]) — deterministic text rendering of both
//!   results.
//!
//! Both analyses are read-only over the function and build all their
//! tables fresh per call, so separate functions can be analyzed
//! independently (and concurrently).

pub mod liveness;
pub mod report;
pub mod value_numbering;

pub use liveness::{compute_liveness, BlockLiveness, Liveness, LivenessStats, NameSet};
pub use value_numbering::{
    number_values, Entity, ExprKey, NumberedInstr, NumberedKind, ValueNumber, ValueNumbering,
    ValueTable,
};

#[cfg(test)]
mod test_helpers;
