//! Minimal basic-block IR for intraprocedural data-flow analysis.
//!
//! This crate provides:
//!
//! - **IR model** ([`Function`], [`BasicBlock`], [`Instr`], [`Terminator`]) —
//!   a function owns an arena of blocks indexed by [`BlockId`]. Blocks hold
//!   an instruction stream of loads, stores, binary operations and opaque
//!   "other" instructions, followed by a terminator that names the block's
//!   successors.
//!
//! - **Construction** ([`FunctionBuilder`]) — incremental building with
//!   uniqued constants and named locations. [`Function::new`] validates the
//!   graph up front, so analyses never see a dangling edge.
//!
//! - **Textual form** ([`parse_module`], [`Function::display_instr`]) — a
//!   small line-oriented syntax for supplying functions from files and for
//!   rendering instructions in reports.
//!
//! # Values and locations
//!
//! [`ValueId`]s are SSA-like operand identities (instruction results,
//! parameters, constants). [`LocationId`]s are memory slots that loads read
//! and stores write. A location may carry a static name; unnamed locations
//! are still distinct identities but cannot be tracked by name.

mod builder;
mod error;
mod function;
mod graph;
mod instr;
pub mod parse;

pub use builder::FunctionBuilder;
pub use error::IrError;
pub use function::{BasicBlock, Function, InstrDisplay, LocationData, ValueData, ValueKind};
pub use instr::{BinOp, Instr, Terminator};
pub use parse::{parse_module, ParseError, ParseErrorKind};

// ── ID newtypes ─────────────────────────────────────────────────────

/// Value ID within a [`Function`].
///
/// Identifies an instruction result, a parameter, or a uniqued constant.
/// Two values are the same only if their IDs are equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ValueId(u32);

impl ValueId {
    /// Create a new value ID from a raw index.
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Memory location ID within a [`Function`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct LocationId(u32);

impl LocationId {
    /// Create a new location ID from a raw index.
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Basic block ID within a [`Function`].
///
/// Block IDs are positions in the function's block arena. The entry block
/// is always `BlockId(0)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct BlockId(u32);

impl BlockId {
    /// Create a new block ID from a raw index.
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Convert an arena position into a `u32` ID.
#[expect(
    clippy::cast_possible_truncation,
    reason = "IR arenas are far below u32::MAX entries"
)]
#[inline]
pub(crate) fn raw_id(index: usize) -> u32 {
    index as u32
}

#[cfg(test)]
mod tests;
