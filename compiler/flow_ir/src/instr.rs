//! Instructions and block terminators.

use smallvec::{smallvec, SmallVec};

use crate::{BlockId, LocationId, ValueId};

// ── Binary operators ────────────────────────────────────────────────

/// Integer binary operator.
///
/// Mirrors the integer subset of LLVM's binary opcodes. Only the
/// arithmetic group (see [`BinOp::is_arithmetic`]) takes part in value
/// numbering; the rest are carried so the IR can describe real code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    UDiv,
    SDiv,
    URem,
    SRem,
    And,
    Or,
    Xor,
    Shl,
    LShr,
    AShr,
}

impl BinOp {
    /// Every operator, in declaration order.
    pub const ALL: [BinOp; 13] = [
        BinOp::Add,
        BinOp::Sub,
        BinOp::Mul,
        BinOp::UDiv,
        BinOp::SDiv,
        BinOp::URem,
        BinOp::SRem,
        BinOp::And,
        BinOp::Or,
        BinOp::Xor,
        BinOp::Shl,
        BinOp::LShr,
        BinOp::AShr,
    ];

    /// The textual opcode (`add`, `udiv`, ...).
    pub fn name(self) -> &'static str {
        match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::UDiv => "udiv",
            BinOp::SDiv => "sdiv",
            BinOp::URem => "urem",
            BinOp::SRem => "srem",
            BinOp::And => "and",
            BinOp::Or => "or",
            BinOp::Xor => "xor",
            BinOp::Shl => "shl",
            BinOp::LShr => "lshr",
            BinOp::AShr => "ashr",
        }
    }

    /// Look up an operator by its textual opcode.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    /// `add`, `sub`, `mul`, `udiv` and `sdiv`.
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::UDiv | BinOp::SDiv
        )
    }
}

// ── Instructions ────────────────────────────────────────────────────

/// A single non-terminator instruction.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Instr {
    /// `dst = load src`: read the value currently stored at `src`.
    Load { dst: ValueId, src: LocationId },

    /// `store value, dst`: overwrite `dst` with `value`.
    Store { value: ValueId, dst: LocationId },

    /// `dst = op lhs, rhs`.
    Binary {
        op: BinOp,
        lhs: ValueId,
        rhs: ValueId,
        dst: ValueId,
    },

    /// Anything else (comparisons, calls, phis, ...). Opaque to both
    /// analyses; kept only so the instruction stream is complete.
    Other {
        dst: Option<ValueId>,
        opcode: Box<str>,
        args: Vec<ValueId>,
    },
}

impl Instr {
    /// Returns the value defined by this instruction, if any.
    pub fn defined_value(&self) -> Option<ValueId> {
        match self {
            Instr::Load { dst, .. } | Instr::Binary { dst, .. } => Some(*dst),
            Instr::Other { dst, .. } => *dst,
            Instr::Store { .. } => None,
        }
    }

    /// Returns all values read by this instruction.
    pub fn used_values(&self) -> Vec<ValueId> {
        match self {
            Instr::Load { .. } => vec![],
            Instr::Store { value, .. } => vec![*value],
            Instr::Binary { lhs, rhs, .. } => vec![*lhs, *rhs],
            Instr::Other { args, .. } => args.clone(),
        }
    }

    /// The memory location read by this instruction, if any.
    pub fn read_location(&self) -> Option<LocationId> {
        match self {
            Instr::Load { src, .. } => Some(*src),
            _ => None,
        }
    }

    /// The memory location written by this instruction, if any.
    pub fn written_location(&self) -> Option<LocationId> {
        match self {
            Instr::Store { dst, .. } => Some(*dst),
            _ => None,
        }
    }
}

// ── Terminators ─────────────────────────────────────────────────────

/// Block exit. Successor edges are derived from the terminator.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Terminator {
    /// Leave the function, optionally with a value.
    Return { value: Option<ValueId> },
    /// Unconditional jump.
    Jump { target: BlockId },
    /// Two-way conditional branch.
    Branch {
        cond: ValueId,
        then_block: BlockId,
        else_block: BlockId,
    },
    /// Control never reaches the end of this block.
    Unreachable,
}

impl Terminator {
    /// Successor block IDs in branch order. A `Branch` with identical
    /// targets reports the target twice.
    pub fn successors(&self) -> SmallVec<[BlockId; 2]> {
        match self {
            Terminator::Return { .. } | Terminator::Unreachable => SmallVec::new(),
            Terminator::Jump { target } => smallvec![*target],
            Terminator::Branch {
                then_block,
                else_block,
                ..
            } => smallvec![*then_block, *else_block],
        }
    }

    /// Returns all values read by this terminator.
    pub fn used_values(&self) -> Vec<ValueId> {
        match self {
            Terminator::Return { value } => value.iter().copied().collect(),
            Terminator::Branch { cond, .. } => vec![*cond],
            Terminator::Jump { .. } | Terminator::Unreachable => vec![],
        }
    }
}
