//! Functions, basic blocks, and the value/location tables they own.
//!
//! A [`Function`] is immutable once constructed. [`Function::new`] checks
//! that every edge and operand stays inside the function and derives the
//! predecessor lists, so analyses can index the block arena freely.

use std::fmt;

use smallvec::SmallVec;

use crate::graph::{compute_predecessors, find_dangling_edge};
use crate::{raw_id, BlockId, Instr, IrError, LocationId, Terminator, ValueId};

/// How a value comes into existence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Function parameter.
    Param,
    /// Integer constant. Constants are uniqued per function.
    Const(i64),
    /// Result of an instruction.
    Result,
}

/// Entry in a function's value table.
///
/// A non-constant value is spelled either by `name` (`%sum`) or by its
/// numeric `slot` (`%3`). Numeric spellings never appear in `name`, so the
/// two cannot collide.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ValueData {
    pub name: Option<Box<str>>,
    pub slot: Option<u32>,
    pub kind: ValueKind,
}

/// Entry in a function's location table.
///
/// `name` is `None` when no static name can be attributed to the location;
/// such a location is spelled by its `slot` (`@5`) instead.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LocationData {
    pub name: Option<Box<str>>,
    pub slot: Option<u32>,
}

// ── Basic blocks ────────────────────────────────────────────────────

/// A basic block: straight-line body followed by a terminator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BasicBlock {
    id: BlockId,
    pub name: Option<Box<str>>,
    pub body: Vec<Instr>,
    pub terminator: Terminator,
    predecessors: Vec<BlockId>,
}

impl BasicBlock {
    /// Create a detached block. Its ID and predecessors are assigned when
    /// the block is placed into a [`Function`].
    pub fn new(name: Option<Box<str>>, body: Vec<Instr>, terminator: Terminator) -> Self {
        Self {
            id: BlockId::new(0),
            name,
            body,
            terminator,
            predecessors: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Successor block IDs, derived from the terminator.
    pub fn successors(&self) -> SmallVec<[BlockId; 2]> {
        self.terminator.successors()
    }

    /// Distinct predecessor block IDs in ascending order.
    pub fn predecessors(&self) -> &[BlockId] {
        &self.predecessors
    }

    fn label(&self) -> String {
        match &self.name {
            Some(name) => name.to_string(),
            None => format!("bb{}", self.id.raw()),
        }
    }
}

// ── Functions ───────────────────────────────────────────────────────

/// A function body: an arena of blocks plus value and location tables.
///
/// The entry block is the first block. A function without blocks is a
/// declaration; both analyses produce empty results for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Function {
    name: Box<str>,
    params: Vec<ValueId>,
    blocks: Vec<BasicBlock>,
    values: Vec<ValueData>,
    locations: Vec<LocationData>,
}

impl Function {
    /// Assemble and validate a function.
    ///
    /// Block IDs are assigned by position. Fails with
    /// [`IrError::MalformedGraph`] if a terminator targets a block outside
    /// `blocks`, and with [`IrError::UndefinedValue`] /
    /// [`IrError::UndefinedLocation`] for dangling operands.
    pub fn new(
        name: impl Into<Box<str>>,
        params: Vec<ValueId>,
        mut blocks: Vec<BasicBlock>,
        values: Vec<ValueData>,
        locations: Vec<LocationData>,
    ) -> Result<Self, IrError> {
        let name = name.into();
        for (idx, block) in blocks.iter_mut().enumerate() {
            block.id = BlockId::new(raw_id(idx));
        }

        if let Some((block_idx, target)) = find_dangling_edge(&blocks) {
            return Err(IrError::MalformedGraph {
                function: name.to_string(),
                block: blocks[block_idx].label(),
                target: target.raw(),
                num_blocks: blocks.len(),
            });
        }

        let mut func = Self {
            name,
            params,
            blocks,
            values,
            locations,
        };
        func.check_operands()?;

        let predecessors = compute_predecessors(&func.blocks);
        for (block, preds) in func.blocks.iter_mut().zip(predecessors) {
            block.predecessors = preds;
        }

        Ok(func)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ValueId] {
        &self.params
    }

    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    /// Look up a block. IDs handed out by this function are always valid.
    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.index()]
    }

    /// The entry block, or `None` for a declaration.
    pub fn entry(&self) -> Option<BlockId> {
        self.blocks.first().map(BasicBlock::id)
    }

    pub fn value(&self, id: ValueId) -> &ValueData {
        &self.values[id.index()]
    }

    pub fn location(&self, id: LocationId) -> &LocationData {
        &self.locations[id.index()]
    }

    /// Static name of a location, if it has one.
    pub fn location_name(&self, id: LocationId) -> Option<&str> {
        self.locations[id.index()].name.as_deref()
    }

    pub fn num_values(&self) -> usize {
        self.values.len()
    }

    pub fn num_locations(&self) -> usize {
        self.locations.len()
    }

    /// Render an instruction in the textual IR syntax.
    pub fn display_instr<'a>(&'a self, instr: &'a Instr) -> InstrDisplay<'a> {
        InstrDisplay {
            func: self,
            item: Item::Instr(instr),
        }
    }

    /// Render a terminator in the textual IR syntax.
    pub fn display_terminator<'a>(&'a self, terminator: &'a Terminator) -> InstrDisplay<'a> {
        InstrDisplay {
            func: self,
            item: Item::Terminator(terminator),
        }
    }

    fn check_operands(&self) -> Result<(), IrError> {
        for &param in &self.params {
            self.check_value("<params>".to_string(), 0, param)?;
        }

        for block in &self.blocks {
            for (index, instr) in block.body.iter().enumerate() {
                let values = instr.used_values().into_iter().chain(instr.defined_value());
                for value in values {
                    self.check_value(block.label(), index, value)?;
                }
                let locations = instr.read_location().into_iter().chain(instr.written_location());
                for location in locations {
                    if location.index() >= self.locations.len() {
                        return Err(IrError::UndefinedLocation {
                            function: self.name.to_string(),
                            block: block.label(),
                            index,
                            location: location.raw(),
                        });
                    }
                }
            }
            for value in block.terminator.used_values() {
                self.check_value(block.label(), block.body.len(), value)?;
            }
        }

        Ok(())
    }

    fn check_value(&self, block: String, index: usize, value: ValueId) -> Result<(), IrError> {
        if value.index() < self.values.len() {
            return Ok(());
        }
        Err(IrError::UndefinedValue {
            function: self.name.to_string(),
            block,
            index,
            value: value.raw(),
        })
    }

    // Entries built by hand without a name or slot fall back to their ID.

    fn write_value(&self, f: &mut fmt::Formatter<'_>, id: ValueId) -> fmt::Result {
        let data = &self.values[id.index()];
        match (&data.kind, &data.name, data.slot) {
            (ValueKind::Const(c), _, _) => write!(f, "{c}"),
            (_, Some(name), _) => write!(f, "%{name}"),
            (_, None, Some(slot)) => write!(f, "%{slot}"),
            (_, None, None) => write!(f, "%{}", id.raw()),
        }
    }

    fn write_location(&self, f: &mut fmt::Formatter<'_>, id: LocationId) -> fmt::Result {
        let data = &self.locations[id.index()];
        match (&data.name, data.slot) {
            (Some(name), _) => write!(f, "@{name}"),
            (None, Some(slot)) => write!(f, "@{slot}"),
            (None, None) => write!(f, "@{}", id.raw()),
        }
    }

    fn write_block(&self, f: &mut fmt::Formatter<'_>, id: BlockId) -> fmt::Result {
        write!(f, "{}", self.block(id).label())
    }
}

// ── Rendering ───────────────────────────────────────────────────────

enum Item<'a> {
    Instr(&'a Instr),
    Terminator(&'a Terminator),
}

/// Display adapter returned by [`Function::display_instr`] and
/// [`Function::display_terminator`].
///
/// Writes piecewise, so width/alignment flags are ignored; render to a
/// `String` first when padding is needed.
pub struct InstrDisplay<'a> {
    func: &'a Function,
    item: Item<'a>,
}

impl fmt::Display for InstrDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let func = self.func;
        match self.item {
            Item::Instr(Instr::Load { dst, src }) => {
                func.write_value(f, *dst)?;
                f.write_str(" = load ")?;
                func.write_location(f, *src)
            }
            Item::Instr(Instr::Store { value, dst }) => {
                f.write_str("store ")?;
                func.write_value(f, *value)?;
                f.write_str(", ")?;
                func.write_location(f, *dst)
            }
            Item::Instr(Instr::Binary { op, lhs, rhs, dst }) => {
                func.write_value(f, *dst)?;
                write!(f, " = {} ", op.name())?;
                func.write_value(f, *lhs)?;
                f.write_str(", ")?;
                func.write_value(f, *rhs)
            }
            Item::Instr(Instr::Other { dst, opcode, args }) => {
                if let Some(dst) = dst {
                    func.write_value(f, *dst)?;
                    f.write_str(" = ")?;
                }
                f.write_str(opcode)?;
                for (i, arg) in args.iter().enumerate() {
                    f.write_str(if i == 0 { " " } else { ", " })?;
                    func.write_value(f, *arg)?;
                }
                Ok(())
            }
            Item::Terminator(Terminator::Return { value }) => {
                f.write_str("ret")?;
                if let Some(value) = value {
                    f.write_str(" ")?;
                    func.write_value(f, *value)?;
                }
                Ok(())
            }
            Item::Terminator(Terminator::Jump { target }) => {
                f.write_str("jmp ")?;
                func.write_block(f, *target)
            }
            Item::Terminator(Terminator::Branch {
                cond,
                then_block,
                else_block,
            }) => {
                f.write_str("br ")?;
                func.write_value(f, *cond)?;
                f.write_str(", ")?;
                func.write_block(f, *then_block)?;
                f.write_str(", ")?;
                func.write_block(f, *else_block)
            }
            Item::Terminator(Terminator::Unreachable) => f.write_str("unreachable"),
        }
    }
}
