//! Incremental construction of a [`Function`].
//!
//! Blocks are declared up front (so forward edges can be named) and filled
//! in any order. Constants are uniqued by value and named locations by
//! name, matching how a compiler IR interns them.
//!
//! Unnamed values and locations get numeric slots (`%0`, `@3`). A name in
//! canonical decimal form (`"7"`, not `"07"`) is taken as an explicit slot
//! rather than a name, so `location("5")` is the same location as the
//! textual `@5`. Fresh slots skip every slot already claimed.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    raw_id, BasicBlock, BinOp, BlockId, Function, Instr, IrError, LocationData, LocationId,
    Terminator, ValueData, ValueId, ValueKind,
};

/// In-progress basic block.
struct BlockSlot {
    name: Option<Box<str>>,
    body: Vec<Instr>,
    terminator: Option<Terminator>,
}

/// Builder for [`Function`]. See the module docs.
pub struct FunctionBuilder {
    name: Box<str>,
    params: Vec<ValueId>,
    values: Vec<ValueData>,
    locations: Vec<LocationData>,
    blocks: Vec<BlockSlot>,
    constants: FxHashMap<i64, ValueId>,
    named_locations: FxHashMap<Box<str>, LocationId>,
    slot_locations: FxHashMap<u32, LocationId>,
    next_location_slot: u32,
    value_slots: FxHashSet<u32>,
    next_value_slot: u32,
}

impl FunctionBuilder {
    pub fn new(name: impl Into<Box<str>>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            values: Vec::new(),
            locations: Vec::new(),
            blocks: Vec::new(),
            constants: FxHashMap::default(),
            named_locations: FxHashMap::default(),
            slot_locations: FxHashMap::default(),
            next_location_slot: 0,
            value_slots: FxHashSet::default(),
            next_value_slot: 0,
        }
    }

    /// Append a parameter.
    pub fn param(&mut self, name: &str) -> ValueId {
        let id = self.push_value(Some(name), ValueKind::Param);
        self.params.push(id);
        id
    }

    /// Allocate an instruction-result value, optionally named. Unnamed
    /// results take the next free slot.
    pub fn value(&mut self, name: Option<&str>) -> ValueId {
        self.push_value(name, ValueKind::Result)
    }

    /// The uniqued value for an integer constant.
    pub fn constant(&mut self, value: i64) -> ValueId {
        if let Some(&id) = self.constants.get(&value) {
            return id;
        }
        let id = self.push_value_data(ValueData {
            name: None,
            slot: None,
            kind: ValueKind::Const(value),
        });
        self.constants.insert(value, id);
        id
    }

    /// The uniqued location spelled `@name`. Numeric names select a slot.
    pub fn location(&mut self, name: &str) -> LocationId {
        if let Some(slot) = numeric_slot(name) {
            return self.slot_location(slot);
        }
        if let Some(&id) = self.named_locations.get(name) {
            return id;
        }
        let id = self.push_location(LocationData {
            name: Some(name.into()),
            slot: None,
        });
        self.named_locations.insert(name.into(), id);
        id
    }

    /// A fresh location with no static name, in the next free slot.
    pub fn unnamed_location(&mut self) -> LocationId {
        while self.slot_locations.contains_key(&self.next_location_slot) {
            self.next_location_slot += 1;
        }
        self.slot_location(self.next_location_slot)
    }

    /// The uniqued unnamed location in `slot`.
    fn slot_location(&mut self, slot: u32) -> LocationId {
        if let Some(&id) = self.slot_locations.get(&slot) {
            return id;
        }
        let id = self.push_location(LocationData {
            name: None,
            slot: Some(slot),
        });
        self.slot_locations.insert(slot, id);
        id
    }

    /// Declare a new, empty block. The first declared block is the entry.
    pub fn block(&mut self, name: Option<&str>) -> BlockId {
        let id = BlockId::new(raw_id(self.blocks.len()));
        self.blocks.push(BlockSlot {
            name: name.map(Into::into),
            body: Vec::new(),
            terminator: None,
        });
        id
    }

    /// Append an instruction to `block`.
    pub fn push(&mut self, block: BlockId, instr: Instr) {
        self.blocks[block.index()].body.push(instr);
    }

    /// Append `dst = load src` with a fresh unnamed result.
    pub fn load(&mut self, block: BlockId, src: LocationId) -> ValueId {
        let dst = self.value(None);
        self.push(block, Instr::Load { dst, src });
        dst
    }

    /// Append `store value, dst`.
    pub fn store(&mut self, block: BlockId, value: ValueId, dst: LocationId) {
        self.push(block, Instr::Store { value, dst });
    }

    /// Append `dst = op lhs, rhs` with a fresh unnamed result.
    pub fn binary(&mut self, block: BlockId, op: BinOp, lhs: ValueId, rhs: ValueId) -> ValueId {
        let dst = self.value(None);
        self.push(block, Instr::Binary { op, lhs, rhs, dst });
        dst
    }

    /// Set the terminator of `block`, replacing any earlier one.
    pub fn terminate(&mut self, block: BlockId, terminator: Terminator) {
        self.blocks[block.index()].terminator = Some(terminator);
    }

    /// Whether `block` already has a terminator.
    pub fn is_terminated(&self, block: BlockId) -> bool {
        self.blocks[block.index()].terminator.is_some()
    }

    /// Validate and produce the function.
    ///
    /// Blocks that were never terminated become exit blocks
    /// (`ret` without a value).
    pub fn finish(self) -> Result<Function, IrError> {
        let blocks = self
            .blocks
            .into_iter()
            .map(|slot| {
                let terminator = slot
                    .terminator
                    .unwrap_or(Terminator::Return { value: None });
                BasicBlock::new(slot.name, slot.body, terminator)
            })
            .collect();
        Function::new(self.name, self.params, blocks, self.values, self.locations)
    }

    fn push_value(&mut self, name: Option<&str>, kind: ValueKind) -> ValueId {
        let slot = match name {
            Some(name) => match numeric_slot(name) {
                Some(slot) => slot,
                None => {
                    return self.push_value_data(ValueData {
                        name: Some(name.into()),
                        slot: None,
                        kind,
                    });
                }
            },
            None => {
                while self.value_slots.contains(&self.next_value_slot) {
                    self.next_value_slot += 1;
                }
                self.next_value_slot
            }
        };
        self.value_slots.insert(slot);
        self.push_value_data(ValueData {
            name: None,
            slot: Some(slot),
            kind,
        })
    }

    fn push_value_data(&mut self, data: ValueData) -> ValueId {
        let id = ValueId::new(raw_id(self.values.len()));
        self.values.push(data);
        id
    }

    fn push_location(&mut self, data: LocationData) -> LocationId {
        let id = LocationId::new(raw_id(self.locations.len()));
        self.locations.push(data);
        id
    }
}

/// The slot selected by a canonical decimal name, if `name` is one.
fn numeric_slot(name: &str) -> Option<u32> {
    let slot: u32 = name.parse().ok()?;
    (slot.to_string() == name).then_some(slot)
}
