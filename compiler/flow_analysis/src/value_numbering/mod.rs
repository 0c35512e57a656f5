//! Value numbering of loads, stores and arithmetic expressions.
//!
//! A single forward pass assigns every value, location and distinct
//! expression a [`ValueNumber`]. Values sharing a number are known to be
//! identical, so an arithmetic instruction whose `(opcode, lhs, rhs)` key
//! was already numbered recomputes an available value and is flagged
//! redundant.
//!
//! # Rules
//!
//! - `store v, loc`: number `v`, then rebind `loc` to the same number.
//!   A later `load loc` therefore sees the stored value.
//! - `dst = load loc`: number `loc` (a fresh number stands for "whatever
//!   is there now") and bind `dst` to it.
//! - `dst = op lhs, rhs` for `add`/`sub`/`mul`/`udiv`/`sdiv`: look up
//!   `(op, VN(lhs), VN(rhs))`. Operand order is significant; there is no
//!   commutative normalization.
//! - Everything else is skipped and produces no entry.
//!
//! # Scope
//!
//! The table spans the whole function: blocks are visited in function
//! order and nothing is reset or invalidated at block boundaries or
//! control-flow merges. Two loads of the same location in unrelated blocks
//! can therefore share a number even when another path stores to it in
//! between. Reports depend on exactly this behavior.

use std::fmt;

use rustc_hash::FxHashMap;

use flow_ir::{BinOp, BlockId, Function, Instr, LocationId, ValueId};

// ── Numbers and keys ────────────────────────────────────────────────

/// Value number. Allocated from 1 upward, in first-seen order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ValueNumber(u32);

impl ValueNumber {
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ValueNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Anything that can hold a value number: an SSA value or a memory
/// location.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Entity {
    Value(ValueId),
    Location(LocationId),
}

/// Canonical form of a binary expression.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ExprKey {
    pub op: BinOp,
    pub lhs: ValueNumber,
    pub rhs: ValueNumber,
}

// ── Table ───────────────────────────────────────────────────────────

/// Hash-consing tables for one function.
#[derive(Clone, Debug)]
pub struct ValueTable {
    next: u32,
    entities: FxHashMap<Entity, ValueNumber>,
    exprs: FxHashMap<ExprKey, ValueNumber>,
}

impl Default for ValueTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueTable {
    pub fn new() -> Self {
        Self {
            next: 1,
            entities: FxHashMap::default(),
            exprs: FxHashMap::default(),
        }
    }

    /// Number of `entity`, allocating a fresh number on first sight.
    pub fn number_of(&mut self, entity: Entity) -> ValueNumber {
        if let Some(&number) = self.entities.get(&entity) {
            return number;
        }
        let number = self.fresh();
        self.entities.insert(entity, number);
        number
    }

    /// Number of `entity` without allocating.
    pub fn get(&self, entity: Entity) -> Option<ValueNumber> {
        self.entities.get(&entity).copied()
    }

    /// Make `entity` an alias of `number`, replacing any earlier binding.
    pub fn bind(&mut self, entity: Entity, number: ValueNumber) {
        self.entities.insert(entity, number);
    }

    /// Number of an expression. The flag is `true` when the key had
    /// already been numbered (the expression is redundant).
    pub fn number_expr(&mut self, key: ExprKey) -> (ValueNumber, bool) {
        if let Some(&number) = self.exprs.get(&key) {
            return (number, true);
        }
        let number = self.fresh();
        self.exprs.insert(key, number);
        (number, false)
    }

    /// Number of an expression without allocating.
    pub fn get_expr(&self, key: &ExprKey) -> Option<ValueNumber> {
        self.exprs.get(key).copied()
    }

    /// How many numbers have been handed out.
    pub fn allocated(&self) -> u32 {
        self.next - 1
    }

    fn fresh(&mut self) -> ValueNumber {
        let number = ValueNumber(self.next);
        self.next += 1;
        number
    }
}

// ── Results ─────────────────────────────────────────────────────────

/// What kind of instruction was numbered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumberedKind {
    Load,
    Store,
    Binary { key: ExprKey, redundant: bool },
}

/// One numbered instruction, addressed by block and body position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NumberedInstr {
    pub block: BlockId,
    pub index: usize,
    pub number: ValueNumber,
    pub kind: NumberedKind,
}

impl NumberedInstr {
    pub fn is_redundant(&self) -> bool {
        matches!(self.kind, NumberedKind::Binary { redundant: true, .. })
    }

    /// The instruction this entry describes.
    pub fn instr<'f>(&self, func: &'f Function) -> &'f Instr {
        &func.block(self.block).body[self.index]
    }
}

/// Renders the report description: `3 = 3` for memory operations,
/// `5 = 3 add 4` (plus ` (redundant)`) for expressions.
impl fmt::Display for NumberedInstr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let number = self.number;
        match self.kind {
            NumberedKind::Load | NumberedKind::Store => write!(f, "{number} = {number}"),
            NumberedKind::Binary { key, redundant } => {
                write!(f, "{number} = {} {} {}", key.lhs, key.op.name(), key.rhs)?;
                if redundant {
                    f.write_str(" (redundant)")?;
                }
                Ok(())
            }
        }
    }
}

/// Output of [`number_values`].
#[derive(Clone, Debug)]
pub struct ValueNumbering {
    entries: Vec<NumberedInstr>,
    table: ValueTable,
}

impl ValueNumbering {
    /// Numbered instructions in program order.
    pub fn entries(&self) -> &[NumberedInstr] {
        &self.entries
    }

    /// Final state of the numbering tables.
    pub fn table(&self) -> &ValueTable {
        &self.table
    }

    /// Number bound to `value` at the end of the pass.
    pub fn value_number(&self, value: ValueId) -> Option<ValueNumber> {
        self.table.get(Entity::Value(value))
    }

    pub fn redundant_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_redundant()).count()
    }
}

// ── Pass ────────────────────────────────────────────────────────────

/// Number every load, store and arithmetic expression in `func`.
pub fn number_values(func: &Function) -> ValueNumbering {
    let mut table = ValueTable::new();
    let mut entries = Vec::new();

    for block in func.blocks() {
        for (index, instr) in block.body.iter().enumerate() {
            let numbered = match instr {
                Instr::Store { value, dst } => {
                    let number = table.number_of(Entity::Value(*value));
                    table.bind(Entity::Location(*dst), number);
                    Some((number, NumberedKind::Store))
                }
                Instr::Load { dst, src } => {
                    let number = table.number_of(Entity::Location(*src));
                    table.bind(Entity::Value(*dst), number);
                    Some((number, NumberedKind::Load))
                }
                Instr::Binary { op, lhs, rhs, dst } if op.is_arithmetic() => {
                    let key = ExprKey {
                        op: *op,
                        lhs: table.number_of(Entity::Value(*lhs)),
                        rhs: table.number_of(Entity::Value(*rhs)),
                    };
                    let (number, redundant) = table.number_expr(key);
                    table.bind(Entity::Value(*dst), number);
                    Some((number, NumberedKind::Binary { key, redundant }))
                }
                Instr::Binary { .. } | Instr::Other { .. } => None,
            };

            if let Some((number, kind)) = numbered {
                entries.push(NumberedInstr {
                    block: block.id(),
                    index,
                    number,
                    kind,
                });
            }
        }
    }

    let numbering = ValueNumbering { entries, table };

    tracing::debug!(
        function = func.name(),
        numbered = numbering.entries.len(),
        allocated = numbering.table.allocated(),
        redundant = numbering.redundant_count(),
        "value numbering complete"
    );

    numbering
}
