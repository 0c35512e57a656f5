use super::*;

// ID newtypes

#[test]
fn value_id_basics() {
    let v = ValueId::new(42);
    assert_eq!(v.raw(), 42);
    assert_eq!(v.index(), 42);
}

#[test]
fn block_id_basics() {
    let b = BlockId::new(7);
    assert_eq!(b.raw(), 7);
    assert_eq!(b.index(), 7);
}

#[test]
fn location_id_equality() {
    assert_eq!(LocationId::new(0), LocationId::new(0));
    assert_ne!(LocationId::new(0), LocationId::new(1));
}

// Operators

#[test]
fn binop_names_round_trip() {
    for op in BinOp::ALL {
        assert_eq!(BinOp::from_name(op.name()), Some(op));
    }
    assert_eq!(BinOp::from_name("icmp"), None);
}

#[test]
fn arithmetic_subset() {
    let arithmetic: Vec<_> = BinOp::ALL
        .into_iter()
        .filter(|op| op.is_arithmetic())
        .map(BinOp::name)
        .collect();
    assert_eq!(arithmetic, ["add", "sub", "mul", "udiv", "sdiv"]);
}

// Instruction accessors

#[test]
fn memory_operands() {
    let load = Instr::Load {
        dst: ValueId::new(0),
        src: LocationId::new(3),
    };
    let store = Instr::Store {
        value: ValueId::new(0),
        dst: LocationId::new(4),
    };
    assert_eq!(load.read_location(), Some(LocationId::new(3)));
    assert_eq!(load.written_location(), None);
    assert_eq!(store.read_location(), None);
    assert_eq!(store.written_location(), Some(LocationId::new(4)));
    assert_eq!(load.defined_value(), Some(ValueId::new(0)));
    assert_eq!(store.defined_value(), None);
    assert_eq!(store.used_values(), vec![ValueId::new(0)]);
}

#[test]
fn branch_successors_keep_duplicates() {
    let term = Terminator::Branch {
        cond: ValueId::new(0),
        then_block: BlockId::new(1),
        else_block: BlockId::new(1),
    };
    assert_eq!(term.successors().as_slice(), &[BlockId::new(1), BlockId::new(1)]);
    assert!(Terminator::Unreachable.successors().is_empty());
}

#[test]
fn function_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<crate::Function>();
}
