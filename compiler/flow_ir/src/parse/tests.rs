use pretty_assertions::assert_eq;

use crate::{BinOp, Function, Instr, IrError, Terminator, ValueKind};

use super::{parse_module, ParseError, ParseErrorKind};

fn parse_one(src: &str) -> Function {
    let mut functions = parse_module(src).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(functions.len(), 1);
    functions.remove(0)
}

fn parse_err(src: &str) -> (usize, ParseErrorKind) {
    let err = match parse_module(src) {
        Ok(functions) => panic!("expected an error, parsed {} functions", functions.len()),
        Err(err) => err,
    };
    match (&err, err.kind()) {
        (ParseError::Syntax { line, .. }, Some(kind)) => (*line, kind.clone()),
        _ => panic!("expected a syntax error, got {err:?}"),
    }
}

fn rendered(func: &Function) -> Vec<String> {
    func.blocks()
        .iter()
        .flat_map(|block| {
            block
                .body
                .iter()
                .map(|i| func.display_instr(i).to_string())
                .chain(std::iter::once(
                    func.display_terminator(&block.terminator).to_string(),
                ))
        })
        .collect()
}

#[test]
fn parses_straight_line_function() {
    let func = parse_one(
        "
        ; a comment line
        func @main(%n) {
        entry:
          %a = load @x        ; trailing comment
          %s = add %a, %n
          store %s, @y
          ret %s
        }
        ",
    );

    assert_eq!(func.name(), "main");
    assert_eq!(func.params().len(), 1);
    assert_eq!(func.value(func.params()[0]).kind, ValueKind::Param);
    assert_eq!(
        rendered(&func),
        vec!["%a = load @x", "%s = add %a, %n", "store %s, @y", "ret %s"]
    );

    let entry = &func.blocks()[0];
    assert!(matches!(
        entry.body[1],
        Instr::Binary {
            op: BinOp::Add,
            ..
        }
    ));
}

#[test]
fn forward_labels_resolve_in_definition_order() {
    let func = parse_one(
        "
        func @loop(%c) {
        head:
          br %c, body, exit
        body:
          jmp head
        exit:
          ret
        }
        ",
    );

    let names: Vec<_> = func.blocks().iter().filter_map(|b| b.name()).collect();
    assert_eq!(names, vec!["head", "body", "exit"]);
    let head = &func.blocks()[0];
    assert!(matches!(head.terminator, Terminator::Branch { .. }));
    assert_eq!(func.blocks()[1].successors().as_slice(), &[head.id()]);
    assert_eq!(head.predecessors(), &[func.blocks()[1].id()]);
}

#[test]
fn forward_value_references_are_allowed() {
    let func = parse_one(
        "
        func @phi() {
        entry:
          jmp body
        body:
          %i = phi 0, %next
          %next = add %i, 1
          jmp body
        }
        ",
    );
    assert_eq!(
        rendered(&func),
        vec!["jmp body", "%i = phi 0, %next", "%next = add %i, 1", "jmp body"]
    );
}

#[test]
fn constants_are_uniqued() {
    let func = parse_one(
        "
        func @k() {
        entry:
          store 4, @a
          store 4, @b
          ret
        }
        ",
    );
    let body = &func.blocks()[0].body;
    let (Instr::Store { value: first, .. }, Instr::Store { value: second, .. }) =
        (&body[0], &body[1])
    else {
        panic!("expected two stores");
    };
    assert_eq!(first, second);
    assert_eq!(func.value(*first).kind, ValueKind::Const(4));
}

#[test]
fn numeric_locations_are_unnamed() {
    let func = parse_one(
        "
        func @slots() {
        entry:
          %a = load @0
          %b = load @0
          %c = load @x
          ret
        }
        ",
    );
    let body = &func.blocks()[0].body;
    let src = |i: usize| body[i].read_location().unwrap_or_else(|| panic!("load"));
    assert_eq!(src(0), src(1));
    assert_eq!(func.location_name(src(0)), None);
    assert_eq!(func.location_name(src(2)), Some("x"));
}

/// Numeric spellings render back exactly as written, whatever order the
/// slots appear in and whatever named locations precede them.
#[test]
fn numeric_slots_render_as_written() {
    let func = parse_one(
        "
        func @slots(%0) {
        entry:
          %a = load @x
          %b = load @5
          store %b, @7
          %3 = add %b, %0
          %c = load @5
          ret %3
        }
        ",
    );
    assert_eq!(
        rendered(&func),
        vec![
            "%a = load @x",
            "%b = load @5",
            "store %b, @7",
            "%3 = add %b, %0",
            "%c = load @5",
            "ret %3",
        ]
    );
    assert_eq!(func.num_locations(), 3);
}

#[test]
fn slot_numbers_distinguish_functions() {
    let functions = parse_module(
        "
        func @f() {
        entry:
          %a = load @1
          ret
        }
        func @g() {
        entry:
          %a = load @2
          ret
        }
        ",
    )
    .unwrap_or_else(|e| panic!("{e}"));
    let texts: Vec<Vec<String>> = functions.iter().map(rendered).collect();
    assert_ne!(texts[0], texts[1]);
    assert_eq!(texts[1][0], "%a = load @2");
}

#[test]
fn validation_errors_have_no_syntax_kind() {
    let err = ParseError::from(IrError::MalformedGraph {
        function: "f".to_string(),
        block: "entry".to_string(),
        target: 4,
        num_blocks: 1,
    });
    assert_eq!(err.kind(), None);
}

#[test]
fn other_instructions_without_result() {
    let func = parse_one(
        "
        func @calls(%p) {
        entry:
          call %p, -3
          fence
          unreachable
        }
        ",
    );
    assert_eq!(rendered(&func), vec!["call %p, -3", "fence", "unreachable"]);
}

#[test]
fn multiple_functions_in_order() {
    let functions = parse_module(
        "
        func @a() {
        entry:
          ret
        }
        func @b() {
        }
        ",
    )
    .unwrap_or_else(|e| panic!("{e}"));
    let names: Vec<_> = functions.iter().map(Function::name).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert!(functions[1].blocks().is_empty());
}

// Errors

#[test]
fn missing_terminator() {
    let (line, kind) = parse_err("func @f() {\nentry:\n  %a = load @x\n}\n");
    assert_eq!(line, 4);
    assert_eq!(kind, ParseErrorKind::MissingTerminator("entry".to_string()));
}

#[test]
fn missing_terminator_before_next_label() {
    let (line, kind) = parse_err("func @f() {\na:\nb:\n  ret\n}\n");
    assert_eq!(line, 3);
    assert_eq!(kind, ParseErrorKind::MissingTerminator("a".to_string()));
}

#[test]
fn unknown_label() {
    let (line, kind) = parse_err("func @f() {\nentry:\n  jmp nowhere\n}\n");
    assert_eq!(line, 3);
    assert_eq!(kind, ParseErrorKind::UnknownLabel("nowhere".to_string()));
}

#[test]
fn duplicate_label() {
    let (_, kind) = parse_err("func @f() {\na:\n  ret\na:\n  ret\n}\n");
    assert_eq!(kind, ParseErrorKind::DuplicateLabel("a".to_string()));
}

#[test]
fn duplicate_value() {
    let (line, kind) = parse_err("func @f() {\ne:\n  %a = load @x\n  %a = load @y\n  ret\n}\n");
    assert_eq!(line, 4);
    assert_eq!(kind, ParseErrorKind::DuplicateValue("a".to_string()));
}

#[test]
fn undefined_value_reports_first_use() {
    let (line, kind) = parse_err("func @f() {\ne:\n  store %ghost, @x\n  ret\n}\n");
    assert_eq!(line, 3);
    assert_eq!(kind, ParseErrorKind::UndefinedValue("ghost".to_string()));
}

#[test]
fn instruction_outside_block() {
    let (line, kind) = parse_err("func @f() {\n  ret\n}\n");
    assert_eq!(line, 2);
    assert_eq!(kind, ParseErrorKind::OutsideBlock);
}

#[test]
fn instruction_after_terminator() {
    let (_, kind) = parse_err("func @f() {\ne:\n  ret\n  %a = load @x\n}\n");
    assert_eq!(kind, ParseErrorKind::AfterTerminator("e".to_string()));
}

#[test]
fn unclosed_function() {
    let (line, kind) = parse_err("func @f() {\ne:\n  ret\n");
    assert_eq!(line, 3);
    assert_eq!(kind, ParseErrorKind::UnclosedFunction("f".to_string()));
}

#[test]
fn binary_op_needs_two_operands() {
    let (_, kind) = parse_err("func @f(%a) {\ne:\n  %s = add %a\n  ret\n}\n");
    assert_eq!(
        kind,
        ParseErrorKind::Unexpected {
            expected: "`,`",
            found: "end of line".to_string(),
        }
    );
}

#[test]
fn store_needs_a_location() {
    let (_, kind) = parse_err("func @f(%a) {\ne:\n  store %a, %a\n  ret\n}\n");
    assert_eq!(
        kind,
        ParseErrorKind::Unexpected {
            expected: "a location",
            found: "`%a`".to_string(),
        }
    );
}

#[test]
fn error_message_includes_line() {
    let err = parse_module("func @f() {\ne:\n  jmp x\n}\n")
        .err()
        .map(|e| e.to_string());
    assert_eq!(err.as_deref(), Some("line 3: unknown label `x`"));
}
