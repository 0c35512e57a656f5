//! End-to-end tests for the `flowc` driver: files in, reports out.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use std::fs;
use std::path::Path;

use flowc::{run, Command, DriverError, DriverOptions};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

const CHAIN: &str = "\
func @chain() {
b1:
  %x = load @a
  store %x, @b
  jmp b2
b2:
  %y = load @b
  ret %y
}
";

const SUM: &str = "\
func @sum(%a, %b) {
entry:
  %c = add %a, %b
  %d = add %a, %b
  ret %d
}
";

fn opts(command: Command, input: &Path, log: Option<&Path>) -> DriverOptions {
    DriverOptions {
        command,
        input: input.to_path_buf(),
        log: log.map(Path::to_path_buf),
    }
}

fn run_to_string(options: &DriverOptions) -> Result<String, DriverError> {
    let mut out = Vec::new();
    run(options, &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

#[test]
fn liveness_command() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("chain.ir");
    fs::write(&input, CHAIN).unwrap();

    let out = run_to_string(&opts(Command::Liveness, &input, None)).unwrap();
    assert_eq!(
        out,
        "----- b1 -----\nUEVAR: a\nVARKILL: b\nLIVEOUT: b\n\
         ----- b2 -----\nUEVAR: b\nVARKILL: \nLIVEOUT: \n"
    );
}

#[test]
fn value_numbering_command_flags_redundancy() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("sum.ir");
    fs::write(&input, SUM).unwrap();

    let out = run_to_string(&opts(Command::ValueNumbering, &input, None)).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "ValueNumbering: sum");
    assert!(lines[1].ends_with(" 3 = 1 add 2"));
    assert!(lines[2].ends_with(" 3 = 1 add 2 (redundant)"));
    assert_eq!(lines.len(), 4);
}

#[test]
fn all_runs_both_per_function_in_file_order() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("both.ir");
    fs::write(&input, format!("{CHAIN}\n{SUM}")).unwrap();

    let mut out = Vec::new();
    let count = run(&opts(Command::All, &input, None), &mut out).unwrap();
    let out = String::from_utf8(out).unwrap();

    assert_eq!(count, 2);
    let chain_live = out.find("----- b1 -----").unwrap();
    let chain_vn = out.find("ValueNumbering: chain").unwrap();
    let sum_live = out.find("----- entry -----").unwrap();
    let sum_vn = out.find("ValueNumbering: sum").unwrap();
    assert!(chain_live < chain_vn);
    assert!(chain_vn < sum_live);
    assert!(sum_live < sum_vn);
}

#[test]
fn log_is_created_then_appended() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("sum.ir");
    let log = dir.path().join("ValueNumberingOutput.log");
    fs::write(&input, SUM).unwrap();

    let options = opts(Command::ValueNumbering, &input, Some(&log));
    let first = run_to_string(&options).unwrap();
    assert_eq!(fs::read_to_string(&log).unwrap(), first);

    run_to_string(&options).unwrap();
    assert_eq!(fs::read_to_string(&log).unwrap(), format!("{first}{first}"));
}

#[test]
fn log_skips_liveness_output() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("chain.ir");
    let log = dir.path().join("vn.log");
    fs::write(&input, CHAIN).unwrap();

    run_to_string(&opts(Command::All, &input, Some(&log))).unwrap();
    let logged = fs::read_to_string(&log).unwrap();
    assert!(logged.starts_with("ValueNumbering: chain\n"));
    assert!(!logged.contains("LIVEOUT"));
}

#[test]
fn missing_input_is_a_read_error() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("absent.ir");

    let err = run_to_string(&opts(Command::Liveness, &input, None)).unwrap_err();
    assert!(matches!(err, DriverError::Read { .. }));
    assert!(err.to_string().starts_with("cannot read `"));
}

#[test]
fn parse_errors_name_file_and_line() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("bad.ir");
    fs::write(&input, "func @f() {\nentry:\n  jmp nowhere\n}\n").unwrap();

    let err = run_to_string(&opts(Command::Liveness, &input, None)).unwrap_err();
    assert!(matches!(err, DriverError::Parse { .. }));
    assert_eq!(
        err.to_string(),
        format!("{}: line 3: unknown label `nowhere`", input.display())
    );
}

#[test]
fn unwritable_log_is_a_log_error() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("sum.ir");
    fs::write(&input, SUM).unwrap();
    // A directory cannot be opened for appending.
    let log = dir.path().to_path_buf();

    let err = run_to_string(&opts(Command::ValueNumbering, &input, Some(&log))).unwrap_err();
    assert!(matches!(err, DriverError::Log { .. }));
}
