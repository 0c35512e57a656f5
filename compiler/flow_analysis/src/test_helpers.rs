//! Shared test utilities for the analyses. Only compiled in test builds.

use flow_ir::{parse_module, BlockId, Function};

/// Shorthand for `BlockId::new(n)`.
pub(crate) fn b(n: u32) -> BlockId {
    BlockId::new(n)
}

/// Parse source text that must contain exactly one function.
pub(crate) fn func(src: &str) -> Function {
    let mut functions = parse_module(src).unwrap_or_else(|e| panic!("bad test IR: {e}"));
    assert_eq!(functions.len(), 1, "expected exactly one function");
    functions.remove(0)
}

/// Sorted owned copy of a name set, for order-independent comparison.
pub(crate) fn names<'a>(set: impl IntoIterator<Item = &'a &'a str>) -> Vec<String> {
    let mut names: Vec<String> = set.into_iter().map(|s| (*s).to_string()).collect();
    names.sort();
    names
}
