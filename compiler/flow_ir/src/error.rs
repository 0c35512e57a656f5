use thiserror::Error;

/// A structural defect in a function, detected when it is constructed.
///
/// Analyses assume a well-formed graph and never re-validate; every check
/// lives in [`Function::new`](crate::Function::new).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum IrError {
    /// A terminator names a block the function does not own.
    #[error(
        "malformed graph in `{function}`: block {block} branches to bb{target}, \
         but the function has {num_blocks} blocks"
    )]
    MalformedGraph {
        function: String,
        block: String,
        target: u32,
        num_blocks: usize,
    },

    /// An operand refers to a value outside the function's value table.
    #[error("in `{function}`, block {block}, instruction {index}: undefined value #{value}")]
    UndefinedValue {
        function: String,
        block: String,
        index: usize,
        value: u32,
    },

    /// A load or store refers to a location outside the location table.
    #[error("in `{function}`, block {block}, instruction {index}: undefined location #{location}")]
    UndefinedLocation {
        function: String,
        block: String,
        index: usize,
        location: u32,
    },
}
