//! Text reports for liveness and value numbering results.
//!
//! Output is deterministic: blocks and instructions appear in function
//! order and name sets are sorted.
//!
//! Liveness, per block:
//!
//! ```text
//! ----- entry -----
//! UEVAR: a
//! VARKILL: b
//! LIVEOUT: b
//! ```
//!
//! Value numbering, per function:
//!
//! ```text
//! ValueNumbering: main
//!   %c = add %a, %b                                    3 = 1 add 2
//!   %d = add %a, %b                                    3 = 1 add 2 (redundant)
//!
//! ```

use std::fmt::{self, Write};

use flow_ir::Function;

use crate::liveness::{Liveness, NameSet};
use crate::value_numbering::ValueNumbering;

/// Width of the instruction column in the value-numbering report.
const INSTR_COLUMN: usize = 50;

/// Header used for blocks without a name.
const UNNAMED_BLOCK: &str = "Unnamed_BB";

/// Write the liveness report for `func`.
pub fn write_liveness_report(
    out: &mut impl Write,
    func: &Function,
    liveness: &Liveness<'_>,
) -> fmt::Result {
    for block in func.blocks() {
        let sets = liveness.block(block.id());
        writeln!(
            out,
            "----- {} -----",
            block.name().unwrap_or(UNNAMED_BLOCK)
        )?;
        writeln!(out, "UEVAR: {}", sorted_names(&sets.ue_var))?;
        writeln!(out, "VARKILL: {}", sorted_names(&sets.var_kill))?;
        writeln!(out, "LIVEOUT: {}", sorted_names(&sets.live_out))?;
    }
    Ok(())
}

/// Write the value-numbering report for `func`, including its header line
/// and trailing blank line.
pub fn write_value_numbering_report(
    out: &mut impl Write,
    func: &Function,
    numbering: &ValueNumbering,
) -> fmt::Result {
    writeln!(out, "ValueNumbering: {}", func.name())?;
    for entry in numbering.entries() {
        // Padding needs a pre-rendered string; the display adapter writes
        // piecewise.
        let text = func.display_instr(entry.instr(func)).to_string();
        writeln!(out, "  {text:<width$} {entry}", width = INSTR_COLUMN)?;
    }
    writeln!(out)
}

/// [`write_liveness_report`] into a fresh `String`.
pub fn liveness_report(func: &Function, liveness: &Liveness<'_>) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_liveness_report(&mut out, func, liveness);
    out
}

/// [`write_value_numbering_report`] into a fresh `String`.
pub fn value_numbering_report(func: &Function, numbering: &ValueNumbering) -> String {
    let mut out = String::new();
    let _ = write_value_numbering_report(&mut out, func, numbering);
    out
}

/// Space-joined names in ascending byte order.
pub fn sorted_names(set: &NameSet<'_>) -> String {
    let mut names: Vec<&str> = set.iter().copied().collect();
    names.sort_unstable();
    names.join(" ")
}
