//! Driver for the `flowc` command.
//!
//! Reads a textual IR module, runs the requested analyses on every
//! function in file order, and writes the reports to the given sink
//! (stderr from the binary). `--log` additionally appends the
//! value-numbering reports to a file.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Once;

use flow_analysis::report::{liveness_report, value_numbering_report};
use flow_analysis::{compute_liveness, number_values};
use flow_ir::{parse_module, ParseError};

/// Usage text printed by `flowc help` and after argument errors.
pub const USAGE: &str = "\
Usage: flowc <command> <file.ir> [--log <path>]

Commands:
  liveness          Print UEVAR, VARKILL and LIVEOUT for every block
  value-numbering   Print value numbers for loads, stores and arithmetic
  all               Run both analyses
  help              Show this message

Options:
  --log <path>      Append value-numbering reports to <path>
";

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber when `RUST_LOG` is set.
///
/// Safe to call more than once; only the first call has an effect.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(io::stderr)
                        .with_target(true)
                        .with_level(true),
                )
                .with(filter)
                .init();
        }
    });
}

// ── Options ─────────────────────────────────────────────────────────

/// Which analyses to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Liveness,
    ValueNumbering,
    All,
}

impl Command {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "liveness" => Some(Command::Liveness),
            "value-numbering" => Some(Command::ValueNumbering),
            "all" => Some(Command::All),
            _ => None,
        }
    }

    fn runs_liveness(self) -> bool {
        matches!(self, Command::Liveness | Command::All)
    }

    fn runs_value_numbering(self) -> bool {
        matches!(self, Command::ValueNumbering | Command::All)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DriverOptions {
    pub command: Command,
    pub input: PathBuf,
    pub log: Option<PathBuf>,
}

/// Result of argument parsing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Invocation {
    Help,
    Run(DriverOptions),
}

/// Parse command-line arguments, excluding the program name.
///
/// `--log` accepts its path either as the next argument or inline
/// (`--log=<path>`), anywhere after the command.
pub fn parse_args<I>(args: I) -> Result<Invocation, DriverError>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    let mut args = args.into_iter().map(Into::into);

    let Some(name) = args.next() else {
        return Err(usage("missing command"));
    };
    if matches!(name.as_str(), "help" | "--help" | "-h") {
        return Ok(Invocation::Help);
    }
    let command =
        Command::from_name(&name).ok_or_else(|| usage(format!("unknown command `{name}`")))?;

    let mut input = None;
    let mut log = None;
    while let Some(arg) = args.next() {
        let path = if arg == "--log" {
            Some(args.next().ok_or_else(|| usage("`--log` requires a path"))?)
        } else {
            arg.strip_prefix("--log=").map(str::to_string)
        };

        if let Some(path) = path {
            if path.is_empty() {
                return Err(usage("`--log` requires a path"));
            }
            if log.replace(PathBuf::from(path)).is_some() {
                return Err(usage("`--log` given more than once"));
            }
        } else if arg.starts_with('-') {
            return Err(usage(format!("unknown option `{arg}`")));
        } else if input.is_none() {
            input = Some(PathBuf::from(arg));
        } else {
            return Err(usage(format!("unexpected argument `{arg}`")));
        }
    }

    let input = input.ok_or_else(|| usage("missing input file"))?;
    if log.is_some() && !command.runs_value_numbering() {
        return Err(usage("`--log` only applies to value-numbering reports"));
    }

    Ok(Invocation::Run(DriverOptions {
        command,
        input,
        log,
    }))
}

fn usage(message: impl Into<String>) -> DriverError {
    DriverError::Usage(message.into())
}

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("{0}")]
    Usage(String),

    #[error("cannot read `{}`: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("{}: {source}", .path.display())]
    Parse { path: PathBuf, source: ParseError },

    #[error("cannot write log `{}`: {source}", .path.display())]
    Log { path: PathBuf, source: io::Error },

    #[error("cannot write report: {0}")]
    Output(#[from] io::Error),
}

// ── Run ─────────────────────────────────────────────────────────────

/// Run the analyses selected by `options`, writing reports to `out`.
///
/// For `all`, each function's liveness report is followed by its
/// value-numbering report. Returns the number of functions analyzed.
pub fn run(options: &DriverOptions, out: &mut impl Write) -> Result<usize, DriverError> {
    let source = fs::read_to_string(&options.input).map_err(|source| DriverError::Read {
        path: options.input.clone(),
        source,
    })?;
    let functions = parse_module(&source).map_err(|source| DriverError::Parse {
        path: options.input.clone(),
        source,
    })?;

    tracing::debug!(
        input = %options.input.display(),
        functions = functions.len(),
        command = ?options.command,
        "module parsed"
    );

    let mut log = match &options.log {
        Some(path) => Some(LogFile::open(path)?),
        None => None,
    };

    for func in &functions {
        if options.command.runs_liveness() {
            let liveness = compute_liveness(func);
            out.write_all(liveness_report(func, &liveness).as_bytes())?;
        }
        if options.command.runs_value_numbering() {
            let report = value_numbering_report(func, &number_values(func));
            out.write_all(report.as_bytes())?;
            if let Some(log) = &mut log {
                log.append(&report)?;
            }
        }
    }
    out.flush()?;

    Ok(functions.len())
}

/// Value-numbering log opened in append mode.
struct LogFile {
    path: PathBuf,
    file: fs::File,
}

impl LogFile {
    fn open(path: &Path) -> Result<Self, DriverError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| DriverError::Log {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(LogFile {
            path: path.to_path_buf(),
            file,
        })
    }

    fn append(&mut self, report: &str) -> Result<(), DriverError> {
        self.file
            .write_all(report.as_bytes())
            .map_err(|source| DriverError::Log {
                path: self.path.clone(),
                source,
            })
    }
}
