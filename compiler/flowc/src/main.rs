//! flowc CLI
//!
//! Liveness and value-numbering reports for textual IR files.

use flowc::{init_tracing, parse_args, run, Invocation, USAGE};

fn main() {
    init_tracing();

    let options = match parse_args(std::env::args().skip(1)) {
        Ok(Invocation::Run(options)) => options,
        Ok(Invocation::Help) => {
            print!("{USAGE}");
            return;
        }
        Err(err) => {
            eprintln!("error: {err}");
            eprintln!();
            eprint!("{USAGE}");
            std::process::exit(1);
        }
    };

    let stderr = std::io::stderr();
    if let Err(err) = run(&options, &mut stderr.lock()) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
