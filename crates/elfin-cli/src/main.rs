//! `elfinc`: batch compiler for ELFIN source files.
//!
//! Exit status is 0 iff no Error-severity diagnostic was produced;
//! warnings and notes alone do not fail the build. Diagnostics go to
//! stderr, one per line as `path:line:col: severity: message`, or with
//! source snippets under `--pretty`.

use clap::Parser;
use elfin_lang::{compile, DiagnosticFormatter};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "elfinc", version = elfin_lang::VERSION, about = "ELFIN language compiler front end")]
struct Args {
    /// Source files to compile
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Print diagnostics with source snippets and labels
    #[arg(long)]
    pretty: bool,

    /// Dump the resolved IR as pretty JSON to stdout
    #[arg(long)]
    dump_json: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut failed = false;

    for file in &args.files {
        let source = match std::fs::read_to_string(file) {
            Ok(source) => source,
            Err(err) => {
                eprintln!("elfinc: cannot read '{}': {}", file.display(), err);
                failed = true;
                continue;
            }
        };

        let output = compile(file.clone(), source);
        tracing::debug!(
            path = %file.display(),
            diagnostics = output.diagnostics.len(),
            "compile finished"
        );

        if args.pretty {
            let formatter = DiagnosticFormatter::new(&output.sources);
            eprint!("{}", formatter.format_all(&output.diagnostics));
        } else {
            for diag in &output.diagnostics {
                eprintln!("{}", diag.one_line(&output.sources));
            }
        }

        if args.dump_json {
            match output.to_json() {
                Ok(json) => println!("{}", json),
                Err(err) => {
                    eprintln!("elfinc: cannot serialize IR: {}", err);
                    failed = true;
                }
            }
        }

        if output.has_errors() {
            failed = true;
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
