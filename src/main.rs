//! CLI entry point (SPEC_FULL.md §4.8): parses arguments, configures
//! logging, then either drives the REPL or evaluates a script
//! non-interactively. Grounded on `original_source/schemepy/__main__.py`'s
//! `argparse` + `logging.basicConfig` pairing, with `clap`'s derive API
//! and `env_logger` as the idiomatic Rust substitutes (derive pattern per
//! `examples/akasaka-miraina-lambdust/src/bin/scheme_comparison.rs`).

use clap::Parser;
use log::LevelFilter;
use rusty_scheme_core::error::SchemeError;
use rusty_scheme_core::reader::{analyzer, datum};
use rusty_scheme_core::{evaluate, global_env, repl};
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

/// A small Scheme interpreter with trampolined tail calls and per-parameter
/// strict/lazy/memoized argument passing.
#[derive(Parser)]
#[command(name = "rusty-scheme", version, about)]
struct Cli {
    /// Enable debug-level logging of tokenization, analysis, and evaluation.
    #[arg(short, long)]
    verbose: bool,

    /// REPL history file (defaults to a dirs-derived location in $HOME).
    #[arg(long, value_name = "PATH")]
    history: Option<PathBuf>,

    /// Evaluate this script non-interactively instead of starting the REPL.
    script: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    env_logger::Builder::new().filter_level(level).init();

    match cli.script {
        Some(path) => run_script(&path),
        None => match repl::run(cli.history) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("{}", err);
                ExitCode::FAILURE
            }
        },
    }
}

/// Reads every top-level form out of `path`, evaluating each against a
/// fresh global environment, and stops at the first error (SPEC_FULL.md
/// §4.8: the script runner, unlike the REPL, treats evaluation failures as
/// fatal).
fn run_script(path: &PathBuf) -> ExitCode {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("failed to read {}: {}", path.display(), err);
            return ExitCode::FAILURE;
        }
    };

    let forms: Result<Vec<_>, SchemeError> = datum::read_all(&source);
    let forms = match forms {
        Ok(forms) => forms,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    let env = global_env();
    for datum in forms {
        let outcome = analyzer::analyze(&datum).and_then(|expr| evaluate(&expr, Rc::clone(&env)));
        if let Err(err) = outcome {
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}
