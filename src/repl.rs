//! Interactive shell (SPEC_FULL.md §4.8), grounded on the teacher's
//! `main.rs` REPL loop and on `original_source/schemepy/repl.py`'s
//! read-analyze-evaluate-print cycle. One process-lifetime global
//! environment; every evaluation failure is reported and the loop
//! continues — the distilled spec's "dispatch failures terminate" policy
//! is honored by the script runner in `main.rs` instead, not here.

use crate::error::SchemeError;
use crate::primitives::global_env;
use crate::reader::{analyzer, datum};
use crate::trampoline::evaluate;
use log::{debug, info};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use std::rc::Rc;

const PROMPT: &str = "scheme> ";

/// A `dirs`-derived default history path, used when `--history` is absent.
pub fn default_history_path() -> Option<PathBuf> {
    dirs::home_dir().map(|mut path| {
        path.push(".rusty_scheme_history");
        path
    })
}

/// Runs the read-eval-print loop until Ctrl+C, Ctrl+D, or a fatal
/// line-editor error. `history_path` overrides [`default_history_path`].
pub fn run(history_path: Option<PathBuf>) -> crate::error::Result<()> {
    println!("Rusty Scheme Interpreter");
    println!("Press Ctrl+C or Ctrl+D to exit");

    let env = global_env();
    let mut editor = DefaultEditor::new()
        .map_err(|e| SchemeError::Eval(format!("failed to initialize line editor: {e}")))?;

    let history_path = history_path.or_else(default_history_path);
    if let Some(path) = &history_path {
        if editor.load_history(path).is_err() {
            debug!("no previous history at {}", path.display());
        }
    }

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line.as_str());
                eval_and_print(&line, &env);
            }
            Err(ReadlineError::Interrupted) => {
                info!("repl interrupted (Ctrl+C)");
                break;
            }
            Err(ReadlineError::Eof) => {
                info!("repl reached eof (Ctrl+D)");
                break;
            }
            Err(err) => {
                eprintln!("readline error: {err:?}");
                break;
            }
        }
    }

    if let Some(path) = &history_path {
        let _ = editor.save_history(path);
    }
    Ok(())
}

fn eval_and_print(line: &str, env: &Rc<std::cell::RefCell<crate::env::Environment>>) {
    let datum = match datum::read_one(line) {
        Ok(None) => return,
        Ok(Some(datum)) => datum,
        Err(err) => {
            eprintln!("{}", err);
            return;
        }
    };
    debug!("datum: {}", datum);
    let outcome = analyzer::analyze(&datum).and_then(|expr| evaluate(&expr, Rc::clone(env)));
    match outcome {
        Ok(value) => println!("{}", value),
        Err(err) => eprintln!("{}", err),
    }
}
