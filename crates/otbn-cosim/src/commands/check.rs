use std::path::Path;

use otbn_cosim::{Replay, ReplayConfig};

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS};
use crate::terminal;

/// Replay an RTL trace against an ISS trace.
pub fn cmd_check(
    rtl_path: &Path,
    iss_path: &Path,
    first_cycle: u32,
    keep_going: bool,
    partial: bool,
) -> i32 {
    terminal::path_output("RTL", rtl_path);
    terminal::path_output("ISS", iss_path);

    let replay = match Replay::load(rtl_path, iss_path) {
        Ok(replay) => replay,
        Err(e) => {
            terminal::error(&e.to_string());
            return EXIT_FAILURE;
        }
    };
    terminal::info(&format!(
        "{} RTL records, {} ISS records",
        replay.rtl_records().len(),
        replay.iss_records().len()
    ));

    let config = ReplayConfig {
        first_cycle,
        stop_on_error: !keep_going,
        finish: !partial,
    };
    let outcome = replay.check(&config);
    if !outcome.quiescent {
        terminal::info("session left open, trailing entries were not checked");
    }

    if outcome.passed {
        terminal::success(&format!("PASS: {} cycles checked", outcome.cycles));
        return EXIT_SUCCESS;
    }

    match &outcome.error {
        Some(err) => {
            terminal::error(&format!(
                "FAIL ({}) after {} cycles",
                err.class(),
                outcome.cycles
            ));
            terminal::details(&err.to_string());
        }
        None => terminal::error(&format!("FAIL after {} cycles", outcome.cycles)),
    }
    EXIT_FAILURE
}
