//! Command implementations.

mod check;
mod dump;

use crate::cli::{Cli, Commands};

/// Dispatch CLI command to the appropriate handler.
pub fn run_command(cli: &Cli) -> i32 {
    match &cli.command {
        Commands::Check {
            rtl,
            iss,
            first_cycle,
            keep_going,
            partial,
        } => check::cmd_check(rtl, iss, *first_cycle, *keep_going, *partial),
        Commands::Dump { file, side } => dump::cmd_dump(file, *side),
    }
}
