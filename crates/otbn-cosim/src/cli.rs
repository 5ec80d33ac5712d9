//! CLI definitions and argument types.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "otbn-cosim")]
#[command(about = "Check OTBN RTL traces against the ISS, instruction by instruction")]
#[command(version)]
pub struct Cli {
    /// Show metrics summary after execution
    #[arg(long, global = true)]
    pub metrics: bool,

    /// Enable verbose output (every trace record is logged)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output (only show errors)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub silent: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay an RTL trace and an ISS trace in lock-step and compare them
    Check {
        /// RTL trace file (one stall or execute record per cycle)
        #[arg(long, value_name = "FILE")]
        rtl: PathBuf,

        /// ISS trace file (one record or STALL per cycle)
        #[arg(long, value_name = "FILE")]
        iss: PathBuf,

        /// Cycle number of the first record
        #[arg(long, default_value = "0")]
        first_cycle: u32,

        /// Keep delivering records after the first failure
        #[arg(long)]
        keep_going: bool,

        /// The traces were cut short: do not end the session after the last record
        #[arg(long)]
        partial: bool,
    },
    /// Parse a trace file and print its records
    Dump {
        /// Trace file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Which simulator produced the file
        #[arg(long, value_enum, default_value = "rtl")]
        side: SideArg,
    },
}

/// Producer of a trace file.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SideArg {
    /// Cycle-level trace of the hardware design
    Rtl,
    /// Reference instruction-set simulator
    Iss,
}
