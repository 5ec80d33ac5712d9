//! otbn-cosim CLI - OTBN RTL/ISS trace checker

mod cli;
mod commands;
mod terminal;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;

fn main() {
    let cli = Cli::parse();

    let metrics_handle = if cli.metrics {
        otbn_cosim::metrics::CliRecorder::new().install()
    } else {
        None
    };
    otbn_cosim::metrics::init();

    let default_level = if cli.verbose {
        "otbn_cosim=debug"
    } else if cli.silent {
        "otbn_cosim=error"
    } else {
        "otbn_cosim=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(default_level.parse().unwrap()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = commands::run_command(&cli);

    if let Some(handle) = metrics_handle {
        handle.print_summary();
    }

    std::process::exit(exit_code);
}
