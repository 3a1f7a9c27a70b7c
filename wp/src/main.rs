use clap::Parser;
use tracing::debug;

mod cli;
mod commands;

use cli::Args;
use commands::{execute_command, report_error};

fn main() {
    let args = Args::parse();

    let mut log_settings = wp_logging::LogSettings::from_env();
    if args.debug {
        log_settings = log_settings.verbose();
    }
    let log_guard = wp_logging::init_subscriber(&log_settings);

    debug!(command = args.command.name(), "Starting wp-manager");

    let code = match execute_command(args) {
        Ok(()) => 0,
        Err(e) => {
            report_error(&e);
            1
        }
    };

    // Flush file logs before exiting.
    drop(log_guard);
    std::process::exit(code);
}
