use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod domain;
mod error;
mod services;

pub use cli::*;
pub use domain::models::*;
pub use services::config::load_config;
pub use services::dispatch::{dispatch, resolve_recipient};
pub use services::output::{print_error, print_one};
pub use services::pipeline::generate_report;
pub use services::render::write_pdf;
pub use services::source::open_source;

const LOG_ENV: &str = "GROUP_REPORT_LOG";

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match commands::handle_report(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => ExitCode::from(print_error(cli.json, &err)),
    }
}
