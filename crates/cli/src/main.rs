mod cli;
mod commands;
mod config;
mod event_processor;
mod formatters;
mod tables;
mod terminal_progress_reporter;

use std::process;

use clap::Parser;
use olaf::{
    config::loader::{ApplyToConfig, ConfigLoader, Yaml},
    fs::real::RealFileSystem,
};
use terminal_progress_reporter::TerminalProgressReporter;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::{cli::ClapCli, commands::dispatch_command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ClapCli::parse();
    init_tracing(args.verbose);
    debug!("CLI arguments: {:#?}", &args);

    let fs = RealFileSystem;

    // `config` drives the install; `config validate` checks the file as written.
    let (config, original_config) = {
        let config = Yaml::new(&fs).load_config()?;
        (args.apply_to_config(config.clone()), config)
    };

    debug!("Final config: {:#?}", &config);

    let reporter = TerminalProgressReporter::new(config.use_colors());
    let exit_code = dispatch_command(&args, &config, original_config, reporter).await;

    process::exit(exit_code)
}

/// Logs go to stderr and are off unless `--verbose` or `RUST_LOG` asks for them. Events already
/// reach the terminal through the reporter.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "off" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
