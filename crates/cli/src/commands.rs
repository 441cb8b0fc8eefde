pub(crate) mod config;
pub(crate) mod install;

use olaf::config::AppConfig;
use tracing::debug;

use crate::{
    cli::{ClapCli, ClapCommands, ConfigSubcommands},
    terminal_progress_reporter::TerminalProgressReporter,
};

/// Route to the requested command; no subcommand means install
pub(crate) async fn dispatch_command(
    args: &ClapCli,
    config: &AppConfig,
    original_config: AppConfig,
    reporter: TerminalProgressReporter,
) -> i32 {
    debug!("Dispatching command: {:?}", args.command);

    match &args.command {
        None => install::handle_install(&args.install, args.yes, config, reporter).await,
        Some(ClapCommands::Config(config_cmd)) => match config_cmd.command {
            ConfigSubcommands::Validate => config::handle_validate(&original_config, reporter),
        },
    }
}
