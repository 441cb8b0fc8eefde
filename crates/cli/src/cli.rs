// src/cli.rs
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// OLAF - overlay installer for competency packs
///
/// Without a subcommand, installs or updates the competency tree from the primary source and
/// the secondary sources it declares.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct ClapCli {
    #[clap(flatten)]
    pub(crate) install: InstallArgs,

    /// Answer yes to confirmation prompts
    ///
    #[clap(long, short = 'y', global = true, default_value_t = false)]
    pub(crate) yes: bool,

    /// Show detailed output
    ///
    #[clap(long, short = 'v', global = true, default_value_t = false)]
    pub(crate) verbose: bool,

    /// Disable colored output
    ///
    #[clap(long, global = true, default_value_t = false)]
    pub(crate) no_color: bool,

    /// Subcommand to execute
    ///
    #[clap(subcommand)]
    pub(crate) command: Option<ClapCommands>,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct InstallArgs {
    /// Primary source repository (`owner/repo` or a GitHub URL)
    ///
    #[clap(long)]
    pub(crate) repo: Option<String>,

    /// Branch of the primary source
    ///
    #[clap(long)]
    pub(crate) branch: Option<String>,

    /// Installation root, overriding `target_directory` from config
    ///
    #[clap(long)]
    pub(crate) target: Option<PathBuf>,

    /// Project root holding the local `.olaf` folder
    ///
    #[clap(long)]
    pub(crate) local: Option<PathBuf>,

    /// Delete the installation root before applying sources
    ///
    #[clap(long, default_value_t = false)]
    pub(crate) clean_global: bool,

    /// Delete the project's `.olaf` folder before applying sources
    ///
    #[clap(long, default_value_t = false)]
    pub(crate) clean_local: bool,

    /// Let incoming sources replace the kernel competency and its skills
    ///
    #[clap(long, default_value_t = false)]
    pub(crate) no_preserve_my_competencies: bool,

    /// Report prune lists without removing anything
    ///
    #[clap(long, default_value_t = false)]
    pub(crate) no_prune: bool,

    /// Additional prune list, relative to the project root
    ///
    #[clap(long)]
    pub(crate) prune_file: Option<PathBuf>,

    /// Initialize a git repository in the project root when there is none
    ///
    #[clap(long, alias = "git-init", default_value_t = false)]
    pub(crate) init_git: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum ClapCommands {
    /// Configuration management commands
    ///
    Config(ConfigCommands),
}

#[derive(Args, Debug, Clone)]
pub(crate) struct ConfigCommands {
    #[clap(subcommand)]
    pub(crate) command: ConfigSubcommands,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum ConfigSubcommands {
    /// Validate the olaf configuration file
    Validate,
}
