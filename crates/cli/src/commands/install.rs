use std::path::PathBuf;

use dialoguer::Confirm;
use olaf::{
    commands::ProcessCommandRunner,
    config::AppConfig,
    fetch::GitFetcher,
    fs::real::RealFileSystem,
    install::{InstallError, InstallOptions, InstallService, InstallServiceImpl},
    local::LocalProject,
};
use tracing::{debug, info};

use crate::{
    cli::InstallArgs, event_processor::EventProcessor,
    terminal_progress_reporter::TerminalProgressReporter,
};

pub(crate) async fn handle_install(
    args: &InstallArgs,
    assume_yes: bool,
    config: &AppConfig,
    reporter: TerminalProgressReporter,
) -> i32 {
    let options = install_options(args);
    debug!("Install options: {:#?}", &options);

    if !assume_yes {
        let confirmed = confirm_destructive(&options, config, |prompt| {
            Confirm::new().with_prompt(prompt).default(false).interact()
        });
        if let Err(error) = confirmed {
            reporter.report_error(error);
            return 1;
        }
    }

    info!("Starting install");
    let runner = ProcessCommandRunner::new(config.command_timeout());
    let fetcher = GitFetcher::new(RealFileSystem, runner.clone(), config);
    let service = InstallServiceImpl::new(RealFileSystem, fetcher, runner, config.clone());

    let stream = service.install(options).await;
    EventProcessor::new(reporter).process_events(stream).await
}

pub(crate) fn install_options(args: &InstallArgs) -> InstallOptions {
    InstallOptions {
        repository: args.repo.clone(),
        branch: args.branch.clone(),
        target: args.target.clone(),
        local: args.local.clone(),
        clean_global: args.clean_global,
        clean_local: args.clean_local,
        preserve_kernel: !args.no_preserve_my_competencies,
        prune: !args.no_prune,
        prune_file: args.prune_file.clone(),
        init_git: args.init_git,
    }
}

/// Ask before each requested clean; a declined or unanswerable prompt aborts the run
fn confirm_destructive<P>(
    options: &InstallOptions,
    config: &AppConfig,
    mut prompt: P,
) -> Result<(), InstallError>
where
    P: FnMut(String) -> Result<bool, dialoguer::Error>,
{
    let mut ask = |path: PathBuf| {
        let question = format!("Delete {} before installing?", path.display());
        match prompt(question) {
            Ok(true) => Ok(()),
            Ok(false) => Err(InstallError::Aborted),
            Err(e) => {
                debug!("confirmation prompt unavailable: {e}");
                Err(InstallError::Aborted)
            }
        }
    };

    if options.clean_global {
        ask(options
            .target
            .clone()
            .unwrap_or_else(|| config.target_directory().clone()))?;
    }
    if options.clean_local {
        let project = options
            .local
            .as_deref()
            .unwrap_or(config.local_root().as_path());
        ask(LocalProject::new(project).olaf_dir())?;
    }

    Ok(())
}
