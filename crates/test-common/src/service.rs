//! Service creation helpers to eliminate service setup duplication in tests.

use std::time::Duration;

use olaf::{
    commands::ProcessCommandRunner,
    config::AppConfig,
    fs::{RemovalPolicy, real::RealFileSystem},
    install::InstallServiceImpl,
};

use crate::{config::test_config_with_dirs, fetcher::FixtureFetcher, fixtures::Workspace};

pub type TestInstallService = InstallServiceImpl<RealFileSystem, FixtureFetcher, ProcessCommandRunner>;

/// Creates an install service over the workspace's fixture sources, target and project.
/// Returns the fetcher as well so tests can inspect fetch order.
pub fn create_test_service(workspace: &Workspace) -> (TestInstallService, FixtureFetcher) {
    let config = test_config_with_dirs(workspace.target(), workspace.project());
    create_test_service_with_config(workspace, config)
}

/// Creates an install service with a specific configuration.
pub fn create_test_service_with_config(
    workspace: &Workspace,
    config: AppConfig,
) -> (TestInstallService, FixtureFetcher) {
    let fetcher = FixtureFetcher::new(workspace.sources());
    let runner = ProcessCommandRunner::new(config.command_timeout());
    let service = InstallServiceImpl::new(RealFileSystem, fetcher.clone(), runner, config)
        .with_removal_policy(RemovalPolicy::new(1, Duration::ZERO));
    (service, fetcher)
}
