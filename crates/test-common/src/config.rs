//! `AppConfig` test helpers to eliminate duplication across install tests.

use std::path::Path;

use olaf::config::{AppConfig, AppConfigBuilder};

use crate::constants::TEST_COMMAND_TIMEOUT_SECS;

/// Creates a standard test configuration with colors disabled.
#[must_use]
pub fn test_config() -> AppConfig {
    AppConfigBuilder::default()
        .use_colors(false)
        .command_timeout(TEST_COMMAND_TIMEOUT_SECS)
        .build()
}

/// Creates a test configuration rooted in the given installation and project directories.
/// Used primarily in integration tests with temporary directories.
pub fn test_config_with_dirs<P, Q>(target: P, project: Q) -> AppConfig
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    AppConfigBuilder::default()
        .target_directory(target.as_ref())
        .local_root(project.as_ref())
        .use_colors(false)
        .command_timeout(TEST_COMMAND_TIMEOUT_SECS)
        .build()
}
