//! Common test utilities shared across all olaf crates.
//!
//! This crate provides standardized test helpers to eliminate code duplication
//! while maintaining test clarity and ergonomics.

pub mod config;
pub mod constants;
pub mod events;
pub mod fetcher;
pub mod fixtures;
pub mod fs;
pub mod service;

// Re-export the most commonly used items for convenience
pub use config::{test_config, test_config_with_dirs};
pub use constants::*;
pub use events::{
    assert_failed_operation, assert_successful_operation, collect_events, get_install_report,
    get_operation_result,
};
pub use fetcher::FixtureFetcher;
pub use fs::FailingCopyFileSystem;
pub use fixtures::{SourceFixture, Workspace, read_file, read_json, write_file};
pub use service::{TestInstallService, create_test_service, create_test_service_with_config};

// Re-export commonly used external dependencies for convenience
pub use olaf::install::{InstallOptions, InstallReport};
pub use tempfile::TempDir;
