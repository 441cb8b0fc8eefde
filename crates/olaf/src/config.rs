pub mod loader;
pub mod seed;
pub mod validate;

use std::{num::NonZeroU64, path::PathBuf, time::Duration};

use serde::Deserialize;

const VERBOSE_DEFAULT: bool = false;
const USE_COLORS_DEFAULT: bool = true;
const COMMAND_TIMEOUT_DEFAULT_SECS: u64 = 300;

pub const DEFAULT_TARGET_DIRECTORY: &str = "~/.olaf";
pub const DEFAULT_SOURCE_BASE_URL: &str = "https://github.com";
pub const DEFAULT_GIT_PROGRAM: &str = "git";

/// Application configuration: the optional user config file with CLI arguments layered on top
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Global installation root
    #[serde(default = "default_target_directory")]
    pub(crate) target_directory: PathBuf,

    /// Project root that receives the local `.olaf` folder
    #[serde(default = "default_local_root")]
    pub(crate) local_root: PathBuf,

    /// User-level default for the primary repository
    #[serde(default)]
    pub(crate) repository: Option<String>,

    /// User-level default for the primary revision
    #[serde(default)]
    pub(crate) branch: Option<String>,

    #[serde(default = "default_source_base_url")]
    pub(crate) source_base_url: String,

    #[serde(default = "default_git_program")]
    pub(crate) git_program: String,

    // UI settings
    #[serde(default)]
    pub(crate) verbose: bool,

    #[serde(default = "default_use_colors")]
    pub(crate) use_colors: bool,

    // Execution settings
    #[serde(default = "default_command_timeout")]
    pub(crate) command_timeout: NonZeroU64,
}

fn default_target_directory() -> PathBuf {
    PathBuf::from(DEFAULT_TARGET_DIRECTORY)
}
fn default_local_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_source_base_url() -> String {
    DEFAULT_SOURCE_BASE_URL.to_string()
}
fn default_git_program() -> String {
    DEFAULT_GIT_PROGRAM.to_string()
}
fn default_command_timeout() -> NonZeroU64 {
    NonZeroU64::new(COMMAND_TIMEOUT_DEFAULT_SECS).unwrap_or(NonZeroU64::MIN)
}
fn default_use_colors() -> bool {
    USE_COLORS_DEFAULT
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfigBuilder::default().build()
    }
}

impl AppConfig {
    #[must_use]
    pub fn target_directory(&self) -> &PathBuf {
        &self.target_directory
    }

    #[must_use]
    pub fn local_root(&self) -> &PathBuf {
        &self.local_root
    }

    #[must_use]
    pub fn repository(&self) -> Option<&str> {
        self.repository.as_deref()
    }

    #[must_use]
    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    #[must_use]
    pub fn source_base_url(&self) -> &str {
        &self.source_base_url
    }

    #[must_use]
    pub fn git_program(&self) -> &str {
        &self.git_program
    }

    #[must_use]
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    #[must_use]
    pub fn use_colors(&self) -> bool {
        self.use_colors
    }

    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout.into())
    }

    pub fn target_directory_mut(&mut self) -> &mut PathBuf {
        &mut self.target_directory
    }

    pub fn local_root_mut(&mut self) -> &mut PathBuf {
        &mut self.local_root
    }

    pub fn verbose_mut(&mut self) -> &mut bool {
        &mut self.verbose
    }

    pub fn use_colors_mut(&mut self) -> &mut bool {
        &mut self.use_colors
    }
}

/// Builder pattern for `AppConfig`
///
#[derive(Default, Debug)]
pub struct AppConfigBuilder {
    target_directory: Option<PathBuf>,
    local_root: Option<PathBuf>,
    repository: Option<String>,
    branch: Option<String>,
    source_base_url: Option<String>,
    git_program: Option<String>,
    verbose: Option<bool>,
    use_colors: Option<bool>,
    command_timeout: Option<NonZeroU64>,
}

impl AppConfigBuilder {
    #[must_use]
    pub fn target_directory(mut self, target_directory: impl Into<PathBuf>) -> Self {
        self.target_directory = Some(target_directory.into());
        self
    }

    #[must_use]
    pub fn local_root(mut self, local_root: impl Into<PathBuf>) -> Self {
        self.local_root = Some(local_root.into());
        self
    }

    #[must_use]
    pub fn repository(mut self, repository: &str) -> Self {
        self.repository = Some(repository.to_string());
        self
    }

    #[must_use]
    pub fn branch(mut self, branch: &str) -> Self {
        self.branch = Some(branch.to_string());
        self
    }

    #[must_use]
    pub fn source_base_url(mut self, url: &str) -> Self {
        self.source_base_url = Some(url.to_string());
        self
    }

    #[must_use]
    pub fn git_program(mut self, program: &str) -> Self {
        self.git_program = Some(program.to_string());
        self
    }

    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    #[must_use]
    pub fn use_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = Some(use_colors);
        self
    }

    /// Zero is ignored and leaves the default in place
    #[must_use]
    pub fn command_timeout(mut self, timeout_secs: u64) -> Self {
        self.command_timeout = NonZeroU64::new(timeout_secs);
        self
    }

    #[must_use]
    pub fn build(self) -> AppConfig {
        AppConfig {
            target_directory: self
                .target_directory
                .unwrap_or_else(default_target_directory),
            local_root: self.local_root.unwrap_or_else(default_local_root),
            repository: self.repository,
            branch: self.branch,
            source_base_url: self
                .source_base_url
                .unwrap_or_else(default_source_base_url),
            git_program: self.git_program.unwrap_or_else(default_git_program),
            verbose: self.verbose.unwrap_or(VERBOSE_DEFAULT),
            use_colors: self.use_colors.unwrap_or(USE_COLORS_DEFAULT),
            command_timeout: self.command_timeout.unwrap_or_else(default_command_timeout),
        }
    }
}
