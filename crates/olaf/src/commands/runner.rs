//! Command execution abstractions and types
//!
//! The installer shells out for exactly two things: cloning sources and initializing a git
//! repository in the project root. Both go through the [`CommandRunner`] port so tests can
//! replace the process layer with a mock.

use std::{borrow::Cow, fmt, path::PathBuf, process::Output, sync::Arc, time::Duration};

use async_trait::async_trait;
use thiserror::Error;

/// A program plus its arguments, executed without a shell
///
/// Arguments are passed verbatim to the child process, so values coming from registry
/// documents are never interpreted by a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    working_directory: Option<PathBuf>,
}

impl Invocation {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_directory: None,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    #[must_use]
    pub fn working_directory(&self) -> Option<&PathBuf> {
        self.working_directory.as_ref()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Port for command execution (Hexagonal Architecture)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Check if `program` can be started in the current environment
    async fn is_command_available(&self, program: &str) -> bool;

    /// Execute an invocation with the runner's default timeout
    ///
    /// A non-zero exit is not an error at this level; inspect [`CommandOutput::is_success`] or
    /// use [`CommandOutput::ensure_success`].
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] if the process cannot be started or times out.
    async fn execute(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError>;

    /// Execute an invocation with an explicit timeout
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] if the process cannot be started or times out.
    async fn execute_with_timeout(
        &self,
        invocation: &Invocation,
        timeout: Duration,
    ) -> Result<CommandOutput, CommandError>;
}

/// Result of executing a command
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput {
    /// The process output containing exit status and output streams
    pub(crate) output: Output,

    /// How long the command took to execute
    pub(crate) duration: Duration,
}

impl CommandOutput {
    #[must_use]
    pub fn new(output: Output, duration: Duration) -> Self {
        Self { output, duration }
    }

    /// Get the command's exit code, or -1 when the process was terminated by a signal
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.output.status.code().unwrap_or(-1)
    }

    #[must_use]
    pub fn stdout_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.output.stdout)
    }

    #[must_use]
    pub fn stderr_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.output.stderr)
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.output.status.success()
    }

    /// Turn a non-zero exit into [`CommandError::NonZeroExit`]
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::NonZeroExit`] with the captured output when the process failed.
    pub fn ensure_success(self, invocation: &Invocation) -> Result<Self, CommandError> {
        if self.is_success() {
            return Ok(self);
        }

        Err(CommandError::NonZeroExit {
            command: invocation.to_string(),
            exit_code: self.exit_code(),
            stdout: self.stdout_str().trim().to_string(),
            stderr: self.stderr_str().trim().to_string(),
            working_directory: invocation.working_directory().cloned().unwrap_or_default(),
            execution_duration: self.duration,
        })
    }
}

/// Errors that can occur during command execution
#[derive(Error, Debug, Clone)]
pub enum CommandError {
    /// Command execution exceeded the specified timeout
    #[error("Command timed out after {timeout:?}: {command}")]
    Timeout {
        command: String,
        timeout: Duration,
        working_directory: PathBuf,
    },

    /// IO error occurred while starting or running the command
    #[error("IO Error executing command '{command}': {source}")]
    IoError {
        command: String,
        working_directory: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },

    /// Command executed but returned a non-zero exit code
    #[error("Command failed with exit code {exit_code}: {command}")]
    NonZeroExit {
        command: String,
        exit_code: i32,
        stdout: String,
        stderr: String,
        working_directory: PathBuf,
        execution_duration: Duration,
    },
}
