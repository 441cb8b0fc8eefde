// Process command runner adapter implementation

use std::{
    path::PathBuf,
    process::Stdio,
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::runner::{CommandError, CommandOutput, CommandRunner, Invocation};

/// Runs invocations as child processes through `tokio::process`
#[derive(Clone, Debug)]
pub struct ProcessCommandRunner {
    default_timeout: Duration,
}

impl ProcessCommandRunner {
    #[must_use]
    pub fn new(default_timeout: Duration) -> Self {
        Self { default_timeout }
    }
}

#[async_trait]
impl CommandRunner for ProcessCommandRunner {
    async fn is_command_available(&self, program: &str) -> bool {
        let probe = Invocation::new(program).arg("--version");

        match self.execute(&probe).await {
            Ok(output) => output.is_success(),
            Err(_) => false,
        }
    }

    async fn execute(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError> {
        self.execute_with_timeout(invocation, self.default_timeout)
            .await
    }

    async fn execute_with_timeout(
        &self,
        invocation: &Invocation,
        timeout: Duration,
    ) -> Result<CommandOutput, CommandError> {
        let start_time = Instant::now();

        let mut cmd = Command::new(invocation.program());
        cmd.args(invocation.arguments())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let working_directory = match invocation.working_directory() {
            Some(dir) => {
                cmd.current_dir(dir);
                dir.clone()
            }
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        };

        debug!(command = %invocation, cwd = %working_directory.display(), "executing");

        let output = tokio::time::timeout(timeout, cmd.output())
            .await
            .map_err(|_| CommandError::Timeout {
                command: invocation.to_string(),
                timeout,
                working_directory: working_directory.clone(),
            })?
            .map_err(|e| CommandError::IoError {
                command: invocation.to_string(),
                working_directory: working_directory.clone(),
                source: Arc::new(e),
            })?;

        Ok(CommandOutput::new(output, start_time.elapsed()))
    }
}
