//! Docker command builder.
//!
//! Every engine call funnels through [`DockerCommand`] so that invocations are
//! logged the same way and failures carry Docker's stderr.

use std::path::Path;

use duct::cmd;
use tracing::debug;
use wp_core::command_stream::render_command;
use wp_core::error::{Result, WpError};

#[derive(Debug, Clone, Default)]
pub struct DockerCommand {
    args: Vec<String>,
}

impl DockerCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn as_args(&self) -> &[String] {
        &self.args
    }

    fn rendered(&self) -> String {
        render_command("docker", &self.args)
    }

    fn run(&self, input: Option<&[u8]>) -> Result<Vec<u8>> {
        debug!("Executing Docker command: {}", self.rendered());

        let mut expression = cmd("docker", &self.args)
            .stdout_capture()
            .stderr_capture()
            .unchecked();
        if let Some(bytes) = input {
            expression = expression.stdin_bytes(bytes.to_vec());
        }

        let output = expression.run().map_err(|e| {
            WpError::Engine(format!("Failed to execute '{}': {}", self.rendered(), e))
        })?;

        if output.status.success() {
            Ok(output.stdout)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(WpError::Engine(format!(
                "'{}' failed with status {}: {}",
                self.rendered(),
                output.status,
                stderr.trim()
            )))
        }
    }

    /// Run and discard stdout.
    pub fn execute(self) -> Result<()> {
        self.run(None).map(|_| ())
    }

    pub fn execute_with_output(self) -> Result<String> {
        self.run(None)
            .map(|stdout| String::from_utf8_lossy(&stdout).into_owned())
    }

    /// Raw stdout, for payloads such as database dumps.
    pub fn execute_with_bytes(self) -> Result<Vec<u8>> {
        self.run(None)
    }

    pub fn execute_with_input(self, input: &[u8]) -> Result<()> {
        self.run(Some(input)).map(|_| ())
    }
}

/// Helper for building `docker compose` arguments.
pub struct ComposeCommand;

impl ComposeCommand {
    pub fn build_args(
        project: &str,
        compose_path: &Path,
        subcommand: &str,
        extra_args: &[&str],
    ) -> Result<Vec<String>> {
        let file = compose_path.to_str().ok_or_else(|| {
            WpError::Internal(format!("Compose path is not valid UTF-8: {:?}", compose_path))
        })?;
        let mut args = vec![
            "compose".to_string(),
            "-p".to_string(),
            project.to_string(),
            "-f".to_string(),
            file.to_string(),
            subcommand.to_string(),
        ];
        args.extend(extra_args.iter().map(|s| s.to_string()));
        Ok(args)
    }
}
