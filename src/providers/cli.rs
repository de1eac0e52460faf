//! Child-process runner shared by the CLI-backed providers.

use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument};

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    /// The program could not be started (missing binary, permissions, ...)
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error talking to '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Captured result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CliOutput {
    /// Trimmed stderr, or a placeholder naming the exit code when it is empty.
    pub fn error_text(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        match self.code {
            Some(code) => format!("exited with status {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// A program plus fixed leading arguments and environment.
///
/// The leading arguments let a provider run behind a wrapper, e.g.
/// `sh -c '<script>' sh` or `flatpak run ...`, with the per-call arguments
/// appended after them.
#[derive(Debug, Clone)]
pub struct CliCommand {
    program: String,
    base_args: Vec<String>,
    env: Vec<(String, String)>,
}

impl CliCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn with_base_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.base_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets an environment variable for every invocation. Values are never
    /// logged.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Runs the command with `args` appended, feeding `stdin` if given.
    ///
    /// The child is killed if the returned future is dropped, so a caller's
    /// timeout also stops the process.
    ///
    /// # Errors
    ///
    /// Only spawn and pipe failures are errors; a non-zero exit is reported
    /// through [`CliOutput::success`].
    #[instrument(skip(self, stdin), fields(program = %self.program))]
    pub async fn run(&self, args: &[&str], stdin: Option<&[u8]>) -> Result<CliOutput, CliError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.base_args)
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in &self.env {
            command.env(key, value);
        }

        let mut child = command.spawn().map_err(|source| CliError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if let Some(input) = stdin {
            if let Some(mut pipe) = child.stdin.take() {
                pipe.write_all(input).await.map_err(|source| self.io_error(source))?;
                pipe.shutdown().await.map_err(|source| self.io_error(source))?;
            }
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| self.io_error(source))?;

        let result = CliOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(
            success = result.success,
            code = ?result.code,
            stdout_bytes = result.stdout.len(),
            "Command finished"
        );
        Ok(result)
    }

    fn io_error(&self, source: std::io::Error) -> CliError {
        CliError::Io {
            program: self.program.clone(),
            source,
        }
    }
}

/// Runs `script` through `sh -c`; per-call arguments arrive as `$1`, `$2`, ...
#[cfg(test)]
pub(crate) fn shell(script: &str) -> CliCommand {
    CliCommand::new("sh").with_base_args(["-c", script, "sh"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_arguments_env_and_stdin_reach_the_child() {
        let command = shell(r#"printf '%s|%s|' "$1" "$2"; printf '%s|' "$TOKEN"; cat"#)
            .with_env("TOKEN", "abc");

        let output = command.run(&["one", "two"], Some(b"input")).await.unwrap();

        assert!(output.success);
        assert_eq!(output.stdout, "one|two|abc|input");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_not_an_error() {
        let output = shell("echo boom >&2; exit 3").run(&[], None).await.unwrap();

        assert!(!output.success);
        assert_eq!(output.code, Some(3));
        assert_eq!(output.error_text(), "boom");

        let silent = shell("exit 4").run(&[], None).await.unwrap();
        assert_eq!(silent.error_text(), "exited with status 4");
    }

    #[tokio::test]
    async fn test_missing_program_is_a_spawn_error() {
        let err = CliCommand::new("definitely-not-a-real-binary-7f3a")
            .run(&[], None)
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_dropped_future_stops_the_child() {
        let command = shell("sleep 5");
        let result =
            tokio::time::timeout(Duration::from_millis(100), command.run(&[], None)).await;
        assert!(result.is_err());
    }
}
