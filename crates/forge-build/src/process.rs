//! External command execution with consistent error reporting.
//!
//! Recipe steps and interpreter queries all go through [`Cmd`], so every
//! failure names the command and its exit code.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use anyhow::{bail, Context, Result};
use tracing::debug;

/// Result of a captured command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Exit code, or -1 if terminated by signal.
    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }

    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }

    pub fn stderr_trimmed(&self) -> &str {
        self.stderr.trim()
    }
}

/// Builder for configuring command execution.
#[derive(Debug, Clone)]
pub struct Cmd {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    env: BTreeMap<String, String>,
    /// Custom error message prefix.
    error_prefix: Option<String>,
}

impl Cmd {
    pub fn new(program: impl AsRef<str>) -> Self {
        Self {
            program: program.as_ref().to_string(),
            args: Vec::new(),
            current_dir: None,
            env: BTreeMap::new(),
            error_prefix: None,
        }
    }

    /// Run `script` through `sh -c`.
    pub fn shell(script: impl AsRef<str>) -> Self {
        Self::new("sh").arg("-c").arg(script)
    }

    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.args.push(arg.as_ref().to_string());
        }
        self
    }

    /// Set the working directory.
    pub fn dir(mut self, dir: &Path) -> Self {
        self.current_dir = Some(dir.to_path_buf());
        self
    }

    /// Add one environment variable on top of the inherited environment.
    pub fn env(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let (key, value) = (key.as_ref().to_string(), value.as_ref().to_string());
        self.env.insert(key, value);
        self
    }

    pub fn envs<'a, I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (k, v) in vars {
            self.env.insert(k.clone(), v.clone());
        }
        self
    }

    pub fn error_msg(mut self, msg: impl AsRef<str>) -> Self {
        self.error_prefix = Some(msg.as_ref().to_string());
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.envs(&self.env);
        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    fn spawn_context(&self) -> String {
        format!("Failed to execute '{}'. Is it installed?", self.program)
    }

    fn failure_prefix(&self) -> String {
        self.error_prefix
            .clone()
            .unwrap_or_else(|| format!("'{}' failed", self.program))
    }

    /// Run the command and capture its output. Fails on non-zero exit.
    pub fn run(self) -> Result<CommandResult> {
        debug!(program = %self.program, args = ?self.args, "running command");
        let mut cmd = self.command();
        let output = cmd.output().with_context(|| self.spawn_context())?;

        let result = CommandResult {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !result.success() {
            let prefix = self.failure_prefix();
            let stderr = result.stderr_trimmed();
            if stderr.is_empty() {
                bail!("{} (exit code {})", prefix, result.code());
            } else {
                bail!("{} (exit code {}):\n{}", prefix, result.code(), stderr);
            }
        }

        Ok(result)
    }

    /// Run the command with inherited stdio so build output streams to the terminal.
    pub fn run_interactive(self) -> Result<ExitStatus> {
        debug!(program = %self.program, args = ?self.args, "running command (interactive)");
        let mut cmd = self.command();
        cmd.stdin(Stdio::inherit());
        cmd.stdout(Stdio::inherit());
        cmd.stderr(Stdio::inherit());

        let status = cmd.status().with_context(|| self.spawn_context())?;

        if !status.success() {
            let code = status.code().unwrap_or(-1);
            bail!("{} (exit code {code})", self.failure_prefix());
        }

        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_captures_stdout() {
        let result = Cmd::shell("echo hello").run().unwrap();
        assert_eq!(result.stdout_trimmed(), "hello");
        assert_eq!(result.code(), 0);
    }

    #[test]
    fn env_and_dir_are_applied() {
        let dir = tempfile::tempdir().unwrap();
        let result = Cmd::shell("echo \"$FORGE_TEST_VAR\"; pwd")
            .env("FORGE_TEST_VAR", "value")
            .dir(dir.path())
            .run()
            .unwrap();
        let lines: Vec<&str> = result.stdout.lines().collect();
        assert_eq!(lines[0], "value");
        assert!(lines[1].ends_with(dir.path().file_name().unwrap().to_str().unwrap()));
    }

    #[test]
    fn failure_includes_prefix_and_stderr() {
        let err = Cmd::shell("echo broken >&2; exit 3")
            .error_msg("step failed")
            .run()
            .unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("step failed (exit code 3)"));
        assert!(msg.contains("broken"));
    }

    #[test]
    fn missing_program_is_an_error() {
        assert!(Cmd::new("forge-definitely-not-installed").run().is_err());
    }

    #[test]
    fn interactive_failure_reports_exit_code() {
        let err = Cmd::shell("exit 4").run_interactive().unwrap_err();
        assert!(err.to_string().contains("exit code 4"));
    }
}
