//! Subprocess execution for the external build tools.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::error::ToolError;

/// Result of a command execution.
#[derive(Debug, Clone, Default)]
pub struct ExecResult {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

impl ExecResult {
    /// Diagnostic text for error reports: stderr, or stdout when stderr is empty.
    #[must_use]
    pub fn diagnostics(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }

    /// Convert a non-zero exit into a [`ToolError::Failed`].
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Failed`] if the command did not succeed.
    pub fn check(self, label: &str) -> Result<Self, ToolError> {
        if self.success {
            return Ok(self);
        }
        Err(ToolError::Failed {
            program: label.to_string(),
            code: self.code.unwrap_or(-1),
            output: self.diagnostics().to_string(),
        })
    }
}

/// Abstraction over process execution so tasks can be tested without
/// spawning the real tools.
pub trait Executor: Send + Sync + std::fmt::Debug {
    /// Run `program` in `dir`, failing on a non-zero exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exits non-zero.
    fn run_in(&self, dir: &Path, program: &str, args: &[String]) -> Result<ExecResult>;

    /// Run `program` in `dir` and return its result regardless of exit status.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned.
    fn run_unchecked_in(&self, dir: &Path, program: &str, args: &[String]) -> Result<ExecResult>;

    /// [`run_unchecked_in`](Self::run_unchecked_in) with `env` added to the
    /// inherited environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned.
    fn run_unchecked_with_env(
        &self,
        dir: &Path,
        program: &str,
        args: &[String],
        env: &[(&str, &str)],
    ) -> Result<ExecResult>;

    /// Locate `program` on `PATH`.
    fn which(&self, program: &str) -> Option<PathBuf>;
}

/// [`Executor`] backed by [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run_in(&self, dir: &Path, program: &str, args: &[String]) -> Result<ExecResult> {
        let result = self.run_unchecked_in(dir, program, args)?;
        Ok(result.check(&display_name(program))?)
    }

    fn run_unchecked_in(&self, dir: &Path, program: &str, args: &[String]) -> Result<ExecResult> {
        self.run_unchecked_with_env(dir, program, args, &[])
    }

    fn run_unchecked_with_env(
        &self,
        dir: &Path,
        program: &str,
        args: &[String],
        env: &[(&str, &str)],
    ) -> Result<ExecResult> {
        let output = Command::new(program)
            .args(args)
            .envs(env.iter().copied())
            .current_dir(dir)
            .output()
            .with_context(|| format!("failed to execute: {program} in {}", dir.display()))?;
        Ok(ExecResult::from(output))
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}

/// Resolve an npm-installed tool: `<root>/node_modules/.bin/<tool>` first,
/// then `PATH`.
///
/// # Errors
///
/// Returns [`ToolError::NotFound`] if the tool is in neither location.
pub fn resolve_tool(executor: &dyn Executor, root: &Path, tool: &str) -> Result<String, ToolError> {
    let local_name = if cfg!(windows) {
        format!("{tool}.cmd")
    } else {
        tool.to_string()
    };
    let local = root.join("node_modules").join(".bin").join(local_name);
    if local.is_file() {
        return Ok(local.display().to_string());
    }
    executor
        .which(tool)
        .map(|p| p.display().to_string())
        .ok_or_else(|| ToolError::NotFound {
            program: tool.to_string(),
        })
}

/// Short name of a program for log lines and errors (`lessc` rather than
/// `/repo/node_modules/.bin/lessc`).
#[must_use]
pub fn display_name(program: &str) -> String {
    Path::new(program)
        .file_stem()
        .map_or_else(|| program.to_string(), |s| s.to_string_lossy().to_string())
}

/// Render a command line for dry-run and debug output.
#[must_use]
pub fn command_line(program: &str, args: &[String]) -> String {
    let mut line = display_name(program);
    for arg in args {
        line.push(' ');
        if arg.contains(char::is_whitespace) {
            line.push_str(&format!("\"{arg}\""));
        } else {
            line.push_str(arg);
        }
    }
    line
}
