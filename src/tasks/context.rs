use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context as _, Result};

use crate::config::{BuildConfig, BuildPaths};
use crate::error::ToolError;
use crate::exec::{self, ExecResult, Executor};
use crate::logging::Log;
use crate::notification::Notifier;

/// Shared context for task execution.
pub struct Context {
    /// Derived build description, read-only for the whole run.
    pub build: Arc<BuildConfig>,
    /// Logger for output and task recording.
    pub log: Arc<dyn Log>,
    /// Log tool invocations instead of running them.
    pub dry_run: bool,
    /// Command executor (real processes or a test double).
    pub executor: Arc<dyn Executor>,
    /// Whether independent tasks run concurrently.
    pub parallel: bool,
    /// Failure alerts.
    pub notifier: Notifier,
    /// Set by the Ctrl-C handler; long-running tasks poll it.
    pub stop: Arc<AtomicBool>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("shop_id", &self.build.shop_id)
            .field("log", &"<dyn Log>")
            .field("dry_run", &self.dry_run)
            .field("executor", &self.executor)
            .field("parallel", &self.parallel)
            .field("notify", &self.notifier.is_enabled())
            .field("stop", &self.stop)
            .finish()
    }
}

impl Context {
    #[must_use]
    pub fn new(
        build: Arc<BuildConfig>,
        log: Arc<dyn Log>,
        executor: Arc<dyn Executor>,
        dry_run: bool,
        parallel: bool,
        notify: bool,
    ) -> Self {
        Self {
            build,
            log,
            dry_run,
            notifier: Notifier::new(Arc::clone(&executor), notify),
            executor,
            parallel,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share `stop` instead of the context's own flag.
    #[must_use]
    pub fn with_stop(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    /// The tool root (the directory the build runs in).
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.build.paths.root
    }

    #[must_use]
    pub fn paths(&self) -> &BuildPaths {
        &self.build.paths
    }

    /// Whether a stop was requested.
    #[must_use]
    pub fn stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Locate `tool`. In dry-run mode a missing tool resolves to its bare
    /// name so the would-be command can still be shown.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::NotFound`] if the tool is not installed.
    pub fn tool(&self, tool: &str) -> Result<String, ToolError> {
        match exec::resolve_tool(self.executor.as_ref(), self.root(), tool) {
            Err(ToolError::NotFound { .. }) if self.dry_run => Ok(tool.to_string()),
            other => other,
        }
    }

    /// Run `program` in the root, failing on a non-zero exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or fails.
    pub fn invoke(&self, program: &str, args: &[String]) -> Result<ExecResult> {
        self.log.debug(&format!("$ {}", exec::command_line(program, args)));
        self.executor
            .run_in(self.root(), program, args)
            .with_context(|| format!("running {}", exec::display_name(program)))
    }

    /// Same context with a different logger; everything else is shared.
    #[must_use]
    pub fn with_log(&self, log: Arc<dyn Log>) -> Self {
        Self {
            build: Arc::clone(&self.build),
            log,
            dry_run: self.dry_run,
            executor: Arc::clone(&self.executor),
            parallel: self.parallel,
            notifier: self.notifier.clone(),
            stop: Arc::clone(&self.stop),
        }
    }
}
