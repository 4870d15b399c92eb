//! Task outcome records and the [`Log`] trait shared by all log backends.
use super::diagnostic::{DiagEvent, DiagnosticLog};
use super::{DRY_RUN_TARGET, STAGE_TARGET};

/// One task outcome, kept for the run summary.
#[derive(Debug, Clone)]
pub struct TaskEntry {
    /// Task name as shown on the command line.
    pub name: String,
    pub status: TaskStatus,
    /// Skip reason or error description.
    pub message: Option<String>,
}

/// Final status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Completed successfully.
    Ok,
    /// Nothing to do for this shop (e.g. no scripts configured).
    NotApplicable,
    /// Not run, typically because a dependency failed.
    Skipped,
    /// Commands were only printed.
    DryRun,
    /// An external tool or the task itself failed.
    Failed,
}

impl TaskStatus {
    /// Summary glyph and ANSI colour.
    pub(super) const fn glyph(self) -> (&'static str, &'static str) {
        match self {
            Self::Ok => ("✓", "\x1b[32m"),
            Self::NotApplicable => ("·", "\x1b[2m"),
            Self::Skipped => ("○", "\x1b[33m"),
            Self::DryRun => ("~", "\x1b[37m"),
            Self::Failed => ("✗", "\x1b[31m"),
        }
    }
}

/// Kind of a logged line. Decides the `tracing` level and target, the
/// console and file rendering, and the diagnostic tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Stage,
    Info,
    Debug,
    Warn,
    Error,
    /// A command `--dry-run` printed instead of running.
    DryRun,
}

impl LogKind {
    /// Hand `msg` to the global subscriber.
    pub(super) fn emit(self, msg: &str) {
        match self {
            Self::Stage => tracing::info!(target: STAGE_TARGET, "{msg}"),
            Self::DryRun => tracing::info!(target: DRY_RUN_TARGET, "{msg}"),
            Self::Info => tracing::info!("{msg}"),
            Self::Debug => tracing::debug!("{msg}"),
            Self::Warn => tracing::warn!("{msg}"),
            Self::Error => tracing::error!("{msg}"),
        }
    }

    pub(super) const fn diag_event(self) -> DiagEvent {
        match self {
            Self::Stage => DiagEvent::Stage,
            Self::Info => DiagEvent::Info,
            Self::Debug => DiagEvent::Debug,
            Self::Warn => DiagEvent::Warn,
            Self::Error => DiagEvent::Error,
            Self::DryRun => DiagEvent::DryRun,
        }
    }
}

/// Logging interface used by tasks.
///
/// [`Logger`](super::logger::Logger) writes immediately;
/// [`BufferedLog`](super::buffered::BufferedLog) holds a task's output until
/// the task finishes so parallel tasks do not interleave.
pub trait Log: Send + Sync {
    /// Log one line of the given kind.
    fn write(&self, kind: LogKind, msg: &str);

    /// Record a task outcome for the summary.
    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>);

    /// The diagnostic timeline, if one could be opened.
    fn diagnostic(&self) -> Option<&DiagnosticLog> {
        None
    }

    fn stage(&self, msg: &str) {
        self.write(LogKind::Stage, msg);
    }

    fn info(&self, msg: &str) {
        self.write(LogKind::Info, msg);
    }

    /// Console only with `--verbose`; the log file always gets it.
    fn debug(&self, msg: &str) {
        self.write(LogKind::Debug, msg);
    }

    fn warn(&self, msg: &str) {
        self.write(LogKind::Warn, msg);
    }

    fn error(&self, msg: &str) {
        self.write(LogKind::Error, msg);
    }

    fn dry_run(&self, msg: &str) {
        self.write(LogKind::DryRun, msg);
    }
}
