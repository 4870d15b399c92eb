//! Microsecond timeline of scheduler and watch events.
use std::cell::RefCell;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;

use super::utils::{STAMP_MICROS, diag_log_file_path, strip_ansi, utc_now};

thread_local! {
    /// Task run by this scheduler thread. Scoped threads have no OS name.
    static TASK_LABEL: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Label the current thread with the task it is running.
pub fn set_diag_thread_name(name: &str) {
    TASK_LABEL.with(|label| *label.borrow_mut() = Some(name.to_string()));
}

/// OS thread name, else the task label, else `?`.
#[must_use]
pub fn diag_thread_name() -> String {
    std::thread::current().name().map_or_else(
        || TASK_LABEL.with(|label| label.borrow().clone().unwrap_or_else(|| "?".to_string())),
        str::to_string,
    )
}

/// Event kinds recorded in the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagEvent {
    Info,
    Debug,
    Warn,
    Error,
    Stage,
    DryRun,
    /// Task thread spawned, waiting for dependencies.
    TaskWait,
    /// Dependencies satisfied, task running.
    TaskStart,
    /// Task finished.
    TaskDone,
    /// Task not run because a dependency failed.
    TaskBlocked,
    /// A watched path changed.
    WatchEvent,
}

impl DiagEvent {
    const fn tag(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Stage => "STAGE",
            Self::DryRun => "DRYRUN",
            Self::TaskWait => "TASK_WAIT",
            Self::TaskStart => "TASK_START",
            Self::TaskDone => "TASK_DONE",
            Self::TaskBlocked => "TASK_BLOCKED",
            Self::WatchEvent => "WATCH",
        }
    }
}

/// Unbuffered event log written to `<cache>/shop-build/<command>.diag.log`.
///
/// Every line carries the elapsed time since start, wall-clock time, the
/// originating thread and an event tag, so the real interleaving of
/// parallel tasks can be reconstructed even though console output is
/// buffered per task.
#[derive(Debug)]
pub struct DiagnosticLog {
    file: Mutex<fs::File>,
    #[cfg_attr(not(test), allow(dead_code))]
    path: PathBuf,
    start: Instant,
}

impl DiagnosticLog {
    /// Open the timeline for `command`; `None` if the cache dir is unusable.
    pub(super) fn new(command: &str, start: Instant) -> Option<Self> {
        let path = diag_log_file_path(command)?;
        let header = format!(
            "# shop-build {} diagnostic timeline, started {}\n\
             # elapsed_us | wall_utc | thread | event | message\n",
            crate::commands::version::version(),
            utc_now(STAMP_MICROS),
        );
        fs::write(&path, header).ok()?;
        let file = fs::OpenOptions::new().append(true).open(&path).ok()?;
        Some(Self {
            file: Mutex::new(file),
            path,
            start,
        })
    }

    /// Append `+<elapsed_us> <wall_utc> [<thread>] <TAG> <message>`.
    pub fn emit(&self, event: DiagEvent, message: &str) {
        let elapsed_us = self.start.elapsed().as_micros();
        let line = format!(
            "+{elapsed_us:>12} {} [{}] {:<12} {}\n",
            utc_now(STAMP_MICROS),
            diag_thread_name(),
            event.tag(),
            strip_ansi(message)
        );
        if let Ok(mut f) = self.file.lock() {
            f.write_all(line.as_bytes()).ok();
        }
    }

    /// Emit an event attributed to `task`.
    pub fn emit_task(&self, event: DiagEvent, task: &str, message: &str) {
        let line = if message.is_empty() {
            format!("[{task}]")
        } else {
            format!("[{task}] {message}")
        };
        self.emit(event, &line);
    }

    #[cfg(test)]
    pub(crate) fn path(&self) -> &std::path::Path {
        &self.path
    }
}
