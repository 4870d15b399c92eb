//! Run-wide logger: writes through `tracing`, keeps the progress line for
//! parallel tasks, and collects task outcomes for the summary.
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use super::diagnostic::DiagnosticLog;
use super::types::{Log, LogKind, TaskEntry, TaskStatus};
use super::utils::{log_file_path, terminal_columns};

/// Logger shared by the whole run.
///
/// Lines go to the global subscriber, so both the console and
/// `$XDG_CACHE_HOME/shop-build/<command>.log` see them.
#[derive(Debug)]
pub struct Logger {
    started: Instant,
    log_file: Option<PathBuf>,
    diagnostic: Option<DiagnosticLog>,
    outcomes: Mutex<Vec<TaskEntry>>,
    console: Mutex<()>,
    running: Mutex<Vec<String>>,
    progress_shown: Mutex<bool>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Logger {
    /// Create a logger for `command`. The log file is opened by
    /// [`init_subscriber`](super::init_subscriber); only its path is kept.
    #[must_use]
    pub fn new(command: &str) -> Self {
        let started = Instant::now();
        Self {
            started,
            log_file: log_file_path(command),
            diagnostic: DiagnosticLog::new(command, started),
            outcomes: Mutex::new(Vec::new()),
            console: Mutex::new(()),
            running: Mutex::new(Vec::new()),
            progress_shown: Mutex::new(false),
        }
    }

    /// Names of the failed tasks, in recording order. A task re-run by the
    /// watch loop appears once per failure.
    #[must_use]
    pub fn failed_tasks(&self) -> Vec<String> {
        lock(&self.outcomes)
            .iter()
            .filter(|entry| entry.status == TaskStatus::Failed)
            .map(|entry| entry.name.clone())
            .collect()
    }

    /// Every recorded outcome, in recording order.
    #[must_use]
    pub fn task_entries(&self) -> Vec<TaskEntry> {
        lock(&self.outcomes).clone()
    }

    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failed_tasks().len()
    }

    /// Print every recorded task with its status, then the totals.
    pub fn print_summary(&self) {
        let outcomes = lock(&self.outcomes).clone();
        if outcomes.is_empty() {
            return;
        }

        println!();
        self.stage("Summary");
        for entry in &outcomes {
            let (glyph, colour) = entry.status.glyph();
            let detail = entry
                .message
                .as_deref()
                .map(|m| format!(" ({m})"))
                .unwrap_or_default();
            self.info(&format!("{colour}{glyph} {}{detail}\x1b[0m", entry.name));
        }

        let count = |status: TaskStatus| outcomes.iter().filter(|e| e.status == status).count();
        println!();
        self.info(&format!(
            "{} tasks in {:.1}s: \x1b[32m{} ok\x1b[0m, \x1b[2m{} n/a\x1b[0m, \x1b[33m{} skipped\x1b[0m, \x1b[37m{} dry-run\x1b[0m, \x1b[31m{} failed\x1b[0m",
            outcomes.len(),
            self.started.elapsed().as_secs_f64(),
            count(TaskStatus::Ok),
            count(TaskStatus::NotApplicable),
            count(TaskStatus::Skipped),
            count(TaskStatus::DryRun),
            count(TaskStatus::Failed),
        ));
        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }

    /// Add `name` to the running set and redraw the progress line.
    pub fn notify_task_start(&self, name: &str) {
        let _console = self.lock_console();
        self.clear_progress();
        let names = {
            let mut running = lock(&self.running);
            running.push(name.to_string());
            running.join(", ")
        };
        self.draw_progress(&names);
    }

    /// Held while a block of task output is printed.
    pub(super) fn lock_console(&self) -> MutexGuard<'_, ()> {
        lock(&self.console)
    }

    /// Drop `name` from the running set; the remaining names, if any.
    pub(super) fn finish_active(&self, name: &str) -> Option<String> {
        let mut running = lock(&self.running);
        running.retain(|n| n != name);
        (!running.is_empty()).then(|| running.join(", "))
    }

    /// Erase the progress line. Caller holds the console lock.
    pub(super) fn clear_progress(&self) {
        let mut shown = lock(&self.progress_shown);
        if *shown {
            print!("\r\x1b[K");
            std::io::stdout().flush().ok();
            *shown = false;
        }
    }

    /// Draw the running-task line, cut to one terminal row. Caller holds
    /// the console lock.
    pub(super) fn draw_progress(&self, names: &str) {
        let room = terminal_columns().saturating_sub(4);
        let line = if names.chars().count() > room {
            let mut cut: String = names.chars().take(room.saturating_sub(1)).collect();
            cut.push('…');
            cut
        } else {
            names.to_string()
        };
        print!("  \x1b[2m▹ {line}\x1b[0m");
        std::io::stdout().flush().ok();
        *lock(&self.progress_shown) = true;
    }

    #[cfg(test)]
    pub const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }


    #[cfg(test)]
    pub(crate) fn active_task_names(&self) -> Vec<String> {
        lock(&self.running).clone()
    }

    #[cfg(test)]
    pub(crate) fn progress_rows_count(&self) -> u16 {
        u16::from(*lock(&self.progress_shown))
    }
}

impl Log for Logger {
    fn write(&self, kind: LogKind, msg: &str) {
        if let Some(diag) = &self.diagnostic {
            diag.emit(kind.diag_event(), msg);
        }
        kind.emit(msg);
    }

    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>) {
        lock(&self.outcomes).push(TaskEntry {
            name: name.to_string(),
            status,
            message: message.map(String::from),
        });
    }

    fn diagnostic(&self) -> Option<&DiagnosticLog> {
        self.diagnostic.as_ref()
    }
}
