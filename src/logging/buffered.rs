//! Per-task output buffer for parallel runs.
use std::sync::{Arc, Mutex, PoisonError};

use super::diagnostic::DiagnosticLog;
use super::logger::Logger;
use super::types::{Log, LogKind, TaskStatus};

/// Holds one task's console output until the task finishes, so that
/// `style-dev`, `lint` and `script-dev` running side by side print as
/// contiguous blocks.
///
/// The diagnostic timeline is written immediately and task outcomes go
/// straight to the shared [`Logger`]; only console and file output wait.
#[derive(Debug)]
pub struct BufferedLog {
    inner: Arc<Logger>,
    pending: Mutex<Vec<(LogKind, String)>>,
}

impl BufferedLog {
    #[must_use]
    pub const fn new(inner: Arc<Logger>) -> Self {
        Self {
            inner,
            pending: Mutex::new(Vec::new()),
        }
    }

    fn drain(&self) {
        let pending = std::mem::take(
            &mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for (kind, msg) in pending {
            kind.emit(&msg);
        }
    }

    /// Print the buffered lines in one block and drop `task_name` from the
    /// progress line.
    pub fn flush_and_complete(&self, task_name: &str) {
        let _console = self.inner.lock_console();
        self.inner.clear_progress();
        self.drain();
        if let Some(still_running) = self.inner.finish_active(task_name) {
            self.inner.draw_progress(&still_running);
        }
    }
}

impl Log for BufferedLog {
    fn write(&self, kind: LogKind, msg: &str) {
        if let Some(diag) = self.inner.diagnostic() {
            diag.emit(kind.diag_event(), msg);
        }
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((kind, msg.to_string()));
    }

    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>) {
        self.inner.record_task(name, status, message);
    }

    fn diagnostic(&self) -> Option<&DiagnosticLog> {
        self.inner.diagnostic()
    }
}
