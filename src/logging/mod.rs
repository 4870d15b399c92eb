//! Console, file and diagnostic logging.
//!
//! Everything funnels into the global `tracing` subscriber installed by
//! [`init_subscriber`]. [`Logger`] is the run-wide handle and owns the task
//! summary; [`BufferedLog`] wraps it for one task of a parallel run.

mod buffered;
mod diagnostic;
mod logger;
mod subscriber;
mod types;
mod utils;

pub use buffered::BufferedLog;
pub use diagnostic::{DiagEvent, DiagnosticLog, diag_thread_name, set_diag_thread_name};
pub use logger::Logger;
pub use subscriber::{LOG_FILTER_ENV, init_subscriber};
pub use types::{Log, LogKind, TaskEntry, TaskStatus};

/// `tracing` target of stage headers.
const STAGE_TARGET: &str = "shop_build::stage";
/// `tracing` target of suppressed dry-run commands.
const DRY_RUN_TARGET: &str = "shop_build::dry_run";

#[cfg(test)]
pub(crate) static TEST_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Run `f` with `XDG_CACHE_HOME` pointing at a fresh temp dir.
#[cfg(test)]
#[allow(clippy::expect_used)]
pub(crate) fn with_temp_cache<T>(f: impl FnOnce() -> T) -> (T, tempfile::TempDir) {
    let tmp = tempfile::tempdir().expect("temp cache dir");
    let _lock = TEST_ENV_MUTEX
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    // SAFETY: every env mutation in tests holds TEST_ENV_MUTEX.
    #[allow(unsafe_code)]
    unsafe {
        std::env::set_var("XDG_CACHE_HOME", tmp.path());
    }
    let value = f();
    // SAFETY: as above.
    #[allow(unsafe_code)]
    unsafe {
        std::env::remove_var("XDG_CACHE_HOME");
    }
    (value, tmp)
}

/// A [`Logger`] plus a thread-local subscriber writing to its log file.
/// Keep the guard alive for the test.
#[cfg(test)]
#[allow(clippy::expect_used)]
pub(crate) fn isolated_logger() -> (Logger, tempfile::TempDir, tracing::dispatcher::DefaultGuard) {
    use tracing_subscriber::{Layer as _, filter::LevelFilter, layer::SubscriberExt as _};
    let ((layer, log), tmp) = with_temp_cache(|| {
        (
            subscriber::FileLayer::new("test").expect("file layer"),
            Logger::new("test"),
        )
    });
    let dispatch = tracing::Dispatch::new(
        tracing_subscriber::registry().with(layer.with_filter(LevelFilter::DEBUG)),
    );
    (log, tmp, tracing::dispatcher::set_default(&dispatch))
}
