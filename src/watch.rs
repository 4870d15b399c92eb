//! Watch driver: maps filesystem changes to the tasks that rebuild them.
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use anyhow::{Context as _, Result};
use notify::RecursiveMode;
use notify_debouncer_mini::{DebounceEventResult, DebouncedEventKind, new_debouncer};

use crate::logging::DiagEvent;
use crate::sources::{JS_SOURCES, LESS_SOURCES, SourceSet};
use crate::tasks::{self, Context, Task};

/// Quiet period before a batch of changes is delivered.
pub const DEBOUNCE: Duration = Duration::from_millis(200);

/// How often the loop checks for a stop request while idle.
const STOP_POLL: Duration = Duration::from_millis(250);

/// A set of source globs and the task that rebuilds them.
pub struct WatchRule<'a> {
    pub label: &'static str,
    pub sources: SourceSet,
    pub task: &'a dyn Task,
}

impl fmt::Debug for WatchRule<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRule")
            .field("label", &self.label)
            .field("patterns", &self.sources.patterns())
            .field("task", &self.task.name())
            .finish()
    }
}

impl<'a> WatchRule<'a> {
    /// # Errors
    ///
    /// Returns an error if a pattern is not a valid glob.
    pub fn new(label: &'static str, root: &Path, patterns: &[&str], task: &'a dyn Task) -> Result<Self> {
        Ok(Self {
            label,
            sources: SourceSet::compile(root, patterns)?,
            task,
        })
    }
}

/// The two shop rules: LESS changes rebuild `style`, script changes
/// rebuild `script`.
///
/// # Errors
///
/// Returns an error if the built-in globs fail to compile.
pub fn shop_rules<'a>(
    root: &Path,
    style: &'a dyn Task,
    script: &'a dyn Task,
) -> Result<Vec<WatchRule<'a>>> {
    Ok(vec![
        WatchRule::new("less", root, LESS_SOURCES, style)?,
        WatchRule::new("js", root, JS_SOURCES, script)?,
    ])
}

/// Rules matched by `paths`, each at most once, with the first path that
/// matched it. Rule order is kept.
#[must_use]
pub fn triggered<'r, 'a, 'p>(
    rules: &'r [WatchRule<'a>],
    paths: &'p [PathBuf],
) -> Vec<(&'r WatchRule<'a>, &'p Path)> {
    rules
        .iter()
        .filter_map(|rule| {
            paths
                .iter()
                .find(|p| rule.sources.matches(p))
                .map(|p| (rule, p.as_path()))
        })
        .collect()
}

/// Re-run the tasks for one delivered batch; returns how many ran.
pub fn handle_batch(ctx: &Context, rules: &[WatchRule<'_>], paths: &[PathBuf]) -> usize {
    let hits = triggered(rules, paths);
    for (rule, path) in &hits {
        let msg = format!("{} changed: {}", rule.label, path.display());
        if let Some(diag) = ctx.log.diagnostic() {
            diag.emit(DiagEvent::WatchEvent, &msg);
        }
        ctx.log.info(&msg);
        tasks::execute(rule.task, ctx);
    }
    hits.len()
}

/// Watch every rule's base directories and dispatch changes until a stop
/// is requested or the watcher goes away.
///
/// In dry-run mode the rules are listed and the function returns.
///
/// # Errors
///
/// Returns an error if the watcher cannot be created or a directory cannot
/// be watched.
pub fn watch_loop(ctx: &Context, rules: &[WatchRule<'_>]) -> Result<()> {
    if ctx.dry_run {
        for rule in rules {
            ctx.log.dry_run(&format!(
                "watch {} -> {}",
                rule.sources.patterns().join(" "),
                rule.task.name()
            ));
        }
        return Ok(());
    }

    let (tx, rx) = mpsc::channel::<DebounceEventResult>();
    let mut debouncer = new_debouncer(DEBOUNCE, tx).context("creating file watcher")?;
    let watcher = debouncer.watcher();
    let mut watched: Vec<&Path> = Vec::new();
    for rule in rules {
        for base in rule.sources.bases() {
            if watched.contains(&base.as_path()) {
                continue;
            }
            if !base.is_dir() {
                ctx.log
                    .warn(&format!("not watching {} (missing)", base.display()));
                continue;
            }
            watcher
                .watch(base, RecursiveMode::Recursive)
                .with_context(|| format!("watching {}", base.display()))?;
            ctx.log.debug(&format!("watching {}", base.display()));
            watched.push(base);
        }
    }
    ctx.log.info(&format!(
        "watching {} directories, press Ctrl-C to stop",
        watched.len()
    ));

    loop {
        if ctx.stopped() {
            ctx.log.info("stop requested");
            break;
        }
        match rx.recv_timeout(STOP_POLL) {
            Ok(Ok(events)) => {
                let paths: Vec<PathBuf> = events
                    .into_iter()
                    .filter(|e| {
                        matches!(
                            e.kind,
                            DebouncedEventKind::Any | DebouncedEventKind::AnyContinuous
                        )
                    })
                    .map(|e| e.path)
                    .collect();
                handle_batch(ctx, rules, &paths);
            }
            Ok(Err(e)) => ctx.log.warn(&format!("file watcher error: {e}")),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                ctx.log.warn("file watcher closed");
                break;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::tasks::TaskResult;
    use crate::tasks::test_helpers::{RecordingExecutor, make_context, sample_build};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingTask {
        runs: AtomicUsize,
    }

    impl Task for CountingTask {
        fn name(&self) -> &'static str {
            "counting"
        }
        fn description(&self) -> &'static str {
            "counts runs"
        }
        fn run(&self, _ctx: &Context) -> Result<TaskResult> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(TaskResult::Ok)
        }
    }

    struct Fixture {
        _tmp: tempfile::TempDir,
        root: PathBuf,
        less: PathBuf,
        js: PathBuf,
        vendor: PathBuf,
    }

    fn fixture() -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("build");
        let js_dir = tmp
            .path()
            .join("themes/Frontend/Shop/frontend/_public/src/js");
        let less_dir = tmp.path().join("themes/Frontend/Shop/frontend/_public/src/less");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::create_dir_all(js_dir.join("vendors")).unwrap();
        std::fs::create_dir_all(&less_dir).unwrap();
        let less = less_dir.join("all.less");
        let js = js_dir.join("app.js");
        let vendor = js_dir.join("vendors/jquery.js");
        for file in [&less, &js, &vendor] {
            std::fs::write(file, "").unwrap();
        }
        Fixture {
            _tmp: tmp,
            root,
            less,
            js,
            vendor,
        }
    }

    #[test]
    fn each_rule_fires_once_per_batch() {
        let fx = fixture();
        let style = CountingTask::default();
        let script = CountingTask::default();
        let rules = shop_rules(&fx.root, &style, &script).unwrap();
        let batch = vec![fx.less.clone(), fx.less.clone(), fx.js.clone()];
        let hits = triggered(&rules, &batch);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0.label, "less");
        assert_eq!(hits[1].0.label, "js");
    }

    #[test]
    fn vendor_scripts_do_not_trigger() {
        let fx = fixture();
        let style = CountingTask::default();
        let script = CountingTask::default();
        let rules = shop_rules(&fx.root, &style, &script).unwrap();
        assert!(triggered(&rules, &[fx.vendor.clone()]).is_empty());
        assert!(triggered(&rules, &[fx.root.join("notes.txt")]).is_empty());
    }

    #[test]
    fn handle_batch_runs_matching_tasks() {
        let fx = fixture();
        let style = CountingTask::default();
        let script = CountingTask::default();
        let rules = shop_rules(&fx.root, &style, &script).unwrap();
        let (ctx, log) = make_context(
            sample_build(&fx.root),
            Arc::new(RecordingExecutor::default()),
        );
        assert_eq!(handle_batch(&ctx, &rules, &[fx.js.clone(), fx.vendor.clone()]), 1);
        assert_eq!(style.runs.load(Ordering::SeqCst), 0);
        assert_eq!(script.runs.load(Ordering::SeqCst), 1);
        assert_eq!(handle_batch(&ctx, &rules, &[fx.less.clone(), fx.js.clone()]), 2);
        assert_eq!(style.runs.load(Ordering::SeqCst), 1);
        assert_eq!(script.runs.load(Ordering::SeqCst), 2);
        assert_eq!(log.failure_count(), 0);
    }

    #[test]
    fn failing_rerun_does_not_stop_dispatch() {
        let fx = fixture();
        let style = tasks::style::CompileStylesDev;
        let script = CountingTask::default();
        let rules = shop_rules(&fx.root, &style, &script).unwrap();
        let (ctx, log) = make_context(
            sample_build(&fx.root),
            Arc::new(RecordingExecutor::default()),
        );
        assert_eq!(handle_batch(&ctx, &rules, &[fx.less.clone(), fx.js.clone()]), 2);
        assert_eq!(log.failure_count(), 1);
        assert_eq!(script.runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn loop_returns_when_stop_requested() {
        let fx = fixture();
        let style = CountingTask::default();
        let script = CountingTask::default();
        let rules = shop_rules(&fx.root, &style, &script).unwrap();
        let (ctx, _log) = make_context(
            sample_build(&fx.root),
            Arc::new(RecordingExecutor::default()),
        );
        ctx.stop.store(true, Ordering::SeqCst);
        watch_loop(&ctx, &rules).unwrap();
        assert_eq!(style.runs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn dry_run_lists_rules_only() {
        let fx = fixture();
        let style = CountingTask::default();
        let script = CountingTask::default();
        let rules = shop_rules(&fx.root, &style, &script).unwrap();
        let (mut ctx, _log) = make_context(
            sample_build(&fx.root),
            Arc::new(RecordingExecutor::default()),
        );
        ctx.dry_run = true;
        watch_loop(&ctx, &rules).unwrap();
        assert!(format!("{:?}", rules[0]).contains("counting"));
    }
}
