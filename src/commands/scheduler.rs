//! Dependency-driven task scheduling.
//!
//! [`run_tasks_parallel`] runs every task on its own OS thread, gated by a
//! [`TaskGraph`]; [`run_tasks_sequential`] walks a dependency-ordered list
//! on the calling thread. Both skip a task whose dependency failed.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Condvar, Mutex, PoisonError};

use crate::logging::{self, BufferedLog, DiagEvent, Log, Logger, TaskStatus};
use crate::tasks::{self, Context, Task};

/// Whether a finished task lets its dependents run. A task skipped for lack
/// of input does not hold anything back.
const fn succeeded(status: TaskStatus) -> bool {
    !matches!(status, TaskStatus::Failed)
}

/// Completion state shared by the scheduler threads.
///
/// Tasks call [`wait_for_deps`](TaskGraph::wait_for_deps) before starting and
/// [`mark_complete`](TaskGraph::mark_complete) when finished. The [`Condvar`]
/// wakes all waiters whenever an outcome is recorded.
#[derive(Debug, Default)]
struct TaskGraph {
    /// Finished tasks and whether each one succeeded.
    outcomes: Mutex<HashMap<TypeId, bool>>,
    condvar: Condvar,
}

impl TaskGraph {
    fn new() -> Self {
        Self::default()
    }

    /// Block until every id in `deps` has finished.
    ///
    /// Returns the first dependency that did not succeed, if any.
    fn wait_for_deps(&self, deps: &[TypeId]) -> Result<(), TypeId> {
        if deps.is_empty() {
            return Ok(());
        }
        let mut outcomes = self
            .outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while !deps.iter().all(|d| outcomes.contains_key(d)) {
            outcomes = self
                .condvar
                .wait(outcomes)
                .unwrap_or_else(PoisonError::into_inner);
        }
        let failed = deps.iter().find(|d| outcomes.get(d) == Some(&false));
        failed.map_or(Ok(()), |d| Err(*d))
    }

    /// Record an outcome and wake all waiting threads.
    fn mark_complete(&self, id: TypeId, ok: bool) {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, ok);
        self.condvar.notify_all();
    }
}

/// Record `task` as skipped because `dep` did not succeed.
fn record_blocked(task: &dyn Task, dep: &str, log: &dyn Log) {
    let reason = format!("dependency '{dep}' failed");
    if let Some(diag) = log.diagnostic() {
        diag.emit_task(DiagEvent::TaskBlocked, task.name(), &reason);
    }
    log.warn(&format!("{}: {reason}", task.name()));
    log.record_task(task.name(), TaskStatus::Skipped, Some(&reason));
}

/// Dependencies of each task that are part of this run.
fn resolved_deps(tasks: &[&dyn Task]) -> Vec<Vec<TypeId>> {
    let present: HashSet<TypeId> = tasks.iter().map(|t| t.task_id()).collect();
    tasks
        .iter()
        .map(|t| {
            t.dependencies()
                .iter()
                .filter(|d| present.contains(d))
                .copied()
                .collect()
        })
        .collect()
}

/// Run tasks concurrently, each waiting for its dependencies.
///
/// OS threads are used rather than a Rayon pool: a task blocked on the
/// `Condvar` would hold a pool worker, and a small pool then deadlocks.
/// Output is buffered per task and flushed when the task finishes, except
/// for long-running tasks, which log straight to the console.
pub(super) fn run_tasks_parallel(tasks: &[&dyn Task], ctx: &Context, log: &Arc<Logger>) {
    let deps_of = resolved_deps(tasks);
    let id_to_name: HashMap<TypeId, &str> = tasks.iter().map(|t| (t.task_id(), t.name())).collect();
    let graph = TaskGraph::new();

    std::thread::scope(|s| {
        for (task, deps) in tasks.iter().zip(deps_of.iter()) {
            let task = *task;
            let graph = &graph;
            let id_to_name = &id_to_name;
            s.spawn(move || {
                logging::set_diag_thread_name(task.name());

                if let Some(diag) = log.diagnostic() {
                    let message = if deps.is_empty() {
                        "no deps, ready".to_string()
                    } else {
                        let names: Vec<&str> = deps
                            .iter()
                            .filter_map(|d| id_to_name.get(d).copied())
                            .collect();
                        format!("waiting for: {}", names.join(", "))
                    };
                    diag.emit_task(DiagEvent::TaskWait, task.name(), &message);
                }

                if let Err(dep) = graph.wait_for_deps(deps) {
                    let dep = id_to_name.get(&dep).copied().unwrap_or("?");
                    record_blocked(task, dep, &**log);
                    graph.mark_complete(task.task_id(), false);
                    return;
                }

                if let Some(diag) = log.diagnostic() {
                    diag.emit_task(DiagEvent::TaskStart, task.name(), "deps satisfied, executing");
                }

                let status = if task.is_long_running() {
                    tasks::execute(task, ctx)
                } else {
                    log.notify_task_start(task.name());
                    let buf = Arc::new(BufferedLog::new(Arc::clone(log)));
                    let task_ctx = ctx.with_log(Arc::clone(&buf) as Arc<dyn Log>);
                    let status = tasks::execute(task, &task_ctx);
                    buf.flush_and_complete(task.name());
                    status
                };

                if let Some(diag) = log.diagnostic() {
                    diag.emit_task(DiagEvent::TaskDone, task.name(), &format!("{status:?}"));
                }
                graph.mark_complete(task.task_id(), succeeded(status));
            });
        }
    });
}

/// Run tasks one at a time in the given order, which must already place
/// dependencies first.
pub(super) fn run_tasks_sequential(tasks: &[&dyn Task], ctx: &Context) {
    let id_to_name: HashMap<TypeId, &str> = tasks.iter().map(|t| (t.task_id(), t.name())).collect();
    let mut failed: HashSet<TypeId> = HashSet::new();

    for (task, deps) in tasks.iter().zip(resolved_deps(tasks)) {
        if let Some(dep) = deps.iter().find(|d| failed.contains(d)) {
            let dep = id_to_name.get(dep).copied().unwrap_or("?");
            record_blocked(*task, dep, ctx.log.as_ref());
            failed.insert(task.task_id());
            continue;
        }
        if !succeeded(tasks::execute(*task, ctx)) {
            failed.insert(task.task_id());
        }
    }
}
