//! Commands that execute build tasks: `default`, `dist`, `watch` and `run`.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;

use super::{CommandSetup, scheduler};
use crate::cli::GlobalOpts;
use crate::error::TaskError;
use crate::exec::{Executor, SystemExecutor};
use crate::logging::{Log, Logger};
use crate::tasks::{self, Context, Task, graph};

/// Run `targets` and their dependencies with real processes.
///
/// # Errors
///
/// Returns an error if setup fails, a target is unknown, the task graph
/// has a cycle, or any task failed.
pub fn run(targets: &[String], global: &GlobalOpts, log: &Arc<Logger>) -> Result<()> {
    run_with(targets, global, log, Arc::new(SystemExecutor))
}

/// [`run`] with a caller-supplied [`Executor`].
///
/// # Errors
///
/// See [`run`].
pub fn run_with(
    targets: &[String],
    global: &GlobalOpts,
    log: &Arc<Logger>,
    executor: Arc<dyn Executor>,
) -> Result<()> {
    run_until(targets, global, log, executor, Arc::default())
}

/// [`run_with`] sharing `stop` with the tasks. Setting it ends the watch
/// loop; Ctrl-C sets it too when a long-running task is planned.
///
/// # Errors
///
/// See [`run`].
pub fn run_until(
    targets: &[String],
    global: &GlobalOpts,
    log: &Arc<Logger>,
    executor: Arc<dyn Executor>,
    stop: Arc<AtomicBool>,
) -> Result<()> {
    let all = tasks::all_tasks();
    let selected = targets
        .iter()
        .map(|name| tasks::find(&all, name))
        .collect::<Result<Vec<_>, _>>()?;
    let registry: Vec<&dyn Task> = all.iter().map(Box::as_ref).collect();
    let plan = graph::plan(&registry, &selected)?;

    let setup = CommandSetup::init(global, log)?;
    let names: Vec<&str> = plan.iter().map(|t| t.name()).collect();
    log.debug(&format!("plan: {}", names.join(" -> ")));

    let ctx = Context::new(
        Arc::new(setup.build),
        Arc::clone(log) as Arc<dyn Log>,
        executor,
        global.dry_run,
        global.parallel,
        global.notify,
    )
    .with_stop(stop);
    if plan.iter().any(|t| t.is_long_running()) {
        install_stop_handler(&ctx, log);
    }

    if ctx.parallel {
        scheduler::run_tasks_parallel(&plan, &ctx, log);
    } else {
        scheduler::run_tasks_sequential(&plan, &ctx);
    }

    log.print_summary();

    let failed = log.failed_tasks();
    if !failed.is_empty() {
        return Err(TaskError::ExecutionFailed {
            count: failed.len(),
            tasks: failed.join(", "),
        }
        .into());
    }
    Ok(())
}

/// Make Ctrl-C end the watch loop instead of the process, so the summary
/// still prints.
fn install_stop_handler(ctx: &Context, log: &Logger) {
    let stop = Arc::clone(&ctx.stop);
    if let Err(e) = ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst)) {
        log.debug(&format!("Ctrl-C handler not installed: {e}"));
    }
}
