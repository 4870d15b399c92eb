use anyhow::Result;

use super::script::ConcatScripts;
use super::style::CompileStylesDev;
use super::{Context, Task, TaskResult};
use crate::watch;

/// Rebuild development outputs whenever their sources change, until
/// interrupted.
///
/// # Errors
///
/// Returns an error if the file watcher cannot be set up.
pub fn watch_sources(ctx: &Context) -> Result<TaskResult> {
    let style = CompileStylesDev;
    let script = ConcatScripts;
    let rules = watch::shop_rules(ctx.root(), &style, &script)?;
    watch::watch_loop(ctx, &rules)?;
    Ok(if ctx.dry_run {
        TaskResult::DryRun
    } else {
        TaskResult::Ok
    })
}

/// Watch LESS and script sources and re-run `style-dev` / `script-dev`.
#[derive(Debug)]
pub struct WatchSources;

impl Task for WatchSources {
    fn name(&self) -> &'static str {
        "watch"
    }

    fn description(&self) -> &'static str {
        "rebuild styles and scripts on change"
    }

    fn error_title(&self) -> &'static str {
        "Watch Error"
    }

    fn is_long_running(&self) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        watch_sources(ctx)
    }
}
