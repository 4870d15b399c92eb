//! Entry-point tasks that group the build steps.
use anyhow::Result;

use super::lint::LintScripts;
use super::script::{ConcatScripts, MinifyScripts};
use super::style::{CompileStylesDev, CompileStylesDist};
use super::watch::watch_sources;
use super::{Context, Task, TaskResult, task_deps};

/// Development build followed by watch mode.
#[derive(Debug)]
pub struct Develop;

impl Task for Develop {
    fn name(&self) -> &'static str {
        "default"
    }

    fn description(&self) -> &'static str {
        "development build, then watch"
    }

    fn error_title(&self) -> &'static str {
        "Watch Error"
    }

    task_deps![CompileStylesDev, LintScripts, ConcatScripts];

    fn is_long_running(&self) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        watch_sources(ctx)
    }
}

/// Production build.
#[derive(Debug)]
pub struct Distribute;

impl Task for Distribute {
    fn name(&self) -> &'static str {
        "dist"
    }

    fn description(&self) -> &'static str {
        "production build"
    }

    task_deps![CompileStylesDist, LintScripts, MinifyScripts];

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        ctx.log.info(&format!(
            "shop {} built into {}",
            ctx.build.shop_id,
            ctx.paths().build_dir.display()
        ));
        Ok(TaskResult::Ok)
    }
}
