//! Script bundling: plain concatenation for development, minified for
//! production.
use std::path::Path;

use anyhow::Result;

use super::helpers::{
    StagedOutput, concat_sources, dry_run_commands, file_size, kilobytes, write_output,
};
use super::{Context, Task, TaskResult};

/// Concatenate the configured scripts into `dest`; returns how many files
/// went in.
fn bundle(ctx: &Context, dest: &Path) -> Result<usize> {
    let sources = ctx.build.js_sources();
    let content = concat_sources(&sources)?;
    write_output(dest, &content)?;
    Ok(sources.len())
}

fn log_bundle(ctx: &Context, count: usize) {
    let js = &ctx.paths().js;
    let size = file_size(js).map_or_else(String::new, |b| format!(" ({})", kilobytes(b)));
    ctx.log
        .info(&format!("bundled {count} scripts into {}{size}", js.display()));
}

fn log_would_bundle(ctx: &Context) {
    ctx.log.dry_run(&format!(
        "concat {} scripts > {}",
        ctx.build.js_files.len(),
        ctx.paths().js.display()
    ));
}

/// Bundle the configured scripts for development.
#[derive(Debug)]
pub struct ConcatScripts;

impl Task for ConcatScripts {
    fn name(&self) -> &'static str {
        "script-dev"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["concat"]
    }

    fn description(&self) -> &'static str {
        "concatenate configured scripts"
    }

    fn error_title(&self) -> &'static str {
        "JS Error"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.build.js_files.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if ctx.dry_run {
            log_would_bundle(ctx);
            return Ok(TaskResult::DryRun);
        }
        let count = bundle(ctx, &ctx.paths().js)?;
        log_bundle(ctx, count);
        Ok(TaskResult::Ok)
    }
}

/// `uglifyjs` arguments: drop console calls, mangle names, minify `file`
/// in place.
#[must_use]
pub fn uglify_args(file: &Path) -> Vec<String> {
    let file = file.display().to_string();
    vec![
        file.clone(),
        "--compress".to_string(),
        "drop_console=true".to_string(),
        "--mangle".to_string(),
        "-o".to_string(),
        file,
    ]
}

/// Bundle and minify the configured scripts for production.
#[derive(Debug)]
pub struct MinifyScripts;

impl Task for MinifyScripts {
    fn name(&self) -> &'static str {
        "script-dist"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["uglify"]
    }

    fn description(&self) -> &'static str {
        "concatenate and minify configured scripts"
    }

    fn error_title(&self) -> &'static str {
        "JS Error"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.build.js_files.is_empty()
    }

    /// The bundle is built and minified in a scratch file; `<name>.js` is
    /// replaced only once `uglifyjs` succeeds.
    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let uglifyjs = ctx.tool("uglifyjs")?;
        if ctx.dry_run {
            log_would_bundle(ctx);
        }
        let shown = uglify_args(&ctx.paths().js);
        if let Some(result) = dry_run_commands(ctx, &[(uglifyjs.as_str(), shown.as_slice())]) {
            return Ok(result);
        }
        let staged = StagedOutput::beside(&ctx.paths().js)?;
        let count = bundle(ctx, staged.path())?;
        ctx.invoke(&uglifyjs, &uglify_args(staged.path()))?;
        staged.commit()?;
        log_bundle(ctx, count);
        Ok(TaskResult::Ok)
    }
}
