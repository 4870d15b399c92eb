//! Stylesheet compilation from the generated manifest.
use std::path::Path;

use anyhow::Result;

use super::helpers::{StagedOutput, dry_run_commands, file_size, kilobytes, modify_var_args};
use super::{Context, Task, TaskResult};
use crate::error::TaskError;

/// Options shared by both `lessc` invocations.
fn common_args(ctx: &Context) -> Vec<String> {
    let mut args = vec![
        "--relative-urls".to_string(),
        format!("--include-path={}", ctx.root().display()),
    ];
    args.extend(modify_var_args(&ctx.build.variables));
    args
}

fn io_args(manifest: &Path, css: &Path) -> [String; 2] {
    [manifest.display().to_string(), css.display().to_string()]
}

/// In a real run the manifest must have been written at startup.
fn require_manifest(ctx: &Context) -> Result<()> {
    if !ctx.dry_run && !ctx.paths().manifest.is_file() {
        return Err(TaskError::SourceMissing(ctx.paths().manifest.clone()).into());
    }
    Ok(())
}

/// `lessc` arguments for the development build: source map and line
/// number annotations.
#[must_use]
pub fn dev_args(ctx: &Context) -> Vec<String> {
    let paths = ctx.paths();
    let mut args = vec![
        "--source-map".to_string(),
        format!("--source-map-url={}", paths.source_map_url()),
        "--line-numbers=all".to_string(),
    ];
    args.extend(common_args(ctx));
    args.extend(io_args(&paths.manifest, &paths.css));
    args
}

/// `lessc` arguments for the distribution build, compiling into `css`.
#[must_use]
pub fn dist_args(ctx: &Context, css: &Path) -> Vec<String> {
    let mut args = common_args(ctx);
    args.extend(io_args(&ctx.paths().manifest, css));
    args
}

/// `postcss` arguments: autoprefix `css` in place.
fn postcss_args(css: &Path) -> Vec<String> {
    vec![
        css.display().to_string(),
        "--use".to_string(),
        "autoprefixer".to_string(),
        "--no-map".to_string(),
        "--replace".to_string(),
    ]
}

/// `cleancss` arguments: minify `css` in place.
fn cleancss_args(css: &Path) -> Vec<String> {
    let css = css.display().to_string();
    vec!["-o".to_string(), css.clone(), css]
}

/// Compile the manifest with a source map for development.
#[derive(Debug)]
pub struct CompileStylesDev;

impl Task for CompileStylesDev {
    fn name(&self) -> &'static str {
        "style-dev"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["less:dev"]
    }

    fn description(&self) -> &'static str {
        "compile LESS with source map and line numbers"
    }

    fn error_title(&self) -> &'static str {
        "LESS Error"
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let lessc = ctx.tool("lessc")?;
        let args = dev_args(ctx);
        if let Some(result) = dry_run_commands(ctx, &[(lessc.as_str(), args.as_slice())]) {
            return Ok(result);
        }
        require_manifest(ctx)?;
        ctx.invoke(&lessc, &args)?;
        ctx.log.info(&format!(
            "wrote {} and {}",
            ctx.paths().css.display(),
            ctx.paths().css_map().display()
        ));
        Ok(TaskResult::Ok)
    }
}

/// Compile, prefix and minify the stylesheet for production.
#[derive(Debug)]
pub struct CompileStylesDist;

impl Task for CompileStylesDist {
    fn name(&self) -> &'static str {
        "style-dist"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["less:dist"]
    }

    fn description(&self) -> &'static str {
        "compile, autoprefix and minify LESS"
    }

    fn error_title(&self) -> &'static str {
        "LESS Error"
    }

    /// All three tools work on a scratch file beside `<name>.css`, which is
    /// replaced only after `cleancss` succeeds.
    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let lessc = ctx.tool("lessc")?;
        let postcss = ctx.tool("postcss")?;
        let cleancss = ctx.tool("cleancss")?;

        let css = &ctx.paths().css;
        if let Some(result) = dry_run_commands(
            ctx,
            &[
                (lessc.as_str(), dist_args(ctx, css).as_slice()),
                (postcss.as_str(), postcss_args(css).as_slice()),
                (cleancss.as_str(), cleancss_args(css).as_slice()),
            ],
        ) {
            return Ok(result);
        }
        require_manifest(ctx)?;

        let staged = StagedOutput::beside(css)?;
        let scratch = staged.path();
        ctx.invoke(&lessc, &dist_args(ctx, scratch))?;
        ctx.invoke(&postcss, &postcss_args(scratch))?;
        let before = file_size(scratch);
        ctx.invoke(&cleancss, &cleancss_args(scratch))?;
        let after = file_size(scratch);
        staged.commit()?;

        let name = format!("{}.css", ctx.paths().name);
        if let (Some(before), Some(after)) = (before, after) {
            ctx.log
                .info(&format!("before compress: {name}: {}", kilobytes(before)));
            ctx.log
                .info(&format!("after  compress: {name}: {}", kilobytes(after)));
        } else {
            ctx.log
                .debug(&format!("{name} not found, size not reported"));
        }
        Ok(TaskResult::Ok)
    }
}
