//! Lint the theme scripts with `eslint`.
use std::path::PathBuf;

use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::error::ToolError;
use crate::exec;
use crate::sources::{JS_SOURCES, SourceSet};

/// Globals the theme scripts rely on.
pub const GLOBALS: &[&str] = &["Modernizr", "jQuery", "$", "StateManager"];

/// Rule severities: 0 off, 1 warning.
pub const RULES: &[(&str, u8)] = &[
    ("no-console", 0),
    ("no-extra-semi", 0),
    ("no-unused-vars", 1),
    ("no-underscore-dangle", 0),
    ("no-shadow-restricted-names", 1),
    ("no-shadow", 1),
    ("no-undef", 1),
    ("no-sequences", 1),
    ("strict", 1),
    ("quotes", 0),
    ("no-unused-expressions", 1),
];

/// Keeps eslint 9 on the eslintrc-style command line used by
/// [`eslint_args`]; eslint 8 ignores it. Flat-config-only releases reject
/// these flags.
pub const ESLINT_ENV: &[(&str, &str)] = &[("ESLINT_USE_FLAT_CONFIG", "false")];

/// `eslint` arguments for `files`, ignoring any project eslintrc.
#[must_use]
pub fn eslint_args(files: &[PathBuf]) -> Vec<String> {
    let mut args = vec![
        "--no-eslintrc".to_string(),
        "--env".to_string(),
        "browser".to_string(),
        "--global".to_string(),
        GLOBALS.join(","),
    ];
    for (rule, level) in RULES {
        args.push("--rule".to_string());
        args.push(format!("{rule}: {level}"));
    }
    args.extend(files.iter().map(|f| f.display().to_string()));
    args
}

/// Run `eslint` over the theme scripts matched by the JS source globs.
#[derive(Debug)]
pub struct LintScripts;

impl Task for LintScripts {
    fn name(&self) -> &'static str {
        "lint"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["eslint"]
    }

    fn description(&self) -> &'static str {
        "lint theme scripts with eslint (8 or 9)"
    }

    fn error_title(&self) -> &'static str {
        "Lint Error"
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let files = SourceSet::compile(ctx.root(), JS_SOURCES)?.collect_files();
        if files.is_empty() {
            return Ok(TaskResult::Skipped("no theme scripts found".to_string()));
        }
        ctx.log.debug(&format!("linting {} files", files.len()));

        let eslint = ctx.tool("eslint")?;
        let args = eslint_args(&files);
        if ctx.dry_run {
            ctx.log.dry_run(&format!(
                "{} ... ({} files)",
                exec::display_name(&eslint),
                files.len()
            ));
            return Ok(TaskResult::DryRun);
        }

        let result = ctx
            .executor
            .run_unchecked_with_env(ctx.root(), &eslint, &args, ESLINT_ENV)?;
        for line in result.stdout.lines().filter(|l| !l.trim().is_empty()) {
            ctx.log.info(line);
        }
        if result.success {
            return Ok(TaskResult::Ok);
        }
        let problems = result
            .stdout
            .lines()
            .map(str::trim)
            .rfind(|l| l.contains("problem"))
            .map_or_else(|| result.diagnostics().to_string(), ToString::to_string);
        Err(ToolError::Failed {
            program: "eslint".to_string(),
            code: result.code.unwrap_or(-1),
            output: problems,
        }
        .into())
    }
}
