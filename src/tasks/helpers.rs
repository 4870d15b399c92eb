//! Helpers shared by the style and script tasks.
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use indexmap::IndexMap;
use rayon::prelude::*;

use super::{Context, TaskResult};
use crate::error::TaskError;
use crate::exec;

/// `--modify-var=<name>=<value>` for every variable, in map order.
#[must_use]
pub fn modify_var_args(variables: &IndexMap<String, String>) -> Vec<String> {
    variables
        .iter()
        .map(|(name, value)| format!("--modify-var={name}={value}"))
        .collect()
}

/// Read `files` in parallel and join them in the given order, one newline
/// between files.
///
/// # Errors
///
/// Returns [`TaskError::SourceMissing`] for the first file that does not
/// exist, or an I/O error for one that cannot be read.
pub fn concat_sources(files: &[PathBuf]) -> Result<String> {
    let contents: Vec<String> = files
        .par_iter()
        .map(|file| {
            if !file.is_file() {
                return Err(TaskError::SourceMissing(file.clone()).into());
            }
            fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))
        })
        .collect::<Result<_>>()?;
    Ok(contents.join("\n"))
}

/// Write a build output, creating its directory.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("writing {}", path.display()))
}

/// A scratch file beside a build output. External tools work on
/// [`path`](Self::path); [`commit`](Self::commit) renames it onto the
/// output. Dropped without a commit, the scratch file is removed and the
/// output keeps its previous content.
#[derive(Debug)]
pub struct StagedOutput {
    scratch: tempfile::TempPath,
    target: PathBuf,
}

impl StagedOutput {
    /// Create an empty scratch file in the directory of `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or the scratch file cannot be created.
    pub fn beside(target: &Path) -> Result<Self> {
        let dir = target.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).with_context(|| format!("creating directory {}", dir.display()))?;
        let name = target
            .file_name()
            .map_or_else(|| "output".into(), |n| n.to_string_lossy());
        let scratch = tempfile::Builder::new()
            .prefix(&format!(".{name}."))
            .suffix(".tmp")
            .tempfile_in(dir)
            .with_context(|| format!("creating scratch file in {}", dir.display()))?
            .into_temp_path();
        Ok(Self {
            scratch,
            target: target.to_path_buf(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.scratch
    }

    /// Replace the output with the scratch file.
    ///
    /// # Errors
    ///
    /// Returns an error if the rename fails.
    pub fn commit(self) -> Result<()> {
        let target = self.target;
        self.scratch
            .persist(&target)
            .map_err(|e| e.error)
            .with_context(|| format!("writing {}", target.display()))
    }
}

#[must_use]
pub fn file_size(path: &Path) -> Option<u64> {
    fs::metadata(path).ok().map(|m| m.len())
}

/// Size in kilobytes (1 Kb = 1000 bytes) with three decimals.
#[must_use]
pub fn kilobytes(bytes: u64) -> String {
    format!("{}.{:03} Kb", bytes / 1000, bytes % 1000)
}

/// In dry-run mode, log each command and report [`TaskResult::DryRun`].
pub fn dry_run_commands(ctx: &Context, commands: &[(&str, &[String])]) -> Option<TaskResult> {
    if !ctx.dry_run {
        return None;
    }
    for (program, args) in commands {
        ctx.log.dry_run(&exec::command_line(program, args));
    }
    Some(TaskResult::DryRun)
}
