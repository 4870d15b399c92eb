//! Domain-specific error types for the build pipeline.
//!
//! Internal modules return typed errors (e.g., [`ConfigError`], [`ToolError`])
//! while command handlers at the CLI boundary convert them to [`anyhow::Error`]
//! via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! BuildError
//! ├── Config(ConfigError) : shop config loading, path derivation, manifest write
//! ├── Task(TaskError)     : task lookup, dependency cycles, missing sources
//! └── Tool(ToolError)     : external tool lookup and exit status
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the build pipeline.
#[derive(Error, Debug)]
pub enum BuildError {
    /// Configuration-related error (shop config, paths, manifest).
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Task graph or task execution error.
    #[error("Task execution error: {0}")]
    Task(#[from] TaskError),

    /// External tool error.
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),
}

/// Errors that arise while loading the shop configuration and preparing the
/// generated sources.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The shop configuration file does not exist.
    #[error("Shop configuration not found: {}", path.display())]
    NotFound {
        /// Expected location of `config_<id>.json`.
        path: PathBuf,
    },

    /// The shop configuration file exists but could not be read.
    #[error("IO error reading shop configuration {}: {source}", path.display())]
    Io {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The shop configuration file is not valid JSON or misses a required field.
    #[error("Invalid shop configuration {}: {source}", path.display())]
    Parse {
        /// Path to the malformed file.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// The shop id taken from the environment is not a number.
    #[error("Invalid shop id '{0}': must be a non-negative integer")]
    InvalidShopId(String),

    /// `lessTarget` has no file name to derive output names from.
    #[error("Invalid lessTarget '{0}': expected a file path such as web/cache/name.css")]
    InvalidTarget(String),

    /// The generated LESS manifest could not be written.
    #[error("Failed to write LESS manifest {}: {source}", path.display())]
    ManifestWrite {
        /// Destination of the manifest.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that arise from the task graph.
#[derive(Error, Debug)]
pub enum TaskError {
    /// One or more tasks of a run failed.
    #[error("{count} task(s) failed: {tasks}")]
    ExecutionFailed {
        /// Number of failed tasks.
        count: usize,
        /// Comma-separated names of the failed tasks.
        tasks: String,
    },

    /// The task dependency graph contains a cycle.
    #[error("Task dependency cycle detected: {0}")]
    DependencyCycle(String),

    /// No task is registered under the requested name or alias.
    #[error("Unknown task '{name}' (available: {available})")]
    UnknownTask {
        /// Requested name.
        name: String,
        /// Comma-separated list of known task names.
        available: String,
    },

    /// A source file listed in the shop configuration does not exist.
    #[error("Source file not found: {}", .0.display())]
    SourceMissing(PathBuf),
}

/// Errors that arise from invoking external tools.
#[derive(Error, Debug)]
pub enum ToolError {
    /// The tool is neither in `node_modules/.bin` nor on `PATH`.
    #[error("'{program}' not found in node_modules/.bin or on PATH")]
    NotFound {
        /// Tool name.
        program: String,
    },

    /// The tool exited with a non-zero status.
    #[error("{program} failed (exit {code}): {output}")]
    Failed {
        /// Tool name.
        program: String,
        /// Exit code, `-1` when terminated by a signal.
        code: i32,
        /// Trimmed diagnostic output of the tool.
        output: String,
    },
}
