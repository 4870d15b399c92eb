//! Named, dependency-ordered build tasks.
mod context;
pub mod entry;
pub mod graph;
pub mod helpers;
pub mod lint;
pub mod script;
pub mod style;
pub mod watch;

/// Implement [`Task::dependencies`] from a list of task types.
///
/// The `const` keeps the slice `'static`, as the return type requires.
///
/// ```ignore
/// task_deps![super::style::CompileStylesDev, super::lint::LintScripts]
/// ```
macro_rules! task_deps {
    [$($dep:ty),+ $(,)?] => {
        fn dependencies(&self) -> &[std::any::TypeId] {
            const DEPS: &[std::any::TypeId] = &[$(std::any::TypeId::of::<$dep>()),+];
            DEPS
        }
    };
}

pub(crate) use task_deps;

pub use context::Context;

use std::any::TypeId;

use anyhow::Result;

use crate::error::TaskError;
use crate::logging::TaskStatus;

/// Outcome of a task that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResult {
    /// Work was done.
    Ok,
    /// Nothing was done, for the given reason.
    Skipped(String),
    /// Commands were logged instead of run.
    DryRun,
}

/// A named unit of build work.
///
/// The `'static` bound gives every task a stable [`TypeId`], which is how
/// dependencies are declared (see [`task_deps!`]).
pub trait Task: Send + Sync + 'static {
    /// Name used on the command line and in the summary.
    fn name(&self) -> &str;

    /// Alternative names accepted by `shop-build run`.
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// One-line description for `shop-build tasks`.
    fn description(&self) -> &str;

    fn task_id(&self) -> TypeId {
        TypeId::of::<Self>()
    }

    /// Tasks that must succeed before this one starts.
    fn dependencies(&self) -> &[TypeId] {
        &[]
    }

    /// Notification title used when this task fails.
    fn error_title(&self) -> &str {
        "Build Error"
    }

    /// Tasks that block until interrupted; their output is not buffered.
    fn is_long_running(&self) -> bool {
        false
    }

    /// Whether there is anything for this task to do with the current shop.
    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    /// Execute the task.
    ///
    /// # Errors
    ///
    /// Returns an error if a required tool is missing, a tool exits with an
    /// error, or an input or output file cannot be accessed.
    fn run(&self, ctx: &Context) -> Result<TaskResult>;
}

/// Every task the tool knows, in listing order.
#[must_use]
pub fn all_tasks() -> Vec<Box<dyn Task>> {
    vec![
        Box::new(style::CompileStylesDev),
        Box::new(style::CompileStylesDist),
        Box::new(script::ConcatScripts),
        Box::new(script::MinifyScripts),
        Box::new(lint::LintScripts),
        Box::new(watch::WatchSources),
        Box::new(entry::Develop),
        Box::new(entry::Distribute),
    ]
}

/// Look a task up by name or alias.
///
/// # Errors
///
/// Returns [`TaskError::UnknownTask`] listing the valid names.
pub fn find<'a>(tasks: &'a [Box<dyn Task>], name: &str) -> Result<&'a dyn Task, TaskError> {
    tasks
        .iter()
        .map(Box::as_ref)
        .find(|t| t.name() == name || t.aliases().iter().any(|a| *a == name))
        .ok_or_else(|| TaskError::UnknownTask {
            name: name.to_string(),
            available: tasks
                .iter()
                .map(|t| t.name().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
}

/// Execute a task, record its outcome and raise a notification on failure.
pub fn execute(task: &dyn Task, ctx: &Context) -> TaskStatus {
    if !task.should_run(ctx) {
        ctx.log
            .debug(&format!("skipping task: {} (not applicable)", task.name()));
        ctx.log
            .record_task(task.name(), TaskStatus::NotApplicable, None);
        return TaskStatus::NotApplicable;
    }

    ctx.log.stage(task.name());

    let status = match task.run(ctx) {
        Ok(TaskResult::Ok) => TaskStatus::Ok,
        Ok(TaskResult::Skipped(reason)) => {
            ctx.log.info(&format!("skipped: {reason}"));
            ctx.log
                .record_task(task.name(), TaskStatus::Skipped, Some(&reason));
            return TaskStatus::Skipped;
        }
        Ok(TaskResult::DryRun) => TaskStatus::DryRun,
        Err(e) => {
            let message = format!("{e:#}");
            ctx.notifier.failure(ctx.log.as_ref(), task.error_title(), &message);
            ctx.log
                .record_task(task.name(), TaskStatus::Failed, Some(&message));
            return TaskStatus::Failed;
        }
    };
    ctx.log.record_task(task.name(), status, None);
    status
}

/// Shared fixtures for task unit tests.
#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
pub mod test_helpers {
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    use indexmap::IndexMap;

    use crate::config::{BuildConfig, ShopConfig};
    use crate::exec::{ExecResult, Executor, display_name};
    use crate::logging::{Log, Logger};

    use super::Context;

    /// One recorded invocation.
    #[derive(Debug, Clone)]
    pub struct Call {
        pub dir: PathBuf,
        pub program: String,
        pub args: Vec<String>,
        pub env: Vec<(String, String)>,
    }

    /// Executor that records every call instead of spawning processes.
    ///
    /// `which()` finds only the tools listed at construction; programs
    /// registered with [`fail_with`](Self::fail_with) exit non-zero.
    #[derive(Debug, Default)]
    pub struct RecordingExecutor {
        tools: Vec<String>,
        failures: HashMap<String, ExecResult>,
        calls: Mutex<Vec<Call>>,
    }

    impl RecordingExecutor {
        #[must_use]
        pub fn with_tools(tools: &[&str]) -> Self {
            Self {
                tools: tools.iter().map(ToString::to_string).collect(),
                ..Self::default()
            }
        }

        /// Make `tool` exit with `code`, printing `output` on stdout.
        #[must_use]
        pub fn fail_with(mut self, tool: &str, code: i32, output: &str) -> Self {
            self.failures.insert(
                tool.to_string(),
                ExecResult {
                    stdout: output.to_string(),
                    stderr: String::new(),
                    success: false,
                    code: Some(code),
                },
            );
            self
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        /// Short program names in call order.
        pub fn programs(&self) -> Vec<String> {
            self.calls()
                .iter()
                .map(|c| display_name(&c.program))
                .collect()
        }
    }

    impl Executor for RecordingExecutor {
        fn run_in(&self, dir: &Path, program: &str, args: &[String]) -> anyhow::Result<ExecResult> {
            let result = self.run_unchecked_in(dir, program, args)?;
            Ok(result.check(&display_name(program))?)
        }

        fn run_unchecked_in(
            &self,
            dir: &Path,
            program: &str,
            args: &[String],
        ) -> anyhow::Result<ExecResult> {
            self.run_unchecked_with_env(dir, program, args, &[])
        }

        fn run_unchecked_with_env(
            &self,
            dir: &Path,
            program: &str,
            args: &[String],
            env: &[(&str, &str)],
        ) -> anyhow::Result<ExecResult> {
            self.calls.lock().unwrap().push(Call {
                dir: dir.to_path_buf(),
                program: program.to_string(),
                args: args.to_vec(),
                env: env
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
            });
            Ok(self
                .failures
                .get(&display_name(program))
                .cloned()
                .unwrap_or(ExecResult {
                    success: true,
                    code: Some(0),
                    ..ExecResult::default()
                }))
        }

        fn which(&self, program: &str) -> Option<PathBuf> {
            self.tools
                .iter()
                .any(|t| t == program)
                .then(|| PathBuf::from("/usr/bin").join(program))
        }
    }

    /// A shop with two partials, one script and one variable, rooted at
    /// `root`.
    #[must_use]
    pub fn sample_build(root: &Path) -> BuildConfig {
        let shop = ShopConfig {
            less: vec!["a.less".to_string(), "b.less".to_string()],
            js: vec!["x.js".to_string()],
            config: IndexMap::from([("brand-primary".to_string(), serde_json::json!("#d9400b"))]),
            less_target: "web/cache/shop1.css".to_string(),
        };
        BuildConfig::from_shop(root, 1, shop, false).expect("sample build config")
    }

    /// Context over `build` with `executor`, notifications off.
    pub fn make_context(build: BuildConfig, executor: Arc<dyn Executor>) -> (Context, Arc<Logger>) {
        let log = Arc::new(Logger::new("test"));
        let ctx = Context::new(
            Arc::new(build),
            Arc::clone(&log) as Arc<dyn Log>,
            executor,
            false,
            false,
            false,
        );
        (ctx, log)
    }
}
