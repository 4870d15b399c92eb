//! Task dependency graph utilities.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};

use super::Task;
use crate::error::TaskError;

/// Tasks from `all` that `targets` need, directly or transitively,
/// including the targets themselves. Keeps the order of `all`.
#[must_use]
pub fn closure<'a>(all: &[&'a dyn Task], targets: &[&dyn Task]) -> Vec<&'a dyn Task> {
    let by_id: HashMap<TypeId, &'a dyn Task> = all.iter().map(|t| (t.task_id(), *t)).collect();
    let mut needed: HashSet<TypeId> = HashSet::new();
    let mut stack: Vec<TypeId> = targets.iter().map(|t| t.task_id()).collect();
    while let Some(id) = stack.pop() {
        if !needed.insert(id) {
            continue;
        }
        if let Some(task) = by_id.get(&id) {
            stack.extend(task.dependencies().iter().copied());
        }
    }
    all.iter()
        .copied()
        .filter(|t| needed.contains(&t.task_id()))
        .collect()
}

/// Order `tasks` so each one follows its dependencies.
///
/// Each step takes the earliest task in input order whose dependencies are
/// already placed, so independent tasks keep their relative order.
/// Dependencies outside `tasks` are ignored.
///
/// # Errors
///
/// Returns [`TaskError::DependencyCycle`] naming the tasks that could not
/// be placed.
pub fn topological_order<'a>(tasks: &[&'a dyn Task]) -> Result<Vec<&'a dyn Task>, TaskError> {
    let in_scope: HashSet<TypeId> = tasks.iter().map(|t| t.task_id()).collect();
    let mut placed: HashSet<TypeId> = HashSet::with_capacity(tasks.len());
    let mut order = Vec::with_capacity(tasks.len());

    let is_ready = |task: &dyn Task, placed: &HashSet<TypeId>| {
        task.dependencies()
            .iter()
            .all(|dep| !in_scope.contains(dep) || placed.contains(dep))
    };

    while let Some(next) = tasks
        .iter()
        .find(|t| !placed.contains(&t.task_id()) && is_ready(**t, &placed))
    {
        placed.insert(next.task_id());
        order.push(*next);
    }

    if order.len() == tasks.len() {
        return Ok(order);
    }
    let stuck: Vec<&str> = tasks
        .iter()
        .filter(|t| !placed.contains(&t.task_id()))
        .map(|t| t.name())
        .collect();
    Err(TaskError::DependencyCycle(stuck.join(", ")))
}

/// The tasks to run for `targets`, dependencies first.
///
/// # Errors
///
/// Returns [`TaskError::DependencyCycle`] if the needed tasks form a cycle.
pub fn plan<'a>(
    all: &[&'a dyn Task],
    targets: &[&dyn Task],
) -> Result<Vec<&'a dyn Task>, TaskError> {
    topological_order(&closure(all, targets))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::tasks::{Context, TaskResult};

    /// Declare a no-op task type: `fake!(Type "name" after [Dep, ...])`.
    macro_rules! fake {
        ($ty:ident $label:literal after [$($dep:ident),*]) => {
            struct $ty;
            impl Task for $ty {
                fn name(&self) -> &str {
                    $label
                }
                fn description(&self) -> &str {
                    "fake"
                }
                fn dependencies(&self) -> &[TypeId] {
                    const AFTER: &[TypeId] = &[$(TypeId::of::<$dep>()),*];
                    AFTER
                }
                fn run(&self, _ctx: &Context) -> anyhow::Result<TaskResult> {
                    Ok(TaskResult::Ok)
                }
            }
        };
    }

    fake!(Fonts "fonts" after []);
    fake!(Icons "icons" after []);

    fake!(Compile "compile" after []);
    fake!(Prefix "prefix" after [Compile]);
    fake!(Minify "minify" after [Prefix]);

    fake!(Manifest "manifest" after []);
    fake!(Styles "styles" after [Manifest]);
    fake!(Scripts "scripts" after [Manifest]);
    fake!(Release "release" after [Styles, Scripts]);

    fake!(Chicken "chicken" after [Egg]);
    fake!(Egg "egg" after [Chicken]);

    fn names(tasks: &[&dyn Task]) -> Vec<String> {
        tasks.iter().map(|t| t.name().to_string()).collect()
    }

    #[test]
    fn unrelated_tasks_keep_input_order() {
        let tasks: Vec<&dyn Task> = vec![&Icons, &Fonts];
        assert_eq!(names(&topological_order(&tasks).unwrap()), ["icons", "fonts"]);
    }

    #[test]
    fn reversed_chain_is_straightened() {
        let tasks: Vec<&dyn Task> = vec![&Minify, &Prefix, &Compile];
        assert_eq!(
            names(&topological_order(&tasks).unwrap()),
            ["compile", "prefix", "minify"]
        );
    }

    #[test]
    fn join_comes_after_both_branches() {
        let tasks: Vec<&dyn Task> = vec![&Release, &Scripts, &Styles, &Manifest];
        assert_eq!(
            names(&topological_order(&tasks).unwrap()),
            ["manifest", "scripts", "styles", "release"]
        );
    }

    #[test]
    fn cycle_names_only_the_stuck_tasks() {
        let tasks: Vec<&dyn Task> = vec![&Fonts, &Chicken, &Egg];
        let err = topological_order(&tasks).err().expect("cycle");
        assert!(matches!(err, TaskError::DependencyCycle(_)));
        assert_eq!(err.to_string(), "Task dependency cycle detected: chicken, egg");
    }

    #[test]
    fn dependency_outside_the_set_is_ignored() {
        let tasks: Vec<&dyn Task> = vec![&Prefix, &Fonts];
        assert_eq!(names(&topological_order(&tasks).unwrap()), ["prefix", "fonts"]);
    }

    #[test]
    fn closure_pulls_in_transitive_deps_only() {
        let all: Vec<&dyn Task> = vec![&Fonts, &Compile, &Prefix, &Minify, &Manifest];
        assert_eq!(
            names(&closure(&all, &[&Minify])),
            ["compile", "prefix", "minify"]
        );
        assert_eq!(names(&closure(&all, &[&Fonts])), ["fonts"]);
    }

    #[test]
    fn plan_for_real_targets() {
        let all = crate::tasks::all_tasks();
        let refs: Vec<&dyn Task> = all.iter().map(Box::as_ref).collect();
        let target = |name: &str| crate::tasks::find(&all, name).unwrap();
        let planned = |name: &str| -> Vec<String> {
            plan(&refs, &[target(name)])
                .unwrap()
                .iter()
                .map(|t| t.name().to_string())
                .collect()
        };

        assert_eq!(planned("dist"), ["style-dist", "script-dist", "lint", "dist"]);
        assert_eq!(planned("default"), ["style-dev", "script-dev", "lint", "default"]);
        assert_eq!(planned("watch"), ["watch"]);
    }

    #[test]
    fn registered_tasks_form_a_dag() {
        let all = crate::tasks::all_tasks();
        let refs: Vec<&dyn Task> = all.iter().map(Box::as_ref).collect();
        let present: HashSet<TypeId> = refs.iter().map(|t| t.task_id()).collect();
        for task in &refs {
            for dep in task.dependencies() {
                assert!(present.contains(dep), "{} has an unknown dependency", task.name());
            }
        }
        assert_eq!(topological_order(&refs).unwrap().len(), refs.len());
    }
}
