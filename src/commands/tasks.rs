//! Command: list the task graph.
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt::Write as _;

use crate::tasks::{self, Task};

/// One block per task: name and aliases, description, then the tasks it
/// needs.
#[must_use]
pub fn render(all: &[Box<dyn Task>]) -> String {
    let names: HashMap<TypeId, &str> = all.iter().map(|t| (t.task_id(), t.name())).collect();
    let labels: Vec<String> = all
        .iter()
        .map(|t| {
            if t.aliases().is_empty() {
                t.name().to_string()
            } else {
                format!("{} ({})", t.name(), t.aliases().join(", "))
            }
        })
        .collect();
    let width = labels.iter().map(String::len).max().unwrap_or(0);

    let mut out = String::new();
    for (task, label) in all.iter().zip(&labels) {
        let _ = writeln!(out, "{label:<width$}  {}", task.description());
        let deps: Vec<&str> = task
            .dependencies()
            .iter()
            .filter_map(|d| names.get(d).copied())
            .collect();
        if !deps.is_empty() {
            let _ = writeln!(out, "{:width$}  needs: {}", "", deps.join(", "));
        }
    }
    out
}

/// Print every known task.
pub fn run() {
    print!("{}", render(&tasks::all_tasks()));
}
