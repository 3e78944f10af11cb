//! Task grouping
//!
//! Pure transform from a priority-ordered task list to a destination-keyed
//! map of command runs. Contiguous tasks for one destination form a run; a
//! destination that reappears after another one has its later run appended to
//! the entry it opened first.

use crate::orchestrator::types::{Command, GroupedTaskMap, Task};

/// Group tasks into per-destination command lists
///
/// Input is re-sorted by priority (stable) so callers may pass tasks in any
/// order. Records without a destination or command are skipped.
pub fn group(tasks: &[Task]) -> GroupedTaskMap {
    let mut sorted: Vec<&Task> = tasks.iter().collect();
    sorted.sort_by_key(|task| task.priority);

    tracing::debug!(task_count = sorted.len(), "Grouping tasks");

    let mut grouped = GroupedTaskMap::new();
    let mut current: Option<&str> = None;
    let mut run: Vec<Command> = Vec::new();
    let mut routable = 0usize;

    for (i, task) in sorted.iter().enumerate() {
        if !task.is_routable() {
            tracing::warn!(
                position = i + 1,
                destination = %task.destination,
                "Skipping task without destination or command"
            );
            continue;
        }
        routable += 1;

        if current == Some(task.destination.as_str()) {
            run.push(task.command.clone());
            continue;
        }

        if let Some(destination) = current {
            grouped.append_run(destination, std::mem::take(&mut run));
        }
        current = Some(task.destination.as_str());
        run.push(task.command.clone());
    }

    if let Some(destination) = current {
        grouped.append_run(destination, run);
    }

    if grouped.command_count() != routable {
        tracing::error!(
            expected = routable,
            actual = grouped.command_count(),
            "Grouping lost commands, regrouping by destination"
        );
        return group_by_destination(sorted.iter().copied());
    }

    for (destination, commands) in grouped.iter() {
        tracing::info!(
            destination = %destination,
            command_count = commands.len(),
            "Grouped commands"
        );
    }

    grouped
}

/// Naive grouping that ignores adjacency; keeps every routable task
pub fn group_by_destination<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> GroupedTaskMap {
    let mut grouped = GroupedTaskMap::new();
    for task in tasks.into_iter().filter(|t| t.is_routable()) {
        grouped.append_run(&task.destination, vec![task.command.clone()]);
    }
    grouped
}
