//! Orchestration data model
//!
//! Call-scoped values that flow through the pipeline:
//! utterance → [`OrderedTaskList`] → [`GroupedTaskMap`] → [`DistributionResult`].
//! None of these outlive a single orchestration call.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Message used when a handler result carries no usable text
pub const DEFAULT_RESULT_MESSAGE: &str = "processing completed";

/// A single operation requested from a destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Operation name (e.g. `search_product`)
    pub action: String,
    /// Human-readable predicate or parameter description
    pub condition: String,
}

impl Command {
    /// Create a new command
    pub fn new(action: impl Into<String>, condition: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            condition: condition.into(),
        }
    }

    /// Render as `"<action>: <condition>"`
    pub fn render(&self) -> String {
        format!("{}: {}", self.action, self.condition)
    }

    /// True when neither field carries any text
    pub fn is_blank(&self) -> bool {
        self.action.trim().is_empty() && self.condition.trim().is_empty()
    }
}

/// A routed, prioritized unit of work produced by extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Identifier of the downstream handler
    pub destination: String,
    /// Payload sent to the destination
    pub command: Command,
    /// Lower value runs earlier; not unique, not contiguous
    pub priority: i64,
}

impl Task {
    /// Create a new task
    pub fn new(destination: impl Into<String>, command: Command, priority: i64) -> Self {
        Self {
            destination: destination.into(),
            command,
            priority,
        }
    }

    /// A task is usable by the grouper only with a destination and a command
    pub fn is_routable(&self) -> bool {
        !self.destination.trim().is_empty() && !self.command.is_blank()
    }
}

/// Tasks sorted ascending by priority (stable: ties keep input order)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OrderedTaskList(Vec<Task>);

impl OrderedTaskList {
    /// Build from tasks in arbitrary order
    pub fn from_unsorted(mut tasks: Vec<Task>) -> Self {
        // `sort_by_key` is stable
        tasks.sort_by_key(|task| task.priority);
        Self(tasks)
    }

    /// Borrow the tasks in priority order
    pub fn as_slice(&self) -> &[Task] {
        &self.0
    }

    /// Number of tasks
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no tasks
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in priority order
    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.0.iter()
    }

    /// Consume into the inner vector
    pub fn into_inner(self) -> Vec<Task> {
        self.0
    }
}

impl std::ops::Deref for OrderedTaskList {
    type Target = [Task];

    fn deref(&self) -> &[Task] {
        &self.0
    }
}

/// Insertion-ordered map keyed by destination
///
/// Iteration order is the order in which each key was first inserted.
/// Serializes as a JSON object in that order.
#[derive(Debug, Clone, PartialEq)]
pub struct DestinationMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for DestinationMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> DestinationMap<V> {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a destination
    pub fn get(&self, destination: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(key, _)| key == destination)
            .map(|(_, value)| value)
    }

    /// Mutable lookup
    pub fn get_mut(&mut self, destination: &str) -> Option<&mut V> {
        self.entries
            .iter_mut()
            .find(|(key, _)| key == destination)
            .map(|(_, value)| value)
    }

    /// Insert or replace; a replaced key keeps its original position
    pub fn insert(&mut self, destination: impl Into<String>, value: V) {
        let destination = destination.into();
        match self.get_mut(&destination) {
            Some(slot) => *slot = value,
            None => self.entries.push((destination, value)),
        }
    }

    /// True when the destination has an entry
    pub fn contains_key(&self, destination: &str) -> bool {
        self.get(destination).is_some()
    }

    /// Number of destinations
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Destinations in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Values in insertion order
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, value)| value)
    }

    /// `(destination, value)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value))
    }
}

impl<V> FromIterator<(String, V)> for DestinationMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<V: Serialize> Serialize for DestinationMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Destination → commands, keyed in first-appearance order
pub type GroupedTaskMap = DestinationMap<Vec<Command>>;

impl DestinationMap<Vec<Command>> {
    /// Append a run of commands to the destination's list, opening the
    /// entry if this is the destination's first run
    pub fn append_run(&mut self, destination: &str, run: Vec<Command>) {
        match self.get_mut(destination) {
            Some(commands) => commands.extend(run),
            None => self.entries.push((destination.to_string(), run)),
        }
    }

    /// Total number of commands across all destinations
    pub fn command_count(&self) -> usize {
        self.values().map(Vec::len).sum()
    }
}

/// Outcome of one destination's invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationStatus {
    /// Handler returned a result
    Executed,
    /// Handler was resolved but its invocation failed
    Failed,
}

/// Record of what was sent to a destination
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributedTask {
    /// Commands merged into this invocation
    pub commands: Vec<Command>,
    /// The instruction string actually sent
    pub integrated_instruction: String,
    /// Type name declared by the handler
    pub handler_type: String,
    /// Invocation outcome
    pub status: DestinationStatus,
}

/// Aggregate returned by the distributor
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DistributionResult {
    /// Per-destination invocation records
    pub distributed_tasks: DestinationMap<DistributedTask>,
    /// Per-destination normalized handler results
    pub execution_results: DestinationMap<Value>,
    /// One entry per destination that could not be resolved or failed
    pub errors: Vec<String>,
    /// Number of destinations in the grouped map
    pub total_destinations: usize,
    /// Destinations whose handler returned a result
    pub successful_count: usize,
    /// Resolved destinations whose invocation failed
    pub failed_count: usize,
    /// Result of the most recently successful destination
    pub last_execution_result: Option<Value>,
    /// Results retained for context threading (same content as `execution_results`)
    pub previous_results: DestinationMap<Value>,
}

impl DistributionResult {
    /// Empty result for a run over `total_destinations` destinations
    pub fn empty(total_destinations: usize) -> Self {
        Self {
            total_destinations,
            ..Self::default()
        }
    }

    /// All-zero result carrying a single pipeline-level error
    pub fn fatal(error: impl Into<String>) -> Self {
        Self {
            errors: vec![error.into()],
            ..Self::default()
        }
    }

    /// `message` of the last successful result, if any
    pub fn final_message(&self) -> Option<&str> {
        self.last_execution_result
            .as_ref()
            .and_then(|result| result.get("message"))
            .and_then(Value::as_str)
    }

    /// Errors joined into one string, `None` when there were none
    pub fn error_summary(&self) -> Option<String> {
        if self.errors.is_empty() {
            None
        } else {
            Some(self.errors.join("; "))
        }
    }
}
