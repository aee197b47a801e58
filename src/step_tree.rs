use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::progress::{clamp_percentage, deserialize_percentage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Error,
}

impl StepStatus {
    /// Maps a collaborator status string onto the nearest known status.
    /// Unknown values become `Pending`.
    pub fn coerce(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "running" | "in_progress" | "in-progress" | "active" | "started" => Self::Running,
            "completed" | "complete" | "done" | "success" | "succeeded" => Self::Completed,
            "error" | "failed" | "failure" | "errored" | "cancelled" => Self::Error,
            _ => Self::Pending,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

/// Reads an optional status from an update: strings are coerced, any other
/// value is treated as absent so it cannot move the step.
pub fn deserialize_status<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<StepStatus>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(raw)) => Some(StepStatus::coerce(&raw)),
        None | Some(Value::Null) => None,
        Some(other) => {
            debug!(value = %other, "ignoring non-string step status");
            None
        }
    })
}

/// Strings are coerced; any other JSON value reads as `Pending`.
impl<'de> Deserialize<'de> for StepStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(raw) => Self::coerce(&raw),
            Value::Null => Self::Pending,
            other => {
                debug!(value = %other, "non-string step status read as pending");
                Self::Pending
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "deserialize_percentage",
        skip_serializing_if = "Option::is_none"
    )]
    pub percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Step>,
}

impl Step {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: StepStatus::Pending,
            start_time: None,
            end_time: None,
            percentage: None,
            children: Vec::new(),
        }
    }

    /// Percentage shown for this step: 100 once completed, the last reported
    /// value otherwise. Always within `[0, 100]`.
    pub fn display_percentage(&self) -> Option<f64> {
        match self.status {
            StepStatus::Completed => Some(100.0),
            StepStatus::Pending => None,
            StepStatus::Running | StepStatus::Error => self.percentage.map(clamp_percentage),
        }
    }
}

/// Partial status carried by a step-update event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepUpdate {
    pub status: Option<StepStatus>,
    pub percentage: Option<f64>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

#[cfg(test)]
impl Step {
    pub fn with_status(mut self, status: StepStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_child(mut self, child: Step) -> Self {
        self.children.push(child);
        self
    }
}

#[cfg(test)]
impl StepUpdate {
    pub fn status(status: StepStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn percentage(percentage: f64) -> Self {
        Self {
            percentage: Some(percentage),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    NotFound,
    Unchanged,
    StatusChanged,
    ProgressChanged,
}

impl UpdateOutcome {
    pub fn needs_render(self) -> bool {
        matches!(self, Self::StatusChanged | Self::ProgressChanged)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The parent was not announced yet; the step was attached at the root.
    AttachedToRoot,
    Duplicate,
}

/// One visible row of the depth-bounded tree rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum StepRow {
    Step {
        depth: usize,
        id: String,
        name: String,
        status: StepStatus,
        percentage: Option<f64>,
        current: bool,
    },
    Truncated {
        depth: usize,
        hidden: usize,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepTree {
    roots: Vec<Step>,
}

impl StepTree {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn from_steps(roots: Vec<Step>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[Step] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn len(&self) -> usize {
        walk(&self.roots).count()
    }

    pub fn reset(&mut self) {
        self.roots.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    pub fn find(&self, id: &str) -> Option<&Step> {
        walk(&self.roots).map(|(_, step)| step).find(|step| step.id == id)
    }

    pub fn insert_step(&mut self, parent_id: Option<&str>, mut step: Step) -> InsertOutcome {
        if self.contains(&step.id) {
            debug!(step_id = %step.id, "ignoring duplicate step announcement");
            return InsertOutcome::Duplicate;
        }
        step.percentage = step.percentage.map(clamp_percentage);

        let Some(parent_id) = parent_id else {
            self.roots.push(step);
            return InsertOutcome::Inserted;
        };
        match self.path_to(parent_id) {
            Some(path) => match self.node_at_mut(&path) {
                Some(parent) => {
                    parent.children.push(step);
                    InsertOutcome::Inserted
                }
                None => {
                    self.roots.push(step);
                    InsertOutcome::AttachedToRoot
                }
            },
            None => {
                debug!(step_id = %step.id, parent_id, "parent not announced yet, attaching at root");
                self.roots.push(step);
                InsertOutcome::AttachedToRoot
            }
        }
    }

    /// Merges a partial status into the step with `step_id`.
    ///
    /// Terminal statuses are sticky against late `pending`/`running` updates
    /// and a running percentage never moves backwards, so updates that arrive
    /// out of order cannot regress the view.
    pub fn apply_update(&mut self, step_id: &str, update: &StepUpdate) -> UpdateOutcome {
        let Some(path) = self.path_to(step_id) else {
            debug!(step_id, "update for unknown step ignored");
            return UpdateOutcome::NotFound;
        };
        let Some(node) = self.node_at_mut(&path) else {
            return UpdateOutcome::NotFound;
        };

        let mut status_changed = false;
        if let Some(next) = update.status {
            if next != node.status {
                if node.status.is_terminal() && !next.is_terminal() {
                    debug!(
                        step_id,
                        current = node.status.label(),
                        stale = next.label(),
                        "ignoring stale status for finished step"
                    );
                } else {
                    node.status = next;
                    status_changed = true;
                    if next == StepStatus::Running && node.start_time.is_none() {
                        node.start_time = Some(update.start_time.unwrap_or_else(Utc::now));
                    }
                    if next.is_terminal() && node.end_time.is_none() {
                        node.end_time = Some(update.end_time.unwrap_or_else(Utc::now));
                    }
                    if next == StepStatus::Completed {
                        node.percentage = Some(100.0);
                    }
                }
            }
        }

        if node.start_time.is_none() {
            node.start_time = update.start_time;
        }

        let mut progress_changed = false;
        if let Some(raw) = update.percentage {
            let next = clamp_percentage(raw);
            if node.status == StepStatus::Running {
                match node.percentage {
                    Some(current) if next <= current => {}
                    _ => {
                        node.percentage = Some(next);
                        progress_changed = true;
                    }
                }
            }
        }

        if status_changed {
            UpdateOutcome::StatusChanged
        } else if progress_changed {
            UpdateOutcome::ProgressChanged
        } else {
            UpdateOutcome::Unchanged
        }
    }

    /// The step the "currently executing" highlight points at: the first
    /// running top-level step, descending into its first running child while
    /// one exists.
    pub fn current_step(&self) -> Option<&Step> {
        let mut current = self
            .roots
            .iter()
            .find(|step| step.status == StepStatus::Running)?;
        while let Some(child) = current
            .children
            .iter()
            .find(|child| child.status == StepStatus::Running)
        {
            current = child;
        }
        Some(current)
    }

    /// Flattens the tree into rows, replacing every subtree below
    /// `max_depth` with a single truncation marker.
    pub fn rows(&self, max_depth: usize) -> Vec<StepRow> {
        let current_id = self.current_step().map(|step| step.id.as_str());
        let mut rows = Vec::new();
        let mut stack: Vec<(usize, &Step)> = self.roots.iter().rev().map(|s| (0, s)).collect();
        while let Some((depth, step)) = stack.pop() {
            rows.push(StepRow::Step {
                depth,
                id: step.id.clone(),
                name: step.name.clone(),
                status: step.status,
                percentage: step.display_percentage(),
                current: current_id == Some(step.id.as_str()),
            });
            if step.children.is_empty() {
                continue;
            }
            if depth + 1 >= max_depth {
                rows.push(StepRow::Truncated {
                    depth: depth + 1,
                    hidden: walk(&step.children).count(),
                });
                continue;
            }
            for child in step.children.iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        rows
    }

    fn path_to(&self, id: &str) -> Option<Vec<usize>> {
        let mut path = Vec::new();
        let mut stack: Vec<(usize, usize, &Step)> = self
            .roots
            .iter()
            .enumerate()
            .rev()
            .map(|(idx, step)| (0, idx, step))
            .collect();
        while let Some((depth, idx, step)) = stack.pop() {
            path.truncate(depth);
            path.push(idx);
            if step.id == id {
                return Some(path);
            }
            for (child_idx, child) in step.children.iter().enumerate().rev() {
                stack.push((depth + 1, child_idx, child));
            }
        }
        None
    }

    fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut Step> {
        let (first, rest) = path.split_first()?;
        let mut node = self.roots.get_mut(*first)?;
        for idx in rest {
            node = node.children.get_mut(*idx)?;
        }
        Some(node)
    }
}

/// Pre-order walk over a forest of steps, yielding `(depth, step)`.
pub fn walk(steps: &[Step]) -> StepWalk<'_> {
    StepWalk {
        stack: steps.iter().rev().map(|step| (0, step)).collect(),
    }
}

pub struct StepWalk<'a> {
    stack: Vec<(usize, &'a Step)>,
}

impl<'a> Iterator for StepWalk<'a> {
    type Item = (usize, &'a Step);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, step) = self.stack.pop()?;
        for child in step.children.iter().rev() {
            self.stack.push((depth + 1, child));
        }
        Some((depth, step))
    }
}

#[cfg(test)]
#[path = "../tests/unit/step_tree_tests.rs"]
mod tests;
