use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::step_tree::{Step, StepStatus, walk};

const BAR_FILLED: char = '█';
const BAR_EMPTY: char = '░';

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub error: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.pending + self.running + self.completed + self.error
    }

    fn record(&mut self, status: StepStatus) {
        match status {
            StepStatus::Pending => self.pending += 1,
            StepStatus::Running => self.running += 1,
            StepStatus::Completed => self.completed += 1,
            StepStatus::Error => self.error += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressSummary {
    pub percent_complete: f64,
    pub counts: StatusCounts,
    /// True when `percent_complete` came from the collaborator rather than
    /// local counts.
    pub authoritative: bool,
}

impl ProgressSummary {
    pub fn display_percent(&self) -> u8 {
        display_percent(self.percent_complete)
    }
}

/// Clamps any upstream percentage into `[0, 100]`; NaN reads as 0.
pub fn clamp_percentage(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Reads an optional percentage leniently: numbers and numeric strings are
/// kept, anything else is treated as absent.
pub fn deserialize_percentage<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<f64>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(raw)) => raw.trim().trim_end_matches('%').trim().parse().ok(),
        Some(other) => {
            debug!(value = %other, "ignoring non-numeric percentage");
            None
        }
    })
}

pub fn display_percent(value: f64) -> u8 {
    clamp_percentage(value).round() as u8
}

pub fn percent_from_counts(completed: usize, total: usize) -> f64 {
    clamp_percentage(completed as f64 / total.max(1) as f64 * 100.0)
}

/// Per-status counts over every step in the forest, nested ones included.
pub fn count_statuses(steps: &[Step]) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for (_, step) in walk(steps) {
        counts.record(step.status);
    }
    counts
}

/// Summarizes a step forest.
///
/// The local percentage is completed top-level steps over all top-level
/// steps. When the collaborator reports an overall number it wins, because it
/// can weigh step costs the local counts cannot see.
pub fn aggregate(steps: &[Step], authoritative: Option<f64>) -> ProgressSummary {
    let counts = count_statuses(steps);
    let authoritative = authoritative.filter(|value| !value.is_nan());
    let percent_complete = match authoritative {
        Some(value) => clamp_percentage(value),
        None => {
            let completed = steps
                .iter()
                .filter(|step| step.status == StepStatus::Completed)
                .count();
            percent_from_counts(completed, steps.len())
        }
    };
    ProgressSummary {
        percent_complete,
        counts,
        authoritative: authoritative.is_some(),
    }
}

pub fn progress_bar(percent: f64, width: usize) -> String {
    let filled = ((clamp_percentage(percent) / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    let mut bar = String::with_capacity(width * BAR_FILLED.len_utf8());
    bar.extend(std::iter::repeat_n(BAR_FILLED, filled));
    bar.extend(std::iter::repeat_n(BAR_EMPTY, width - filled));
    bar
}
