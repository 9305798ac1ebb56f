//! Linear progress indicator derived from the harvest status

use serde::Serialize;

use crate::models::HarvestStatus;

/// One segment of the progress bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressStep {
    pub status: HarvestStatus,
    pub label: &'static str,
    pub filled: bool,
    pub current: bool,
}

/// Progress through the seven workflow stages
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub steps: Vec<ProgressStep>,
}

impl Progress {
    pub fn filled_count(&self) -> usize {
        self.steps.iter().filter(|s| s.filled).count()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Segments up to and including the current status are filled
pub fn progress(status: HarvestStatus) -> Progress {
    let current = status.index();
    let steps = HarvestStatus::ALL
        .iter()
        .map(|s| ProgressStep {
            status: *s,
            label: s.label(),
            filled: s.index() <= current,
            current: s.index() == current,
        })
        .collect();
    Progress { steps }
}
