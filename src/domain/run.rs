//! Per-idea outcomes and the report of a whole run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Result of a Notifier call. Only ever logged, never persisted as state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub recipient: String,

    pub delivered: bool,

    /// Provider-side message id (if returned)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

/// What happened to one idea during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IdeaOutcome {
    /// All stages succeeded and the idea moved to `evaluated`
    Evaluated,

    /// Moved to `evaluated`, but audio or delivery did not complete
    Partial { issues: Vec<String> },

    /// Not processed, left where it was (e.g. empty file)
    Skipped { reason: String },

    /// Left in `pending` for the next run
    Failed { reason: String },
}

impl IdeaOutcome {
    /// Whether the idea left the pending queue
    pub fn is_archived(&self) -> bool {
        matches!(self, Self::Evaluated | Self::Partial { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Evaluated => "evaluated",
            Self::Partial { .. } => "partial",
            Self::Skipped { .. } => "skipped",
            Self::Failed { .. } => "failed",
        }
    }
}

/// One line of the run report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdeaResult {
    /// File name of the idea
    pub idea: String,

    #[serde(flatten)]
    pub outcome: IdeaOutcome,
}

/// Summary of a pipeline run over the pending queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,

    pub started_at: DateTime<Utc>,

    pub finished_at: Option<DateTime<Utc>>,

    /// Results in processing order
    pub results: Vec<IdeaResult>,
}

/// Counters derived from a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounts {
    pub evaluated: usize,
    pub partial: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunCounts {
    pub fn total(&self) -> usize {
        self.evaluated + self.partial + self.skipped + self.failed
    }
}

impl RunReport {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            finished_at: None,
            results: Vec::new(),
        }
    }

    pub fn record(&mut self, idea: impl Into<String>, outcome: IdeaOutcome) {
        self.results.push(IdeaResult {
            idea: idea.into(),
            outcome,
        });
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// True when the pending queue had nothing in it
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn counts(&self) -> RunCounts {
        let mut counts = RunCounts::default();
        for result in &self.results {
            match result.outcome {
                IdeaOutcome::Evaluated => counts.evaluated += 1,
                IdeaOutcome::Partial { .. } => counts.partial += 1,
                IdeaOutcome::Skipped { .. } => counts.skipped += 1,
                IdeaOutcome::Failed { .. } => counts.failed += 1,
            }
        }
        counts
    }

    /// Outcome recorded for a given idea file
    pub fn outcome_of(&self, idea: &str) -> Option<&IdeaOutcome> {
        self.results
            .iter()
            .find(|r| r.idea == idea)
            .map(|r| &r.outcome)
    }
}
