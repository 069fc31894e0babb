//! The run's event log — one entry per pipeline step.
//!
//! RULE: Every observable step of a run is recorded as an event.
//! Two runs with the same seed and inputs must produce byte-identical
//! event logs; the determinism test depends on it.
//! Variants are added over time — never removed or reordered.

use crate::model::VariantLabel;
use crate::types::{LeadId, RunId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExperimentEvent {
    RunStarted {
        run_id: RunId,
        seed: u64,
        lead_count: usize,
    },
    LeadEnriched {
        lead_id: LeadId,
        triggers: Vec<String>,
    },
    VariantAssigned {
        lead_id: LeadId,
        variant: VariantLabel,
    },
    MessageDrafted {
        lead_id: LeadId,
        variant: VariantLabel,
        subject_line: String,
    },
    OutcomeSimulated {
        lead_id: LeadId,
        variant: VariantLabel,
        opened: bool,
        replied: bool,
        meeting_booked: bool,
    },
    RunCompleted {
        run_id: RunId,
        winner: Option<VariantLabel>,
    },
}

impl ExperimentEvent {
    /// Stable string name, used for the event_type column in event_log.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::RunStarted { .. } => "run_started",
            Self::LeadEnriched { .. } => "lead_enriched",
            Self::VariantAssigned { .. } => "variant_assigned",
            Self::MessageDrafted { .. } => "message_drafted",
            Self::OutcomeSimulated { .. } => "outcome_simulated",
            Self::RunCompleted { .. } => "run_completed",
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub run_id: RunId,
    /// Monotonic sequence number within the run.
    pub seq: u64,
    /// Which pipeline stage emitted the event.
    pub stage: String,
    pub event_type: String,
    pub payload: String, // JSON-serialized ExperimentEvent
}
