//! The records flowing through one experiment run.
//!
//! Lifecycle: a Lead is created from input data, mutated exactly once by
//! the enrichment stage, then read-only. Messages and results are created
//! once per lead and never modified.

use crate::error::{PipelineError, PipelineResult};
use crate::types::{LeadId, RunId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One prospect record under evaluation.
///
/// `name` doubles as the join key between leads, messages and results,
/// so it must be unique within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub name:    String,
    pub title:   String,
    pub company: String,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Contextual facts about the lead's company. Empty until enrichment.
    #[serde(default)]
    pub triggers: Vec<String>,
    /// Category → observations (pain points, goals, KPIs). Empty until enrichment.
    #[serde(default)]
    pub persona_profile: BTreeMap<String, Vec<String>>,
}

impl Lead {
    pub fn new(name: &str, title: &str, company: &str) -> Self {
        Self {
            name:            name.to_string(),
            title:           title.to_string(),
            company:         company.to_string(),
            linkedin_url:    None,
            email:           None,
            triggers:        Vec::new(),
            persona_profile: BTreeMap::new(),
        }
    }

    /// Ingestion boundary check. The pipeline assumes validated input and
    /// rejects a batch up front rather than degrading mid-run.
    pub fn validate(&self) -> PipelineResult<()> {
        for (field, value) in [
            ("name", &self.name),
            ("title", &self.title),
            ("company", &self.company),
        ] {
            if value.trim().is_empty() {
                return Err(PipelineError::InvalidLead {
                    name: self.name.clone(),
                    field,
                });
            }
        }
        Ok(())
    }
}

/// The experimental arm a lead is assigned to.
///
/// Ordering (A < B < Control) is the winner tie-break: when two variants
/// book meetings at the same rate, the first label in sort order wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VariantLabel {
    A,
    B,
    Control,
}

impl VariantLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::Control => "Control",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "Control" => Some(Self::Control),
            _ => None,
        }
    }
}

impl fmt::Display for VariantLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A testable messaging angle bound to one variant.
///
/// The description is free text; the funnel simulator also inspects it
/// for keyword cues when scoring persona fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hypothesis {
    pub name:        String,
    pub description: String,
    pub variant:     VariantLabel,
}

impl Hypothesis {
    pub fn new(name: &str, description: &str, variant: VariantLabel) -> Self {
        Self {
            name:        name.to_string(),
            description: description.to_string(),
            variant,
        }
    }
}

/// The generated outreach artifact for one lead/hypothesis pairing.
/// Exactly one message exists per lead per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub content:      String,
    pub subject_line: String,
    /// Echoes the variant the strategist was actually asked to use —
    /// not necessarily the hypothesis's own label. Keeping the two
    /// coupled is the orchestration's job, not the generator's.
    pub variant_type: VariantLabel,
    /// Free-text justification from the generation stage. Audit only;
    /// the simulator never reads it.
    pub reasoning: String,
    pub lead_id:   LeadId,
}

/// The stochastic funnel outcome for one lead.
///
/// Invariant: meeting_booked ⇒ replied ⇒ opened ⇒ sent.
/// `sent` is always true — send failures are not modeled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentResult {
    pub lead_id:        LeadId,
    pub variant_chosen: VariantLabel,
    pub sent:           bool,
    pub opened:         bool,
    pub replied:        bool,
    pub meeting_booked: bool,
}

impl ExperimentResult {
    /// Funnel monotonicity check.
    pub fn is_monotonic(&self) -> bool {
        (!self.opened || self.sent)
            && (!self.replied || self.opened)
            && (!self.meeting_booked || self.replied)
    }
}

/// Convenience container binding the two hypotheses, the enriched lead
/// set and the accumulated artifacts of one finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experiment {
    pub name:      RunId,
    pub variant_a: Hypothesis,
    pub variant_b: Hypothesis,
    pub leads:     Vec<Lead>,
    pub messages:  Vec<Message>,
    pub results:   Vec<ExperimentResult>,
}
