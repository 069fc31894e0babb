//! Aggregation over a finished run's results.
//!
//! Rates are raw means per variant group — no significance testing.
//! The winner is the arg-max on meeting rate; ties go to whichever
//! label sorts first (A before B).

use crate::model::{ExperimentResult, VariantLabel};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct VariantSummary {
    pub variant:  VariantLabel,
    pub sent:     usize,
    pub opened:   usize,
    pub replied:  usize,
    pub meetings: usize,
    pub open_rate:    f64,
    pub reply_rate:   f64,
    pub meeting_rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunnelReport {
    pub total_sent:     usize,
    pub total_opened:   usize,
    pub total_replied:  usize,
    pub total_meetings: usize,
    /// Per-variant summaries in label sort order.
    pub variants: Vec<VariantSummary>,
    pub winner: Option<VariantLabel>,
}

impl FunnelReport {
    pub fn from_results(results: &[ExperimentResult]) -> Self {
        let mut groups: BTreeMap<VariantLabel, Vec<&ExperimentResult>> = BTreeMap::new();
        for result in results {
            groups.entry(result.variant_chosen).or_default().push(result);
        }

        let variants: Vec<VariantSummary> = groups
            .into_iter()
            .map(|(variant, group)| {
                let sent = group.len();
                let opened = group.iter().filter(|r| r.opened).count();
                let replied = group.iter().filter(|r| r.replied).count();
                let meetings = group.iter().filter(|r| r.meeting_booked).count();
                VariantSummary {
                    variant,
                    sent,
                    opened,
                    replied,
                    meetings,
                    open_rate: opened as f64 / sent as f64,
                    reply_rate: replied as f64 / sent as f64,
                    meeting_rate: meetings as f64 / sent as f64,
                }
            })
            .collect();

        // Arg-max over meeting rate. Iterating in label order and
        // requiring a strict improvement gives the documented tie-break.
        let mut winner: Option<VariantLabel> = None;
        let mut best_rate = f64::NEG_INFINITY;
        for summary in &variants {
            if summary.meeting_rate > best_rate {
                best_rate = summary.meeting_rate;
                winner = Some(summary.variant);
            }
        }

        Self {
            total_sent: results.len(),
            total_opened: results.iter().filter(|r| r.opened).count(),
            total_replied: results.iter().filter(|r| r.replied).count(),
            total_meetings: results.iter().filter(|r| r.meeting_booked).count(),
            variants,
            winner,
        }
    }
}
