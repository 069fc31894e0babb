//! The experiment engine — wires the stages into one run.
//!
//! PIPELINE ORDER (fixed, documented, never reordered):
//!   1. Validate the whole batch (fail fast on bad input).
//!   2. Per lead, strictly sequential: enrich → assign variant →
//!      draft message → simulate funnel outcome.
//!   3. Aggregate and declare the winner.
//!
//! RULES:
//!   - Variant assignment alternates deterministically: even index → A,
//!     odd index → B. Only funnel outcomes are stochastic.
//!   - All randomness flows through the RngBank.
//!   - Every pipeline step is recorded in the event log.
//!   - A generation failure degrades one lead's output; the batch
//!     always completes.

use crate::config::ExperimentConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::event::{EventLogEntry, ExperimentEvent};
use crate::generation::TextGenerator;
use crate::model::{Experiment, Hypothesis, Lead, VariantLabel};
use crate::report::FunnelReport;
use crate::researcher::Researcher;
use crate::rng::{RngBank, StageSlot};
use crate::simulator::FunnelSimulator;
use crate::store::ExperimentStore;
use crate::strategist::Strategist;
use crate::types::RunId;
use std::collections::HashSet;
use std::sync::Arc;

pub struct ExperimentEngine {
    run_id: RunId,
    seed: u64,
    researcher: Researcher,
    strategist: Strategist,
    simulator: FunnelSimulator,
    rng_bank: RngBank,
    store: ExperimentStore,
    seq: u64,
}

impl ExperimentEngine {
    pub fn new(
        run_id: RunId,
        seed: u64,
        config: &ExperimentConfig,
        generator: Option<Arc<dyn TextGenerator>>,
        store: ExperimentStore,
    ) -> Self {
        Self {
            researcher: Researcher::new(generator.clone()),
            strategist: Strategist::new(generator),
            simulator: FunnelSimulator::new(config),
            rng_bank: RngBank::new(seed),
            store,
            seq: 0,
            run_id,
            seed,
        }
    }

    /// Build a fully wired engine on an in-memory store, in fallback
    /// generation mode. Used by tests.
    pub fn build_test(run_id: RunId, seed: u64) -> PipelineResult<Self> {
        let store = ExperimentStore::in_memory()?;
        store.migrate()?;
        store.insert_run(&run_id, seed, "0.1.0-test")?;
        Ok(Self::new(
            run_id,
            seed,
            &ExperimentConfig::default(),
            None,
            store,
        ))
    }

    /// The i-th lead of a batch (0-indexed) always lands on this arm.
    /// Reproducibility of the split is a design requirement.
    pub fn variant_for_index(index: usize) -> VariantLabel {
        if index % 2 == 0 {
            VariantLabel::A
        } else {
            VariantLabel::B
        }
    }

    /// Run one experiment batch to completion and return the finished
    /// aggregate. Everything is persisted under this engine's run id.
    pub fn run(
        &mut self,
        leads: Vec<Lead>,
        variant_a_desc: &str,
        variant_b_desc: &str,
    ) -> PipelineResult<Experiment> {
        let mut seen = HashSet::new();
        for lead in &leads {
            lead.validate()?;
            if !seen.insert(lead.name.clone()) {
                return Err(PipelineError::DuplicateLead {
                    name: lead.name.clone(),
                });
            }
        }

        let hypothesis_a = Hypothesis::new("Hypothesis A", variant_a_desc, VariantLabel::A);
        let hypothesis_b = Hypothesis::new("Hypothesis B", variant_b_desc, VariantLabel::B);

        self.emit(
            "engine",
            ExperimentEvent::RunStarted {
                run_id: self.run_id.clone(),
                seed: self.seed,
                lead_count: leads.len(),
            },
        )?;

        let mut research_rng = self.rng_bank.for_stage(StageSlot::Research);
        let mut funnel_rng = self.rng_bank.for_stage(StageSlot::Funnel);

        let mut enriched = Vec::with_capacity(leads.len());
        let mut messages = Vec::with_capacity(leads.len());
        let mut results = Vec::with_capacity(leads.len());

        for (index, lead) in leads.into_iter().enumerate() {
            let variant = Self::variant_for_index(index);
            let hypothesis = match variant {
                VariantLabel::A => &hypothesis_a,
                _ => &hypothesis_b,
            };

            log::info!("researching {} ({})", lead.company, lead.name);
            let lead = self.researcher.enrich(lead, &mut research_rng);
            self.store.insert_lead(&self.run_id, &lead)?;
            self.emit(
                "researcher",
                ExperimentEvent::LeadEnriched {
                    lead_id: lead.name.clone(),
                    triggers: lead.triggers.clone(),
                },
            )?;

            self.emit(
                "engine",
                ExperimentEvent::VariantAssigned {
                    lead_id: lead.name.clone(),
                    variant,
                },
            )?;

            log::info!("drafting message for {} under variant {variant}", lead.name);
            let message = self.strategist.draft(&lead, hypothesis, variant);
            self.store.insert_message(&self.run_id, &message)?;
            self.emit(
                "strategist",
                ExperimentEvent::MessageDrafted {
                    lead_id: lead.name.clone(),
                    variant,
                    subject_line: message.subject_line.clone(),
                },
            )?;

            let result = self
                .simulator
                .simulate(&lead, &message, hypothesis, &mut funnel_rng);
            self.store.insert_result(&self.run_id, &result)?;
            self.emit(
                "simulator",
                ExperimentEvent::OutcomeSimulated {
                    lead_id: result.lead_id.clone(),
                    variant: result.variant_chosen,
                    opened: result.opened,
                    replied: result.replied,
                    meeting_booked: result.meeting_booked,
                },
            )?;

            enriched.push(lead);
            messages.push(message);
            results.push(result);
        }

        let report = FunnelReport::from_results(&results);
        self.emit(
            "engine",
            ExperimentEvent::RunCompleted {
                run_id: self.run_id.clone(),
                winner: report.winner,
            },
        )?;
        log::info!(
            "run {} complete: {} leads, winner {:?}",
            self.run_id,
            results.len(),
            report.winner
        );

        Ok(Experiment {
            name: self.run_id.clone(),
            variant_a: hypothesis_a,
            variant_b: hypothesis_b,
            leads: enriched,
            messages,
            results,
        })
    }

    /// Query the persisted event log. Used by the determinism test and
    /// replay tooling.
    pub fn store_events(&self) -> PipelineResult<Vec<EventLogEntry>> {
        self.store.events_for_run(&self.run_id)
    }

    pub fn store(&self) -> &ExperimentStore {
        &self.store
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    fn emit(&mut self, stage: &str, event: ExperimentEvent) -> PipelineResult<()> {
        self.seq += 1;
        let entry = EventLogEntry {
            id: None,
            run_id: self.run_id.clone(),
            seq: self.seq,
            stage: stage.to_string(),
            event_type: event.type_name().to_string(),
            payload: serde_json::to_string(&event)?,
        };
        self.store.append_event(&entry)
    }
}
