//! Enrichment stage — trigger research and persona profiling.
//!
//! Contract: enrich() always returns a lead with populated triggers and
//! persona profile. A generation failure is caught here and resolved to
//! mock triggers; it never reaches the caller.

use crate::generation::TextGenerator;
use crate::model::Lead;
use crate::rng::StageRng;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Generic trigger phrases used in fallback/simulation mode.
pub const MOCK_TRIGGERS: [&str; 5] = [
    "Recently raised Series B funding",
    "Hiring for Head of Sales",
    "expanding into APAC region",
    "Released new API documentation",
    "Featured in TechCrunch top startups",
];

pub struct Researcher {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl Researcher {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    /// Research a lead to find trigger events and attach a persona
    /// profile. In a real deployment this would use web search tools;
    /// here it asks the generation backend or samples the mock pool.
    pub fn enrich(&self, mut lead: Lead, rng: &mut StageRng) -> Lead {
        lead.triggers = match &self.generator {
            Some(generator) => match request_triggers(generator.as_ref(), &lead) {
                Ok(triggers) if !triggers.is_empty() => triggers,
                Ok(_) => {
                    log::warn!("trigger research for {} returned nothing usable", lead.company);
                    sample_mock_triggers(rng)
                }
                Err(e) => {
                    log::warn!("trigger research failed for {}: {e:#}", lead.company);
                    sample_mock_triggers(rng)
                }
            },
            None => sample_mock_triggers(rng),
        };

        // Static profile for now. A real inference step can replace this
        // without changing the enrich() contract.
        lead.persona_profile = default_persona_profile();

        log::debug!("enriched {} with triggers {:?}", lead.name, lead.triggers);
        lead
    }
}

fn request_triggers(generator: &dyn TextGenerator, lead: &Lead) -> anyhow::Result<Vec<String>> {
    let prompt = format!(
        "You are an expert lead researcher. For the company {} and title {}, \
         generate 3 plausible 'trigger events' that would make them a good \
         prospect for B2B SaaS. Return them as a comma-separated list.",
        lead.company, lead.title
    );
    let raw = generator.generate_text(&prompt)?;
    Ok(raw
        .split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect())
}

/// Sample 2 distinct phrases from the mock pool, without replacement.
fn sample_mock_triggers(rng: &mut StageRng) -> Vec<String> {
    let pool_size = MOCK_TRIGGERS.len() as u64;
    let first = rng.next_u64_below(pool_size) as usize;
    let offset = 1 + rng.next_u64_below(pool_size - 1) as usize;
    let second = (first + offset) % MOCK_TRIGGERS.len();
    vec![
        MOCK_TRIGGERS[first].to_string(),
        MOCK_TRIGGERS[second].to_string(),
    ]
}

fn default_persona_profile() -> BTreeMap<String, Vec<String>> {
    let mut profile = BTreeMap::new();
    profile.insert(
        "pain_points".to_string(),
        vec![
            "Manual data entry".to_string(),
            "Low conversion rates".to_string(),
            "Lack of visibility".to_string(),
        ],
    );
    profile.insert(
        "goals".to_string(),
        vec![
            "Increase pipeline".to_string(),
            "Automate outreach".to_string(),
            "Improve ROI".to_string(),
        ],
    );
    profile.insert(
        "kpis".to_string(),
        vec![
            "Meeting booked rate".to_string(),
            "CAC".to_string(),
            "LTV".to_string(),
        ],
    );
    profile
}
