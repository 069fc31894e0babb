//! Deterministic synthetic lead generation using curated lists.
//!
//! All generation is deterministic (same RNG seed = same leads). Lead
//! names are the join key of a run, so the generator de-duplicates.

use crate::model::Lead;
use crate::rng::StageRng;
use std::collections::HashSet;

pub struct LeadGenerator;

impl LeadGenerator {
    /// The fixed demo batch used for quick experiments.
    pub fn sample_batch() -> Vec<Lead> {
        vec![
            Lead::new("Alice Chen", "VP Sales", "TechFlow"),
            Lead::new("Bob Smith", "Founder", "DataSync"),
            Lead::new("Charlie Davis", "Head of Ops", "LogiChain"),
            Lead::new("Diana Prince", "CTO", "SecureNet"),
            Lead::new("Evan Wright", "Director of Growth", "ScaleUp"),
        ]
    }

    /// Generate `count` synthetic leads deterministically.
    pub fn generate(count: usize, rng: &mut StageRng) -> Vec<Lead> {
        let mut used_names = HashSet::new();
        let mut leads = Vec::with_capacity(count);

        for index in 0..count {
            let mut name = Self::generate_name(rng);
            if !used_names.insert(name.clone()) {
                // Collision on the join key — qualify with the index.
                name = format!("{name} {}", index + 1);
                used_names.insert(name.clone());
            }
            let title = Self::pick(rng, Self::titles());
            let company = Self::generate_company(rng);
            leads.push(Lead::new(&name, title, &company));
        }

        leads
    }

    fn generate_name(rng: &mut StageRng) -> String {
        format!(
            "{} {}",
            Self::pick(rng, Self::first_names()),
            Self::pick(rng, Self::last_names())
        )
    }

    fn generate_company(rng: &mut StageRng) -> String {
        format!(
            "{}{}",
            Self::pick(rng, Self::company_stems()),
            Self::pick(rng, Self::company_ends())
        )
    }

    fn pick<'a>(rng: &mut StageRng, list: &'a [&'a str]) -> &'a str {
        list[rng.next_u64_below(list.len() as u64) as usize]
    }

    fn first_names() -> &'static [&'static str] {
        &[
            "James", "Mary", "Robert", "Patricia", "Michael", "Jennifer", "David", "Linda",
            "William", "Elizabeth", "Richard", "Susan", "Joseph", "Jessica", "Thomas", "Sarah",
            "Daniel", "Karen", "Matthew", "Lisa", "Anthony", "Nancy", "Mark", "Sandra",
            "Steven", "Ashley", "Andrew", "Emily", "Joshua", "Michelle", "Kevin", "Amanda",
            "Brian", "Melissa", "Kenneth", "Stephanie", "Aisha", "Priya", "Wei", "Sofia",
            "Mateo", "Yuki", "Omar", "Ingrid", "Ravi", "Elena", "Tariq", "Mei",
        ]
    }

    fn last_names() -> &'static [&'static str] {
        &[
            "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis",
            "Rodriguez", "Martinez", "Wilson", "Anderson", "Taylor", "Thomas", "Moore",
            "Jackson", "Martin", "Lee", "Perez", "Thompson", "White", "Harris", "Sanchez",
            "Clark", "Lewis", "Robinson", "Walker", "Young", "Allen", "King", "Wright",
            "Nguyen", "Hill", "Green", "Adams", "Nelson", "Baker", "Chen", "Patel",
            "Kim", "Singh", "Kumar", "Ali", "Silva", "Costa", "Tanaka", "Okafor", "Novak",
        ]
    }

    fn titles() -> &'static [&'static str] {
        &[
            "VP Sales",
            "Founder",
            "Co-Founder",
            "CTO",
            "COO",
            "Head of Ops",
            "Director of Growth",
            "VP Marketing",
            "Chief Revenue Officer",
            "Head of Partnerships",
            "Engineering Manager",
            "Principal Engineer",
            "Senior Software Engineer",
            "Head of Demand Gen",
            "VP Customer Success",
            "Product Lead",
        ]
    }

    fn company_stems() -> &'static [&'static str] {
        &[
            "Tech", "Data", "Cloud", "Scale", "Logi", "Secure", "Pipe", "Launch", "Grid",
            "Signal", "Vertex", "Atlas", "Nimbus", "Quant", "Forge", "Spark", "Orbit", "Pulse",
        ]
    }

    fn company_ends() -> &'static [&'static str] {
        &[
            "Flow", "Sync", "Chain", "Net", "Up", "Stack", "Base", "Labs", "Works", "Metrics",
            "Desk", "Loop", "Gen", "Ware", "Path",
        ]
    }
}
