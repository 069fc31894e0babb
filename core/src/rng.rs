//! Deterministic random number generation.
//!
//! RULE: Nothing in the pipeline may call any platform RNG.
//! All randomness flows through StageRng instances derived from the
//! single master seed recorded on the run.
//!
//! Each pipeline stage gets its own RNG stream, seeded deterministically
//! from (master_seed XOR stage_index). This means:
//!   - Adding a new stage never changes existing stages' streams.
//!   - Each stage's stream is fully reproducible in isolation.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

/// A named, deterministic RNG for a single pipeline stage.
///
/// Tracks how many uniform [0, 1) draws have been consumed so tests can
/// assert the funnel's draw budget (fewer draws as a prospect drops out
/// earlier in the funnel).
#[derive(Clone)]
pub struct StageRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
    draws: u64,
}

impl StageRng {
    /// Create a stage RNG from the master seed and a stable stage index.
    /// The index must never change once assigned.
    pub fn new(master_seed: u64, stage_index: u64) -> Self {
        let derived_seed = master_seed ^ (stage_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
            draws: 0,
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0). Counted against the draw budget.
    pub fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        self.draws += 1;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Draw a raw u64 (full range). Not counted as a uniform draw.
    pub fn next_u64(&mut self) -> u64 {
        use rand::RngCore;
        self.inner.next_u64()
    }

    /// Roll a u64 in [0, n). Not counted as a uniform draw.
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        use rand::RngCore;
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Total uniform [0, 1) draws consumed so far.
    pub fn draw_count(&self) -> u64 {
        self.draws
    }
}

/// All stage RNGs for a single run, indexed by stable slot.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn for_stage(&self, slot: StageSlot) -> StageRng {
        StageRng::new(self.master_seed, slot as u64).with_name(slot.name())
    }
}

/// Stable stage slot assignments.
/// NEVER reorder or remove entries — only append.
/// Reordering changes every stage's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum StageSlot {
    Research = 0,
    Funnel = 1,
    LeadGen = 2,
    // Add new stages here — append only.
}

impl StageSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Research => "research",
            Self::Funnel => "funnel",
            Self::LeadGen => "leadgen",
        }
    }
}
