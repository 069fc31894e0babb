//! Funnel simulator — the stochastic engine behind every outcome.
//!
//! Two phases per lead:
//!   1. A deterministic probability model: base rates adjusted by a
//!      trigger-relevance bonus and a persona/variant-fit bonus, each
//!      stage clamped to an explicit ceiling.
//!   2. A staged Monte Carlo draw, strictly sequential and
//!      short-circuiting — a prospect who never opens consumes no reply
//!      draw, so a full call costs exactly 1–3 uniform draws.
//!
//! The simulator is a pure function of its inputs plus the injected RNG;
//! no state is carried between calls.

use crate::config::{ExperimentConfig, FitRule, FunnelRatesConfig};
use crate::model::{ExperimentResult, Hypothesis, Lead, Message};
use crate::rng::StageRng;

/// The adjusted per-stage probabilities for one lead/message/hypothesis
/// triple, with the bonus components kept visible for analysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FunnelProbabilities {
    pub trigger_bonus: f64,
    pub variant_bonus: f64,
    pub p_open: f64,
    pub p_reply: f64,
    pub p_meeting: f64,
}

pub struct FunnelSimulator {
    rates: FunnelRatesConfig,
    /// Fit rules with keywords pre-lowercased. Order preserved from the
    /// config: first match wins.
    fit_rules: Vec<FitRule>,
}

impl FunnelSimulator {
    pub fn new(config: &ExperimentConfig) -> Self {
        let fit_rules = config
            .fit_rules
            .iter()
            .map(|rule| FitRule {
                title_keyword: rule.title_keyword.to_lowercase(),
                description_keyword: rule.description_keyword.to_lowercase(),
                bonus: rule.bonus,
            })
            .collect();
        Self {
            rates: config.funnel.clone(),
            fit_rules,
        }
    }

    /// The deterministic half: compute adjusted probabilities without
    /// consuming any randomness.
    pub fn probabilities(
        &self,
        lead: &Lead,
        message: &Message,
        hypothesis: &Hypothesis,
    ) -> FunnelProbabilities {
        let rates = &self.rates;

        // Relevance: reward literal trigger mentions in the message body.
        // Substring match, not semantic similarity.
        let content = message.content.to_lowercase();
        let mut trigger_bonus = 0.0;
        for trigger in &lead.triggers {
            if content.contains(&trigger.to_lowercase()) {
                trigger_bonus += rates.trigger_mention_bonus;
            }
        }

        // Persona fit: first matching title/description keyword pair wins.
        let title = lead.title.to_lowercase();
        let description = hypothesis.description.to_lowercase();
        let variant_bonus = self
            .fit_rules
            .iter()
            .find(|rule| {
                title.contains(&rule.title_keyword)
                    && description.contains(&rule.description_keyword)
            })
            .map(|rule| rule.bonus)
            .unwrap_or(0.0);

        FunnelProbabilities {
            trigger_bonus,
            variant_bonus,
            p_open: (rates.base_open + trigger_bonus * rates.trigger_open_weight)
                .min(rates.open_ceiling),
            p_reply: (rates.base_reply + trigger_bonus + variant_bonus)
                .min(rates.reply_ceiling),
            p_meeting: (rates.base_meeting + variant_bonus * rates.variant_meeting_weight)
                .min(rates.meeting_ceiling),
        }
    }

    /// Simulate the outcome of sending one message to one lead.
    ///
    /// State machine: Sent → {Opened, NotOpened}; Opened → {Replied,
    /// NotReplied}; Replied → {Meeting, NoMeeting}. Draws short-circuit:
    /// no reply draw without an open, no meeting draw without a reply.
    pub fn simulate(
        &self,
        lead: &Lead,
        message: &Message,
        hypothesis: &Hypothesis,
        rng: &mut StageRng,
    ) -> ExperimentResult {
        let p = self.probabilities(lead, message, hypothesis);

        let opened = rng.chance(p.p_open);
        let replied = opened && rng.chance(p.p_reply);
        let meeting_booked = replied && rng.chance(p.p_meeting);

        ExperimentResult {
            lead_id: lead.name.clone(),
            variant_chosen: message.variant_type,
            sent: true,
            opened,
            replied,
            meeting_booked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VariantLabel;
    use crate::rng::{RngBank, StageSlot};

    fn simulator() -> FunnelSimulator {
        FunnelSimulator::new(&ExperimentConfig::default())
    }

    fn lead_with(title: &str, triggers: &[&str]) -> Lead {
        let mut lead = Lead::new("Test User", title, "TestCorp");
        lead.triggers = triggers.iter().map(|t| t.to_string()).collect();
        lead
    }

    fn message_with(content: &str) -> Message {
        Message {
            content: content.to_string(),
            subject_line: "s".to_string(),
            variant_type: VariantLabel::A,
            reasoning: "r".to_string(),
            lead_id: "Test User".to_string(),
        }
    }

    fn hypothesis_with(description: &str) -> Hypothesis {
        Hypothesis::new("Hypothesis A", description, VariantLabel::A)
    }

    #[test]
    fn trigger_mention_is_case_insensitive_and_literal() {
        let p = simulator().probabilities(
            &lead_with("Head of Ops", &["raised Series B"]),
            &message_with("Noticed you RAISED SERIES B last month — congrats."),
            &hypothesis_with("no keyword cues here"),
        );
        assert!((p.trigger_bonus - 0.15).abs() < 1e-12);
        assert!((p.p_open - 0.475).abs() < 1e-12);
        assert!((p.p_reply - 0.20).abs() < 1e-12);

        // Paraphrased mention earns nothing — the model rewards literal
        // substrings only.
        let p = simulator().probabilities(
            &lead_with("Head of Ops", &["raised Series B"]),
            &message_with("Congrats on the new funding round."),
            &hypothesis_with("no keyword cues here"),
        );
        assert_eq!(p.trigger_bonus, 0.0);
    }

    #[test]
    fn sales_roi_pairing_adjusts_meeting_probability() {
        let p = simulator().probabilities(
            &lead_with("VP Sales", &[]),
            &message_with("hello"),
            &hypothesis_with("Focus on ROI and efficiency gains."),
        );
        assert!((p.variant_bonus - 0.10).abs() < 1e-12);
        assert!((p.p_meeting - 0.065).abs() < 1e-12);
    }

    #[test]
    fn engineer_technical_pairing_gets_the_larger_bonus() {
        let p = simulator().probabilities(
            &lead_with("Staff Engineer", &[]),
            &message_with("hello"),
            &hypothesis_with("Deep technical integration story."),
        );
        assert!((p.variant_bonus - 0.15).abs() < 1e-12);
    }

    #[test]
    fn fit_rules_are_exclusive_first_match_wins() {
        // Title matches both the sales and founder rules, description
        // matches both keyword sets — only the first rule applies.
        let p = simulator().probabilities(
            &lead_with("Founder & Head of Sales", &[]),
            &message_with("hello"),
            &hypothesis_with("ROI through social proof."),
        );
        assert!((p.variant_bonus - 0.10).abs() < 1e-12);
    }

    #[test]
    fn probabilities_never_exceed_ceilings() {
        let triggers: Vec<String> = (0..10).map(|i| format!("trigger {i}")).collect();
        let trigger_refs: Vec<&str> = triggers.iter().map(String::as_str).collect();
        let content = triggers.join(" and ");

        let p = simulator().probabilities(
            &lead_with("VP Sales", &trigger_refs),
            &message_with(&content),
            &hypothesis_with("Focus on ROI."),
        );
        // 10 mentions → bonus 1.5, far past both ceilings.
        assert!((p.p_open - 0.90).abs() < 1e-12);
        assert!((p.p_reply - 0.40).abs() < 1e-12);

        // A config with an outsized fit bonus must still respect the
        // meeting ceiling.
        let mut config = ExperimentConfig::default();
        config.fit_rules.insert(
            0,
            FitRule {
                title_keyword: "sales".to_string(),
                description_keyword: "roi".to_string(),
                bonus: 0.50,
            },
        );
        let p = FunnelSimulator::new(&config).probabilities(
            &lead_with("VP Sales", &[]),
            &message_with("hello"),
            &hypothesis_with("Focus on ROI."),
        );
        assert!((p.p_meeting - 0.20).abs() < 1e-12);
    }

    #[test]
    fn floors_hold_when_nothing_matches() {
        let p = simulator().probabilities(
            &lead_with("Head of Ops", &["unmentioned trigger"]),
            &message_with("hello"),
            &hypothesis_with("nothing relevant"),
        );
        assert!((p.p_open - 0.40).abs() < 1e-12);
        assert!((p.p_reply - 0.05).abs() < 1e-12);
        assert!((p.p_meeting - 0.015).abs() < 1e-12);
    }

    #[test]
    fn draw_budget_is_one_to_three_and_short_circuits() {
        let simulator = simulator();
        let lead = lead_with("VP Sales", &["raised Series B"]);
        let message = message_with("you raised series b");
        let hypothesis = hypothesis_with("Focus on ROI.");

        let mut rng = RngBank::new(0xDEAD_BEEF).for_stage(StageSlot::Funnel);
        for _ in 0..500 {
            let before = rng.draw_count();
            let result = simulator.simulate(&lead, &message, &hypothesis, &mut rng);
            let consumed = rng.draw_count() - before;

            let expected = 1 + u64::from(result.opened) + u64::from(result.replied);
            assert_eq!(consumed, expected, "draws must track funnel depth");
            assert!((1..=3).contains(&consumed));
            assert!(result.is_monotonic());
            assert!(result.sent);
        }
    }

    #[test]
    fn same_seed_reproduces_identical_outcomes() {
        let simulator = simulator();
        let lead = lead_with("VP Sales", &["raised Series B"]);
        let message = message_with("you raised series b");
        let hypothesis = hypothesis_with("Focus on ROI.");

        let run = |seed: u64| -> Vec<ExperimentResult> {
            let mut rng = RngBank::new(seed).for_stage(StageSlot::Funnel);
            (0..50)
                .map(|_| simulator.simulate(&lead, &message, &hypothesis, &mut rng))
                .collect()
        };

        assert_eq!(run(12345), run(12345));
    }
}
