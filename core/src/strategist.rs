//! Message-generation stage — turns an enriched lead plus a hypothesis
//! into a subject/body/reasoning triple.
//!
//! Three paths, in degradation order:
//!   1. Backend reply parses as structured JSON → use its fields.
//!   2. Backend replies but the parse fails → raw text becomes the body.
//!   3. Backend call fails, or no backend configured → fixed templates.
//! A failure is caught here and never reaches the caller.

use crate::generation::{parse_reply, GeneratedReply, TextGenerator};
use crate::model::{Hypothesis, Lead, Message, VariantLabel};
use std::sync::Arc;

pub struct Strategist {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl Strategist {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    /// Draft the outreach message for one lead under one hypothesis.
    ///
    /// The returned message's variant_type always echoes the `variant`
    /// argument — the hypothesis may carry a different label; keeping
    /// the two coupled is the orchestration's responsibility.
    pub fn draft(&self, lead: &Lead, hypothesis: &Hypothesis, variant: VariantLabel) -> Message {
        let (content, subject_line, reasoning) = match &self.generator {
            Some(generator) => {
                match generator.generate_text(&build_prompt(lead, hypothesis, variant)) {
                    Ok(raw) => extract_fields(&raw, lead),
                    Err(e) => {
                        log::warn!("message generation failed for {}: {e:#}", lead.name);
                        fallback_fields(lead, hypothesis)
                    }
                }
            }
            None => template_fields(lead, hypothesis),
        };

        Message {
            content,
            subject_line,
            variant_type: variant,
            reasoning,
            lead_id: lead.name.clone(),
        }
    }
}

fn build_prompt(lead: &Lead, hypothesis: &Hypothesis, variant: VariantLabel) -> String {
    format!(
        "You are a world-class growth strategist. Write a cold email to {name}, \
         {title} at {company}.\n\
         Context: they recently experienced these triggers: {triggers}.\n\
         Hypothesis to test: {hypothesis_desc}\n\
         Goal: book a meeting.\n\
         Style: variant {variant}.\n\
         Keep it under 150 words. Return JSON with 'subject', 'body', and 'reasoning'.",
        name = lead.name,
        title = lead.title,
        company = lead.company,
        triggers = lead.triggers.join(", "),
        hypothesis_desc = hypothesis.description,
        variant = variant,
    )
}

/// Map a backend reply onto (content, subject, reasoning), defaulting
/// whatever the reply didn't provide.
fn extract_fields(raw: &str, lead: &Lead) -> (String, String, String) {
    match parse_reply(raw) {
        GeneratedReply::Structured {
            subject,
            body,
            reasoning,
        } => (
            body.unwrap_or_else(|| raw.to_string()),
            subject.unwrap_or_else(|| "Quick question".to_string()),
            reasoning.unwrap_or_else(|| "Aligned with hypothesis".to_string()),
        ),
        GeneratedReply::PlainText { content } => (
            content,
            format!("Question for {}", lead.name),
            "Generated from an unstructured model reply".to_string(),
        ),
    }
}

/// Used when the backend call itself failed.
fn fallback_fields(lead: &Lead, hypothesis: &Hypothesis) -> (String, String, String) {
    let trigger = lead
        .triggers
        .first()
        .map(String::as_str)
        .unwrap_or("your recent momentum");
    (
        format!(
            "Hi {}, spotted your news about {}. Thought it ties straight into {}.",
            lead.name, trigger, hypothesis.name
        ),
        "Connect?".to_string(),
        "Fallback template: generation call failed".to_string(),
    )
}

/// Used when no backend is configured at all. Fully deterministic.
fn template_fields(lead: &Lead, hypothesis: &Hypothesis) -> (String, String, String) {
    let trigger = lead
        .triggers
        .first()
        .map(String::as_str)
        .unwrap_or("growing");
    (
        format!(
            "Hi {},\n\nSaw that {} is {}. Our solution fits your need for {}.",
            lead.name, lead.company, trigger, hypothesis.name
        ),
        format!("Idea for {}", lead.company),
        "Simulated output based on fixed templates".to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedGenerator(&'static str);
    impl TextGenerator for ScriptedGenerator {
        fn generate_text(&self, _prompt: &str) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingGenerator;
    impl TextGenerator for FailingGenerator {
        fn generate_text(&self, _prompt: &str) -> anyhow::Result<String> {
            anyhow::bail!("backend unreachable")
        }
    }

    fn sample_lead() -> Lead {
        let mut lead = Lead::new("Alice Chen", "VP Sales", "TechFlow");
        lead.triggers = vec!["raised Series B".to_string(), "hiring SDRs".to_string()];
        lead
    }

    fn roi_hypothesis() -> Hypothesis {
        Hypothesis::new(
            "Hypothesis A",
            "Focus on ROI and efficiency gains.",
            VariantLabel::A,
        )
    }

    #[test]
    fn template_mode_references_lead_and_marks_simulated_origin() {
        let strategist = Strategist::new(None);
        let message = strategist.draft(&sample_lead(), &roi_hypothesis(), VariantLabel::A);

        assert!(!message.content.is_empty());
        assert!(message.content.contains("Alice Chen"));
        assert!(message.content.contains("TechFlow"));
        assert!(message.content.contains("raised Series B"));
        assert_eq!(message.subject_line, "Idea for TechFlow");
        assert!(message.reasoning.contains("Simulated"));
        assert_eq!(message.variant_type, VariantLabel::A);
        assert_eq!(message.lead_id, "Alice Chen");
    }

    #[test]
    fn template_mode_without_triggers_says_growing() {
        let strategist = Strategist::new(None);
        let message = strategist.draft(
            &Lead::new("Bob Smith", "Founder", "DataSync"),
            &roi_hypothesis(),
            VariantLabel::B,
        );
        assert!(message.content.contains("growing"));
    }

    #[test]
    fn structured_reply_fields_are_used() {
        let strategist = Strategist::new(Some(Arc::new(ScriptedGenerator(
            r#"{"subject": "Series B momentum", "body": "Hi Alice — congrats.", "reasoning": "trigger-led opener"}"#,
        ))));
        let message = strategist.draft(&sample_lead(), &roi_hypothesis(), VariantLabel::A);

        assert_eq!(message.subject_line, "Series B momentum");
        assert_eq!(message.content, "Hi Alice — congrats.");
        assert_eq!(message.reasoning, "trigger-led opener");
    }

    #[test]
    fn structured_reply_missing_body_keeps_raw_text() {
        let raw = r#"{"subject": "Series B momentum"}"#;
        let strategist = Strategist::new(Some(Arc::new(ScriptedGenerator(raw))));
        let message = strategist.draft(&sample_lead(), &roi_hypothesis(), VariantLabel::A);

        assert_eq!(message.content, raw);
        assert_eq!(message.subject_line, "Series B momentum");
        assert_eq!(message.reasoning, "Aligned with hypothesis");
    }

    #[test]
    fn prose_reply_becomes_content_with_generic_subject() {
        let strategist = Strategist::new(Some(Arc::new(ScriptedGenerator(
            "Hi Alice, loved the Series B news!",
        ))));
        let message = strategist.draft(&sample_lead(), &roi_hypothesis(), VariantLabel::A);

        assert_eq!(message.content, "Hi Alice, loved the Series B news!");
        assert_eq!(message.subject_line, "Question for Alice Chen");
    }

    #[test]
    fn failed_call_uses_fallback_template() {
        let strategist = Strategist::new(Some(Arc::new(FailingGenerator)));
        let message = strategist.draft(&sample_lead(), &roi_hypothesis(), VariantLabel::A);

        assert_eq!(message.subject_line, "Connect?");
        assert!(message.content.contains("raised Series B"));
        assert!(message.reasoning.contains("Fallback"));
    }

    #[test]
    fn variant_type_echoes_the_argument_not_the_hypothesis() {
        let strategist = Strategist::new(None);
        let hypothesis = Hypothesis::new("Hypothesis B", "social proof", VariantLabel::B);
        let message = strategist.draft(&sample_lead(), &hypothesis, VariantLabel::A);
        assert_eq!(message.variant_type, VariantLabel::A);
    }
}
