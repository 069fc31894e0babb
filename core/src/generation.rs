//! The pluggable text-generation capability.
//!
//! Both pipeline stages that phrase text (researcher, strategist) are
//! polymorphic over this one trait. The capability is selected once at
//! construction time — either a real backend or absent, in which case
//! every stage runs its deterministic fallback. Core code never reads
//! environment variables; key handling belongs to the binary.

use crate::config::GenerationConfig;
use serde::Deserialize;
use std::time::Duration;

/// A text-generation backend. Treat every call as fallible and
/// latency-bearing; pipeline correctness never depends on it.
pub trait TextGenerator: Send + Sync {
    fn generate_text(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Blocking HTTP client for an Anthropic-style messages endpoint.
pub struct ApiTextGenerator {
    client: reqwest::blocking::Client,
    config: GenerationConfig,
    api_key: String,
}

impl ApiTextGenerator {
    pub fn new(config: GenerationConfig, api_key: String) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            config,
            api_key,
        })
    }
}

impl TextGenerator for ApiTextGenerator {
    fn generate_text(&self, prompt: &str) -> anyhow::Result<String> {
        let request_body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": [
                {
                    "role": "user",
                    "content": prompt
                }
            ]
        });

        let response = self
            .client
            .post(&self.config.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request_body)
            .send()?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            anyhow::bail!("generation API returned {status}: {error_text}");
        }

        let response_json: serde_json::Value = response.json()?;
        let text = response_json["content"][0]["text"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("generation response had no text content"))?;

        Ok(text.to_string())
    }
}

/// Outcome of the best-effort structured parse of a model reply.
///
/// Backends are not trusted to return well-formed JSON. A reply either
/// parses into the requested fields or is carried whole as plain text —
/// the caller decides what to default for anything missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedReply {
    Structured {
        subject: Option<String>,
        body: Option<String>,
        reasoning: Option<String>,
    },
    PlainText {
        content: String,
    },
}

/// Attempt the structured parse, else treat the reply as plain text.
/// Never fails.
pub fn parse_reply(raw: &str) -> GeneratedReply {
    #[derive(Deserialize)]
    struct RawReply {
        subject: Option<String>,
        body: Option<String>,
        reasoning: Option<String>,
    }

    match serde_json::from_str::<RawReply>(raw.trim()) {
        Ok(reply) => GeneratedReply::Structured {
            subject: reply.subject,
            body: reply.body,
            reasoning: reply.reasoning,
        },
        Err(_) => GeneratedReply::PlainText {
            content: raw.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_reply_parses_structured() {
        let raw = r#"{"subject": "Quick one", "body": "Hi there", "reasoning": "angle fit"}"#;
        assert_eq!(
            parse_reply(raw),
            GeneratedReply::Structured {
                subject: Some("Quick one".into()),
                body: Some("Hi there".into()),
                reasoning: Some("angle fit".into()),
            }
        );
    }

    #[test]
    fn missing_fields_stay_none() {
        let raw = r#"{"subject": "Quick one"}"#;
        assert_eq!(
            parse_reply(raw),
            GeneratedReply::Structured {
                subject: Some("Quick one".into()),
                body: None,
                reasoning: None,
            }
        );
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        let raw = r#"{"body": "Hi", "tone": "friendly"}"#;
        assert!(matches!(
            parse_reply(raw),
            GeneratedReply::Structured { body: Some(_), .. }
        ));
    }

    #[test]
    fn prose_reply_falls_back_to_plain_text() {
        let raw = "Sure! Here's a draft:\n\nHi Alice, ...";
        assert_eq!(
            parse_reply(raw),
            GeneratedReply::PlainText {
                content: raw.to_string()
            }
        );
    }

    #[test]
    fn non_object_json_is_plain_text() {
        assert!(matches!(
            parse_reply(r#""just a string""#),
            GeneratedReply::PlainText { .. }
        ));
        assert!(matches!(
            parse_reply("[1, 2, 3]"),
            GeneratedReply::PlainText { .. }
        ));
    }
}
