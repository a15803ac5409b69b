//! Upstream persona generator — the capability interface the engine
//! consumes but does not implement.
//!
//! A generator turns the counterpart's message into a persona reply plus a
//! side-channel list of field candidates. The engine makes no assumption
//! about how candidates were derived; two implementations ship here:
//! `TemplateGenerator` (scripted replies + regex harvest, no model in the
//! loop) and `MockGenerator` (preconfigured turns for tests).

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::engine::{Candidate, FieldKind, SessionState, Stage};
use crate::persona;

/// Who said what, for the slice of history a generator may want.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Scammer,
    Persona,
}

/// One prior conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

impl HistoryEntry {
    pub fn scammer(content: impl Into<String>) -> Self {
        Self {
            role: Role::Scammer,
            content: content.into(),
        }
    }

    pub fn persona(content: impl Into<String>) -> Self {
        Self {
            role: Role::Persona,
            content: content.into(),
        }
    }
}

/// What a generator produces for one turn.
#[derive(Debug, Clone)]
pub struct GeneratedTurn {
    /// The persona's reply text.
    pub reply: String,
    /// Candidates proposed alongside the reply. Never shown to the
    /// counterpart; the engine validates and tracks them.
    pub candidates: Vec<Candidate>,
    /// The reply raised a technical-friction pretext.
    pub friction_pretext_raised: bool,
}

/// Errors from generator implementations.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("generator unavailable: {0}")]
    Unavailable(String),
    #[error("generation failed: {0}")]
    Failed(String),
}

/// The contract persona generators implement.
///
/// Abstracts over how replies are produced (model-backed, scripted, mock)
/// so the engine and API layer never depend on a concrete backend.
#[async_trait]
pub trait PersonaGenerator: Send + Sync {
    async fn generate(
        &self,
        state: &SessionState,
        message: &str,
        history: &[HistoryEntry],
    ) -> Result<GeneratedTurn, GeneratorError>;
}

fn harvest_upi() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z0-9._\-]+@[A-Za-z]{2,}").expect("upi harvest pattern"))
}

fn harvest_account() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d{9,18}\b").expect("account harvest pattern"))
}

fn harvest_ifsc() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b[A-Za-z]{4}0[A-Za-z0-9]{6}\b").expect("ifsc harvest pattern")
    })
}

fn harvest_url() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"https?://[^\s<>"{}|\\^`\[\]]+"#).expect("url harvest pattern")
    })
}

/// Regex sweep over inbound text, proposing at most one candidate per kind.
///
/// This is a candidate source, not a validator: matches go through the
/// field validators like any other proposal.
pub fn harvest_candidates(text: &str) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    if let Some(m) = harvest_url().find(text) {
        candidates.push(Candidate::of(FieldKind::Link, m.as_str()));
    }
    // Strip URLs before the UPI sweep so "host@path" fragments inside a
    // link are not mistaken for handles.
    let without_urls = harvest_url().replace_all(text, " ");
    if let Some(m) = harvest_upi().find(&without_urls) {
        candidates.push(Candidate::of(FieldKind::Upi, m.as_str()));
    }
    if let Some(m) = harvest_account().find(text) {
        candidates.push(Candidate::of(FieldKind::BankAccount, m.as_str()));
    }
    if let Some(m) = harvest_ifsc().find(text) {
        candidates.push(Candidate::of(FieldKind::Ifsc, m.as_str()));
    }
    candidates
}

/// Scripted generator: stage-keyed persona replies plus the regex harvest.
/// Runs the whole funnel end to end with no model in the loop.
#[derive(Debug, Default)]
pub struct TemplateGenerator;

impl TemplateGenerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PersonaGenerator for TemplateGenerator {
    async fn generate(
        &self,
        state: &SessionState,
        message: &str,
        _history: &[HistoryEntry],
    ) -> Result<GeneratedTurn, GeneratorError> {
        Ok(GeneratedTurn {
            reply: persona::stage_reply(state.stage).to_string(),
            candidates: harvest_candidates(message),
            friction_pretext_raised: state.stage == Stage::Friction,
        })
    }
}

/// Mock generator for tests — returns a preconfigured turn, or a failure.
#[derive(Debug, Default)]
pub struct MockGenerator {
    reply: String,
    candidates: Vec<Candidate>,
    friction_pretext_raised: bool,
    fail: bool,
}

impl MockGenerator {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn with_candidate(mut self, candidate: Candidate) -> Self {
        self.candidates.push(candidate);
        self
    }

    pub fn with_friction_pretext(mut self) -> Self {
        self.friction_pretext_raised = true;
        self
    }
}

#[async_trait]
impl PersonaGenerator for MockGenerator {
    async fn generate(
        &self,
        _state: &SessionState,
        _message: &str,
        _history: &[HistoryEntry],
    ) -> Result<GeneratedTurn, GeneratorError> {
        if self.fail {
            return Err(GeneratorError::Failed(
                "mock generator configured to fail".to_string(),
            ));
        }
        Ok(GeneratedTurn {
            reply: self.reply.clone(),
            candidates: self.candidates.clone(),
            friction_pretext_raised: self.friction_pretext_raised,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn harvest_finds_each_kind() {
        let text = "Send to scammer@okaxis, account 123456789012, IFSC SBIN0001234, \
                    or pay at https://pay-verify.example/claim";
        let candidates = harvest_candidates(text);
        let kinds: Vec<&str> = candidates.iter().map(|c| c.kind.as_str()).collect();
        assert!(kinds.contains(&"upi"));
        assert!(kinds.contains(&"bank_account"));
        assert!(kinds.contains(&"ifsc"));
        assert!(kinds.contains(&"link"));
    }

    #[test]
    fn harvest_ignores_handle_like_fragments_inside_urls() {
        let candidates = harvest_candidates("go to https://evil.example/user@site now");
        assert!(candidates.iter().any(|c| c.kind == "link"));
        assert!(!candidates.iter().any(|c| c.kind == "upi"));
    }

    #[test]
    fn harvest_of_plain_text_is_empty() {
        assert!(harvest_candidates("hello beta how are you").is_empty());
    }

    #[tokio::test]
    async fn template_generator_replies_per_stage_and_harvests() {
        let state = SessionState {
            session_id: "s1".to_string(),
            stage: Stage::Friction,
            turn_count: 2,
            detected_language: "english".to_string(),
            has_intel: false,
            extraction_allowed: false,
        };
        let turn = TemplateGenerator::new()
            .generate(&state, "pay to scammer@okaxis", &[])
            .await
            .unwrap();
        assert!(turn.reply.contains("NetProtect"));
        assert!(turn.friction_pretext_raised);
        assert_eq!(turn.candidates.len(), 1);
    }

    #[tokio::test]
    async fn mock_generator_round_trips_configuration() {
        let generator = MockGenerator::replying("hello beta")
            .with_candidate(Candidate::of(FieldKind::Upi, "a@okaxis"));
        let state = SessionState {
            session_id: "s1".to_string(),
            stage: Stage::Hook,
            turn_count: 1,
            detected_language: "english".to_string(),
            has_intel: false,
            extraction_allowed: false,
        };
        let turn = generator.generate(&state, "hi", &[]).await.unwrap();
        assert_eq!(turn.reply, "hello beta");
        assert_eq!(turn.candidates.len(), 1);

        let err = MockGenerator::failing()
            .generate(&state, "hi", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, GeneratorError::Failed(_)));
    }
}
