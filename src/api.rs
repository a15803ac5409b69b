//! Transport-independent API layer.
//!
//! `CybertrapApi` is the single entry point for consumers. Transports
//! (HTTP, CLI, direct embedding) call these methods — they never reach into
//! the generator or `ExtractionEngine` directly. The engage flow mirrors
//! one conversational turn: hint the language, ask the generator for a
//! reply and candidates, hand the candidates to the engine, and append any
//! clarification prompt to the reply.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::engine::{
    EngineResult, ExtractionEngine, FieldKind, SessionSummary, TurnContext,
};
use crate::generator::{GeneratedTurn, HistoryEntry, PersonaGenerator};
use crate::persona;
use crate::snapshot::IntelligenceSnapshot;
use crate::trace::{TraceStep, TurnTrace};
use crate::{generator, VERSION};

/// Per-turn response handed to the transport layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngageResponse {
    /// Always "SCAM": the honeypot only ever engages counterparts it has
    /// already decided to trap.
    pub classification: String,
    /// Aggregate confidence in [0.0, 1.0].
    pub confidence: f64,
    /// The persona's reply text.
    pub reply: String,
    /// Committed artifact values (exactly four keys, null when absent).
    pub intelligence: IntelligenceSnapshot,
    /// One-line summary of the turn's reasoning.
    pub explanation: String,
    pub current_stage: u8,
    pub detected_language: String,
    pub thought_process: Vec<TraceStep>,
    /// Field awaiting a one-turn clarification, if any.
    pub needs_clarification: Option<FieldKind>,
    pub extraction_allowed: bool,
}

/// Service health view for the CLI and monitoring surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthView {
    pub status: String,
    pub version: String,
    pub active_sessions: usize,
}

/// Single entry point for all consumer-facing operations.
#[derive(Clone)]
pub struct CybertrapApi {
    engine: Arc<ExtractionEngine>,
    generator: Arc<dyn PersonaGenerator>,
}

impl CybertrapApi {
    pub fn new(engine: Arc<ExtractionEngine>, generator: Arc<dyn PersonaGenerator>) -> Self {
        Self { engine, generator }
    }

    /// Process one inbound message for a session.
    pub async fn engage(
        &self,
        session_id: &str,
        message: &str,
        history: &[HistoryEntry],
    ) -> EngineResult<EngageResponse> {
        let language = persona::detect_language(message);
        let state = self.engine.session_view(session_id).await;

        // The generator is a black box that may fail; the funnel must not.
        let mut prelude = TurnTrace::new();
        let generated = match self.generator.generate(&state, message, history).await {
            Ok(turn) => turn,
            Err(e) => {
                tracing::warn!(session = session_id, error = %e, "generator failed; using template reply");
                prelude.push(TraceStep::thought(format!(
                    "Generator unavailable ({}). Using template response.",
                    e
                )));
                GeneratedTurn {
                    reply: persona::stage_reply(state.stage).to_string(),
                    candidates: generator::harvest_candidates(message),
                    friction_pretext_raised: state.stage == crate::engine::Stage::Friction,
                }
            }
        };

        let ctx = TurnContext {
            detected_language: Some(language.to_string()),
            friction_pretext_raised: generated.friction_pretext_raised,
        };
        let outcome = self
            .engine
            .process_turn_with(session_id, &generated.candidates, ctx)
            .await?;

        let mut reply = generated.reply;
        let needs_clarification = outcome.needs_clarification.as_ref().map(|(kind, _)| *kind);
        if let Some((kind, value)) = &outcome.needs_clarification {
            let prompt = persona::clarification_prompt(*kind, value, outcome.turn_count);
            reply = format!("{} {}", reply, prompt);
        }

        let explanation = format!(
            "Stage {} ({}); {} candidate(s) proposed, {} field(s) committed this turn; confidence {:.2}",
            outcome.stage.number(),
            outcome.stage.description(),
            generated.candidates.len(),
            outcome.committed.len(),
            outcome.confidence
        );

        let mut thought_process = prelude.steps;
        thought_process.extend(outcome.trace.steps);

        Ok(EngageResponse {
            classification: "SCAM".to_string(),
            confidence: outcome.confidence,
            reply,
            intelligence: outcome.intelligence,
            explanation,
            current_stage: outcome.stage.number(),
            detected_language: language.to_string(),
            thought_process,
            needs_clarification,
            extraction_allowed: outcome.stage.is_extraction_eligible(),
        })
    }

    /// Delete a session's state. Idempotent.
    pub fn reset(&self, session_id: &str) -> bool {
        self.engine.reset_session(session_id)
    }

    /// Listing of all live sessions.
    pub async fn sessions(&self) -> Vec<SessionSummary> {
        self.engine.sessions().await
    }

    pub async fn health(&self) -> HealthView {
        HealthView {
            status: "online".to_string(),
            version: VERSION.to_string(),
            active_sessions: self.engine.store().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Candidate, FieldKind};
    use crate::generator::{MockGenerator, TemplateGenerator};

    fn api_with(generator: Arc<dyn PersonaGenerator>) -> CybertrapApi {
        CybertrapApi::new(Arc::new(ExtractionEngine::in_memory()), generator)
    }

    #[tokio::test]
    async fn engage_always_returns_a_reply_and_snapshot() {
        let api = api_with(Arc::new(TemplateGenerator::new()));
        let response = api.engage("s1", "Hello madam you won a prize!", &[]).await.unwrap();
        assert_eq!(response.classification, "SCAM");
        assert!(!response.reply.is_empty());
        assert!(response.intelligence.is_empty());
        assert_eq!(response.current_stage, 1);
        assert!(!response.extraction_allowed);
        assert!(!response.thought_process.is_empty());
    }

    #[tokio::test]
    async fn generator_failure_falls_back_to_template_reply() {
        let api = api_with(Arc::new(MockGenerator::failing()));
        let response = api.engage("s1", "send money now", &[]).await.unwrap();
        assert!(!response.reply.is_empty());
        assert!(response
            .thought_process
            .iter()
            .any(|s| s.content.contains("template response")));
    }

    /// Advance a session through empty turns, past the rapport stages.
    async fn advance_empty_turns(api: &CybertrapApi, session_id: &str, turns: u32) {
        for _ in 0..turns {
            api.engine.process_turn(session_id, &[]).await.unwrap();
        }
    }

    #[tokio::test]
    async fn clarification_prompt_is_appended_to_reply() {
        let generator = MockGenerator::replying("Writing it down, beta.")
            .with_candidate(Candidate::of(FieldKind::BankAccount, "1234 5678 90"));
        let api = api_with(Arc::new(generator));
        advance_empty_turns(&api, "s1", 4).await;
        let response = api.engage("s1", "account is 1234 5678 90", &[]).await.unwrap();
        assert_eq!(response.needs_clarification, Some(FieldKind::BankAccount));
        assert!(response.reply.starts_with("Writing it down, beta."));
        assert!(response.reply.len() > "Writing it down, beta.".len());
    }

    #[tokio::test]
    async fn language_hint_is_recorded() {
        let api = api_with(Arc::new(TemplateGenerator::new()));
        let response = api.engage("s1", "Aap paisa kaise bhejo ge?", &[]).await.unwrap();
        assert_eq!(response.detected_language, "hindi");
    }

    #[tokio::test]
    async fn reset_is_idempotent_through_api() {
        let api = api_with(Arc::new(TemplateGenerator::new()));
        api.engage("s1", "hello", &[]).await.unwrap();
        assert!(api.reset("s1"));
        assert!(!api.reset("s1"));
        assert_eq!(api.health().await.active_sessions, 0);
    }

    #[tokio::test]
    async fn sessions_listing_reflects_engagements() {
        let api = api_with(Arc::new(TemplateGenerator::new()));
        api.engage("a", "hello", &[]).await.unwrap();
        api.engage("b", "pay to scammer@okaxis", &[]).await.unwrap();
        let sessions = api.sessions().await;
        assert_eq!(sessions.len(), 2);
    }
}
