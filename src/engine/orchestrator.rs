//! Extraction orchestrator — the single entry point for one
//! conversational turn.
//!
//! A turn loads (or creates) the session, advances the funnel stage, runs
//! every candidate through its field validator, records observations,
//! applies the consensus policy when the stage permits, and returns the
//! intelligence snapshot plus the explainability trace. The session mutates
//! atomically: work happens on a copy that is written back only when the
//! turn completes.

use std::sync::Arc;

use thiserror::Error;

use super::consensus::{ConsensusEvent, ConsensusTracker, EligibleObservation};
use super::session::{Candidate, FieldKind, Observation, Session};
use super::stage::{self, Stage, StageSignals};
use super::store::{SessionStore, SessionSummary};
use crate::config::EngineConfig;
use crate::snapshot::IntelligenceSnapshot;
use crate::trace::{TraceStep, TurnTrace};
use crate::validate::{validator_for, Outcome};

/// Errors the orchestrator can surface to the caller.
///
/// Everything recoverable — rejected candidates, conflicts, unknown field
/// kinds — degrades into trace entries instead. Corruption is the one
/// condition where guessing a recovery would be worse than stopping.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("session '{session_id}' failed its consistency check ({reason}); explicit reset required")]
    SessionCorrupted { session_id: String, reason: String },
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Out-of-band facts accompanying a turn, supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct TurnContext {
    /// Best-guess language of the inbound message, if the caller ran the
    /// hint heuristic.
    pub detected_language: Option<String>,
    /// The persona raised a technical-friction pretext in its reply for
    /// this turn. Feeds the Friction stage's exit condition from the next
    /// turn onwards.
    pub friction_pretext_raised: bool,
}

/// Everything one turn hands back to the transport layer.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub intelligence: IntelligenceSnapshot,
    /// Max per-field score across committed fields, else 0.
    pub confidence: f64,
    pub stage: Stage,
    pub turn_count: u32,
    pub trace: TurnTrace,
    /// Fields that committed a value during this turn.
    pub committed: Vec<FieldKind>,
    /// A soft-failed field whose repaired value deserves a one-turn
    /// clarification, with the repaired value to echo back.
    pub needs_clarification: Option<(FieldKind, String)>,
}

/// The stateful core: funnel, validators, consensus, store.
pub struct ExtractionEngine {
    store: Arc<SessionStore>,
    config: EngineConfig,
    tracker: ConsensusTracker,
}

impl ExtractionEngine {
    pub fn new(store: Arc<SessionStore>, config: EngineConfig) -> Self {
        let tracker = ConsensusTracker::new(config.latent_consensus, config.extended_turn_after);
        Self {
            store,
            config,
            tracker,
        }
    }

    /// Engine over a fresh store with default configuration.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(SessionStore::new()), EngineConfig::default())
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Process one turn's candidates for a session.
    pub async fn process_turn(
        &self,
        session_id: &str,
        candidates: &[Candidate],
    ) -> EngineResult<TurnOutcome> {
        self.process_turn_with(session_id, candidates, TurnContext::default())
            .await
    }

    /// Process one turn with out-of-band context from the caller.
    pub async fn process_turn_with(
        &self,
        session_id: &str,
        candidates: &[Candidate],
        ctx: TurnContext,
    ) -> EngineResult<TurnOutcome> {
        let handle = self.store.get_or_create(session_id);
        let mut guard = handle.lock().await;

        guard
            .check_integrity()
            .map_err(|reason| EngineError::SessionCorrupted {
                session_id: session_id.to_string(),
                reason,
            })?;

        // Work on a copy; commit by writing back at the end. A turn that
        // fails partway leaves prior state untouched.
        let mut session = guard.clone();
        let mut trace = TurnTrace::new();

        session.turn_count += 1;
        session.last_active = chrono::Utc::now();
        if let Some(lang) = &ctx.detected_language {
            if *lang != session.detected_language {
                session.detected_language = lang.clone();
            }
            trace.push(TraceStep::thought(format!("Language detected: {}", lang)));
        }

        trace.push(TraceStep::thought(format!(
            "Stage {}: {}",
            session.stage.number(),
            session.stage.description()
        )));

        // Stage advance uses signals from previous turns only; this turn's
        // friction flag is folded in afterwards.
        let signals = StageSignals {
            friction_pretext_raised: session.friction_pretext_raised,
            field_committed: session.has_intel(),
        };
        if let Some(next) = stage::advance(
            session.stage,
            session.turn_count,
            &self.config.stage_turn_thresholds,
            signals,
        ) {
            tracing::info!(
                session = session_id,
                from = %session.stage,
                to = %next,
                turn = session.turn_count,
                "stage advanced"
            );
            trace.push(TraceStep::action(format!(
                "Stage advanced: {} -> {}",
                session.stage, next
            )));
            session.stage = next;
        }
        if ctx.friction_pretext_raised {
            session.friction_pretext_raised = true;
        }

        let eligible = session.stage.is_extraction_eligible();
        if !eligible {
            trace.push(TraceStep::thought(format!(
                "Stage buffer active at {}: observing candidates without committing",
                session.stage
            )));
        }

        let mut committed = Vec::new();
        let mut needs_clarification = None;
        let mut observed_any = false;

        for candidate in candidates {
            let Some(kind) = FieldKind::parse(&candidate.kind) else {
                tracing::warn!(
                    session = session_id,
                    kind = %candidate.kind,
                    "discarding candidate with unknown field kind"
                );
                trace.push(TraceStep::validation(format!(
                    "Discarded candidate with unknown field kind '{}'",
                    candidate.kind
                )));
                continue;
            };

            let validator = validator_for(kind);
            trace.push(TraceStep::tool_call(format!(
                "Validating {} candidate",
                kind.label()
            )));

            let outcome = validator.validate(&candidate.raw);
            let (value, exact) = match &outcome {
                Outcome::Rejected { reason } => {
                    tracing::debug!(session = session_id, field = %kind, %reason, "candidate rejected");
                    trace.push(TraceStep::validation(format!(
                        "{} candidate rejected: {}",
                        kind.label(),
                        reason
                    )));
                    continue;
                }
                Outcome::SoftFail { value, reason } => {
                    trace.push(TraceStep::validation(format!(
                        "{} candidate repaired ({}); clarification advised",
                        kind.label(),
                        reason
                    )));
                    if needs_clarification.is_none() {
                        needs_clarification = Some((kind, value.clone()));
                    }
                    (value.clone(), false)
                }
                Outcome::Accepted { value } => (value.clone(), true),
            };

            // Observations append unconditionally so rapport-stage sightings
            // can satisfy consensus later.
            let canonical = validator.canonicalize(&value);
            let turn = session.turn_count;
            let record = session.field_mut(kind);
            record.observations.push(Observation {
                turn,
                canonical: canonical.clone(),
            });
            observed_any = true;

            if !eligible {
                continue;
            }

            let events = self.tracker.observe(
                record,
                EligibleObservation {
                    kind,
                    normalized: &value,
                    canonical: &canonical,
                    turn,
                    turn_count: turn,
                    exact,
                },
            );
            for event in events {
                match event {
                    ConsensusEvent::Committed { kind, value } => {
                        tracing::info!(session = session_id, field = %kind, "field committed");
                        trace.push(TraceStep::action(format!(
                            "Committed {} value '{}'",
                            kind.label(),
                            value
                        )));
                        committed.push(kind);
                    }
                    ConsensusEvent::Locked { kind, value } => {
                        tracing::info!(session = session_id, field = %kind, "consensus locked");
                        trace.push(TraceStep::validation(format!(
                            "CONSENSUS: {} '{}' confirmed across multiple turns. Locking record.",
                            kind.label(),
                            value
                        )));
                    }
                    ConsensusEvent::Conflict {
                        kind,
                        held,
                        rejected,
                    } => {
                        tracing::warn!(
                            session = session_id,
                            field = %kind,
                            "conflicting value refused; first commitment is sticky"
                        );
                        trace.push(TraceStep::validation(format!(
                            "CONFLICT: {} already committed as '{}'; refusing '{}'",
                            kind.label(),
                            held,
                            rejected
                        )));
                    }
                    ConsensusEvent::Reinforced { kind } => {
                        trace.push(TraceStep::validation(format!(
                            "{} re-observed on the committing turn; confidence reinforced",
                            kind.label()
                        )));
                    }
                }
            }
        }

        let confidence = session.aggregate_confidence();
        if eligible && observed_any {
            let note = if (confidence - 1.0).abs() < f64::EPSILON {
                "Confidence: 100% (consensus achieved - data immutable)".to_string()
            } else {
                format!(
                    "Confidence: {}% (awaiting consensus for 100%)",
                    (confidence * 100.0).round() as u32
                )
            };
            trace.push(TraceStep::action(note));
        }

        let outcome = TurnOutcome {
            intelligence: IntelligenceSnapshot::from_session(&session),
            confidence,
            stage: session.stage,
            turn_count: session.turn_count,
            trace,
            committed,
            needs_clarification,
        };

        *guard = session;
        Ok(outcome)
    }

    /// Read-only view of a session's current state, creating it if unseen.
    pub async fn session_view(&self, session_id: &str) -> SessionState {
        let handle = self.store.get_or_create(session_id);
        let session = handle.lock().await;
        SessionState::from(&*session)
    }

    /// Delete a session. Idempotent; returns whether state existed.
    pub fn reset_session(&self, session_id: &str) -> bool {
        self.store.reset(session_id)
    }

    /// Listing of all live sessions.
    pub async fn sessions(&self) -> Vec<SessionSummary> {
        self.store.summaries().await
    }
}

/// Immutable view of a session, safe to hand to the upstream generator.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub session_id: String,
    pub stage: Stage,
    pub turn_count: u32,
    pub detected_language: String,
    pub has_intel: bool,
    pub extraction_allowed: bool,
}

impl From<&Session> for SessionState {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.session_id.clone(),
            stage: session.stage,
            turn_count: session.turn_count,
            detected_language: session.detected_language.clone(),
            has_intel: session.has_intel(),
            extraction_allowed: session.stage.is_extraction_eligible(),
        }
    }
}
