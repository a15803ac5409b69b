//! Cybertrap: scam-engagement honeypot engine.
//!
//! Engages an adversarial counterpart through a four-stage conversational
//! funnel, validates the payment and phishing artifacts it surfaces, and
//! tracks how certain each artifact is — certainty only arrives when the
//! same value is observed across independent turns.
//!
//! # Core Concepts
//!
//! - **Funnel stages**: Hook → Friction → Pivot → Extract; extraction only
//!   commits once the conversation has pivoted.
//! - **Validators**: per-kind grammar checks with deterministic soft-fail
//!   repair (never fabricating data).
//! - **Consensus**: the same canonical value seen on two independent turns
//!   locks the record at full confidence.
//!
//! # Example
//!
//! ```
//! use cybertrap::{Candidate, ExtractionEngine, FieldKind};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let engine = ExtractionEngine::in_memory();
//! let outcome = engine
//!     .process_turn("demo", &[Candidate::of(FieldKind::Upi, "scammer@okaxis")])
//!     .await
//!     .unwrap();
//! // Turn 1 is rapport-building: observed, not committed.
//! assert!(outcome.intelligence.upi.is_none());
//! # }
//! ```

pub mod api;
pub mod config;
pub mod engine;
pub mod generator;
pub mod persona;
pub mod snapshot;
pub mod trace;
pub mod validate;

pub use api::{CybertrapApi, EngageResponse, HealthView};
pub use config::EngineConfig;
pub use engine::{
    Candidate, ConfidenceTier, EngineError, EngineResult, ExtractionEngine, FieldKind,
    FieldRecord, Session, SessionState, SessionStore, SessionSummary, Stage, TurnContext,
    TurnOutcome,
};
pub use generator::{
    GeneratedTurn, GeneratorError, HistoryEntry, MockGenerator, PersonaGenerator, Role,
    TemplateGenerator,
};
pub use snapshot::IntelligenceSnapshot;
pub use trace::{StepKind, TraceStep, TurnTrace};
pub use validate::{FieldValidator, Outcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
