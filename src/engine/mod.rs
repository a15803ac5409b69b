//! The stateful extraction core: session model, funnel stage machine,
//! consensus tracking, session store, and the turn orchestrator.

mod consensus;
mod orchestrator;
mod session;
mod stage;
mod store;

pub use consensus::{ConsensusEvent, ConsensusTracker, EligibleObservation};
pub use orchestrator::{
    EngineError, EngineResult, ExtractionEngine, SessionState, TurnContext, TurnOutcome,
};
pub use session::{Candidate, ConfidenceTier, FieldKind, FieldRecord, Observation, Session};
pub use stage::{advance, Stage, StageSignals};
pub use store::{SessionHandle, SessionStore, SessionSummary};
