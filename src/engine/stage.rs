//! Four-stage engagement funnel: Hook → Friction → Pivot → Extract.
//!
//! The stage gates whether extraction is attempted at all. It advances by
//! exactly one step per turn, never regresses, and only a session reset
//! returns it to Hook. `Extract` is terminal.

use serde::{Deserialize, Serialize};

/// Funnel stage, serialized as its 1-based stage number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum Stage {
    /// Acknowledge the approach eagerly, build rapport.
    Hook = 1,
    /// Claim technical trouble to stall the script.
    Friction = 2,
    /// Ask for a payment alternative — extraction becomes eligible.
    Pivot = 3,
    /// Confirm and verify collected artifacts. Terminal.
    Extract = 4,
}

impl Stage {
    /// 1-based stage number as exposed on the wire.
    pub fn number(self) -> u8 {
        self as u8
    }

    /// The following stage, or `None` at the terminal stage.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Hook => Some(Stage::Friction),
            Stage::Friction => Some(Stage::Pivot),
            Stage::Pivot => Some(Stage::Extract),
            Stage::Extract => None,
        }
    }

    /// Candidates only commit and gain confidence in Pivot or Extract.
    pub fn is_extraction_eligible(self) -> bool {
        matches!(self, Stage::Pivot | Stage::Extract)
    }

    /// Short description used in the turn trace.
    pub fn description(self) -> &'static str {
        match self {
            Stage::Hook => "Building rapport - acknowledging the offer eagerly",
            Stage::Friction => "Creating technical friction - claiming app/link issues",
            Stage::Pivot => "Pivoting to extraction - asking for payment alternatives",
            Stage::Extract => "Confirming extraction - verifying collected data",
        }
    }
}

impl From<Stage> for u8 {
    fn from(stage: Stage) -> u8 {
        stage as u8
    }
}

impl TryFrom<u8> for Stage {
    type Error = String;

    fn try_from(n: u8) -> Result<Stage, String> {
        match n {
            1 => Ok(Stage::Hook),
            2 => Ok(Stage::Friction),
            3 => Ok(Stage::Pivot),
            4 => Ok(Stage::Extract),
            other => Err(format!("stage number out of range: {}", other)),
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Hook => "Hook",
            Stage::Friction => "Friction",
            Stage::Pivot => "Pivot",
            Stage::Extract => "Extract",
        };
        write!(f, "{}({})", name, self.number())
    }
}

/// Exit-condition signals observed before the current turn.
///
/// Turn-threshold advancement is the default path; these let a stage exit
/// early once its designated condition has already been met.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageSignals {
    /// A technical-friction pretext was raised in a previous turn.
    pub friction_pretext_raised: bool,
    /// Some field already committed a value.
    pub field_committed: bool,
}

/// Decide whether the stage advances this turn.
///
/// Advances by exactly one step when the turn count reaches the configured
/// threshold for the current stage, or when the stage's exit signal fired.
/// Returns `None` when the stage holds.
pub fn advance(
    current: Stage,
    turn_count: u32,
    thresholds: &[u32; 3],
    signals: StageSignals,
) -> Option<Stage> {
    let next = current.next()?;
    let threshold_met = turn_count >= thresholds[(current.number() - 1) as usize];
    let exit_met = match current {
        // Hook has no early exit; rapport is strictly time-based.
        Stage::Hook => false,
        Stage::Friction => signals.friction_pretext_raised,
        Stage::Pivot => signals.field_committed,
        Stage::Extract => false,
    };
    (threshold_met || exit_met).then_some(next)
}
