//! Engine configuration.
//!
//! Stage thresholds and consensus behavior are deployment knobs, not
//! hard-coded constants. Defaults reproduce the reference funnel:
//! Hook→Friction after turn 2, Friction→Pivot after turn 4,
//! Pivot→Extract after turn 6.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Turn counts at which Hook, Friction, and Pivot hand over to the
    /// next stage (absent an earlier exit signal).
    pub stage_turn_thresholds: [u32; 3],
    /// The extended-turn confidence boost applies once `turn_count`
    /// exceeds this.
    pub extended_turn_after: u32,
    /// Whether observations recorded before stage eligibility count toward
    /// consensus once the field commits. When false, the consensus clock
    /// only starts at the committing turn.
    pub latent_consensus: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stage_turn_thresholds: [2, 4, 6],
            extended_turn_after: 4,
            latent_consensus: true,
        }
    }
}

impl EngineConfig {
    pub fn with_thresholds(mut self, thresholds: [u32; 3]) -> Self {
        self.stage_turn_thresholds = thresholds;
        self
    }

    pub fn with_latent_consensus(mut self, enabled: bool) -> Self {
        self.latent_consensus = enabled;
        self
    }
}
