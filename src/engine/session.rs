//! Session state — one record per conversation with an adversarial counterpart.
//!
//! A session tracks the funnel stage, the turn counter, and one
//! [`FieldRecord`] per artifact kind. Field records follow a monotonic-commit
//! discipline: a committed value never reverts to absent and never changes
//! to a different value within a live session (first-writer-wins).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::stage::Stage;

/// The artifact kinds the engine knows how to validate and track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Upi,
    BankAccount,
    Ifsc,
    Link,
}

impl FieldKind {
    /// All kinds, in snapshot order.
    pub const ALL: [FieldKind; 4] = [
        FieldKind::Upi,
        FieldKind::BankAccount,
        FieldKind::Ifsc,
        FieldKind::Link,
    ];

    /// Wire name used by the upstream generator and the snapshot.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Upi => "upi",
            FieldKind::BankAccount => "bank_account",
            FieldKind::Ifsc => "ifsc",
            FieldKind::Link => "link",
        }
    }

    /// Parse a wire name. Unknown names yield `None` — the caller decides
    /// whether that discards the candidate or aborts (it never aborts here).
    pub fn parse(s: &str) -> Option<FieldKind> {
        match s {
            "upi" => Some(FieldKind::Upi),
            "bank_account" => Some(FieldKind::BankAccount),
            "ifsc" => Some(FieldKind::Ifsc),
            "link" => Some(FieldKind::Link),
            _ => None,
        }
    }

    /// Human-readable label for trace entries.
    pub fn label(&self) -> &'static str {
        match self {
            FieldKind::Upi => "UPI",
            FieldKind::BankAccount => "Bank Account",
            FieldKind::Ifsc => "IFSC",
            FieldKind::Link => "Link",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordered confidence tiers for a tracked field.
///
/// The numeric score is derived from the record's boost flags, not stored;
/// `Consensus` is terminal for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    None,
    Base,
    PatternConfirmed,
    ExtendedTurn,
    Consensus,
}

impl ConfidenceTier {
    /// Nominal score for the tier.
    pub fn score(&self) -> f64 {
        match self {
            ConfidenceTier::None => 0.0,
            ConfidenceTier::Base => 0.50,
            ConfidenceTier::PatternConfirmed => 0.65,
            ConfidenceTier::ExtendedTurn => 0.75,
            ConfidenceTier::Consensus => 1.00,
        }
    }
}

/// One normalized sighting of a field value, tagged with the turn it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub turn: u32,
    pub canonical: String,
}

/// Per-field state: committed value, boost flags, and the append-only
/// observation history used for consensus comparison.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldRecord {
    /// Normalized committed value. Absent until the field first commits;
    /// never overwritten afterwards.
    pub value: Option<String>,
    /// Canonical form of the committed value, kept for cross-turn equality.
    pub canonical: Option<String>,
    /// Turn on which the value committed (and the current tier was set).
    pub committed_turn: Option<u32>,
    /// The committed value was re-confirmed by an exact grammar match
    /// (no soft-fail repair) after commitment.
    pub pattern_confirmed: bool,
    /// The session had passed the extended-turn threshold when observed.
    pub extended_turn: bool,
    /// Same canonical value seen across two independent turns. Locked.
    pub consensus: bool,
    /// Every normalized sighting, eligible or not. Never cleared while
    /// the session is live.
    pub observations: Vec<Observation>,
}

impl FieldRecord {
    /// Current confidence score in [0.0, 1.0].
    ///
    /// Base 0.50 on commit, +0.15 pattern boost, +0.10 extended-turn boost,
    /// saturating at 0.75 until a consensus event lifts it to 1.00.
    pub fn score(&self) -> f64 {
        if self.consensus {
            return 1.0;
        }
        if self.value.is_none() {
            return 0.0;
        }
        let mut score: f64 = 0.50;
        if self.pattern_confirmed {
            score += 0.15;
        }
        if self.extended_turn {
            score += 0.10;
        }
        score.min(0.75)
    }

    /// Tier derived from the score.
    pub fn tier(&self) -> ConfidenceTier {
        if self.consensus {
            return ConfidenceTier::Consensus;
        }
        let score = self.score();
        if score >= 0.75 {
            ConfidenceTier::ExtendedTurn
        } else if score >= 0.65 {
            ConfidenceTier::PatternConfirmed
        } else if score >= 0.50 {
            ConfidenceTier::Base
        } else {
            ConfidenceTier::None
        }
    }

    /// Whether an observation with this canonical value exists on a turn
    /// other than the given one.
    pub fn seen_on_other_turn(&self, canonical: &str, turn: u32) -> bool {
        self.observations
            .iter()
            .any(|o| o.turn != turn && o.canonical == canonical)
    }
}

/// A raw field value proposed by the upstream generator for one turn.
///
/// The kind is carried as its wire string so unrecognized kinds can flow
/// through to the orchestrator, which discards them without failing the turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub kind: String,
    pub raw: String,
}

impl Candidate {
    pub fn new(kind: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            raw: raw.into(),
        }
    }

    /// Candidate with a known kind.
    pub fn of(kind: FieldKind, raw: impl Into<String>) -> Self {
        Self::new(kind.as_str(), raw)
    }
}

/// One conversation's engine state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub stage: Stage,
    pub turn_count: u32,
    pub fields: HashMap<FieldKind, FieldRecord>,
    /// Best-guess language label from the hint heuristic.
    pub detected_language: String,
    /// A technical-friction pretext was raised in some earlier turn.
    pub friction_pretext_raised: bool,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl Session {
    /// Fresh session at stage Hook with empty records for all four kinds.
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            stage: Stage::Hook,
            turn_count: 0,
            fields: FieldKind::ALL
                .iter()
                .map(|k| (*k, FieldRecord::default()))
                .collect(),
            detected_language: "english".to_string(),
            friction_pretext_raised: false,
            created_at: now,
            last_active: now,
        }
    }

    pub fn field(&self, kind: FieldKind) -> &FieldRecord {
        // All four records are created with the session; a missing entry is
        // caught by check_integrity before any turn runs.
        self.fields.get(&kind).expect("field record present")
    }

    pub fn field_mut(&mut self, kind: FieldKind) -> &mut FieldRecord {
        self.fields.entry(kind).or_default()
    }

    /// Whether any field has committed a value.
    pub fn has_intel(&self) -> bool {
        self.fields.values().any(|r| r.value.is_some())
    }

    /// Max per-field score across fields with a committed value, else 0.
    pub fn aggregate_confidence(&self) -> f64 {
        self.fields
            .values()
            .filter(|r| r.value.is_some())
            .map(|r| r.score())
            .fold(0.0, f64::max)
    }

    /// Internal consistency check run before every turn.
    ///
    /// A failure here is the only fatal per-session condition: the
    /// orchestrator refuses to proceed and requires an explicit reset.
    pub fn check_integrity(&self) -> Result<(), String> {
        for kind in FieldKind::ALL {
            let Some(record) = self.fields.get(&kind) else {
                return Err(format!("missing field record for '{}'", kind));
            };
            if record.consensus && record.value.is_none() {
                return Err(format!(
                    "field '{}' marked consensus without a committed value",
                    kind
                ));
            }
            if record.value.is_some() != record.canonical.is_some() {
                return Err(format!(
                    "field '{}' has mismatched value/canonical commitment",
                    kind
                ));
            }
            if let Some(turn) = record.committed_turn {
                if turn > self.turn_count {
                    return Err(format!(
                        "field '{}' committed on turn {} beyond turn count {}",
                        kind, turn, self.turn_count
                    ));
                }
            }
            if let Some(obs) = record
                .observations
                .iter()
                .find(|o| o.turn > self.turn_count)
            {
                return Err(format!(
                    "field '{}' has an observation from turn {} beyond turn count {}",
                    kind, obs.turn, self.turn_count
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_starts_empty_at_hook() {
        let session = Session::new("s1");
        assert_eq!(session.stage, Stage::Hook);
        assert_eq!(session.turn_count, 0);
        assert_eq!(session.fields.len(), 4);
        assert!(!session.has_intel());
        assert_eq!(session.aggregate_confidence(), 0.0);
        session.check_integrity().unwrap();
    }

    #[test]
    fn field_kind_wire_names_round_trip() {
        for kind in FieldKind::ALL {
            assert_eq!(FieldKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(FieldKind::parse("phone_number"), None);
    }

    #[test]
    fn tier_scores_follow_boost_flags() {
        let mut record = FieldRecord::default();
        assert_eq!(record.tier(), ConfidenceTier::None);
        assert_eq!(record.score(), 0.0);

        record.value = Some("x@okaxis".to_string());
        record.canonical = Some("x@okaxis".to_string());
        assert_eq!(record.tier(), ConfidenceTier::Base);
        assert_eq!(record.score(), 0.50);

        record.pattern_confirmed = true;
        assert_eq!(record.tier(), ConfidenceTier::PatternConfirmed);
        assert_eq!(record.score(), 0.65);

        record.extended_turn = true;
        assert_eq!(record.tier(), ConfidenceTier::ExtendedTurn);
        assert_eq!(record.score(), 0.75);

        record.consensus = true;
        assert_eq!(record.tier(), ConfidenceTier::Consensus);
        assert_eq!(record.score(), 1.0);
    }

    #[test]
    fn extended_boost_alone_stays_at_base_tier() {
        let record = FieldRecord {
            value: Some("123456789".to_string()),
            canonical: Some("123456789".to_string()),
            extended_turn: true,
            ..Default::default()
        };
        assert_eq!(record.score(), 0.60);
        assert_eq!(record.tier(), ConfidenceTier::Base);
    }

    #[test]
    fn aggregate_confidence_takes_max_across_fields() {
        let mut session = Session::new("s1");
        session.turn_count = 3;
        let upi = session.field_mut(FieldKind::Upi);
        upi.value = Some("a@okaxis".to_string());
        upi.canonical = Some("a@okaxis".to_string());
        upi.committed_turn = Some(2);
        let bank = session.field_mut(FieldKind::BankAccount);
        bank.value = Some("123456789".to_string());
        bank.canonical = Some("123456789".to_string());
        bank.committed_turn = Some(3);
        bank.consensus = true;
        assert_eq!(session.aggregate_confidence(), 1.0);
    }

    #[test]
    fn integrity_rejects_observation_beyond_turn_count() {
        let mut session = Session::new("s1");
        session.field_mut(FieldKind::Upi).observations.push(Observation {
            turn: 7,
            canonical: "a@okaxis".to_string(),
        });
        assert!(session.check_integrity().is_err());
    }

    #[test]
    fn integrity_rejects_consensus_without_value() {
        let mut session = Session::new("s1");
        session.field_mut(FieldKind::Ifsc).consensus = true;
        assert!(session.check_integrity().is_err());
    }

    #[test]
    fn seen_on_other_turn_ignores_same_turn_duplicates() {
        let mut record = FieldRecord::default();
        record.observations.push(Observation {
            turn: 3,
            canonical: "a@okaxis".to_string(),
        });
        assert!(!record.seen_on_other_turn("a@okaxis", 3));
        assert!(record.seen_on_other_turn("a@okaxis", 4));
        assert!(!record.seen_on_other_turn("b@okaxis", 4));
    }
}
