//! Consensus tracking — tier escalation and the first-writer-wins
//! conflict policy.
//!
//! A field commits at base confidence on its first stage-eligible sighting
//! and only reaches certainty when the same canonical value is seen again
//! on an independent turn. Two smaller boosts sit between: an exact
//! grammar-match re-confirmation of the committed value (pattern boost) and
//! engagement past the extended-turn threshold. A differing value after
//! commitment never overwrites the original: a counterpart who "corrects"
//! an account number after one was already captured must not be able to
//! erase the first lead.

use super::session::{FieldKind, FieldRecord};

/// What happened to a field record during one eligible observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsensusEvent {
    /// First commitment of a value for this field.
    Committed { kind: FieldKind, value: String },
    /// The same canonical value was seen on an independent turn; the
    /// record is locked for the session.
    Locked { kind: FieldKind, value: String },
    /// A differing value arrived after commitment and was refused.
    Conflict {
        kind: FieldKind,
        held: String,
        rejected: String,
    },
    /// Boost flags changed without a commit or lock.
    Reinforced { kind: FieldKind },
}

/// One stage-eligible observation, as seen by the tracker.
#[derive(Debug, Clone, Copy)]
pub struct EligibleObservation<'a> {
    pub kind: FieldKind,
    /// Normalized value from the validator (committed verbatim).
    pub normalized: &'a str,
    /// Canonical form used for equality.
    pub canonical: &'a str,
    /// Turn that produced the observation.
    pub turn: u32,
    /// Session turn count at observation time.
    pub turn_count: u32,
    /// Raw value matched its grammar with no soft-fail repair. Only
    /// re-observations of the committed value use this; a first commit
    /// always lands at base confidence.
    pub exact: bool,
}

/// Applies consensus policy to field records.
#[derive(Debug, Clone)]
pub struct ConsensusTracker {
    /// Pre-eligibility observations count toward consensus once the field
    /// commits. When false, the clock starts at the committing turn.
    pub latent_consensus: bool,
    /// Extended-turn boost applies once `turn_count` exceeds this.
    pub extended_turn_after: u32,
}

impl ConsensusTracker {
    pub fn new(latent_consensus: bool, extended_turn_after: u32) -> Self {
        Self {
            latent_consensus,
            extended_turn_after,
        }
    }

    /// Apply one eligible observation to a record.
    ///
    /// The caller has already appended the observation to the record's
    /// history; this decides commitment, boosts, conflicts, and locking.
    pub fn observe(
        &self,
        record: &mut FieldRecord,
        obs: EligibleObservation<'_>,
    ) -> Vec<ConsensusEvent> {
        let mut events = Vec::new();

        // A locked record never changes value or tier. Differing values are
        // still reported as conflicts for the trace.
        if record.consensus {
            if let Some(held) = &record.canonical {
                if held != obs.canonical {
                    events.push(ConsensusEvent::Conflict {
                        kind: obs.kind,
                        held: record.value.clone().unwrap_or_default(),
                        rejected: obs.normalized.to_string(),
                    });
                }
            }
            return events;
        }

        match record.canonical.clone() {
            None => {
                record.value = Some(obs.normalized.to_string());
                record.canonical = Some(obs.canonical.to_string());
                record.committed_turn = Some(obs.turn);
                if obs.turn_count > self.extended_turn_after {
                    record.extended_turn = true;
                }
                events.push(ConsensusEvent::Committed {
                    kind: obs.kind,
                    value: obs.normalized.to_string(),
                });
                // Latent signal retained from rapport-building turns can
                // confirm the value the moment it commits.
                if self.latent_consensus && record.seen_on_other_turn(obs.canonical, obs.turn) {
                    record.consensus = true;
                    events.push(ConsensusEvent::Locked {
                        kind: obs.kind,
                        value: obs.normalized.to_string(),
                    });
                }
            }
            Some(held) if held != obs.canonical => {
                events.push(ConsensusEvent::Conflict {
                    kind: obs.kind,
                    held: record.value.clone().unwrap_or_default(),
                    rejected: obs.normalized.to_string(),
                });
            }
            Some(_) => {
                let mut reinforced = false;
                if obs.exact && !record.pattern_confirmed {
                    record.pattern_confirmed = true;
                    reinforced = true;
                }
                if obs.turn_count > self.extended_turn_after && !record.extended_turn {
                    record.extended_turn = true;
                    reinforced = true;
                }
                // Independent re-observation: any turn other than the one
                // that set the current tier.
                if record.committed_turn != Some(obs.turn) {
                    record.consensus = true;
                    events.push(ConsensusEvent::Locked {
                        kind: obs.kind,
                        value: record.value.clone().unwrap_or_default(),
                    });
                } else if reinforced {
                    events.push(ConsensusEvent::Reinforced { kind: obs.kind });
                }
            }
        }

        events
    }
}
