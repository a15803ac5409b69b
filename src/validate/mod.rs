//! Field validators — per-kind grammar check, normalization, and
//! soft-fail repair.
//!
//! Each validator classifies a raw candidate into one of three outcomes:
//! `Accepted` (matches the grammar after plain normalization), `SoftFail`
//! (a deterministic repair rescued a near-miss, with a reason the prompt
//! layer can turn into a one-turn clarification), or `Rejected` (no safe
//! repair exists). Repairs only rearrange or case-fold characters already
//! present in the input; they never fabricate data. Repairs are idempotent:
//! re-validating a repaired value yields `Accepted` with the same value.

mod bank;
mod ifsc;
mod link;
mod upi;

pub use bank::BankAccountValidator;
pub use ifsc::IfscValidator;
pub use link::LinkValidator;
pub use upi::UpiValidator;

use crate::engine::FieldKind;

/// Result of validating one raw candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Raw value matched the field's grammar; `value` is the normalized form.
    Accepted { value: String },
    /// A deterministic repair produced a grammar-passing value. The reason
    /// is short and human-readable, meant for a clarification prompt.
    SoftFail { value: String, reason: String },
    /// No safe repair; the candidate is dropped for this turn.
    Rejected { reason: String },
}

impl Outcome {
    /// The normalized value, when one exists.
    pub fn value(&self) -> Option<&str> {
        match self {
            Outcome::Accepted { value } | Outcome::SoftFail { value, .. } => Some(value),
            Outcome::Rejected { .. } => None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Outcome::Rejected { .. })
    }
}

/// The contract one field kind's validator implements.
pub trait FieldValidator: Send + Sync {
    /// The artifact kind this validator owns.
    fn kind(&self) -> FieldKind;

    /// Classify a raw candidate.
    fn validate(&self, raw: &str) -> Outcome;

    /// Canonical form used for cross-turn equality in consensus tracking.
    /// Case-folded and separator-stripped as appropriate for the kind.
    fn canonicalize(&self, value: &str) -> String;
}

/// Validator for a field kind. Validators are stateless, so a single static
/// instance serves every session.
pub fn validator_for(kind: FieldKind) -> &'static dyn FieldValidator {
    static UPI: UpiValidator = UpiValidator;
    static BANK: BankAccountValidator = BankAccountValidator;
    static IFSC: IfscValidator = IfscValidator;
    static LINK: LinkValidator = LinkValidator;
    match kind {
        FieldKind::Upi => &UPI,
        FieldKind::BankAccount => &BANK,
        FieldKind::Ifsc => &IFSC,
        FieldKind::Link => &LINK,
    }
}
