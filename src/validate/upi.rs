//! UPI handle validation: `local-part@psp-suffix`.

use regex::{Regex, RegexBuilder};
use std::sync::OnceLock;

use super::{FieldValidator, Outcome};
use crate::engine::FieldKind;

fn upi_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        RegexBuilder::new(r"^[\w.\-]{2,256}@\w{2,64}$")
            .size_limit(1 << 26)
            .build()
            .expect("upi pattern")
    })
}

/// Punctuation that commonly clings to a handle pasted out of chat text.
const STRAY_EDGES: &[char] = &['"', '\'', '<', '>', '(', ')', '[', ']', ',', ';', ':', '!', '?'];

pub struct UpiValidator;

impl UpiValidator {
    fn normalize(raw: &str) -> String {
        raw.trim().to_lowercase()
    }
}

impl FieldValidator for UpiValidator {
    fn kind(&self) -> FieldKind {
        FieldKind::Upi
    }

    fn validate(&self, raw: &str) -> Outcome {
        let normalized = Self::normalize(raw);
        if upi_pattern().is_match(&normalized) {
            return Outcome::Accepted { value: normalized };
        }

        // Soft-fail repairs: drop interior whitespace, then shed stray edge
        // punctuation. The PSP suffix is word characters only, so trailing
        // dots can never be legitimate.
        let mut reasons: Vec<&str> = Vec::new();
        let mut repaired = normalized.clone();
        if repaired.chars().any(char::is_whitespace) {
            repaired.retain(|c| !c.is_whitespace());
            reasons.push("removed stray whitespace");
        }
        let trimmed = repaired
            .trim_matches(|c| STRAY_EDGES.contains(&c))
            .trim_end_matches('.');
        if trimmed.len() != repaired.len() {
            reasons.push("stripped surrounding punctuation");
        }
        let repaired = trimmed.to_string();

        if !reasons.is_empty() && upi_pattern().is_match(&repaired) {
            return Outcome::SoftFail {
                value: repaired,
                reason: format!("{} from UPI handle", reasons.join(" and ")),
            };
        }

        let reason = if !normalized.contains('@') {
            "missing '@' separator between handle and PSP suffix".to_string()
        } else {
            "does not match the local-part@psp-suffix shape".to_string()
        };
        Outcome::Rejected { reason }
    }

    fn canonicalize(&self, value: &str) -> String {
        let mut canonical = value.trim().to_lowercase();
        canonical.retain(|c| !c.is_whitespace());
        canonical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(raw: &str) -> Outcome {
        UpiValidator.validate(raw)
    }

    #[test]
    fn plain_handle_is_accepted() {
        assert_eq!(
            validate("scammer@okaxis"),
            Outcome::Accepted {
                value: "scammer@okaxis".to_string()
            }
        );
    }

    #[test]
    fn case_folding_is_normalization_not_repair() {
        assert_eq!(
            validate("  Scammer.01@YBL "),
            Outcome::Accepted {
                value: "scammer.01@ybl".to_string()
            }
        );
    }

    #[test]
    fn interior_whitespace_soft_fails_with_reason() {
        let outcome = validate("scammer @okaxis");
        let Outcome::SoftFail { value, reason } = outcome else {
            panic!("expected soft-fail, got {outcome:?}");
        };
        assert_eq!(value, "scammer@okaxis");
        assert!(reason.contains("whitespace"));
    }

    #[test]
    fn trailing_punctuation_soft_fails() {
        let outcome = validate("scammer@okaxis.");
        assert_eq!(outcome.value(), Some("scammer@okaxis"));
        assert!(!outcome.is_accepted());
    }

    #[test]
    fn missing_at_is_rejected() {
        let outcome = validate("scammer-okaxis");
        let Outcome::Rejected { reason } = outcome else {
            panic!("expected rejection, got {outcome:?}");
        };
        assert!(reason.contains('@'));
    }

    #[test]
    fn psp_suffix_with_dots_is_rejected() {
        // An email-style domain is not a PSP suffix.
        assert!(validate("someone@gmail.com").is_rejected());
    }

    #[test]
    fn canonical_form_is_case_folded() {
        assert_eq!(
            UpiValidator.canonicalize("Scammer@OkAxis"),
            "scammer@okaxis"
        );
    }
}
