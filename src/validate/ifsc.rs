//! IFSC routing code validation: 4-letter bank prefix, a literal '0',
//! then 6 alphanumerics — fixed length 11.

use regex::Regex;
use std::sync::OnceLock;

use super::{FieldValidator, Outcome};
use crate::engine::FieldKind;

fn ifsc_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]{4}0[A-Z0-9]{6}$").expect("ifsc pattern"))
}

pub struct IfscValidator;

impl FieldValidator for IfscValidator {
    fn kind(&self) -> FieldKind {
        FieldKind::Ifsc
    }

    fn validate(&self, raw: &str) -> Outcome {
        let normalized = raw.trim().to_uppercase();
        if ifsc_pattern().is_match(&normalized) {
            return Outcome::Accepted { value: normalized };
        }

        // Repairs: scammers tend to dictate codes in spaced groups, and the
        // mandatory fifth-position '0' is routinely transcribed as 'O'.
        let mut repaired: String = normalized
            .chars()
            .filter(|c| *c != ' ' && *c != '-')
            .collect();
        let mut reasons: Vec<&str> = Vec::new();
        if repaired.len() != normalized.len() {
            reasons.push("stripped separators");
        }
        if repaired.len() == 11 && repaired.as_bytes()[4] == b'O' {
            repaired.replace_range(4..5, "0");
            reasons.push("corrected 'O' to '0' in fifth position");
        }

        if !reasons.is_empty() && ifsc_pattern().is_match(&repaired) {
            return Outcome::SoftFail {
                value: repaired,
                reason: format!("{} in IFSC code", reasons.join(" and ")),
            };
        }

        let reason = if repaired.len() != 11 {
            format!("IFSC must be exactly 11 characters, got {}", repaired.len())
        } else if !repaired.chars().take(4).all(|c| c.is_ascii_alphabetic()) {
            "IFSC must start with a 4-letter bank prefix".to_string()
        } else if repaired.as_bytes()[4] != b'0' {
            "fifth character of an IFSC is always '0'".to_string()
        } else {
            "does not match the IFSC shape".to_string()
        };
        Outcome::Rejected { reason }
    }

    fn canonicalize(&self, value: &str) -> String {
        value
            .trim()
            .chars()
            .filter(|c| *c != ' ' && *c != '-')
            .collect::<String>()
            .to_uppercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(raw: &str) -> Outcome {
        IfscValidator.validate(raw)
    }

    #[test]
    fn canonical_code_is_accepted() {
        assert_eq!(
            validate("SBIN0001234"),
            Outcome::Accepted {
                value: "SBIN0001234".to_string()
            }
        );
    }

    #[test]
    fn lowercase_code_is_accepted_uppercased() {
        assert_eq!(
            validate("hdfc0004321"),
            Outcome::Accepted {
                value: "HDFC0004321".to_string()
            }
        );
    }

    #[test]
    fn spaced_groups_soft_fail() {
        let outcome = validate("SBIN 000 1234");
        let Outcome::SoftFail { value, reason } = outcome else {
            panic!("expected soft-fail, got {outcome:?}");
        };
        assert_eq!(value, "SBIN0001234");
        assert!(reason.contains("separators"));
    }

    #[test]
    fn letter_o_in_fifth_position_is_repaired() {
        let outcome = validate("SBINO001234");
        assert_eq!(outcome.value(), Some("SBIN0001234"));
        assert!(!outcome.is_accepted());
    }

    #[test]
    fn wrong_length_is_rejected() {
        let Outcome::Rejected { reason } = validate("SBIN001234") else {
            panic!("expected rejection");
        };
        assert!(reason.contains("11"));
    }

    #[test]
    fn digit_prefix_is_rejected() {
        assert!(validate("1BIN0001234").is_rejected());
    }

    #[test]
    fn nonzero_fifth_character_is_rejected() {
        let Outcome::Rejected { reason } = validate("SBIN1001234") else {
            panic!("expected rejection");
        };
        assert!(reason.contains("'0'"));
    }

    #[test]
    fn canonical_form_uppercases_and_strips() {
        assert_eq!(IfscValidator.canonicalize("sbin 0001234"), "SBIN0001234");
    }
}
