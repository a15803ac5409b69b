//! Bank account number validation: a digit run of 9–18 digits.

use super::{FieldValidator, Outcome};
use crate::engine::FieldKind;

const MIN_DIGITS: usize = 9;
const MAX_DIGITS: usize = 18;

pub struct BankAccountValidator;

/// Map one OCR-style letter confusion back to its digit, if safe.
fn ocr_digit(c: char) -> Option<char> {
    match c {
        'O' | 'o' => Some('0'),
        'l' | 'I' => Some('1'),
        _ => None,
    }
}

impl FieldValidator for BankAccountValidator {
    fn kind(&self) -> FieldKind {
        FieldKind::BankAccount
    }

    fn validate(&self, raw: &str) -> Outcome {
        let trimmed = raw.trim();
        if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
            return if (MIN_DIGITS..=MAX_DIGITS).contains(&trimmed.len()) {
                Outcome::Accepted {
                    value: trimmed.to_string(),
                }
            } else {
                Outcome::Rejected {
                    reason: format!(
                        "account number must be {}-{} digits, got {}",
                        MIN_DIGITS,
                        MAX_DIGITS,
                        trimmed.len()
                    ),
                }
            };
        }

        // Repairs: drop separators scammers dictate in groups, undo the
        // common O/0 and l/1 confusions. Anything else is unrepairable.
        let mut digits = String::with_capacity(trimmed.len());
        let mut stripped_separators = false;
        let mut repaired_ocr = false;
        for c in trimmed.chars() {
            if c.is_ascii_digit() {
                digits.push(c);
            } else if c == ' ' || c == '-' {
                stripped_separators = true;
            } else if let Some(d) = ocr_digit(c) {
                digits.push(d);
                repaired_ocr = true;
            } else {
                return Outcome::Rejected {
                    reason: format!("contains '{}', which cannot belong to an account number", c),
                };
            }
        }

        if !(MIN_DIGITS..=MAX_DIGITS).contains(&digits.len()) {
            return Outcome::Rejected {
                reason: format!(
                    "digit run is {} digits after cleanup, outside the {}-{} band",
                    digits.len(),
                    MIN_DIGITS,
                    MAX_DIGITS
                ),
            };
        }

        let mut reasons: Vec<&str> = Vec::new();
        if stripped_separators {
            reasons.push("stripped separators");
        }
        if repaired_ocr {
            reasons.push("corrected letter-for-digit confusion");
        }
        Outcome::SoftFail {
            value: digits,
            reason: format!("{} in account number", reasons.join(" and ")),
        }
    }

    fn canonicalize(&self, value: &str) -> String {
        value
            .trim()
            .chars()
            .filter(|c| *c != ' ' && *c != '-')
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(raw: &str) -> Outcome {
        BankAccountValidator.validate(raw)
    }

    #[test]
    fn plain_digit_run_is_accepted() {
        assert_eq!(
            validate("123456789012"),
            Outcome::Accepted {
                value: "123456789012".to_string()
            }
        );
    }

    #[test]
    fn grouped_digits_soft_fail_to_stripped_run() {
        let outcome = validate("1234 5678 90");
        let Outcome::SoftFail { value, reason } = outcome else {
            panic!("expected soft-fail, got {outcome:?}");
        };
        assert_eq!(value, "1234567890");
        assert!(reason.contains("separators"));
    }

    #[test]
    fn ocr_confusions_are_repaired() {
        let outcome = validate("12345678O1");
        assert_eq!(outcome.value(), Some("1234567801"));
        assert!(!outcome.is_accepted());
    }

    #[test]
    fn too_short_run_is_rejected() {
        assert!(validate("12345678").is_rejected());
    }

    #[test]
    fn too_long_run_is_rejected_even_after_repair() {
        assert!(validate("1234 5678 9012 3456 789").is_rejected());
    }

    #[test]
    fn arbitrary_letters_are_never_repaired() {
        let Outcome::Rejected { reason } = validate("12345678X9") else {
            panic!("expected rejection");
        };
        assert!(reason.contains('X'));
    }

    #[test]
    fn canonical_form_strips_separators() {
        assert_eq!(
            BankAccountValidator.canonicalize("1234-5678-90"),
            "1234567890"
        );
    }
}
