//! Persona script tables — staged replies, clarification prompts, and
//! language hinting for the bundled template generator.
//!
//! The persona is Mrs. Shanthi, a retired teacher who is delighted about
//! the prize, hopeless with technology, and very slow at writing down
//! numbers. None of this is engine logic; the tables only feed reply text.

use crate::engine::{FieldKind, Stage};

/// Scripted reply for a stage, used when no model-backed generator is
/// available (and as the fallback when one fails).
pub fn stage_reply(stage: Stage) -> &'static str {
    match stage {
        Stage::Hook => {
            "Aiyyo! This is very interesting, beta! I am very excited to hear more! \
             Please tell me all the details about this opportunity?"
        }
        Stage::Friction => {
            "Beta, I want to do this but my grandson installed some NetProtect software \
             and it is showing warnings. I am not good with technology. \
             Is there some other way I can proceed?"
        }
        Stage::Pivot => {
            "I am trying to pay, but my grandson is not here to help me. Can you give me \
             your UPI ID or Bank account? My neighbor Lakshmi's son said he can do the \
             transfer for me if I give him the details."
        }
        Stage::Extract => {
            "Let me write this down slowly, beta... Can you repeat that again? \
             My eyes are not so good nowadays."
        }
    }
}

/// Clarification prompts per field, echoed back when a soft-fail repair
/// wants a one-turn confirmation instead of silently trusting guessed data.
fn clarification_table(kind: FieldKind) -> &'static [&'static str] {
    match kind {
        FieldKind::Upi => &[
            "Aiyyo, my eyes are not so good. You said '{value}'? Is that correct, beta?",
            "Sorry beta, network issue. Can you type the UPI ID again slowly?",
            "One second, let me get my reading glasses... '{value}' - correct?",
        ],
        FieldKind::BankAccount => &[
            "Beta, this is 10 digit or 12 digit? Let me write slowly... '{value}', no?",
            "My hand is shaking, can you repeat the account number one more time?",
            "Lakshmi's son is asking - is this savings account or current account?",
        ],
        FieldKind::Ifsc => &[
            "IFSC code - is it starting with your bank name? Like SBIN or HDFC?",
            "Beta, slowly tell - first 4 letters of IFSC? I wrote '{value}'.",
        ],
        FieldKind::Link => &[
            "Beta, the link is not opening on my phone. Can you send '{value}' once more?",
        ],
    }
}

/// A clarification prompt for a repaired value, rotated by turn so the
/// persona does not repeat itself verbatim.
pub fn clarification_prompt(kind: FieldKind, value: &str, turn: u32) -> String {
    let prompts = clarification_table(kind);
    let template = prompts[(turn as usize) % prompts.len()];
    template.replace("{value}", value)
}

/// Common-word hints per language, matched against the lowercased message.
const LANGUAGE_HINTS: &[(&str, &[&str])] = &[
    (
        "hindi",
        &[
            "kya", "hai", "aap", "karo", "bhejo", "paisa", "rupay", "kaise", "mujhe", "aapka",
        ],
    ),
    (
        "tamil",
        &[
            "enna", "panna", "vaanga", "panam", "eppadi", "sollunga", "nandri",
        ],
    ),
    ("telugu", &["emi", "cheyandi", "pampandi", "dabbu", "ela", "mee"]),
    ("malayalam", &["enthu", "cheyyuka", "paisa", "engane", "ningal"]),
];

/// Keyword-count language guess. Falls back to english; accuracy is not a
/// goal, the label only flavors the reply and the session listing.
pub fn detect_language(text: &str) -> &'static str {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let mut best = ("english", 0usize);
    for &(lang, hints) in LANGUAGE_HINTS {
        let score = words.iter().filter(|w| hints.contains(*w)).count();
        if score > best.1 {
            best = (lang, score);
        }
    }
    best.0
}
