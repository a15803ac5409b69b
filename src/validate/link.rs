//! Phishing link validation: well-formed URL with an explicit
//! http/https scheme.

use regex::Regex;
use std::sync::OnceLock;

use super::{FieldValidator, Outcome};
use crate::engine::FieldKind;

fn url_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^https?://[^\s<>"{}|\\^`\[\]]+$"#).expect("url pattern")
    })
}

/// Wrappers and trailing punctuation that chat clients glue onto pasted URLs.
const WRAPPERS: &[char] = &['<', '>', '(', ')', '[', ']', '"', '\''];
const TRAILERS: &[char] = &['.', ',', ';', ':', '!', '?'];

pub struct LinkValidator;

fn has_host(url: &str) -> bool {
    url.split_once("://")
        .map(|(_, rest)| !rest.is_empty() && !rest.starts_with('/'))
        .unwrap_or(false)
}

/// Lowercase the scheme and host portions, leaving path/query untouched.
fn fold_scheme_and_host(url: &str) -> String {
    match url.split_once("://") {
        Some((scheme, rest)) => {
            let (host, path) = match rest.find('/') {
                Some(i) => rest.split_at(i),
                None => (rest, ""),
            };
            format!("{}://{}{}", scheme.to_lowercase(), host.to_lowercase(), path)
        }
        None => url.to_string(),
    }
}

impl FieldValidator for LinkValidator {
    fn kind(&self) -> FieldKind {
        FieldKind::Link
    }

    fn validate(&self, raw: &str) -> Outcome {
        let trimmed = raw.trim();
        if url_pattern().is_match(trimmed) && has_host(trimmed) {
            return Outcome::Accepted {
                value: trimmed.to_string(),
            };
        }

        // Repairs: shed wrappers and trailing punctuation, fold an
        // upper-cased scheme. Scheme typos ("htp:/") stay rejected — guessing
        // a scheme would fabricate data the scammer never sent.
        let mut reasons: Vec<&str> = Vec::new();
        let unwrapped = trimmed.trim_matches(|c| WRAPPERS.contains(&c));
        if unwrapped.len() != trimmed.len() {
            reasons.push("removed wrapping characters");
        }
        let clipped = unwrapped.trim_end_matches(|c| TRAILERS.contains(&c));
        if clipped.len() != unwrapped.len() {
            reasons.push("stripped trailing punctuation");
        }
        let mut repaired = clipped.to_string();
        let scheme_upper = repaired
            .split_once("://")
            .map(|(s, _)| s.chars().any(|c| c.is_ascii_uppercase()))
            .unwrap_or(false);
        if scheme_upper {
            repaired = fold_scheme_and_host(&repaired);
            reasons.push("folded scheme casing");
        }

        if !reasons.is_empty() && url_pattern().is_match(&repaired) && has_host(&repaired) {
            return Outcome::SoftFail {
                value: repaired,
                reason: format!("{} in URL", reasons.join(" and ")),
            };
        }

        let reason = if !trimmed.contains("://")
            || !(repaired.starts_with("http://") || repaired.starts_with("https://"))
        {
            "URL must carry an explicit http or https scheme".to_string()
        } else if !has_host(&repaired) {
            "URL has no host".to_string()
        } else {
            "URL contains characters that cannot appear in a link".to_string()
        };
        Outcome::Rejected { reason }
    }

    fn canonicalize(&self, value: &str) -> String {
        let folded = fold_scheme_and_host(value.trim());
        folded.trim_end_matches('/').to_string()
    }
}
