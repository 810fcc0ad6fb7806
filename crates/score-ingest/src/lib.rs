#![deny(warnings)]

//! Free-text score ingestion with an advisory PII pre-filter.
//!
//! Raw text is scanned for obvious personal-information patterns before
//! any parsing happens; a match rejects the whole batch. The scan is a
//! best-effort heuristic, not a security boundary.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::warn;

/// Errors produced while ingesting a score batch.
#[derive(Debug, Error, PartialEq)]
pub enum IngestError {
    /// The PII heuristic matched; the batch is rejected wholesale.
    #[error("possible personal information detected: {}", reasons.join("; "))]
    PossiblePii { reasons: Vec<String> },
    /// One or more tokens failed to parse as integers.
    #[error("non-numeric tokens: {}", tokens.join(", "))]
    Format { tokens: Vec<String> },
}

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("email pattern"));

static NAME_WITH_SCORE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z]+\s+[A-Za-z]+\s+\d+\b").expect("name pattern"));

static SURNAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b(?:{})\b", COMMON_SURNAMES.join("|"))).expect("surname pattern")
});

// US-census common surnames plus the two canonical first names; matched
// case-insensitively as whole words.
const COMMON_SURNAMES: &[&str] = &[
    "john", "jane", "smith", "jones", "williams", "brown", "davis", "miller", "wilson", "moore",
    "taylor", "anderson", "thomas", "jackson", "white", "harris", "martin", "thompson", "garcia",
    "martinez", "robinson", "clark", "rodriguez", "lewis", "lee", "walker", "hall", "allen",
    "young", "hernandez", "king", "wright", "lopez", "hill", "scott", "green", "adams", "baker",
    "gonzalez", "nelson", "carter", "mitchell", "perez", "roberts", "turner", "phillips",
    "campbell", "parker", "evans", "edwards", "collins", "stewart", "sanchez", "morris", "rogers",
    "reed", "cook", "morgan", "bell", "murphy", "bailey", "rivera", "cooper", "richardson", "cox",
    "howard", "ward", "torres", "peterson", "gray", "ramirez", "james", "watson", "brooks",
    "kelly", "sanders", "price", "bennett", "wood", "barnes", "ross", "henderson", "coleman",
    "jenkins", "perry", "powell", "long", "patterson", "hughes", "flores", "washington", "butler",
    "simmons", "foster", "gonzales", "bryant", "alexander", "russell", "griffin", "diaz", "hayes",
];

/// Scan raw text for personal-information patterns.
///
/// Returns one human-readable reason per matching pattern; empty means the
/// text looks safe. Known gaps: common surnames used as ordinary words
/// trigger false positives, and uncommon names pass straight through.
pub fn scan_pii(text: &str) -> Vec<String> {
    let mut reasons = Vec::new();
    if EMAIL_RE.is_match(text) {
        reasons.push("email address detected".to_string());
    }
    if NAME_WITH_SCORE_RE.is_match(text) {
        reasons.push("name with score pattern detected".to_string());
    }
    if SURNAME_RE.is_match(text) {
        reasons.push("potential name detected - only enter numerical scores".to_string());
    }
    reasons
}

/// Parse a free-text score batch into integers.
///
/// The PII scan runs first over the raw text, so `"John 95"` reports
/// `PossiblePii` rather than a format error. Tokens are split on any run
/// of commas, whitespace, or newlines; empty tokens are dropped; every
/// remaining token must parse as an integer.
pub fn parse_scores(raw_text: &str) -> Result<Vec<i64>, IngestError> {
    let reasons = scan_pii(raw_text);
    if !reasons.is_empty() {
        warn!(?reasons, "rejecting score batch");
        return Err(IngestError::PossiblePii { reasons });
    }

    let mut scores = Vec::new();
    let mut bad_tokens = Vec::new();
    for token in raw_text.split(|c: char| c == ',' || c.is_whitespace()) {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        match token.parse::<i64>() {
            Ok(score) => scores.push(score),
            Err(_) => bad_tokens.push(token.to_string()),
        }
    }
    if !bad_tokens.is_empty() {
        warn!(n_bad = bad_tokens.len(), "rejecting score batch");
        return Err(IngestError::Format { tokens: bad_tokens });
    }
    Ok(scores)
}
