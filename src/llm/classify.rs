//! Heuristic failure classification.
//!
//! DESIGN
//! ======
//! Providers report the same conditions inconsistently: Gemini answers a
//! quota breach with `429 RESOURCE_EXHAUSTED`, xAI sometimes with a 400 and a
//! "rate limit" message, and an unknown model shows up as either a 404 or a
//! 400 mentioning "does not exist". The table below maps status codes and
//! lower-cased message fragments to a [`FailureKind`]. Rules are checked in
//! order and the first match wins; anything unmatched is a transport error.

use super::types::FailureKind;

/// One row of the classification table.
#[derive(Debug, Clone, Copy)]
pub struct FailureRule {
    pub kind: FailureKind,
    pub statuses: &'static [u16],
    pub needles: &'static [&'static str],
}

pub const FAILURE_RULES: &[FailureRule] = &[
    FailureRule {
        kind: FailureKind::RateLimited,
        statuses: &[429],
        needles: &["quota", "rate limit", "rate_limit", "resource_exhausted", "too many requests"],
    },
    FailureRule {
        kind: FailureKind::ModelUnavailable,
        statuses: &[404],
        needles: &["not found", "does not exist", "not_found", "unknown model"],
    },
    FailureRule {
        kind: FailureKind::ServerOverloaded,
        statuses: &[503, 529],
        needles: &["overloaded", "unavailable"],
    },
];

/// Classify a failure from an optional HTTP status and a message/body.
#[must_use]
pub fn classify(status: Option<u16>, message: &str) -> FailureKind {
    classify_with(FAILURE_RULES, status, message)
}

/// Classify against an explicit rule table.
#[must_use]
pub fn classify_with(rules: &[FailureRule], status: Option<u16>, message: &str) -> FailureKind {
    let lower = message.to_ascii_lowercase();
    rules
        .iter()
        .find(|rule| {
            status.is_some_and(|s| rule.statuses.contains(&s)) || rule.needles.iter().any(|n| lower.contains(n))
        })
        .map_or(FailureKind::TransportError, |rule| rule.kind)
}

#[cfg(test)]
#[path = "classify_test.rs"]
mod tests;
