// File: classify.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

//! Decision table turning a pair of fetch outcomes into one verdict.

use crate::outcome::FetchOutcome;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ValidationState {
    #[serde(rename = "PASS")]
    Pass,
    #[serde(rename = "FETCH_ERROR")]
    FetchError,
    #[serde(rename = "STATUS_NOT_MATCH")]
    StatusNotMatch,
    #[serde(rename = "EMPTY_CONTENT")]
    EmptyContent,
    #[serde(rename = "STATUS_NOT_200/206_SKIP")]
    StatusNot200Or206Skip,
    #[serde(rename = "CONTENT_NOT_MATCH")]
    ContentNotMatch,
}

impl ValidationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationState::Pass => "PASS",
            ValidationState::FetchError => "FETCH_ERROR",
            ValidationState::StatusNotMatch => "STATUS_NOT_MATCH",
            ValidationState::EmptyContent => "EMPTY_CONTENT",
            ValidationState::StatusNot200Or206Skip => "STATUS_NOT_200/206_SKIP",
            ValidationState::ContentNotMatch => "CONTENT_NOT_MATCH",
        }
    }

    pub fn is_divergent(&self) -> bool {
        *self != ValidationState::Pass
    }
}

impl fmt::Display for ValidationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct Rule {
    pub state: ValidationState,
    pub matches: fn(&FetchOutcome, &FetchOutcome) -> bool,
}

/// Evaluated top to bottom; the first matching rule decides. Later rules may
/// assume every earlier rule did not match.
pub static RULES: [Rule; 5] = [
    Rule {
        state: ValidationState::FetchError,
        matches: either_failed,
    },
    Rule {
        state: ValidationState::StatusNotMatch,
        matches: status_differs,
    },
    Rule {
        state: ValidationState::EmptyContent,
        matches: either_body_absent,
    },
    Rule {
        state: ValidationState::StatusNot200Or206Skip,
        matches: status_not_comparable,
    },
    Rule {
        state: ValidationState::ContentNotMatch,
        matches: bodies_differ,
    },
];

pub fn classify(baseline: &FetchOutcome, test: &FetchOutcome) -> ValidationState {
    RULES
        .iter()
        .find(|rule| (rule.matches)(baseline, test))
        .map_or(ValidationState::Pass, |rule| rule.state)
}

fn either_failed(baseline: &FetchOutcome, test: &FetchOutcome) -> bool {
    baseline.is_error() || test.is_error()
}

fn status_differs(baseline: &FetchOutcome, test: &FetchOutcome) -> bool {
    baseline.status() != test.status()
}

fn either_body_absent(baseline: &FetchOutcome, test: &FetchOutcome) -> bool {
    baseline.body().is_none() || test.body().is_none()
}

fn status_not_comparable(baseline: &FetchOutcome, _test: &FetchOutcome) -> bool {
    !matches!(baseline.status(), 200 | 206)
}

fn bodies_differ(baseline: &FetchOutcome, test: &FetchOutcome) -> bool {
    match (baseline.body(), test.body()) {
        (Some(b), Some(t)) => !bytes_equal(b, t),
        _ => true,
    }
}

/// Exact comparison: same length and same bytes, no normalization.
pub fn bytes_equal(baseline: &[u8], test: &[u8]) -> bool {
    baseline.len() == test.len() && baseline == test
}

/// SHA-256 of the body as lowercase hex, or `None` when there is no body.
pub fn digest(body: Option<&[u8]>) -> Option<String> {
    body.map(|bytes| format!("{:x}", Sha256::digest(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::FetchError;
    use bytes::Bytes;
    use pretty_assertions::assert_eq;
    use reqwest::header::HeaderMap;
    use rstest::*;

    fn ok(status: u16, body: Option<&'static str>) -> FetchOutcome {
        FetchOutcome::new(
            status,
            HeaderMap::new(),
            body.map(|s| Bytes::from_static(s.as_bytes())),
        )
    }

    fn send_failed() -> FetchOutcome {
        FetchOutcome::failed(0, FetchError::Send("connection refused".to_string()))
    }

    fn read_failed(status: u16) -> FetchOutcome {
        FetchOutcome::failed(status, FetchError::ReadBody("reset".to_string()))
    }

    #[rstest]
    #[case(ok(200, Some("same")), ok(200, Some("same")), ValidationState::Pass)]
    #[case(ok(206, Some("part")), ok(206, Some("part")), ValidationState::Pass)]
    #[case(ok(200, Some("X")), ok(200, Some("Y")), ValidationState::ContentNotMatch)]
    #[case(ok(200, Some("abc")), ok(200, Some("abcd")), ValidationState::ContentNotMatch)]
    #[case(ok(206, Some("a")), ok(206, Some("b")), ValidationState::ContentNotMatch)]
    #[case(ok(200, Some("X")), ok(404, Some("X")), ValidationState::StatusNotMatch)]
    #[case(ok(200, None), ok(500, None), ValidationState::StatusNotMatch)]
    #[case(ok(404, None), ok(404, None), ValidationState::EmptyContent)]
    #[case(ok(200, Some("X")), ok(200, None), ValidationState::EmptyContent)]
    #[case(ok(200, None), ok(200, Some("X")), ValidationState::EmptyContent)]
    #[case(ok(500, Some("err")), ok(500, Some("err")), ValidationState::StatusNot200Or206Skip)]
    #[case(ok(404, Some("a")), ok(404, Some("b")), ValidationState::StatusNot200Or206Skip)]
    #[case(ok(304, Some("a")), ok(304, Some("a")), ValidationState::StatusNot200Or206Skip)]
    #[case(send_failed(), ok(200, Some("X")), ValidationState::FetchError)]
    #[case(ok(200, Some("X")), send_failed(), ValidationState::FetchError)]
    #[case(send_failed(), send_failed(), ValidationState::FetchError)]
    #[case(read_failed(200), ok(200, Some("X")), ValidationState::FetchError)]
    fn test_classification_table(
        #[case] baseline: FetchOutcome,
        #[case] test: FetchOutcome,
        #[case] expected: ValidationState,
    ) {
        assert_eq!(classify(&baseline, &test), expected);
    }

    #[test]
    fn test_rule_order_is_fixed() {
        let order: Vec<ValidationState> = RULES.iter().map(|rule| rule.state).collect();
        assert_eq!(
            order,
            vec![
                ValidationState::FetchError,
                ValidationState::StatusNotMatch,
                ValidationState::EmptyContent,
                ValidationState::StatusNot200Or206Skip,
                ValidationState::ContentNotMatch,
            ]
        );
    }

    #[test]
    fn test_fetch_error_wins_over_everything() {
        // The failed side reports status 0, which would also be a status mismatch.
        assert_eq!(
            classify(&send_failed(), &ok(500, None)),
            ValidationState::FetchError
        );
    }

    #[test]
    fn test_state_strings() {
        assert_eq!(ValidationState::Pass.to_string(), "PASS");
        assert_eq!(
            ValidationState::StatusNot200Or206Skip.as_str(),
            "STATUS_NOT_200/206_SKIP"
        );
        assert_eq!(
            serde_json::to_string(&ValidationState::ContentNotMatch).unwrap(),
            "\"CONTENT_NOT_MATCH\""
        );
        assert!(!ValidationState::Pass.is_divergent());
        assert!(ValidationState::EmptyContent.is_divergent());
    }

    #[test]
    fn test_digest_is_pure() {
        let first = digest(Some(&b"hello"[..])).unwrap();
        let second = digest(Some(&b"hello"[..])).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_ne!(first, digest(Some(&b"hello!"[..])).unwrap());
        assert_eq!(digest(None), None);
    }

    #[test]
    fn test_bytes_equal_is_exact() {
        assert!(bytes_equal(b"a b", b"a b"));
        assert!(!bytes_equal(b"a b", b"a  b"));
        assert!(!bytes_equal(b"A", b"a"));
        assert!(!bytes_equal(b"x", b"x\n"));
    }
}
