//! Response classification into vulnerability signals.
//!
//! Pure and stateless: the same `(status, body, payload)` triple always
//! yields the same signal.

use serde::{Deserialize, Serialize};

/// Backend error fingerprints indicating an injection payload reached a
/// database engine. Matched case-insensitively against the response body.
const ERROR_FINGERPRINTS: &[&str] = &[
    "sql syntax",
    "mysql_fetch",
    "ora-",
    "postgresql",
    "sqlite",
    "warning: mysql",
    "microsoft ole db",
];

/// Classification of a single probe response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// The response exposes a vulnerability: the payload was reflected
    /// verbatim, or a backend error fingerprint leaked through.
    Vulnerable,
    /// The target rejected or errored on the request without leaking
    /// anything (400, 403, or 500 with a clean body).
    Detected,
    /// Nothing noteworthy.
    Neutral,
}

/// Classifies one raw HTTP response against the payload that produced it.
///
/// Evaluation order matters: a reflected payload or fingerprint match is
/// `Vulnerable` even when the status would otherwise read as `Detected`.
#[must_use]
pub fn classify_response(status: u16, body: &str, payload: &str) -> Signal {
    if body.contains(payload) {
        return Signal::Vulnerable;
    }

    let lowered = body.to_lowercase();
    if ERROR_FINGERPRINTS.iter().any(|f| lowered.contains(f)) {
        return Signal::Vulnerable;
    }

    match status {
        400 | 403 | 500 => Signal::Detected,
        _ => Signal::Neutral,
    }
}
