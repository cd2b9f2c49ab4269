//! Probe engine: time-boxed, concurrency-controlled attack simulation.
//!
//! Five probe strategies (flood, injection, reflection, credential-guess,
//! port-sweep), each a function of `(target, intensity, duration)` yielding
//! a [`ProbeResult`]. Strategies share the [`RateScheduler`] for pacing and
//! never surface per-attempt network failures: only request preconditions
//! (missing target, out-of-range intensity) are errors.

pub mod classify;
pub mod credential;
pub mod flood;
pub mod injection;
pub mod payloads;
pub mod portsweep;
pub mod reflection;
pub mod scheduler;

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::info;

pub use classify::{Signal, classify_response};
pub use scheduler::RateScheduler;

use crate::config::ProbeConfig;
use crate::error::ProbeError;

// ============================================================================
// Attack request
// ============================================================================

/// The simulated attack categories.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum, Default,
)]
#[serde(rename_all = "kebab-case")]
#[clap(rename_all = "kebab-case")]
pub enum AttackKind {
    /// Concurrent idempotent read flood.
    #[default]
    Flood,
    /// SQL injection attempts against conventional query parameters.
    Injection,
    /// Script/markup reflection probes.
    Reflection,
    /// Common-credential login attempts.
    CredentialGuess,
    /// TCP connect sweep over a candidate port list.
    PortSweep,
    /// Unrecognized kind; simulated without network activity.
    Other,
}

impl AttackKind {
    /// Stable kebab-case name, matching the serialized form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Flood => "flood",
            Self::Injection => "injection",
            Self::Reflection => "reflection",
            Self::CredentialGuess => "credential-guess",
            Self::PortSweep => "port-sweep",
            Self::Other => "other",
        }
    }

    /// Whether this kind performs real network operations and therefore
    /// requires a target.
    #[must_use]
    pub const fn requires_target(self) -> bool {
        !matches!(self, Self::Other)
    }
}

impl std::fmt::Display for AttackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared attack to simulate against a target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackRequest {
    /// Attack category.
    pub kind: AttackKind,
    /// Target URL or host. Required for every kind except `other`.
    #[serde(default)]
    pub target: Option<String>,
    /// Intensity on a 1–10 scale; drives batch and payload-slice sizing.
    pub intensity: u8,
    /// Wall-clock run duration in seconds.
    pub duration_secs: u64,
    /// Opaque caller-supplied parameters, carried into the assessment.
    #[serde(default)]
    pub parameters: HashMap<String, serde_json::Value>,
    /// Caller-supplied port list for port sweeps. Defaults to the
    /// well-known table when absent.
    #[serde(default)]
    pub ports: Option<Vec<u16>>,
}

impl AttackRequest {
    /// Validates request preconditions.
    ///
    /// Runs synchronously before any probing starts, so a rejected
    /// request never causes network traffic.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] naming the violated precondition.
    pub fn validate(&self) -> Result<(), ProbeError> {
        if !(1..=10).contains(&self.intensity) {
            return Err(ProbeError::IntensityOutOfRange {
                value: self.intensity,
            });
        }
        if self.duration_secs == 0 {
            return Err(ProbeError::ZeroDuration);
        }
        if self.kind.requires_target() && self.target.as_deref().is_none_or(str::is_empty) {
            return Err(ProbeError::MissingTarget {
                kind: self.kind.to_string(),
            });
        }
        Ok(())
    }

    /// Wall-clock duration of the run.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    fn required_target(&self) -> Result<&str, ProbeError> {
        self.target
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ProbeError::MissingTarget {
                kind: self.kind.to_string(),
            })
    }
}

// ============================================================================
// Probe result
// ============================================================================

/// An open port found by a sweep, with its conventional service name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortReport {
    /// Port number.
    pub port: u16,
    /// Conventional service name (`"Unknown"` when unmapped).
    pub service: String,
}

/// Raw per-run outcome of one probe, with kind-specific counters.
///
/// Counters only ever increase while a run executes and are frozen in
/// the returned value once the run ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ProbeResult {
    /// Flood outcome: volumetric counters and achieved throughput.
    Flood {
        /// Total requests dispatched.
        requests_sent: u64,
        /// Responses with a non-server-error status.
        successful: u64,
        /// Server errors plus transport-level failures and timeouts.
        failed: u64,
        /// Wall-clock seconds the run took.
        elapsed_secs: f64,
        /// `requests_sent / elapsed_secs`.
        average_rps: f64,
    },
    /// Injection outcome.
    Injection {
        /// Payloads tried (one increment per payload, not per parameter).
        attempts: u64,
        /// Responses that rejected or errored on a payload.
        detected: u64,
        /// Responses matching a backend error fingerprint.
        vulnerable: u64,
        /// Wall-clock seconds the run took.
        elapsed_secs: f64,
    },
    /// Reflection outcome.
    Reflection {
        /// Payloads tried.
        attempts: u64,
        /// Responses that rejected or errored on a payload.
        detected: u64,
        /// Responses reflecting a payload verbatim.
        vulnerable: u64,
        /// Wall-clock seconds the run took.
        elapsed_secs: f64,
    },
    /// Credential-guess outcome.
    CredentialGuess {
        /// Login attempts submitted.
        attempts: u64,
        /// Responses indicating active throttling (429 or 403).
        blocked: u64,
        /// Wall-clock seconds the run took.
        elapsed_secs: f64,
    },
    /// Port-sweep outcome. Every scanned port appears in exactly one of
    /// `open`, `closed`, or `filtered`.
    PortSweep {
        /// Host the sweep resolved to.
        host: String,
        /// Ports that accepted a TCP connection.
        open: Vec<PortReport>,
        /// Ports that cleanly refused the connection.
        closed: Vec<u16>,
        /// Ports whose connect attempt failed with a resolution or other
        /// transport error (including timeout).
        filtered: Vec<u16>,
        /// Ports actually visited.
        total_scanned: usize,
        /// Wall-clock seconds the sweep took.
        elapsed_secs: f64,
    },
    /// Placeholder outcome for unrecognized kinds.
    Simulated {
        /// Requested duration, echoed back.
        duration_secs: u64,
    },
}

// ============================================================================
// Engine
// ============================================================================

/// Executes probe strategies against live targets.
///
/// Holds two pre-built HTTP clients: one following redirects (GET
/// probes) and one that does not (credential POSTs, where a redirect is
/// itself signal). Both skip TLS certificate verification because probe
/// targets are arbitrary research hosts.
#[derive(Debug)]
pub struct ProbeEngine {
    config: ProbeConfig,
    http: reqwest::Client,
    http_no_redirect: reqwest::Client,
}

impl ProbeEngine {
    /// Creates an engine with the given pacing configuration.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP clients cannot be built (should never happen).
    #[must_use]
    pub fn new(config: ProbeConfig) -> Self {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .expect("failed to build HTTP client");
        let http_no_redirect = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("failed to build HTTP client");
        Self {
            config,
            http,
            http_no_redirect,
        }
    }

    /// Dispatches a validated request to its strategy.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] on precondition violations only;
    /// per-attempt network failures are folded into the result counters.
    pub async fn run(&self, request: &AttackRequest) -> Result<ProbeResult, ProbeError> {
        request.validate()?;

        info!(
            kind = %request.kind,
            intensity = request.intensity,
            duration_secs = request.duration_secs,
            "probe starting"
        );

        match request.kind {
            AttackKind::Flood => {
                self.flood(request.required_target()?, request.intensity, request.duration())
                    .await
            }
            AttackKind::Injection => {
                self.injection(request.required_target()?, request.intensity, request.duration())
                    .await
            }
            AttackKind::Reflection => {
                self.reflection(request.required_target()?, request.intensity, request.duration())
                    .await
            }
            AttackKind::CredentialGuess => {
                self.credential_guess(
                    request.required_target()?,
                    request.intensity,
                    request.duration(),
                )
                .await
            }
            AttackKind::PortSweep => {
                self.port_sweep(
                    request.required_target()?,
                    request.ports.as_deref(),
                    request.duration(),
                )
                .await
            }
            AttackKind::Other => {
                // No strategy for this kind; hold the slot briefly, never
                // past the declared duration, so the run still produces a
                // terminal record.
                tokio::time::sleep(Duration::from_secs(2).min(request.duration())).await;
                Ok(ProbeResult::Simulated {
                    duration_secs: request.duration_secs,
                })
            }
        }
    }

    pub(crate) const fn config(&self) -> &ProbeConfig {
        &self.config
    }

    pub(crate) const fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) const fn http_no_redirect(&self) -> &reqwest::Client {
        &self.http_no_redirect
    }
}

// ============================================================================
// Target parsing
// ============================================================================

/// Interprets a target string as a URL, defaulting the scheme to `http`.
pub(crate) fn url_for(target: &str) -> Result<Url, ProbeError> {
    let candidate = if target.contains("://") {
        target.to_string()
    } else {
        format!("http://{target}")
    };
    Url::parse(&candidate).map_err(|e| ProbeError::InvalidTarget {
        target: target.to_string(),
        message: e.to_string(),
    })
}

/// Extracts the bare host from a target URL or host string.
pub(crate) fn host_of(target: &str) -> Result<String, ProbeError> {
    let url = url_for(target)?;
    url.host_str()
        .map(ToString::to_string)
        .ok_or_else(|| ProbeError::InvalidTarget {
            target: target.to_string(),
            message: "no host component".to_string(),
        })
}
