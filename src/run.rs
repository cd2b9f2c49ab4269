//! Run orchestration: probe, assess, decide, record.
//!
//! The [`Runner`] chains one attack run end to end under a fresh run id:
//! request validation, probe execution, threat assessment, adjudication,
//! and persistence of the resulting [`RunRecord`]. Collaborators are
//! injected as trait objects at construction so the storage, defense
//! inventory, and statistics backends stay swappable without globals.
//!
//! Runs spawned with [`Runner::spawn`] detach into a `tokio::spawn` task
//! and always reach a terminal state. A run-level failure marks that run
//! `Failed`; it never panics the process or disturbs other runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::adjudicate::{AdjudicationDecision, decide};
use crate::analyzer::{AttackSignal, ThreatAnalyzer, ThreatAssessment};
use crate::config::{EngineConfig, PolicyConfig};
use crate::error::ProbeError;
use crate::observability::events::{Event, EventSink, LogLevel};
use crate::observability::metrics;
use crate::probe::{AttackRequest, ProbeEngine, ProbeResult};

// ============================================================================
// Run records
// ============================================================================

/// Lifecycle state of an attack run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Spawned and executing.
    Running,
    /// Reached its terminal state with a full result chain.
    Completed,
    /// Terminated by a run-level failure.
    Failed,
}

/// The full record of one attack run.
///
/// The chain `request → result → assessment → decision` fills in as the
/// run progresses; a `Completed` record carries all of it, a `Failed`
/// record carries whatever was produced before the failure plus a
/// message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    /// Run identifier.
    pub run_id: Uuid,
    /// The request that started the run.
    pub request: AttackRequest,
    /// Lifecycle state.
    pub status: RunStatus,
    /// Failure message when `status` is `Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Raw probe outcome.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ProbeResult>,
    /// Threat assessment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment: Option<ThreatAssessment>,
    /// Block/allow decision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<AdjudicationDecision>,
    /// End-to-end latency in milliseconds, set at the terminal state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl RunRecord {
    fn started(run_id: Uuid, request: AttackRequest) -> Self {
        Self {
            run_id,
            request,
            status: RunStatus::Running,
            message: None,
            started_at: Utc::now(),
            result: None,
            assessment: None,
            decision: None,
            latency_ms: None,
        }
    }
}

// ============================================================================
// Injected collaborators
// ============================================================================

/// Persistence for run records.
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Saves a record, replacing any previous state for the same run id.
    async fn save(&self, record: RunRecord);
    /// Fetches a record by run id.
    async fn get(&self, run_id: Uuid) -> Option<RunRecord>;
    /// Lists all records, most recently started first.
    async fn list(&self) -> Vec<RunRecord>;
}

/// In-memory run store backed by a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryRunStore {
    runs: DashMap<Uuid, RunRecord>,
}

impl MemoryRunStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RunStore for MemoryRunStore {
    async fn save(&self, record: RunRecord) {
        self.runs.insert(record.run_id, record);
    }

    async fn get(&self, run_id: Uuid) -> Option<RunRecord> {
        self.runs.get(&run_id).map(|r| r.clone())
    }

    async fn list(&self) -> Vec<RunRecord> {
        let mut records: Vec<RunRecord> = self.runs.iter().map(|r| r.clone()).collect();
        records.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        records
    }
}

/// Inventory of defense mechanisms consulted at decision time.
pub trait DefenseRegistry: Send + Sync {
    /// Names of currently active defenses, in registration order.
    fn active_defenses(&self) -> Vec<String>;
}

/// In-memory defense registry with per-defense toggles.
#[derive(Debug)]
pub struct MemoryDefenseRegistry {
    defenses: Mutex<Vec<(String, bool)>>,
}

impl MemoryDefenseRegistry {
    /// Creates a registry seeded with the default defense set, all
    /// active. Names use the same identifiers the analyzer recommends.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::from_names(&["firewall", "ids", "rate_limiting", "ai_detection"])
    }

    /// Creates a registry with the given defenses, all active.
    #[must_use]
    pub fn from_names(names: &[&str]) -> Self {
        Self {
            defenses: Mutex::new(names.iter().map(|n| ((*n).to_string(), true)).collect()),
        }
    }

    /// Enables or disables a defense by name. Unknown names are ignored.
    pub fn set_enabled(&self, name: &str, enabled: bool) {
        if let Ok(mut defenses) = self.defenses.lock() {
            for (defense, active) in defenses.iter_mut() {
                if defense == name {
                    *active = enabled;
                }
            }
        }
    }
}

impl DefenseRegistry for MemoryDefenseRegistry {
    fn active_defenses(&self) -> Vec<String> {
        self.defenses.lock().map_or_else(
            |_| Vec::new(),
            |defenses| {
                defenses
                    .iter()
                    .filter(|(_, active)| *active)
                    .map(|(name, _)| name.clone())
                    .collect()
            },
        )
    }
}

/// Maximum points retained in the statistics time series.
const STATS_SERIES_CAPACITY: usize = 100;

/// One point in the bounded statistics time series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsPoint {
    /// When the point was taken.
    pub timestamp: DateTime<Utc>,
    /// Runs recorded so far.
    pub total_runs: u64,
    /// Blocked runs so far.
    pub blocked: u64,
}

/// Aggregate run statistics at one instant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Runs recorded.
    pub total_runs: u64,
    /// Runs adjudicated as blocked.
    pub blocked: u64,
    /// Runs that reached the failed state.
    pub failed: u64,
    /// Run counts by attack kind name.
    pub by_kind: HashMap<String, u64>,
    /// Rolling average of end-to-end latency in milliseconds.
    pub average_latency_ms: f64,
    /// Bounded time series of cumulative totals.
    pub series: Vec<StatsPoint>,
}

/// Aggregation of terminal run records.
pub trait StatsCollector: Send + Sync {
    /// Folds one terminal record into the aggregates.
    fn record_run(&self, record: &RunRecord);
    /// Returns the current aggregates.
    fn snapshot(&self) -> StatsSnapshot;
}

/// In-memory statistics collector.
#[derive(Debug, Default)]
pub struct MemoryStats {
    inner: Mutex<StatsSnapshot>,
}

impl MemoryStats {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatsCollector for MemoryStats {
    fn record_run(&self, record: &RunRecord) {
        let Ok(mut stats) = self.inner.lock() else {
            return;
        };

        stats.total_runs += 1;
        if record.status == RunStatus::Failed {
            stats.failed += 1;
        }
        if record.decision.as_ref().is_some_and(|d| d.should_block) {
            stats.blocked += 1;
        }
        *stats
            .by_kind
            .entry(record.request.kind.to_string())
            .or_insert(0) += 1;

        if let Some(latency) = record.latency_ms {
            // Incremental mean over all recorded runs
            #[allow(clippy::cast_precision_loss)]
            let n = stats.total_runs as f64;
            #[allow(clippy::cast_precision_loss)]
            let sample = latency as f64;
            stats.average_latency_ms += (sample - stats.average_latency_ms) / n;
        }

        let point = StatsPoint {
            timestamp: Utc::now(),
            total_runs: stats.total_runs,
            blocked: stats.blocked,
        };
        if stats.series.len() >= STATS_SERIES_CAPACITY {
            stats.series.remove(0);
        }
        stats.series.push(point);
    }

    fn snapshot(&self) -> StatsSnapshot {
        self.inner
            .lock()
            .map_or_else(|_| StatsSnapshot::default(), |stats| stats.clone())
    }
}

// ============================================================================
// Runner
// ============================================================================

/// Handle to a detached run.
#[derive(Debug)]
pub struct RunHandle {
    /// Identifier of the spawned run.
    pub run_id: Uuid,
    /// Join handle resolving to the terminal record.
    pub task: JoinHandle<RunRecord>,
}

/// Orchestrates attack runs end to end.
pub struct Runner {
    engine: ProbeEngine,
    analyzer: ThreatAnalyzer,
    policy: PolicyConfig,
    store: Arc<dyn RunStore>,
    defenses: Arc<dyn DefenseRegistry>,
    stats: Arc<dyn StatsCollector>,
    events: Arc<EventSink>,
    active: AtomicU64,
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("active", &self.active.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl Runner {
    /// Creates a runner with explicit collaborators.
    #[must_use]
    pub fn new(
        config: &EngineConfig,
        store: Arc<dyn RunStore>,
        defenses: Arc<dyn DefenseRegistry>,
        stats: Arc<dyn StatsCollector>,
        events: Arc<EventSink>,
    ) -> Self {
        Self {
            engine: ProbeEngine::new(config.probe.clone()),
            analyzer: ThreatAnalyzer::new(config),
            policy: config.policy.clone(),
            store,
            defenses,
            stats,
            events,
            active: AtomicU64::new(0),
        }
    }

    /// Creates a runner with the in-memory collaborator implementations
    /// and an event stream on stderr.
    #[must_use]
    pub fn with_defaults(config: &EngineConfig) -> Self {
        Self::new(
            config,
            Arc::new(MemoryRunStore::new()),
            Arc::new(MemoryDefenseRegistry::with_defaults()),
            Arc::new(MemoryStats::new()),
            Arc::new(EventSink::stderr()),
        )
    }

    /// The run store this runner persists into.
    #[must_use]
    pub fn store(&self) -> Arc<dyn RunStore> {
        Arc::clone(&self.store)
    }

    /// The statistics collector this runner feeds.
    #[must_use]
    pub fn stats(&self) -> Arc<dyn StatsCollector> {
        Arc::clone(&self.stats)
    }

    /// Validates and detaches a run, returning immediately.
    ///
    /// The returned handle carries the fresh run id; the run itself
    /// proceeds in a spawned task to a terminal state. The task is
    /// supervised: a panic out of the engine or an injected collaborator
    /// still leaves a `Failed` record behind, so a stored run can never
    /// stay `Running` forever. There is no cancellation once started.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when the request fails validation. Nothing
    /// is spawned or recorded in that case.
    pub fn spawn(self: &Arc<Self>, request: AttackRequest) -> Result<RunHandle, ProbeError> {
        request.validate()?;

        let run_id = Uuid::new_v4();
        let runner = Arc::clone(self);
        let task = tokio::spawn(async move {
            let inner_runner = Arc::clone(&runner);
            let inner_request = request.clone();
            let inner =
                tokio::spawn(async move { inner_runner.execute(run_id, inner_request).await });

            match inner.await {
                Ok(record) => record,
                Err(e) => {
                    runner
                        .recover_aborted(run_id, request, format!("run aborted: {e}"))
                        .await
                }
            }
        });

        Ok(RunHandle { run_id, task })
    }

    /// Validates and executes a run inline, returning its terminal
    /// record.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when the request fails validation, before
    /// any network I/O.
    pub async fn run_to_completion(&self, request: AttackRequest) -> Result<RunRecord, ProbeError> {
        request.validate()?;
        Ok(self.execute(Uuid::new_v4(), request).await)
    }

    /// Drives one validated run to its terminal state.
    async fn execute(&self, run_id: Uuid, request: AttackRequest) -> RunRecord {
        let started = std::time::Instant::now();
        let mut record = RunRecord::started(run_id, request);

        self.active.fetch_add(1, Ordering::SeqCst);
        metrics::set_runs_active(self.active.load(Ordering::SeqCst));
        metrics::record_run_started(record.request.kind.as_str());

        self.events.emit(Event::RunStarted {
            timestamp: Utc::now(),
            run_id,
            kind: record.request.kind.to_string(),
            target: record.request.target.clone(),
        });
        self.events.record(
            LogLevel::Info,
            "ATTACK",
            &format!("{} attack started", record.request.kind),
            json!({
                "run_id": run_id,
                "target": record.request.target,
                "intensity": record.request.intensity,
            }),
        );
        self.store.save(record.clone()).await;

        match self.engine.run(&record.request).await {
            Ok(result) => {
                self.events.emit(Event::ProbeCompleted {
                    timestamp: Utc::now(),
                    run_id,
                    duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                });
                metrics::record_probe_requests(
                    record.request.kind.as_str(),
                    requests_in(&result),
                );
                record.result = Some(result);
            }
            Err(e) => {
                warn!(run_id = %run_id, error = %e, "run failed");
                self.finish_failed(&mut record, started, e.to_string()).await;
                return record;
            }
        }

        let signal = AttackSignal::from(&record.request);
        let assessment = self.analyzer.analyze(&signal).await;
        self.events.emit(Event::AssessmentProduced {
            timestamp: Utc::now(),
            run_id,
            threat_level: assessment.threat_level.to_string(),
            external: self.analyzer.has_external_tier(),
        });

        let active = self.defenses.active_defenses();
        let decision = decide(&assessment, &active, &self.policy);
        self.events.emit(Event::DecisionMade {
            timestamp: Utc::now(),
            run_id,
            blocked: decision.should_block,
            confidence: decision.confidence,
        });
        metrics::record_decision(decision.should_block);

        if decision.should_block {
            self.events.record(
                LogLevel::Success,
                "DEFENSE",
                &format!("{} attack blocked", record.request.kind),
                json!({ "run_id": run_id, "confidence": decision.confidence }),
            );
        } else {
            self.events.record(
                LogLevel::Warning,
                "DEFENSE",
                &format!("{} attack allowed through", record.request.kind),
                json!({ "run_id": run_id, "confidence": decision.confidence }),
            );
        }

        record.assessment = Some(assessment);
        record.decision = Some(decision);
        record.status = RunStatus::Completed;
        record.latency_ms = Some(u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX));

        info!(
            run_id = %run_id,
            kind = %record.request.kind,
            blocked = record.decision.as_ref().is_some_and(|d| d.should_block),
            "run completed"
        );

        self.finish(&record, true, started).await;
        record
    }

    async fn finish_failed(
        &self,
        record: &mut RunRecord,
        started: std::time::Instant,
        message: String,
    ) {
        self.events.emit(Event::RunFailed {
            timestamp: Utc::now(),
            run_id: record.run_id,
            message: message.clone(),
        });
        self.events.record(
            LogLevel::Error,
            "ATTACK",
            &format!("{} attack failed", record.request.kind),
            json!({ "run_id": record.run_id, "message": message }),
        );

        record.status = RunStatus::Failed;
        record.message = Some(message);
        record.latency_ms = Some(u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX));

        self.finish(record, false, started).await;
    }

    async fn finish(&self, record: &RunRecord, success: bool, started: std::time::Instant) {
        self.store.save(record.clone()).await;
        self.stats.record_run(record);
        metrics::record_run_completed(record.request.kind.as_str(), success, started.elapsed());
        self.release_slot();
    }

    /// Replaces whatever a panicked run left behind with a `Failed`
    /// terminal record and releases its active slot.
    async fn recover_aborted(
        &self,
        run_id: Uuid,
        request: AttackRequest,
        message: String,
    ) -> RunRecord {
        warn!(run_id = %run_id, message = %message, "run task aborted");

        self.events.emit(Event::RunFailed {
            timestamp: Utc::now(),
            run_id,
            message: message.clone(),
        });
        self.events.record(
            LogLevel::Error,
            "ATTACK",
            &format!("{} attack aborted", request.kind),
            json!({ "run_id": run_id, "message": message }),
        );

        let mut record = RunRecord::started(run_id, request);
        record.status = RunStatus::Failed;
        record.message = Some(message);
        record.latency_ms = Some(0);

        self.store.save(record.clone()).await;
        self.stats.record_run(&record);
        metrics::record_run_completed(record.request.kind.as_str(), false, Duration::ZERO);
        self.release_slot();

        record
    }

    // Saturating: the aborted task may have died before or after its own
    // increment, so the counter must never wrap below zero.
    fn release_slot(&self) {
        let _ = self
            .active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| {
                Some(v.saturating_sub(1))
            });
        metrics::set_runs_active(self.active.load(Ordering::SeqCst));
    }
}

/// Requests or attempts a probe result represents, for metrics.
fn requests_in(result: &ProbeResult) -> u64 {
    match result {
        ProbeResult::Flood { requests_sent, .. } => *requests_sent,
        ProbeResult::Injection { attempts, .. }
        | ProbeResult::Reflection { attempts, .. }
        | ProbeResult::CredentialGuess { attempts, .. } => *attempts,
        ProbeResult::PortSweep { total_scanned, .. } => {
            u64::try_from(*total_scanned).unwrap_or(u64::MAX)
        }
        ProbeResult::Simulated { .. } => 0,
    }
}
