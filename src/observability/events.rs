//! Structured event stream and log sink.
//!
//! Discrete, typed events emitted during attack runs, serialized as
//! newline-delimited JSON with a monotonically increasing sequence
//! number, plus the free-form `record(level, category, message,
//! metadata)` sink the engine's collaborators log through. The sink
//! keeps a bounded rolling tail in memory so recent activity can be
//! inspected without replaying the stream.

use std::collections::VecDeque;
use std::io::{BufWriter, Write};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Maximum log entries retained in the in-memory tail.
const LOG_TAIL_CAPACITY: usize = 1_000;

// ---------------------------------------------------------------------------
// Event variants
// ---------------------------------------------------------------------------

/// A discrete event emitted during an attack run.
///
/// Each variant is tagged with `"type"` when serialized so consumers can
/// dispatch on the event kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// An attack run was accepted and spawned.
    RunStarted {
        /// When the run started.
        timestamp: DateTime<Utc>,
        /// Run identifier.
        run_id: Uuid,
        /// Attack kind name.
        kind: String,
        /// Declared target, if any.
        target: Option<String>,
    },

    /// A probe finished and produced its raw result.
    ProbeCompleted {
        /// When the probe finished.
        timestamp: DateTime<Utc>,
        /// Run identifier.
        run_id: Uuid,
        /// Probe wall-clock time in milliseconds.
        duration_ms: u64,
    },

    /// A threat assessment was produced.
    AssessmentProduced {
        /// When the assessment was produced.
        timestamp: DateTime<Utc>,
        /// Run identifier.
        run_id: Uuid,
        /// Assessed threat level.
        threat_level: String,
        /// Whether an external classifier tier was configured for the run.
        external: bool,
    },

    /// The blocking decision was made.
    DecisionMade {
        /// When the decision was made.
        timestamp: DateTime<Utc>,
        /// Run identifier.
        run_id: Uuid,
        /// Whether the attack is blocked.
        blocked: bool,
        /// Decision confidence.
        confidence: f64,
    },

    /// The run reached a failed terminal state.
    RunFailed {
        /// When the failure was recorded.
        timestamp: DateTime<Utc>,
        /// Run identifier.
        run_id: Uuid,
        /// Descriptive failure message.
        message: String,
    },
}

/// Wraps an [`Event`] with a monotonically increasing sequence number.
#[derive(Debug, Serialize)]
struct EventEnvelope {
    sequence: u64,
    #[serde(flatten)]
    event: Event,
}

// ---------------------------------------------------------------------------
// Log entries
// ---------------------------------------------------------------------------

/// Severity attached to free-form log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Informational.
    Info,
    /// A defense outcome worth celebrating.
    Success,
    /// Something degraded but the run continues.
    Warning,
    /// A run-level failure.
    Error,
}

/// One free-form record in the rolling log tail.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    /// Unique entry identifier.
    pub log_id: Uuid,
    /// When the entry was recorded.
    pub timestamp: DateTime<Utc>,
    /// Severity.
    pub level: LogLevel,
    /// Category label (e.g. `"ATTACK"`, `"DEFENSE"`).
    pub category: String,
    /// Human-readable message.
    pub message: String,
    /// Structured context.
    pub metadata: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

/// Thread-safe, buffered JSONL event writer with a bounded rolling tail.
///
/// Emission is fire-and-forget: serialization or I/O failures are
/// silently dropped, because observability must never crash a run.
pub struct EventSink {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
    tail: Mutex<VecDeque<LogEntry>>,
}

// The boxed writer has no Debug impl, so write one by hand.
impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventSink {
    /// Creates a sink that writes to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
            tail: Mutex::new(VecDeque::with_capacity(LOG_TAIL_CAPACITY)),
        }
    }

    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that discards the stream (the tail still fills).
    #[must_use]
    pub fn discard() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Emits a typed event as one JSON line.
    pub fn emit(&self, event: Event) {
        let envelope = EventEnvelope {
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst),
            event,
        };
        self.write_line(&envelope);
    }

    /// Records a free-form log entry: appended to the rolling tail and
    /// emitted as one JSON line. Fire-and-forget.
    pub fn record(
        &self,
        level: LogLevel,
        category: &str,
        message: &str,
        metadata: serde_json::Value,
    ) {
        let entry = LogEntry {
            log_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            level,
            category: category.to_string(),
            message: message.to_string(),
            metadata,
        };

        self.write_line(&entry);

        if let Ok(mut tail) = self.tail.lock() {
            if tail.len() >= LOG_TAIL_CAPACITY {
                tail.pop_back();
            }
            tail.push_front(entry);
        }
    }

    /// Returns up to `limit` most-recent entries, optionally filtered by
    /// level. Most recent first.
    #[must_use]
    pub fn tail(&self, limit: usize, level: Option<LogLevel>) -> Vec<LogEntry> {
        self.tail.lock().map_or_else(
            |_| Vec::new(),
            |tail| {
                tail.iter()
                    .filter(|entry| level.is_none_or(|l| entry.level == l))
                    .take(limit)
                    .cloned()
                    .collect()
            },
        )
    }

    /// Flushes the underlying writer.
    pub fn flush(&self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }

    fn write_line<T: Serialize>(&self, value: &T) {
        let Ok(mut line) = serde_json::to_vec(value) else {
            return;
        };
        line.push(b'\n');

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.write_all(&line);
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone)]
    struct TestWriter(Arc<Mutex<Vec<u8>>>);

    impl TestWriter {
        fn new() -> Self {
            Self(Arc::new(Mutex::new(Vec::new())))
        }

        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for TestWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn events_carry_increasing_sequence() {
        let tw = TestWriter::new();
        let sink = EventSink::new(Box::new(tw.clone()));

        let run_id = Uuid::new_v4();
        for _ in 0..3 {
            sink.emit(Event::ProbeCompleted {
                timestamp: Utc::now(),
                run_id,
                duration_ms: 5,
            });
        }

        let output = tw.contents();
        let sequences: Vec<u64> = output
            .lines()
            .map(|line| {
                serde_json::from_str::<serde_json::Value>(line).unwrap()["sequence"]
                    .as_u64()
                    .unwrap()
            })
            .collect();
        assert_eq!(sequences, vec![0, 1, 2]);
    }

    #[test]
    fn record_appends_to_tail_most_recent_first() {
        let sink = EventSink::discard();
        sink.record(LogLevel::Info, "ATTACK", "first", serde_json::json!({}));
        sink.record(LogLevel::Error, "ATTACK", "second", serde_json::json!({}));

        let tail = sink.tail(10, None);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].message, "second");
        assert_eq!(tail[1].message, "first");
    }

    #[test]
    fn tail_filters_by_level() {
        let sink = EventSink::discard();
        sink.record(LogLevel::Info, "A", "info", serde_json::json!({}));
        sink.record(LogLevel::Error, "A", "error", serde_json::json!({}));

        let errors = sink.tail(10, Some(LogLevel::Error));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "error");
    }

    #[test]
    fn tail_is_bounded() {
        let sink = EventSink::discard();
        for i in 0..(LOG_TAIL_CAPACITY + 50) {
            sink.record(LogLevel::Info, "A", &format!("m{i}"), serde_json::json!({}));
        }

        let tail = sink.tail(usize::MAX, None);
        assert_eq!(tail.len(), LOG_TAIL_CAPACITY);
        // Oldest entries were dropped
        assert_eq!(tail[0].message, format!("m{}", LOG_TAIL_CAPACITY + 49));
    }

    #[test]
    fn event_json_is_type_tagged() {
        let tw = TestWriter::new();
        let sink = EventSink::new(Box::new(tw.clone()));
        sink.emit(Event::RunStarted {
            timestamp: Utc::now(),
            run_id: Uuid::new_v4(),
            kind: "flood".to_string(),
            target: Some("http://example.com".to_string()),
        });

        let value: serde_json::Value =
            serde_json::from_str(tw.contents().lines().next().unwrap()).unwrap();
        assert_eq!(value["type"], "RunStarted");
        assert_eq!(value["kind"], "flood");
    }

    #[test]
    fn log_level_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&LogLevel::Warning).unwrap(),
            "\"WARNING\""
        );
    }
}
