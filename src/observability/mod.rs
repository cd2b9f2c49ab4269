//! Observability: logging, structured events, and metrics for monitoring
//! probe runs.

pub mod events;
pub mod logging;
pub mod metrics;

pub use events::{Event, EventSink, LogEntry, LogLevel};
pub use logging::{LogFormat, init_logging};
