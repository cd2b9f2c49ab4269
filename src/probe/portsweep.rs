//! Port-sweep probe: sequential TCP connect attempts over a candidate list.

use std::io::ErrorKind;
use std::time::Duration;

use tokio::net::TcpStream;
use tracing::debug;

use crate::error::ProbeError;

use super::payloads::{WELL_KNOWN_PORTS, service_name};
use super::scheduler::RateScheduler;
use super::{PortReport, ProbeEngine, ProbeResult, host_of};

impl ProbeEngine {
    /// Visits each candidate port in order with a short connect timeout,
    /// partitioning outcomes into open / closed / filtered.
    ///
    /// Candidate lists are truncated to the configured cap for resource
    /// safety. Ports are visited sequentially with a small inter-port
    /// delay; the sweep stops early if the wall-clock duration expires.
    /// A clean refusal is `closed`; resolution failures, timeouts, and
    /// any other transport error are `filtered`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::InvalidTarget`] if no host can be extracted
    /// from the target.
    pub(crate) async fn port_sweep(
        &self,
        target: &str,
        ports: Option<&[u16]>,
        duration: Duration,
    ) -> Result<ProbeResult, ProbeError> {
        let host = host_of(target)?;
        let limit = Duration::from_millis(self.config().connect_timeout_ms);
        let delay = Duration::from_millis(self.config().port_delay_ms);

        let mut candidates: Vec<u16> = ports.map_or_else(
            || WELL_KNOWN_PORTS.iter().map(|(port, _)| *port).collect(),
            <[u16]>::to_vec,
        );
        candidates.truncate(self.config().max_ports);

        let mut open = Vec::new();
        let mut closed = Vec::new();
        let mut filtered = Vec::new();

        let sched = RateScheduler::new(duration);
        for port in candidates {
            if sched.expired() {
                break;
            }

            match tokio::time::timeout(limit, TcpStream::connect((host.as_str(), port))).await {
                Ok(Ok(_stream)) => {
                    debug!(port, "port open");
                    open.push(PortReport {
                        port,
                        service: service_name(port).to_string(),
                    });
                }
                Ok(Err(e)) if e.kind() == ErrorKind::ConnectionRefused => closed.push(port),
                // DNS failure, unreachable network, connect timeout: the
                // port's state cannot be distinguished from a drop
                Ok(Err(_)) | Err(_) => filtered.push(port),
            }

            sched.pace(delay).await;
        }

        let total_scanned = open.len() + closed.len() + filtered.len();

        Ok(ProbeResult::PortSweep {
            host,
            open,
            closed,
            filtered,
            total_scanned,
            elapsed_secs: sched.elapsed_secs(),
        })
    }
}
