pub mod checker;
/// Monitoring engine module - probes endpoints and tracks availability
///
/// This module is responsible for:
/// - Probing HTTP endpoints under a hard timeout
/// - Running every probe of a cycle concurrently and pacing cycles
/// - Aggregating results into per-domain availability
/// - Reporting each cycle to an event sink
pub mod executor;
pub mod scheduler;
pub mod sink;
pub mod stats;
pub mod types;

pub use checker::{HttpProber, PROBE_TIMEOUT, Prober, ProberError};
pub use executor::{CYCLE_INTERVAL, CycleReport, MonitoringExecutor};
pub use scheduler::MonitoringScheduler;
pub use sink::{EventSink, MemorySink, TracingSink};
pub use stats::{DomainCounters, DomainStats};
pub use types::{EndpointDescriptor, ProbeFailure, ProbeOutcome, ProbeStatus, domain_key};
