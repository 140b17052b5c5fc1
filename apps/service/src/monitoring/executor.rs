use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::Instant;

use super::checker::Prober;
use super::types::{EndpointDescriptor, ProbeOutcome};

/// Wall-clock time between the starts of two consecutive cycles
pub const CYCLE_INTERVAL: Duration = Duration::from_secs(15);

/// Everything one cycle produced
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Endpoints paired with their outcome, in configuration order
    pub entries: Vec<(EndpointDescriptor, ProbeOutcome)>,

    /// Distinct domain keys probed this cycle
    pub unique_domains: usize,

    /// When fan-out began
    pub started_at: Instant,

    /// Time spent probing, fan-out through join
    pub elapsed: Duration,

    /// Pause owed before the next cycle, `interval - elapsed` floored at zero
    pub sleep: Duration,
}

impl CycleReport {
    /// Deadline for the next cycle to start.
    ///
    /// Already in the past when probing overran the interval.
    pub fn next_cycle_at(&self) -> Instant {
        self.started_at + self.elapsed + self.sleep
    }
}

/// Cycle coordinator - probes every endpoint concurrently and joins on all of them
pub struct MonitoringExecutor {
    prober: Arc<dyn Prober>,
    interval: Duration,
}

impl MonitoringExecutor {
    pub fn new(prober: Arc<dyn Prober>) -> Self {
        Self::with_interval(prober, CYCLE_INTERVAL)
    }

    /// Same as [`MonitoringExecutor::new`] with a custom pacing interval
    pub fn with_interval(prober: Arc<dyn Prober>, interval: Duration) -> Self {
        Self { prober, interval }
    }

    /// Run one cycle over `endpoints`.
    ///
    /// One probe per endpoint runs concurrently with no cap. The returned
    /// report lists the outcomes in the order the endpoints were given,
    /// whatever order the probes completed in.
    pub async fn run_cycle(&self, endpoints: &[EndpointDescriptor]) -> CycleReport {
        let started_at = Instant::now();

        let outcomes =
            join_all(endpoints.iter().map(|endpoint| self.prober.probe(endpoint))).await;

        let elapsed = started_at.elapsed();

        let unique_domains = endpoints
            .iter()
            .filter_map(EndpointDescriptor::domain)
            .collect::<HashSet<_>>()
            .len();

        let entries = endpoints.iter().cloned().zip(outcomes).collect();

        CycleReport {
            entries,
            unique_domains,
            started_at,
            elapsed,
            sleep: self.interval.saturating_sub(elapsed),
        }
    }
}
