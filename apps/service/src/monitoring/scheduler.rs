use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::Level;

use super::executor::{CycleReport, MonitoringExecutor};
use super::sink::EventSink;
use super::stats::DomainStats;
use super::types::EndpointDescriptor;

/// Printed after every cycle summary
pub const SEPARATOR_WIDTH: usize = 150;

/// Monitoring scheduler - drives cycles back to back and keeps the
/// cumulative per-domain statistics
pub struct MonitoringScheduler {
    executor: MonitoringExecutor,
    endpoints: Vec<EndpointDescriptor>,
    sink: Arc<dyn EventSink>,
    stats: DomainStats,
}

impl MonitoringScheduler {
    pub fn new(
        executor: MonitoringExecutor,
        endpoints: Vec<EndpointDescriptor>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self { executor, endpoints, sink, stats: DomainStats::new() }
    }

    pub fn stats(&self) -> &DomainStats {
        &self.stats
    }

    /// Run one probing cycle and fold its results in, without pacing.
    pub async fn run_once(&mut self) -> CycleReport {
        self.sink.emit(Level::INFO, "Starting health check cycle...");

        let report = self.executor.run_cycle(&self.endpoints).await;
        self.apply(&report);
        report
    }

    /// Run cycles until `shutdown` is cancelled.
    ///
    /// Cancellation is honoured during probing as well as during the pause;
    /// an interrupted cycle is dropped whole, so the statistics only ever
    /// contain complete cycles.
    pub async fn run(&mut self, shutdown: CancellationToken) {
        loop {
            let report = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                report = self.run_once() => report,
            };

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep_until(report.next_cycle_at()) => {}
            }
        }

        self.sink.emit(Level::INFO, "Monitoring stopped by user.");
    }

    /// Record every result and emit the per-cycle and cumulative summaries
    fn apply(&mut self, report: &CycleReport) {
        for (endpoint, outcome) in &report.entries {
            let Some(domain) = endpoint.domain() else {
                continue;
            };

            self.sink.emit(Level::INFO, &format!("{domain} is {}", outcome.status));
            self.stats.record(&domain, outcome.status);
        }

        self.sink.emit(
            Level::INFO,
            &format!(
                "Queried {} endpoints across {} unique domain(s) this cycle",
                report.entries.len(),
                report.unique_domains
            ),
        );

        for (domain, counters) in self.stats.iter() {
            if let Some(availability) = counters.availability() {
                self.sink.emit(
                    Level::INFO,
                    &format!("{domain} has {availability}% availability percentage"),
                );
            }
        }

        self.sink.emit(Level::INFO, &"-".repeat(SEPARATOR_WIDTH));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::checker::Prober;
    use crate::monitoring::executor::CYCLE_INTERVAL;
    use crate::monitoring::sink::MemorySink;
    use crate::monitoring::stats::DomainCounters;
    use crate::monitoring::types::{ProbeFailure, ProbeOutcome};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Returns status codes per URL, one entry per cycle; the last entry repeats.
    #[derive(Default)]
    struct SequencedProber {
        codes: Mutex<HashMap<String, Vec<u16>>>,
        calls: Mutex<usize>,
    }

    impl SequencedProber {
        fn with(codes: &[(&str, &[u16])]) -> Self {
            let codes = codes.iter().map(|(url, seq)| (url.to_string(), seq.to_vec())).collect();
            Self { codes: Mutex::new(codes), calls: Mutex::new(0) }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait::async_trait]
    impl Prober for SequencedProber {
        async fn probe(&self, endpoint: &EndpointDescriptor) -> ProbeOutcome {
            *self.calls.lock().unwrap() += 1;
            let name = endpoint.display_name();
            let Some(url) = endpoint.configured_url() else {
                return ProbeOutcome::down(name, ProbeFailure::MissingUrl);
            };
            let code = {
                let mut codes = self.codes.lock().unwrap();
                let seq = codes.get_mut(url).expect("unscripted url");
                if seq.len() > 1 { seq.remove(0) } else { seq[0] }
            };
            ProbeOutcome::from_status_code(name, code)
        }
    }

    fn two_services() -> Vec<EndpointDescriptor> {
        vec![
            EndpointDescriptor::new("svc-a", "http://host1/ping"),
            EndpointDescriptor::new("svc-b", "http://host1/health"),
        ]
    }

    fn scheduler_with(
        prober: Arc<SequencedProber>,
        endpoints: Vec<EndpointDescriptor>,
    ) -> (MonitoringScheduler, MemorySink) {
        let sink = MemorySink::new();
        let scheduler = MonitoringScheduler::new(
            MonitoringExecutor::new(prober),
            endpoints,
            Arc::new(sink.clone()),
        );
        (scheduler, sink)
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_cycles_accumulate_per_domain() {
        let prober = Arc::new(SequencedProber::with(&[
            ("http://host1/ping", &[200]),
            ("http://host1/health", &[200, 500]),
        ]));
        let (mut scheduler, _sink) = scheduler_with(prober, two_services());

        scheduler.run_once().await;
        assert_eq!(scheduler.stats().get("host1"), Some(DomainCounters { up: 2, total: 2 }));
        assert_eq!(scheduler.stats().availability("host1"), Some(100));

        scheduler.run_once().await;
        assert_eq!(scheduler.stats().get("host1"), Some(DomainCounters { up: 3, total: 4 }));
        assert_eq!(scheduler.stats().availability("host1"), Some(75));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycle_emits_status_summary_and_availability() {
        let prober = Arc::new(SequencedProber::with(&[
            ("http://host1/ping", &[200]),
            ("http://host1/health", &[503]),
        ]));
        let (mut scheduler, sink) = scheduler_with(prober, two_services());

        scheduler.run_once().await;

        assert_eq!(
            sink.messages(),
            vec![
                "Starting health check cycle...".to_string(),
                "host1 is UP".to_string(),
                "host1 is DOWN".to_string(),
                "Queried 2 endpoints across 1 unique domain(s) this cycle".to_string(),
                "host1 has 50% availability percentage".to_string(),
                "-".repeat(SEPARATOR_WIDTH),
            ]
        );
        assert!(sink.events().iter().all(|(level, _)| *level == Level::INFO));
    }

    #[tokio::test(start_paused = true)]
    async fn test_summary_reports_unique_domains_of_the_cycle() {
        let prober = Arc::new(SequencedProber::with(&[
            ("http://host1:8080/a", &[200]),
            ("http://host1:9090/b", &[200]),
            ("http://host2/c", &[200]),
        ]));
        let endpoints = vec![
            EndpointDescriptor::new("a", "http://host1:8080/a"),
            EndpointDescriptor::new("b", "http://host1:9090/b"),
            EndpointDescriptor::new("c", "http://host2/c"),
        ];
        let (mut scheduler, sink) = scheduler_with(prober, endpoints);

        let report = scheduler.run_once().await;

        assert_eq!(report.unique_domains, 2);
        assert!(
            sink.messages()
                .contains(&"Queried 3 endpoints across 2 unique domain(s) this cycle".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_url_is_counted_but_not_aggregated() {
        let prober = Arc::new(SequencedProber::with(&[("http://host2/", &[200])]));
        let endpoints = vec![
            EndpointDescriptor { name: Some("orphan".into()), ..Default::default() },
            EndpointDescriptor::new("svc", "http://host2/"),
        ];
        let (mut scheduler, sink) = scheduler_with(prober, endpoints);

        let report = scheduler.run_once().await;

        assert_eq!(report.entries[0].1.failure, Some(ProbeFailure::MissingUrl));
        assert_eq!(scheduler.stats().len(), 1);
        assert!(
            sink.messages()
                .contains(&"Queried 2 endpoints across 1 unique domain(s) this cycle".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_availability_lists_every_known_domain() {
        let prober = Arc::new(SequencedProber::with(&[
            ("http://alpha/", &[200]),
            ("http://beta:8080/", &[404]),
        ]));
        let endpoints = vec![
            EndpointDescriptor::new("a", "http://alpha/"),
            EndpointDescriptor::new("b", "http://beta:8080/"),
        ];
        let (mut scheduler, sink) = scheduler_with(prober, endpoints);

        scheduler.run_once().await;

        let messages = sink.messages();
        let availability: Vec<_> =
            messages.iter().filter(|m| m.ends_with("availability percentage")).collect();
        assert_eq!(
            availability,
            ["alpha has 100% availability percentage", "beta has 0% availability percentage"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_paces_cycles_and_stops_on_cancel() {
        let prober = Arc::new(SequencedProber::with(&[
            ("http://host1/ping", &[200]),
            ("http://host1/health", &[200]),
        ]));
        let (mut scheduler, sink) = scheduler_with(prober.clone(), two_services());
        let shutdown = CancellationToken::new();

        let canceller = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                // Lands inside the third cycle's pause.
                tokio::time::sleep(CYCLE_INTERVAL * 2 + Duration::from_secs(5)).await;
                shutdown.cancel();
            })
        };

        scheduler.run(shutdown).await;
        canceller.await.unwrap();

        assert_eq!(prober.calls(), 6);
        assert_eq!(scheduler.stats().get("host1"), Some(DomainCounters { up: 6, total: 6 }));
        assert_eq!(sink.messages().last().map(String::as_str), Some("Monitoring stopped by user."));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_returns_immediately_when_already_cancelled() {
        let prober = Arc::new(SequencedProber::with(&[
            ("http://host1/ping", &[200]),
            ("http://host1/health", &[200]),
        ]));
        let (mut scheduler, sink) = scheduler_with(prober.clone(), two_services());
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        scheduler.run(shutdown).await;

        assert_eq!(prober.calls(), 0);
        assert!(scheduler.stats().is_empty());
        assert_eq!(sink.messages(), vec!["Monitoring stopped by user.".to_string()]);
    }
}
