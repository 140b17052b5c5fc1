//! Cumulative per-domain availability counters.
//!
//! Counters live for the lifetime of the process and are only ever touched
//! from the sequential part of a cycle, after every probe has been joined.

use std::collections::HashMap;

use super::types::ProbeStatus;

/// Up/total observations for one domain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DomainCounters {
    pub up: u64,
    pub total: u64,
}

impl DomainCounters {
    /// Rounded availability percentage (round half to even).
    ///
    /// `None` until at least one observation was recorded.
    pub fn availability(&self) -> Option<u8> {
        if self.total == 0 {
            return None;
        }
        let percentage = 100.0 * self.up as f64 / self.total as f64;
        Some(percentage.round_ties_even() as u8)
    }
}

/// Availability counters keyed by domain, in first-observation order
#[derive(Debug, Default)]
pub struct DomainStats {
    counters: HashMap<String, DomainCounters>,
    order: Vec<String>,
}

impl DomainStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one observation for `domain`
    pub fn record(&mut self, domain: &str, status: ProbeStatus) {
        let counters = match self.counters.get_mut(domain) {
            Some(counters) => counters,
            None => {
                self.order.push(domain.to_string());
                self.counters.entry(domain.to_string()).or_default()
            }
        };

        counters.total += 1;
        if status.is_up() {
            counters.up += 1;
        }
    }

    pub fn get(&self, domain: &str) -> Option<DomainCounters> {
        self.counters.get(domain).copied()
    }

    /// Rounded availability percentage for `domain`, `None` if never observed
    pub fn availability(&self, domain: &str) -> Option<u8> {
        self.counters.get(domain).and_then(DomainCounters::availability)
    }

    /// Domains with their counters, in the order they were first seen
    pub fn iter(&self) -> impl Iterator<Item = (&str, DomainCounters)> + '_ {
        self.order
            .iter()
            .filter_map(|domain| self.counters.get(domain).map(|c| (domain.as_str(), *c)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
