//! Periodic HTTP endpoint monitoring with cumulative per-domain availability.

pub mod config;
pub mod monitoring;
