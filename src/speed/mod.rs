//! Speed test module.
//!
//! This module provides the client-side speed test:
//! - Latency sampling with outlier trimming and jitter estimation
//! - Streamed download/upload throughput measurement
//! - A phased engine reporting live progress through an observer

pub mod engine;
pub mod stats;

pub use engine::{NullObserver, Phase, SpeedTestObserver, SpeedTestReport, SpeedTester};
