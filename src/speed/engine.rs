//! Phased speed test engine.
//!
//! One run walks ping → download → upload and reports live progress
//! through a [`SpeedTestObserver`]. A failed probe is logged and skipped;
//! the phase figure is the best surviving trial. Only a phase losing
//! every probe aborts the run.
//!
//! Individual transfers are deliberately not bounded by a timeout; a
//! stalled transfer stalls its phase. A cooperative stop flag aborts a
//! run between probes and between chunks.

use crate::api::ApiClient;
use crate::error::{Error, Result};
use crate::speed::stats;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Number of sequential ping round-trips.
pub const PING_PROBES: usize = 10;

/// Download payload sizes in megabytes, requested in order.
pub const DOWNLOAD_SIZES_MB: [u64; 4] = [2, 5, 10, 10];

/// Upload payload sizes in megabytes, sent in order.
pub const UPLOAD_SIZES_MB: [u64; 4] = [1, 2, 5, 5];

const BYTES_PER_MB: u64 = 1024 * 1024;

// Hand-tuned per-phase progress ranges. Cosmetic, not proportional to
// actual throughput.
const PING_START: f64 = 5.0;
const PING_END: f64 = 25.0;
const DOWNLOAD_END: f64 = 65.0;
const UPLOAD_END: f64 = 97.0;

/// Phase of a speed test run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Ping,
    Download,
    Upload,
    Complete,
    Error,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Ping => "ping",
            Self::Download => "download",
            Self::Upload => "upload",
            Self::Complete => "complete",
            Self::Error => "error",
        };
        write!(f, "{name}")
    }
}

/// Live progress sink for a speed test run.
///
/// All methods have empty defaults; implementors override what they
/// display. Implementations must be shareable across the probe tasks.
pub trait SpeedTestObserver: Send + Sync {
    /// A new phase has begun.
    fn phase_changed(&self, _phase: Phase) {}

    /// One ping round-trip completed (`seq` is zero-based).
    fn ping_sample(&self, _seq: usize, _ms: f64) {}

    /// Instantaneous throughput for live display.
    fn live_throughput(&self, _phase: Phase, _mbps: f64) {}

    /// A download/upload trial finished with its reported speed.
    fn trial_finished(&self, _phase: Phase, _trial: usize, _mbps: f64) {}

    /// Overall progress percentage, monotonically increasing.
    fn progress(&self, _percent: u8) {}
}

/// Observer that discards everything.
pub struct NullObserver;

impl SpeedTestObserver for NullObserver {}

/// Final measurements of one completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedTestReport {
    /// Mean round-trip time over the trimmed ping samples, ms
    pub ping_ms: f64,
    /// Population standard deviation of the trimmed samples, ms
    pub jitter_ms: f64,
    /// Best download trial, Mbps
    pub download_mbps: f64,
    /// Best upload trial, Mbps
    pub upload_mbps: f64,
    /// Highest instantaneous download value observed, Mbps
    pub peak_download_mbps: f64,
    /// Highest per-trial upload value observed, Mbps
    pub peak_upload_mbps: f64,
    /// Reported speed of each surviving download trial, Mbps
    pub download_trials: Vec<f64>,
    /// Reported speed of each surviving upload trial, Mbps
    pub upload_trials: Vec<f64>,
    pub finished_at: DateTime<Utc>,
}

/// Monotonic progress reporter.
///
/// Percentages are hand-tuned per phase; this guard keeps the emitted
/// sequence non-decreasing regardless of chunk timing.
struct ProgressTracker {
    last: u8,
}

impl ProgressTracker {
    fn new() -> Self {
        Self { last: 0 }
    }

    fn report<O: SpeedTestObserver + ?Sized>(&mut self, observer: &O, percent: f64) {
        let percent = percent.clamp(0.0, 100.0).round() as u8;
        if percent > self.last {
            self.last = percent;
            observer.progress(percent);
        }
    }
}

fn ping_progress(completed: usize) -> f64 {
    PING_START + (completed as f64 / PING_PROBES as f64) * (PING_END - PING_START)
}

fn download_progress(trials_done: f64) -> f64 {
    PING_END + (trials_done / DOWNLOAD_SIZES_MB.len() as f64) * (DOWNLOAD_END - PING_END)
}

fn upload_progress(trials_done: f64) -> f64 {
    DOWNLOAD_END + (trials_done / UPLOAD_SIZES_MB.len() as f64) * (UPLOAD_END - DOWNLOAD_END)
}

/// Fill a buffer with a non-repeating pseudo-pattern.
///
/// Upload payloads must not compress well, or the transport could
/// inflate the measured throughput.
#[must_use]
pub fn pseudo_random_payload(len: usize) -> Vec<u8> {
    let mut buf = Vec::with_capacity(len);
    let mut state: u32 = 0x9e37_79b9;
    for _ in 0..len {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        buf.push((state >> 24) as u8);
    }
    buf
}

fn cancelled() -> Error {
    Error::network("speed test cancelled")
}

/// HTTP speed tester.
///
/// # Example
///
/// ```ignore
/// let tester = SpeedTester::new(client.clone());
/// let report = tester.run(&NullObserver).await?;
/// println!("{:.1} Mbps down / {:.1} Mbps up", report.download_mbps, report.upload_mbps);
/// ```
pub struct SpeedTester {
    client: ApiClient,
    stop: Arc<AtomicBool>,
}

impl SpeedTester {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared flag that aborts the run when set.
    ///
    /// Checked between probes and between chunks, so cancellation takes
    /// effect promptly without tearing down a transfer mid-read.
    #[must_use]
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Run the full ping → download → upload sequence.
    ///
    /// # Errors
    ///
    /// Returns an error when a whole phase fails (every probe lost) or
    /// the run is cancelled. Single-probe failures are logged and
    /// skipped.
    pub async fn run<O: SpeedTestObserver + ?Sized>(&self, observer: &O) -> Result<SpeedTestReport> {
        self.stop.store(false, Ordering::Relaxed);
        let mut progress = ProgressTracker::new();

        observer.phase_changed(Phase::Ping);
        progress.report(observer, PING_START);
        let (ping_ms, jitter_ms) = self.ping_phase(observer, &mut progress).await?;

        observer.phase_changed(Phase::Download);
        let (download_trials, peak_download_mbps) =
            self.download_phase(observer, &mut progress).await?;
        let download_mbps = stats::best(&download_trials)
            .ok_or_else(|| Error::network("all download probes failed"))?;

        observer.phase_changed(Phase::Upload);
        let upload_trials = self.upload_phase(observer, &mut progress).await?;
        let upload_mbps =
            stats::best(&upload_trials).ok_or_else(|| Error::network("all upload probes failed"))?;

        observer.phase_changed(Phase::Complete);
        progress.report(observer, 100.0);

        Ok(SpeedTestReport {
            ping_ms,
            jitter_ms,
            download_mbps,
            upload_mbps,
            peak_download_mbps,
            peak_upload_mbps: upload_mbps,
            download_trials,
            upload_trials,
            finished_at: Utc::now(),
        })
    }

    /// Ten sequential round-trips; trimmed mean and population std dev.
    async fn ping_phase<O: SpeedTestObserver + ?Sized>(
        &self,
        observer: &O,
        progress: &mut ProgressTracker,
    ) -> Result<(f64, f64)> {
        let url = self.client.ping_url();
        let mut samples = Vec::with_capacity(PING_PROBES);

        for seq in 0..PING_PROBES {
            if self.stopped() {
                return Err(cancelled());
            }

            let start = Instant::now();
            match self.round_trip(&url).await {
                Ok(()) => {
                    let ms = start.elapsed().as_secs_f64() * 1000.0;
                    observer.ping_sample(seq, ms);
                    samples.push(ms);
                }
                Err(e) => tracing::warn!("ping probe {} failed: {e}", seq + 1),
            }
            progress.report(observer, ping_progress(seq + 1));
        }

        if samples.len() < 3 {
            return Err(Error::network("ping probes failed"));
        }

        let trimmed = stats::trim_outliers(&samples);
        Ok((stats::mean(&trimmed), stats::population_std_dev(&trimmed)))
    }

    async fn round_trip(&self, url: &str) -> Result<()> {
        let response = self.client.http().get(url).send().await?;
        let response = response.error_for_status()?;
        let _ = response.bytes().await?;
        Ok(())
    }

    /// Sequential download trials; returns surviving speeds and the peak
    /// instantaneous value.
    async fn download_phase<O: SpeedTestObserver + ?Sized>(
        &self,
        observer: &O,
        progress: &mut ProgressTracker,
    ) -> Result<(Vec<f64>, f64)> {
        let mut speeds = Vec::new();
        let mut peak = 0.0f64;

        for (trial, size_mb) in DOWNLOAD_SIZES_MB.iter().enumerate() {
            match self
                .download_trial(*size_mb, trial as f64, observer, progress)
                .await
            {
                Ok((speed, trial_peak)) => {
                    observer.trial_finished(Phase::Download, trial, speed);
                    speeds.push(speed);
                    peak = peak.max(trial_peak);
                }
                Err(e) => {
                    if self.stopped() {
                        return Err(cancelled());
                    }
                    tracing::warn!("download trial {} failed: {e}", trial + 1);
                }
            }
            progress.report(observer, download_progress((trial + 1) as f64));
        }

        Ok((speeds, peak))
    }

    async fn download_trial<O: SpeedTestObserver + ?Sized>(
        &self,
        size_mb: u64,
        trials_done: f64,
        observer: &O,
        progress: &mut ProgressTracker,
    ) -> Result<(f64, f64)> {
        let url = self.client.download_url(size_mb);
        let expected = (size_mb * BYTES_PER_MB) as f64;

        let start = Instant::now();
        let response = self.client.http().get(&url).send().await?;
        let response = response.error_for_status()?;
        let mut stream = response.bytes_stream();

        let mut received: u64 = 0;
        let mut peak = 0.0f64;

        while let Some(chunk) = stream.next().await {
            if self.stopped() {
                return Err(cancelled());
            }
            let chunk = chunk?;
            received += chunk.len() as u64;

            let instantaneous = stats::mbps(received, start.elapsed().as_secs_f64());
            peak = peak.max(instantaneous);
            observer.live_throughput(Phase::Download, instantaneous);

            let fraction = (received as f64 / expected).min(1.0);
            progress.report(observer, download_progress(trials_done + fraction));
        }

        let speed = stats::mbps(received, start.elapsed().as_secs_f64());
        Ok((speed, peak))
    }

    /// Sequential upload trials; returns surviving speeds.
    async fn upload_phase<O: SpeedTestObserver + ?Sized>(
        &self,
        observer: &O,
        progress: &mut ProgressTracker,
    ) -> Result<Vec<f64>> {
        let mut speeds = Vec::new();

        for (trial, size_mb) in UPLOAD_SIZES_MB.iter().enumerate() {
            if self.stopped() {
                return Err(cancelled());
            }

            match self.upload_trial(*size_mb, observer).await {
                Ok(speed) => {
                    observer.trial_finished(Phase::Upload, trial, speed);
                    speeds.push(speed);
                }
                Err(e) => tracing::warn!("upload trial {} failed: {e}", trial + 1),
            }
            progress.report(observer, upload_progress((trial + 1) as f64));
        }

        Ok(speeds)
    }

    async fn upload_trial<O: SpeedTestObserver + ?Sized>(
        &self,
        size_mb: u64,
        observer: &O,
    ) -> Result<f64> {
        let url = self.client.upload_url();
        let payload = pseudo_random_payload((size_mb * BYTES_PER_MB) as usize);
        let bytes = payload.len() as u64;

        let start = Instant::now();
        let response = self
            .client
            .http()
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(payload)
            .send()
            .await?;
        response.error_for_status()?;

        let speed = stats::mbps(bytes, start.elapsed().as_secs_f64());
        observer.live_throughput(Phase::Upload, speed);
        Ok(speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::sync::Mutex;

    struct Recorder {
        percents: Mutex<Vec<u8>>,
    }

    impl SpeedTestObserver for Recorder {
        fn progress(&self, percent: u8) {
            self.percents.lock().unwrap().push(percent);
        }
    }

    #[test]
    fn test_progress_ranges_are_hand_tuned_per_phase() {
        assert!((ping_progress(0) - 5.0).abs() < 1e-9);
        assert!((ping_progress(PING_PROBES) - 25.0).abs() < 1e-9);
        assert!((download_progress(0.0) - 25.0).abs() < 1e-9);
        assert!((download_progress(4.0) - 65.0).abs() < 1e-9);
        assert!((upload_progress(0.0) - 65.0).abs() < 1e-9);
        assert!((upload_progress(4.0) - 97.0).abs() < 1e-9);
    }

    #[test]
    fn test_progress_tracker_is_monotonic() {
        let recorder = Recorder {
            percents: Mutex::new(Vec::new()),
        };
        let mut tracker = ProgressTracker::new();

        tracker.report(&recorder, 5.0);
        tracker.report(&recorder, 25.0);
        tracker.report(&recorder, 20.0); // out-of-order value is swallowed
        tracker.report(&recorder, 25.0); // duplicate is swallowed
        tracker.report(&recorder, 100.0);

        assert_eq!(*recorder.percents.lock().unwrap(), vec![5, 25, 100]);
    }

    #[test]
    fn test_payload_has_requested_length() {
        assert_eq!(pseudo_random_payload(0).len(), 0);
        assert_eq!(pseudo_random_payload(1024).len(), 1024);
    }

    #[test]
    fn test_payload_does_not_repeat() {
        let payload = pseudo_random_payload(4096);
        assert_ne!(&payload[..1024], &payload[1024..2048]);
        assert_ne!(&payload[1024..2048], &payload[2048..3072]);
        // Not a constant fill either.
        assert!(payload.iter().any(|&b| b != payload[0]));
    }

    #[test]
    fn test_stop_flag_is_shared() {
        let config = Config::default();
        let client = ApiClient::new(&config).unwrap();
        let tester = SpeedTester::new(client);

        let flag = tester.stop_flag();
        assert!(!tester.stopped());
        flag.store(true, Ordering::Relaxed);
        assert!(tester.stopped());
    }

    // Full run against a live backend; opt-in since it needs the API.
    #[tokio::test]
    async fn test_run_against_backend() {
        if std::env::var("IPSCOUT_E2E").is_err() {
            return;
        }

        let config = Config::load(None).unwrap();
        let client = ApiClient::new(&config).unwrap();
        let tester = SpeedTester::new(client);
        let report = tester.run(&NullObserver).await.unwrap();

        assert!(report.ping_ms > 0.0);
        assert!(report.download_mbps > 0.0);
        assert!(report.upload_mbps > 0.0);
    }
}
