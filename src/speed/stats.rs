//! Measurement arithmetic for the speed test.
//!
//! Latency samples are trimmed of their single highest and single lowest
//! value before averaging; jitter is the population standard deviation of
//! the trimmed set. Throughput trials report `bytes * 8 / secs / 1e6`
//! Mbps, and a phase's final figure is the best trial, not the average.

/// Drop one instance of the minimum and one of the maximum sample.
///
/// Slices with fewer than three samples are returned unchanged, since
/// trimming would leave nothing to average.
#[must_use]
pub fn trim_outliers(samples: &[f64]) -> Vec<f64> {
    if samples.len() < 3 {
        return samples.to_vec();
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted[1..sorted.len() - 1].to_vec()
}

/// Arithmetic mean. Returns 0.0 for an empty slice.
#[must_use]
pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Population standard deviation. Returns 0.0 for an empty slice.
#[must_use]
pub fn population_std_dev(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let m = mean(samples);
    let variance = samples.iter().map(|s| (s - m).powi(2)).sum::<f64>() / samples.len() as f64;
    variance.sqrt()
}

/// Throughput in megabits per second.
#[must_use]
pub fn mbps(bytes: u64, secs: f64) -> f64 {
    if secs <= 0.0 {
        return 0.0;
    }
    (bytes as f64 * 8.0) / secs / 1e6
}

/// Best observed trial speed.
///
/// The reported figure for a download/upload phase is the maximum across
/// trials, not the mean and not the last.
#[must_use]
pub fn best(speeds: &[f64]) -> Option<f64> {
    speeds.iter().copied().reduce(f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: [f64; 10] = [10.0, 12.0, 11.0, 50.0, 9.0, 11.0, 13.0, 10.0, 12.0, 8.0];

    #[test]
    fn test_trim_drops_single_min_and_max() {
        let trimmed = trim_outliers(&SAMPLES);
        assert_eq!(trimmed.len(), 8);
        assert!(!trimmed.contains(&50.0));
        assert!(!trimmed.contains(&8.0));
        // Only one instance of a repeated extreme is dropped.
        let trimmed = trim_outliers(&[5.0, 5.0, 7.0, 9.0, 9.0]);
        assert_eq!(trimmed, vec![5.0, 7.0, 9.0]);
    }

    #[test]
    fn test_trim_leaves_tiny_slices_alone() {
        assert_eq!(trim_outliers(&[3.0, 4.0]), vec![3.0, 4.0]);
        assert_eq!(trim_outliers(&[]), Vec::<f64>::new());
    }

    #[test]
    fn test_ping_is_trimmed_mean() {
        let trimmed = trim_outliers(&SAMPLES);
        assert!((mean(&trimmed) - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_jitter_is_population_std_dev_of_trimmed_set() {
        let trimmed = trim_outliers(&SAMPLES);
        let jitter = population_std_dev(&trimmed);
        // [10,12,11,9,11,13,10,12]: mean 11, population std dev ~1.2247
        assert!((jitter - 1.224_744_871_391_589).abs() < 1e-9);
    }

    #[test]
    fn test_mbps_formula() {
        // 10 MB in 8 seconds = 10 Mbps
        assert!((mbps(10_000_000, 8.0) - 10.0).abs() < 1e-9);
        assert_eq!(mbps(1_000_000, 0.0), 0.0);
    }

    #[test]
    fn test_best_is_max_not_mean_or_last() {
        let speeds = [20.1, 35.4, 33.0, 35.0];
        assert_eq!(best(&speeds), Some(35.4));
    }

    #[test]
    fn test_best_over_surviving_trials() {
        // A failed trial contributes nothing; the figure is the max of
        // whatever survived.
        let survivors = [20.1, 35.4, 35.0];
        assert_eq!(best(&survivors), Some(35.4));
        assert_eq!(best(&[]), None);
    }

    #[test]
    fn test_std_dev_degenerate_cases() {
        assert_eq!(population_std_dev(&[]), 0.0);
        assert_eq!(population_std_dev(&[7.0]), 0.0);
        assert_eq!(population_std_dev(&[7.0, 7.0, 7.0]), 0.0);
    }
}
