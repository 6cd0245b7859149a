use serde::{Deserialize, Serialize};

/// Relative deviation from the median interval that counts as a gap.
const GAP_THRESHOLD: f64 = 0.1;

/// Timing statistics over a non-decreasing time series.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimingStats {
    pub sample_count: usize,
    pub duration_minutes: f64,
    pub median_interval_s: f64,
    pub frequency_hz: f64,
    pub gap_count: usize,
    /// Gaps over sample count (not interval count).
    pub gap_ratio: f64,
}

/// Compute timing statistics for a time series, or `None` when fewer than
/// two samples are available (insufficient data, not an error).
///
/// The nominal interval is the median of the N-1 adjacent differences,
/// found by selection rather than a full sort; on an even interval count
/// the upper median is taken. A gap is any interval deviating from the
/// median by more than 10% of it.
pub fn timing_stats(times: &[f64]) -> Option<TimingStats> {
    if times.len() < 2 {
        return None;
    }

    let mut diffs: Vec<f64> = times.windows(2).map(|w| w[1] - w[0]).collect();
    let mid = diffs.len() / 2;
    let (_, median, _) = diffs.select_nth_unstable_by(mid, |a, b| a.partial_cmp(b).unwrap());
    let median = *median;

    let gap_count = diffs
        .iter()
        .filter(|&&dt| (dt - median).abs() > GAP_THRESHOLD * median)
        .count();

    Some(TimingStats {
        sample_count: times.len(),
        duration_minutes: (times[times.len() - 1] - times[0]) / 60.0,
        median_interval_s: median,
        frequency_hz: 1.0 / median,
        gap_count,
        gap_ratio: gap_count as f64 / times.len() as f64,
    })
}
