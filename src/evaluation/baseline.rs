use super::metrics::average_segment_length;

/// Period of the naive baseline: the average training segment length,
/// rounded, at least 1.
pub fn baseline_period(training: &[bool]) -> usize {
    (average_segment_length(training).round() as usize).max(1)
}

/// A boundary every `period` lines starting with the first, truncated to
/// `length`. Holds exactly `ceil(length / period)` boundaries.
pub fn naive_baseline(length: usize, period: usize) -> Vec<bool> {
    let period = period.max(1);
    (0..length).map(|index| index % period == 0).collect()
}
