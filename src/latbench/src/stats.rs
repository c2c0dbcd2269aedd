/// How much of a per-size summary gets computed and reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryMode {
    /// mean latency and success count only
    Mean,
    /// additionally median / p95 / p99
    Percentiles,
}

/// Summary over the successful latencies of one payload size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeSummary {
    pub mean: f64,
    pub median: f64,
    pub p95: f64,
    pub p99: f64,
}

impl SizeSummary {
    /// `latencies` need not be sorted but must be non-empty.
    pub fn compute(latencies: &[f64]) -> SizeSummary {
        assert!(!latencies.is_empty());
        let mut sorted = latencies.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        SizeSummary {
            mean: sorted.iter().sum::<f64>() / sorted.len() as f64,
            median: percentile(&sorted, 0.5),
            p95: percentile(&sorted, 0.95),
            p99: percentile(&sorted, 0.99),
        }
    }
}

/// Truncating-index percentile over an ascending-sorted slice:
/// `sorted[floor(len * fraction)]`. Not the interpolating textbook
/// definition; the index formula is part of the output contract.
pub fn percentile(sorted: &[f64], fraction: f64) -> f64 {
    let idx = (sorted.len() as f64 * fraction) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_index_formula_is_pinned() {
        let sorted: Vec<f64> = (1..=10).map(|v| v as f64).collect();

        // median: idx = floor(10 * 0.5) = 5 -> 6 (0-based ascending)
        assert_eq!(percentile(&sorted, 0.5), 6.0);
        // p95: idx = floor(10 * 0.95) = 9 -> 10
        assert_eq!(percentile(&sorted, 0.95), 10.0);
        // p99: idx = floor(10 * 0.99) = 9 -> 10
        assert_eq!(percentile(&sorted, 0.99), 10.0);
    }

    #[test]
    fn summary_over_unsorted_input() {
        let latencies = vec![5.0, 1.0, 4.0, 2.0, 3.0];
        let summary = SizeSummary::compute(&latencies);
        assert_eq!(summary.mean, 3.0);
        // idx = floor(5 * 0.5) = 2 -> 3
        assert_eq!(summary.median, 3.0);
        // idx = floor(5 * 0.95) = 4 -> 5
        assert_eq!(summary.p95, 5.0);
        assert_eq!(summary.p99, 5.0);
    }

    #[test]
    fn single_sample() {
        let summary = SizeSummary::compute(&[7.5]);
        assert_eq!(summary.mean, 7.5);
        assert_eq!(summary.median, 7.5);
        assert_eq!(summary.p95, 7.5);
        assert_eq!(summary.p99, 7.5);
    }
}
