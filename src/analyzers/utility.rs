use serde::Serialize;

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Computes the population standard deviation given a pre-computed mean.
/// Returns 0.0 for empty input.
pub fn stddev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;

    variance.sqrt()
}

/// Mean, spread and range of one metric across a section's populated cells.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricSummary {
    pub mean: f64,
    pub stddev: f64,
    pub min: f64,
    pub max: f64,
}

/// Summarizes the present values of `values`; `None` if there are none.
pub fn summarize(values: impl Iterator<Item = Option<f64>>) -> Option<MetricSummary> {
    let present: Vec<f64> = values.flatten().collect();
    if present.is_empty() {
        return None;
    }

    let avg = mean(&present);
    Some(MetricSummary {
        mean: avg,
        stddev: stddev(&present, avg),
        min: present.iter().copied().fold(f64::INFINITY, f64::min),
        max: present.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_stddev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let m = mean(&values);
        assert_eq!(m, 5.0);
        assert_eq!(stddev(&values, m), 2.0);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(stddev(&[], 1.0), 0.0);
        assert!(summarize(vec![None, None].into_iter()).is_none());
    }

    #[test]
    fn test_summarize_skips_missing() {
        let s = summarize(vec![Some(1.0), None, Some(3.0)].into_iter()).unwrap();
        assert_eq!(s.mean, 2.0);
        assert_eq!(s.stddev, 1.0);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 3.0);
    }
}
