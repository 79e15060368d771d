//! Small numeric helpers for the seasonal model.
//!
//! All functions return `NaN` rather than failing when a statistic is
//! undefined for the given input.

/// Arithmetic mean. `NaN` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation with the N-1 denominator. `NaN` for fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

/// Centered rolling mean over a full window.
///
/// For an even `window` the window at index `i` spans `i - window/2 ..= i + window/2 - 1`,
/// so with 30 samples it holds 15 values before `i`, `i` itself and 14 after.
/// Positions where the window would run past either end are `None`.
pub fn centered_rolling_mean(series: &[f64], window: usize) -> Vec<Option<f64>> {
    let n = series.len();
    let mut result = vec![None; n];
    if window == 0 || n < window {
        return result;
    }

    let before = window / 2;
    let after = window - before - 1;

    // running sum over series[start..start + window]
    let mut sum: f64 = series[..window].iter().sum();
    for start in 0..=(n - window) {
        if start > 0 {
            sum += series[start + window - 1] - series[start - 1];
        }
        let center = start + before;
        debug_assert!(center + after < n);
        result[center] = Some(sum / window as f64);
    }

    result
}
