//! Column statistics
//!
//! Small numeric helpers shared by the pipeline stages. Every function works on
//! a whole column at once and treats `None` as a missing value.

/// Arithmetic mean, `None` for an empty input
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divides by `n`)
pub fn population_std(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Sample standard deviation (divides by `n - 1`)
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Quantile `q` in `[0, 1]` of an ascending slice, linearly interpolated
/// between the two closest ranks (`pos = q * (n - 1)`).
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Quantile of the present values of a column
pub fn quantile(values: &[Option<f64>], q: f64) -> Option<f64> {
    let mut present = present_values(values);
    present.sort_by(f64::total_cmp);
    quantile_sorted(&present, q)
}

/// Present values of a column, in order
pub fn present_values(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().filter_map(|v| *v).collect()
}

/// Centered rolling mean.
///
/// The window for index `i` spans `[i - w/2, i + w - 1 - w/2]`, so even windows
/// lean one sample to the left. A position gets a value only when at least
/// `min_periods` of its window falls inside the column.
pub fn centered_rolling_mean(
    values: &[f64],
    window: usize,
    min_periods: usize,
) -> Vec<Option<f64>> {
    let n = values.len();
    let left = window / 2;
    let right = window.saturating_sub(1) - left;
    let min_periods = min_periods.max(1);

    (0..n)
        .map(|i| {
            let start = i.saturating_sub(left);
            let end = (i + right).min(n.saturating_sub(1));
            let count = end + 1 - start;
            if count < min_periods {
                return None;
            }
            Some(values[start..=end].iter().sum::<f64>() / count as f64)
        })
        .collect()
}

/// Trailing rolling mean over the last `window` samples up to and including `i`
pub fn trailing_rolling_mean(
    values: &[f64],
    window: usize,
    min_periods: usize,
) -> Vec<Option<f64>> {
    let min_periods = min_periods.max(1);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window.max(1));
            let count = i + 1 - start;
            if count < min_periods {
                return None;
            }
            Some(values[start..=i].iter().sum::<f64>() / count as f64)
        })
        .collect()
}

/// Fill missing values by linear interpolation between the nearest present
/// neighbours (positions are treated as equally spaced), carrying forward.
/// Trailing gaps take the last present value; leading gaps have no left
/// neighbour and stay missing. A column with no present value is returned
/// unchanged.
pub fn interpolate_linear(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let anchors: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .collect();

    let Some(&last) = anchors.last() else {
        return values.to_vec();
    };

    let mut out = values.to_vec();
    for slot in out.iter_mut().skip(last.0 + 1) {
        *slot = Some(last.1);
    }
    for pair in anchors.windows(2) {
        let (i0, v0) = pair[0];
        let (i1, v1) = pair[1];
        let span = (i1 - i0) as f64;
        for (k, slot) in out.iter_mut().enumerate().take(i1).skip(i0 + 1) {
            let frac = (k - i0) as f64 / span;
            *slot = Some(v0 + (v1 - v0) * frac);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_population_vs_sample_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!(approx(population_std(&values).unwrap(), 2.0));
        let expected = (32.0_f64 / 7.0).sqrt();
        assert!(approx(sample_std(&values).unwrap(), expected));
        assert!(population_std(&[]).is_none());
        assert!(sample_std(&[1.0]).is_none());
    }

    #[test]
    fn test_quantile_linear() {
        let values = [Some(101.0), Some(99.0), None, Some(100.0), Some(102.0)];
        assert!(approx(quantile(&values, 0.25).unwrap(), 99.75));
        assert!(approx(quantile(&values, 0.5).unwrap(), 100.5));
        assert!(approx(quantile(&values, 0.75).unwrap(), 101.25));
        assert!(quantile(&[None, None], 0.5).is_none());
    }

    #[test]
    fn test_centered_window_three() {
        let means = centered_rolling_mean(&[1.0, 2.0, 3.0, 4.0, 5.0], 3, 3);
        assert_eq!(means, vec![None, Some(2.0), Some(3.0), Some(4.0), None]);
    }

    #[test]
    fn test_centered_even_window_leans_left() {
        let means = centered_rolling_mean(&[0.0, 1.0, 2.0, 3.0, 4.0], 4, 4);
        assert_eq!(means, vec![None, None, Some(1.5), Some(2.5), None]);
    }

    #[test]
    fn test_centered_partial_windows() {
        let means = centered_rolling_mean(&[1.0, 2.0, 3.0], 3, 1);
        assert_eq!(means, vec![Some(1.5), Some(2.0), Some(2.5)]);
    }

    #[test]
    fn test_window_longer_than_column() {
        let means = centered_rolling_mean(&[1.0, 2.0, 3.0], 60, 60);
        assert!(means.iter().all(Option::is_none));
    }

    #[test]
    fn test_trailing_window() {
        let means = trailing_rolling_mean(&[2.0, 4.0, 6.0, 8.0], 2, 1);
        assert_eq!(means, vec![Some(2.0), Some(3.0), Some(5.0), Some(7.0)]);
    }

    #[test]
    fn test_interpolate_interior_and_trailing() {
        let filled = interpolate_linear(&[Some(2.0), None, None, Some(8.0), None, None]);
        assert_eq!(
            filled,
            vec![Some(2.0), Some(4.0), Some(6.0), Some(8.0), Some(8.0), Some(8.0)]
        );
    }

    #[test]
    fn test_interpolate_leaves_leading_gap() {
        let filled = interpolate_linear(&[None, None, Some(3.0), None, Some(5.0)]);
        assert_eq!(filled, vec![None, None, Some(3.0), Some(4.0), Some(5.0)]);
    }

    #[test]
    fn test_interpolate_all_missing() {
        let filled = interpolate_linear(&[None, None]);
        assert_eq!(filled, vec![None, None]);
    }
}
