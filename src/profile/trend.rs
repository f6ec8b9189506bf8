//! Small statistics shared by the profile analyzers.

use crate::model::Trend;

/// Arithmetic mean; 0 for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0 for fewer than two values.
#[must_use]
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Compare the mean of the last `recent` values with the mean of everything before.
///
/// A relative change beyond `threshold` (0.10 = 10%) in either direction is a trend.
/// With no earlier values, or an earlier mean of zero, the result is stable.
#[must_use]
pub fn trend(values: &[f64], recent: usize, threshold: f64) -> Trend {
    if values.len() <= recent {
        return Trend::Stable;
    }
    let (earlier, last) = values.split_at(values.len() - recent);
    compare(mean(earlier), mean(last), threshold)
}

/// Compare the last `window` values with the `window` values before them.
///
/// Stable until there are at least `2 * window` values.
#[must_use]
pub fn windowed_trend(values: &[f64], window: usize, threshold: f64) -> Trend {
    if window == 0 || values.len() < 2 * window {
        return Trend::Stable;
    }
    let end = values.len();
    let last = &values[end - window..];
    let prior = &values[end - 2 * window..end - window];
    compare(mean(prior), mean(last), threshold)
}

fn compare(before: f64, after: f64, threshold: f64) -> Trend {
    if before <= 0.0 {
        return Trend::Stable;
    }
    let change = (after - before) / before;
    if change > threshold {
        Trend::Improving
    } else if change < -threshold {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_std_dev() {
        assert_eq!(mean(&[]), 0.0);
        assert!((mean(&[2.0, 4.0]) - 3.0).abs() < f64::EPSILON);
        assert!((std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]) - 2.0).abs() < 1e-9);
        assert_eq!(std_dev(&[5.0]), 0.0);
    }

    #[test]
    fn test_trend() {
        assert_eq!(trend(&[50.0, 50.0, 50.0], 3, 0.1), Trend::Stable);
        assert_eq!(trend(&[50.0, 60.0, 60.0, 60.0], 3, 0.1), Trend::Improving);
        assert_eq!(trend(&[50.0, 40.0, 40.0, 40.0], 3, 0.1), Trend::Declining);
        assert_eq!(trend(&[50.0, 54.0, 54.0, 54.0], 3, 0.1), Trend::Stable);
    }

    #[test]
    fn test_windowed_trend() {
        assert_eq!(windowed_trend(&[60.0; 5], 3, 0.05), Trend::Stable);
        assert_eq!(
            windowed_trend(&[10.0, 60.0, 60.0, 60.0, 70.0, 70.0, 70.0], 3, 0.05),
            Trend::Improving
        );
        assert_eq!(
            windowed_trend(&[60.0, 60.0, 60.0, 50.0, 50.0, 50.0], 3, 0.05),
            Trend::Declining
        );
    }
}
