use chrono::{Duration, NaiveDate};
use serde::Serialize;
use thiserror::Error;

/// Label attached to every projected point so rendering can tell the
/// forecast apart from observed history.
pub const SERIES_LABEL: &str = "Forecast";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ForecastError {
    #[error("forecast requires at least one observed week")]
    InsufficientData,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ForecastPoint {
    pub week: NaiveDate,
    pub predicted: f64,
    pub series_label: &'static str,
}

/// Projects `horizon` future weekly values by extending the least-squares
/// line through the observed series. The series must be chronologically
/// ordered; `last_week` identifies the final observed week (under whatever
/// convention the caller labels weeks by) and point `i` (zero-indexed) is
/// dated `last_week + (i + 1)` weeks. Predictions are deliberately not
/// clamped to [0, 100] even for percentage series.
pub fn forecast(
    series: &[f64],
    last_week: NaiveDate,
    horizon: usize,
) -> Result<Vec<ForecastPoint>, ForecastError> {
    if series.is_empty() {
        return Err(ForecastError::InsufficientData);
    }

    let (slope, intercept) = fit_line(series);
    let n = series.len();

    Ok((0..horizon)
        .map(|i| {
            let x = (n + i) as f64;
            ForecastPoint {
                week: last_week + Duration::weeks(i as i64 + 1),
                predicted: slope * x + intercept,
                series_label: SERIES_LABEL,
            }
        })
        .collect())
}

/// Ordinary least squares fit of `y = slope * x + intercept` over
/// `(x = 0..n-1, y = series)`. A single observation degenerates to a flat
/// line; identical y-values give slope 0 without error.
fn fit_line(series: &[f64]) -> (f64, f64) {
    if series.len() == 1 {
        return (0.0, series[0]);
    }

    let n = series.len() as f64;
    let sum_x: f64 = (0..series.len()).map(|x| x as f64).sum();
    let sum_y: f64 = series.iter().sum();
    let sum_xy: f64 = series.iter().enumerate().map(|(x, y)| x as f64 * y).sum();
    let sum_xx: f64 = (0..series.len()).map(|x| (x * x) as f64).sum();

    let slope = (n * sum_xy - sum_x * sum_y) / (n * sum_xx - sum_x * sum_x);
    let intercept = (sum_y - slope * sum_x) / n;
    (slope, intercept)
}
