//! Read-side derivations over the health history: correlation, forecast,
//! trends, and anomaly detection. Everything here is pure; insufficient
//! data yields empty or neutral results rather than errors.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::models::{HealthMetrics, HistoryPoint, Metric};

/// Pearson product-moment correlation over equal-length paired samples.
///
/// Returns `0.0` for empty input, zero variance, or a zero denominator so
/// NaN never escapes into downstream scoring. Mismatched lengths are a
/// programming error and fail with `InvalidInput`.
pub fn pearson(x: &[f64], y: &[f64]) -> Result<f64> {
    if x.len() != y.len() {
        return Err(CoreError::InvalidInput(format!(
            "series length mismatch: {} vs {}",
            x.len(),
            y.len()
        )));
    }
    let n = x.len();
    if n == 0 {
        return Ok(0.0);
    }
    let nf = n as f64;
    let sum_x: f64 = x.iter().sum();
    let sum_y: f64 = y.iter().sum();
    let sum_xy: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();
    let sum_x2: f64 = x.iter().map(|a| a * a).sum();
    let sum_y2: f64 = y.iter().map(|b| b * b).sum();

    let numerator = nf * sum_xy - sum_x * sum_y;
    let denominator = ((nf * sum_x2 - sum_x * sum_x) * (nf * sum_y2 - sum_y * sum_y)).sqrt();
    if denominator == 0.0 {
        return Ok(0.0);
    }
    Ok(numerator / denominator)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    High,
    Medium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correlation {
    pub impact: Impact,
    pub direction: Direction,
}

/// Classify a correlation coefficient. `|r| <= 0.3` is too weak to surface
/// and returns `None`; callers drop those pairs entirely.
#[must_use]
pub fn classify(r: f64) -> Option<Correlation> {
    let strength = r.abs();
    let impact = if strength > 0.6 {
        Impact::High
    } else if strength > 0.3 {
        Impact::Medium
    } else {
        return None;
    };
    let direction = if r > 0.0 {
        Direction::Positive
    } else {
        Direction::Negative
    };
    Some(Correlation { impact, direction })
}

/// A surfaced relationship between a lifestyle factor and activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationInsight {
    pub factor: Metric,
    pub impact: Impact,
    pub direction: Direction,
    pub score: f64,
    pub description: String,
}

const MIN_CORRELATION_POINTS: usize = 7;

/// Pairwise correlations between daily steps and the factors known to move
/// with activity (sleep, mood). Needs at least 7 history points; weak
/// correlations are filtered out, not labeled.
#[must_use]
pub fn correlation_insights(history: &[HistoryPoint]) -> Vec<CorrelationInsight> {
    if history.len() < MIN_CORRELATION_POINTS {
        return Vec::new();
    }

    let factors = [
        (Metric::Sleep, "sleep duration"),
        (Metric::Mood, "mood"),
    ];

    let mut insights = Vec::new();
    for (factor, label) in factors {
        let mut steps = Vec::new();
        let mut values = Vec::new();
        for point in history {
            if let Some(value) = point.metrics.value(factor) {
                steps.push(point.metrics.steps);
                values.push(value);
            }
        }
        if steps.len() < MIN_CORRELATION_POINTS {
            continue;
        }
        let r = pearson(&steps, &values).unwrap_or(0.0);
        let Some(correlation) = classify(r) else {
            continue;
        };
        let relation = match correlation.direction {
            Direction::Positive => "rises with",
            Direction::Negative => "drops as you gain",
        };
        insights.push(CorrelationInsight {
            factor,
            impact: correlation.impact,
            direction: correlation.direction,
            score: r,
            description: format!("Your daily activity {relation} {label}"),
        });
    }
    insights
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

/// Bounded composite wellness score for one day. Steps cap at 10,000 and
/// sleep at 8 hours so a single outlier day cannot dominate.
#[must_use]
pub fn wellness_score(point: &HistoryPoint) -> f64 {
    let steps = point.metrics.steps.min(10_000.0);
    let sleep = point.metrics.sleep.unwrap_or(0.0).min(8.0);
    steps / 10_000.0 * 50.0 + sleep / 8.0 * 50.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellnessForecast {
    pub predicted_score: f64,
    pub trend: Trend,
    pub confidence: f64,
}

/// Confidence estimator over the window's per-point scores. The default is
/// a fixed constant; whether it should derive from sample size or variance
/// is an open tuning point.
pub type ConfidenceFn = fn(&[f64]) -> f64;

const DEFAULT_CONFIDENCE: f64 = 0.8;
const FORECAST_WINDOW: usize = 7;

fn fixed_confidence(_scores: &[f64]) -> f64 {
    DEFAULT_CONFIDENCE
}

/// Forecast tomorrow's wellness from recent history with the default
/// 7-point window and constant confidence.
#[must_use]
pub fn forecast(history: &[HistoryPoint]) -> WellnessForecast {
    forecast_with(history, FORECAST_WINDOW, fixed_confidence)
}

/// Forecast with an explicit window and confidence estimator.
///
/// Fewer than 3 points is an expected steady state, not an error: the
/// result is neutral with zero confidence. The prediction is the average
/// score of the last `window` points; the trend compares the most recent
/// point's score against that average.
#[must_use]
pub fn forecast_with(
    history: &[HistoryPoint],
    window: usize,
    confidence: ConfidenceFn,
) -> WellnessForecast {
    if history.len() < 3 || window == 0 {
        return WellnessForecast {
            predicted_score: 0.0,
            trend: Trend::Stable,
            confidence: 0.0,
        };
    }

    let start = history.len().saturating_sub(window);
    let scores: Vec<f64> = history[start..].iter().map(wellness_score).collect();
    let average = scores.iter().sum::<f64>() / scores.len() as f64;
    let latest = scores[scores.len() - 1];

    let trend = if latest > average {
        Trend::Improving
    } else if latest < average {
        Trend::Declining
    } else {
        Trend::Stable
    };

    WellnessForecast {
        predicted_score: average.round(),
        trend,
        confidence: confidence(&scores),
    }
}

/// Average of a metric over the history, skipping days it was not logged.
/// Empty input (or a never-logged metric) averages to 0.
#[must_use]
pub fn metric_average(history: &[HistoryPoint], metric: Metric) -> f64 {
    let values: Vec<f64> = history
        .iter()
        .filter_map(|point| point.metrics.value(metric))
        .collect();
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Direction of a metric over the last 7 logged days, via a split-half
/// comparison with a 5% dead band. For steps/sleep/water more is
/// improving; for stress/heart-rate less is improving. Other metrics and
/// short histories read as stable.
#[must_use]
pub fn metric_trend(history: &[HistoryPoint], metric: Metric) -> Trend {
    if history.len() < 3 {
        return Trend::Stable;
    }
    let start = history.len().saturating_sub(7);
    let recent: Vec<f64> = history[start..]
        .iter()
        .filter_map(|point| point.metrics.value(metric))
        .collect();
    if recent.len() < 3 {
        return Trend::Stable;
    }

    let midpoint = recent.len() / 2;
    let first_avg = recent[..midpoint].iter().sum::<f64>() / midpoint as f64;
    let second_avg = recent[midpoint..].iter().sum::<f64>() / (recent.len() - midpoint) as f64;
    if first_avg == 0.0 {
        return Trend::Stable;
    }

    let change = (second_avg - first_avg) / first_avg * 100.0;
    if change.abs() < 5.0 {
        return Trend::Stable;
    }

    match metric {
        Metric::Steps | Metric::Sleep | Metric::Water => {
            if change > 0.0 {
                Trend::Improving
            } else {
                Trend::Declining
            }
        }
        Metric::Stress | Metric::HeartRate => {
            if change < 0.0 {
                Trend::Improving
            } else {
                Trend::Declining
            }
        }
        _ => Trend::Stable,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// A metric value that deviates notably from its historical average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub metric: Metric,
    pub current: f64,
    pub expected: f64,
    pub deviation: f64,
    pub severity: Severity,
}

/// Relative deviation allowed per metric before a value reads as anomalous.
fn deviation_threshold(metric: Metric) -> f64 {
    match metric {
        Metric::HeartRate => 0.15,
        Metric::Sleep => 0.25,
        _ => 0.3,
    }
}

const ANOMALY_METRICS: [Metric; 5] = [
    Metric::Steps,
    Metric::HeartRate,
    Metric::Sleep,
    Metric::Water,
    Metric::Calories,
];

/// Compare today's metrics against the history averages. Severity bands at
/// 1x, 1.5x, and 2x the per-metric threshold. Needs at least 3 history
/// points to have a meaningful baseline.
#[must_use]
pub fn detect_anomalies(current: &HealthMetrics, history: &[HistoryPoint]) -> Vec<Anomaly> {
    if history.len() < 3 {
        return Vec::new();
    }

    let mut anomalies = Vec::new();
    for metric in ANOMALY_METRICS {
        let Some(value) = current.value(metric) else {
            continue;
        };
        let average = metric_average(history, metric);
        if average == 0.0 {
            continue;
        }
        let deviation = ((value - average) / average).abs();
        let threshold = deviation_threshold(metric);
        if deviation <= threshold {
            continue;
        }
        let severity = if deviation > threshold * 2.0 {
            Severity::High
        } else if deviation > threshold * 1.5 {
            Severity::Medium
        } else {
            Severity::Low
        };
        anomalies.push(Anomaly {
            metric,
            current: value,
            expected: average,
            deviation,
            severity,
        });
    }
    anomalies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MoodLevel;
    use chrono::NaiveDate;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, n).unwrap()
    }

    fn point(n: u32, steps: f64, sleep: Option<f64>) -> HistoryPoint {
        HistoryPoint {
            date: day(n),
            metrics: HealthMetrics {
                steps,
                sleep,
                ..HealthMetrics::default()
            },
        }
    }

    #[test]
    fn test_pearson_perfect_positive() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        let r = pearson(&x, &y).unwrap();
        assert!((r - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_pearson_perfect_negative() {
        let x = [1.0, 2.0, 3.0];
        let y = [3.0, 2.0, 1.0];
        let r = pearson(&x, &y).unwrap();
        assert!((r + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_pearson_self_correlation_is_one() {
        let x = [3.0, 7.0, 1.0, 9.0, 4.0];
        let r = pearson(&x, &x).unwrap();
        assert!((r - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_pearson_bounded() {
        let x = [1.0, 5.0, 2.0, 8.0, 3.0];
        let y = [9.0, 1.0, 7.0, 2.0, 5.0];
        let r = pearson(&x, &y).unwrap();
        assert!((-1.0..=1.0).contains(&r));
    }

    #[test]
    fn test_pearson_constant_series_is_zero_not_nan() {
        let x = [5.0, 5.0, 5.0];
        let y = [1.0, 2.0, 3.0];
        let r = pearson(&x, &y).unwrap();
        assert_eq!(r, 0.0);
    }

    #[test]
    fn test_pearson_empty_is_zero() {
        assert_eq!(pearson(&[], &[]).unwrap(), 0.0);
    }

    #[test]
    fn test_pearson_length_mismatch_is_invalid_input() {
        let err = pearson(&[1.0, 2.0], &[1.0]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn test_classify_thresholds() {
        assert_eq!(
            classify(0.7),
            Some(Correlation {
                impact: Impact::High,
                direction: Direction::Positive,
            })
        );
        assert_eq!(
            classify(-0.5),
            Some(Correlation {
                impact: Impact::Medium,
                direction: Direction::Negative,
            })
        );
        assert_eq!(classify(0.3), None);
        assert_eq!(classify(-0.1), None);
        assert_eq!(classify(0.0), None);
    }

    #[test]
    fn test_forecast_below_minimum_is_neutral() {
        let history = vec![point(1, 8000.0, Some(7.0)), point(2, 9000.0, Some(7.5))];
        let result = forecast(&history);
        assert_eq!(result.predicted_score, 0.0);
        assert_eq!(result.trend, Trend::Stable);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_forecast_improving_when_latest_above_average() {
        let history = vec![
            point(1, 2000.0, Some(5.0)),
            point(2, 3000.0, Some(6.0)),
            point(3, 10_000.0, Some(8.0)),
        ];
        let result = forecast(&history);
        assert_eq!(result.trend, Trend::Improving);
        assert!((result.confidence - 0.8).abs() < 1e-9);
        assert!(result.predicted_score > 0.0);
    }

    #[test]
    fn test_forecast_declining_when_latest_below_average() {
        let history = vec![
            point(1, 10_000.0, Some(8.0)),
            point(2, 9000.0, Some(8.0)),
            point(3, 1000.0, Some(3.0)),
        ];
        let result = forecast(&history);
        assert_eq!(result.trend, Trend::Declining);
    }

    #[test]
    fn test_forecast_caps_outlier_days() {
        let history = vec![
            point(1, 10_000.0, Some(8.0)),
            point(2, 10_000.0, Some(8.0)),
            point(3, 50_000.0, Some(20.0)),
        ];
        let result = forecast(&history);
        // Every point saturates both caps, so the scores are identical.
        assert_eq!(result.predicted_score, 100.0);
        assert_eq!(result.trend, Trend::Stable);
    }

    #[test]
    fn test_forecast_with_custom_confidence() {
        let history = vec![
            point(1, 5000.0, Some(7.0)),
            point(2, 6000.0, Some(7.0)),
            point(3, 7000.0, Some(7.0)),
        ];
        fn sample_size_confidence(scores: &[f64]) -> f64 {
            scores.len() as f64 / 10.0
        }
        let result = forecast_with(&history, 7, sample_size_confidence);
        assert!((result.confidence - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_correlation_insights_need_seven_points() {
        let history: Vec<HistoryPoint> = (1..=6)
            .map(|n| point(n, f64::from(n) * 1000.0, Some(f64::from(n))))
            .collect();
        assert!(correlation_insights(&history).is_empty());
    }

    #[test]
    fn test_correlation_insights_surface_strong_sleep_link() {
        let history: Vec<HistoryPoint> = (1..=8)
            .map(|n| point(n, f64::from(n) * 1000.0, Some(4.0 + f64::from(n) * 0.5)))
            .collect();
        let insights = correlation_insights(&history);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].factor, Metric::Sleep);
        assert_eq!(insights[0].impact, Impact::High);
        assert_eq!(insights[0].direction, Direction::Positive);
    }

    #[test]
    fn test_correlation_insights_include_mood() {
        let moods = [
            MoodLevel::Struggling,
            MoodLevel::Low,
            MoodLevel::Low,
            MoodLevel::Okay,
            MoodLevel::Okay,
            MoodLevel::Good,
            MoodLevel::Good,
            MoodLevel::Excellent,
        ];
        let history: Vec<HistoryPoint> = moods
            .iter()
            .enumerate()
            .map(|(i, mood)| {
                let n = u32::try_from(i).unwrap() + 1;
                HistoryPoint {
                    date: day(n),
                    metrics: HealthMetrics {
                        steps: f64::from(n) * 1200.0,
                        mood: Some(*mood),
                        ..HealthMetrics::default()
                    },
                }
            })
            .collect();
        let insights = correlation_insights(&history);
        assert!(insights.iter().any(|i| i.factor == Metric::Mood));
    }

    #[test]
    fn test_metric_average_skips_unlogged_days() {
        let history = vec![
            point(1, 1000.0, Some(6.0)),
            point(2, 2000.0, None),
            point(3, 3000.0, Some(8.0)),
        ];
        assert!((metric_average(&history, Metric::Sleep) - 7.0).abs() < 1e-9);
        assert!((metric_average(&history, Metric::Steps) - 2000.0).abs() < 1e-9);
        assert_eq!(metric_average(&history, Metric::Water), 0.0);
    }

    #[test]
    fn test_metric_trend_direction_aware() {
        let rising = vec![
            point(1, 1000.0, None),
            point(2, 1000.0, None),
            point(3, 2000.0, None),
            point(4, 2000.0, None),
        ];
        assert_eq!(metric_trend(&rising, Metric::Steps), Trend::Improving);

        let stress_rising: Vec<HistoryPoint> = [2.0, 2.0, 6.0, 6.0]
            .iter()
            .enumerate()
            .map(|(i, stress)| HistoryPoint {
                date: day(u32::try_from(i).unwrap() + 1),
                metrics: HealthMetrics {
                    steps: 1000.0,
                    stress: Some(*stress),
                    ..HealthMetrics::default()
                },
            })
            .collect();
        assert_eq!(metric_trend(&stress_rising, Metric::Stress), Trend::Declining);
    }

    #[test]
    fn test_metric_trend_dead_band_reads_stable() {
        let history = vec![
            point(1, 1000.0, None),
            point(2, 1010.0, None),
            point(3, 1020.0, None),
            point(4, 1030.0, None),
        ];
        assert_eq!(metric_trend(&history, Metric::Steps), Trend::Stable);
    }

    #[test]
    fn test_detect_anomalies_needs_baseline() {
        let current = HealthMetrics {
            steps: 100.0,
            ..HealthMetrics::default()
        };
        let history = vec![point(1, 8000.0, None), point(2, 8000.0, None)];
        assert!(detect_anomalies(&current, &history).is_empty());
    }

    #[test]
    fn test_detect_anomalies_flags_low_steps_with_severity() {
        let history = vec![
            point(1, 8000.0, Some(7.0)),
            point(2, 8000.0, Some(7.0)),
            point(3, 8000.0, Some(7.0)),
        ];
        let current = HealthMetrics {
            steps: 1000.0, // 87.5% below average, far past 2x the 30% threshold
            sleep: Some(7.0),
            ..HealthMetrics::default()
        };
        let anomalies = detect_anomalies(&current, &history);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].metric, Metric::Steps);
        assert_eq!(anomalies[0].severity, Severity::High);
        assert!((anomalies[0].expected - 8000.0).abs() < 1e-9);
    }

    #[test]
    fn test_detect_anomalies_within_threshold_is_quiet() {
        let history = vec![
            point(1, 8000.0, None),
            point(2, 8000.0, None),
            point(3, 8000.0, None),
        ];
        let current = HealthMetrics {
            steps: 7000.0,
            ..HealthMetrics::default()
        };
        assert!(detect_anomalies(&current, &history).is_empty());
    }
}
