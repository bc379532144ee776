//! Statistical analysis of evaluation scores
//!
//! Derives baseline parameters and zone thresholds from historical scores,
//! aggregates per-finding severity scores into an overall score, and detects
//! drift of a current score against its history.

use crate::types::ZoneStatus;
use serde::Serialize;

/// Baseline parameters derived from historical scores
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaselineParams {
    pub mean: f64,
    pub std_dev: f64,
    pub green_zone_max: f64,
    pub yellow_zone_max: f64,
    pub sample_size: u32,
}

/// Outcome of drift detection for a single score
#[derive(Debug, Clone, Serialize)]
pub struct DriftReport {
    pub has_drift: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deviation: Option<f64>,
    pub message: String,
}

/// Direction of a score series over time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
    InsufficientData,
}

/// Service for calculating statistical baselines and trends
pub struct StatisticalAnalyzer;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation
fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

impl StatisticalAnalyzer {
    /// Calculate baseline parameters from historical scores
    ///
    /// With no history, returns the default baseline (mean 30, std dev 15).
    /// Zone thresholds are mean + 0.5σ (green) and mean + 1.5σ (yellow);
    /// anything above the yellow maximum is red.
    pub fn calculate_baseline(historical_scores: &[f64]) -> BaselineParams {
        if historical_scores.is_empty() {
            return BaselineParams {
                mean: 30.0,
                std_dev: 15.0,
                green_zone_max: 37.5,
                yellow_zone_max: 52.5,
                sample_size: 0,
            };
        }

        let m = mean(historical_scores);
        let sd = std_dev(historical_scores);

        BaselineParams {
            mean: round2(m),
            std_dev: round2(sd),
            green_zone_max: round2(m + 0.5 * sd),
            yellow_zone_max: round2(m + 1.5 * sd),
            sample_size: historical_scores.len() as u32,
        }
    }

    /// Classify a score against zone thresholds
    pub fn determine_zone_status(score: f64, green_max: f64, yellow_max: f64) -> ZoneStatus {
        if score <= green_max {
            ZoneStatus::Green
        } else if score <= yellow_max {
            ZoneStatus::Yellow
        } else {
            ZoneStatus::Red
        }
    }

    /// Aggregate per-finding severity scores into an overall score (0-100)
    ///
    /// Scores are sorted descending and combined with harmonic weights
    /// 1/(i+1), so the worst findings dominate the aggregate.
    pub fn calculate_overall_score(severity_scores: &[f64]) -> f64 {
        if severity_scores.is_empty() {
            return 0.0;
        }

        let mut sorted = severity_scores.to_vec();
        sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;
        for (i, score) in sorted.iter().enumerate() {
            let weight = 1.0 / (i as f64 + 1.0);
            weighted_sum += score * weight;
            total_weight += weight;
        }

        round2(weighted_sum / total_weight)
    }

    /// Classify the direction of a score series by its least-squares slope
    ///
    /// Slopes within ±0.5 per step count as stable. Fewer than 2 points is
    /// insufficient data.
    pub fn calculate_trend(scores: &[f64]) -> Trend {
        if scores.len() < 2 {
            return Trend::InsufficientData;
        }

        let n = scores.len() as f64;
        let x_mean = (n - 1.0) / 2.0;
        let y_mean = mean(scores);

        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for (i, score) in scores.iter().enumerate() {
            let dx = i as f64 - x_mean;
            numerator += dx * (score - y_mean);
            denominator += dx * dx;
        }

        let slope = numerator / denominator;
        if slope.abs() < 0.5 {
            Trend::Stable
        } else if slope > 0.0 {
            Trend::Increasing
        } else {
            Trend::Decreasing
        }
    }

    /// Detect whether a score drifts significantly from its history
    ///
    /// Requires at least 3 historical points; flags drift when the z-score
    /// exceeds `threshold` standard deviations.
    pub fn detect_drift(current_score: f64, historical_scores: &[f64], threshold: f64) -> DriftReport {
        if historical_scores.len() < 3 {
            return DriftReport {
                has_drift: false,
                z_score: None,
                deviation: None,
                message: "Insufficient historical data for drift detection".to_string(),
            };
        }

        let m = mean(historical_scores);
        let sd = std_dev(historical_scores);

        if sd == 0.0 {
            return DriftReport {
                has_drift: current_score != m,
                z_score: None,
                deviation: Some((current_score - m).abs()),
                message: format!("Score differs from constant baseline of {:.2}", m),
            };
        }

        let z_score = (current_score - m) / sd;
        let has_drift = z_score.abs() > threshold;

        DriftReport {
            has_drift,
            z_score: Some(round2(z_score)),
            deviation: Some(round2((current_score - m).abs())),
            message: if has_drift {
                format!(
                    "Score is {:.2} standard deviations from baseline",
                    z_score.abs()
                )
            } else {
                "No significant drift detected".to_string()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_baseline_without_history() {
        let baseline = StatisticalAnalyzer::calculate_baseline(&[]);
        assert_eq!(baseline.mean, 30.0);
        assert_eq!(baseline.std_dev, 15.0);
        assert_eq!(baseline.green_zone_max, 37.5);
        assert_eq!(baseline.yellow_zone_max, 52.5);
        assert_eq!(baseline.sample_size, 0);
    }

    #[test]
    fn test_baseline_thresholds_from_history() {
        // mean 40, population std dev ~8.16 -> green ~44.08, yellow ~52.25
        let baseline = StatisticalAnalyzer::calculate_baseline(&[30.0, 40.0, 50.0]);
        assert_eq!(baseline.mean, 40.0);
        assert!((baseline.std_dev - 8.16).abs() < 0.01);
        assert_eq!(baseline.sample_size, 3);
        assert!(baseline.green_zone_max < baseline.yellow_zone_max);
    }

    #[test]
    fn test_zone_classification_boundaries() {
        assert_eq!(
            StatisticalAnalyzer::determine_zone_status(37.5, 37.5, 52.5),
            ZoneStatus::Green
        );
        assert_eq!(
            StatisticalAnalyzer::determine_zone_status(40.0, 37.5, 52.5),
            ZoneStatus::Yellow
        );
        assert_eq!(
            StatisticalAnalyzer::determine_zone_status(60.0, 37.5, 52.5),
            ZoneStatus::Red
        );
    }

    #[test]
    fn test_overall_score_weights_worst_findings() {
        // Single score passes through unchanged
        assert_eq!(StatisticalAnalyzer::calculate_overall_score(&[42.0]), 42.0);

        // 80 gets weight 1, 20 gets weight 1/2 -> (80 + 10) / 1.5 = 60
        assert_eq!(
            StatisticalAnalyzer::calculate_overall_score(&[20.0, 80.0]),
            60.0
        );

        assert_eq!(StatisticalAnalyzer::calculate_overall_score(&[]), 0.0);
    }

    #[test]
    fn test_trend_classification() {
        assert_eq!(StatisticalAnalyzer::calculate_trend(&[42.0]), Trend::InsufficientData);
        assert_eq!(
            StatisticalAnalyzer::calculate_trend(&[30.0, 35.0, 40.0]),
            Trend::Increasing
        );
        assert_eq!(
            StatisticalAnalyzer::calculate_trend(&[40.0, 35.0, 30.0]),
            Trend::Decreasing
        );
        assert_eq!(
            StatisticalAnalyzer::calculate_trend(&[30.0, 30.2, 30.1]),
            Trend::Stable
        );
    }

    #[test]
    fn test_drift_requires_history() {
        let report = StatisticalAnalyzer::detect_drift(90.0, &[50.0], 2.0);
        assert!(!report.has_drift);
        assert!(report.z_score.is_none());
    }

    #[test]
    fn test_drift_detected_beyond_threshold() {
        let history = [30.0, 32.0, 28.0, 31.0, 29.0];
        let report = StatisticalAnalyzer::detect_drift(90.0, &history, 2.0);
        assert!(report.has_drift);
        assert!(report.z_score.unwrap() > 2.0);
    }

    #[test]
    fn test_no_drift_near_baseline() {
        let history = [30.0, 32.0, 28.0, 31.0, 29.0];
        let report = StatisticalAnalyzer::detect_drift(30.5, &history, 2.0);
        assert!(!report.has_drift);
        assert_eq!(report.message, "No significant drift detected");
    }
}
