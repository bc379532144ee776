//! Baseline and trend endpoints

use super::{evaluations::parse_evaluation_id, ApiError, ApiJson, AppState};
use crate::services::{DriftReport, StatisticalAnalyzer, Trend};
use crate::types::{Baseline, EvaluationId, StatisticalParams, ZoneStatus};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

const DRIFT_THRESHOLD: f64 = 2.0;

#[derive(Debug, Deserialize)]
pub struct CreateBaselineRequest {
    pub evaluation_id: String,
    pub name: Option<String>,
    pub green_zone_max: Option<f64>,
    pub yellow_zone_max: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct TimeSeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub score: f64,
    pub zone: String,
}

#[derive(Debug, Serialize)]
pub struct TrendsResponse {
    pub evaluation_id: EvaluationId,
    pub current_zone: String,
    pub trend: Trend,
    pub time_series: Vec<TimeSeriesPoint>,
    pub drift_alerts: Vec<DriftReport>,
}

/// `POST /api/baselines`
///
/// Derives baseline parameters from the evaluation's score history and
/// stores them under a generated or caller-supplied name. Explicit zone
/// thresholds override the derived ones.
pub async fn create_baseline(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateBaselineRequest>,
) -> Result<(StatusCode, Json<Baseline>), ApiError> {
    if let Some(green) = payload.green_zone_max {
        if let Some(yellow) = payload.yellow_zone_max {
            if green >= yellow {
                return Err(ApiError::validation(
                    "green_zone_max must be below yellow_zone_max",
                    Some(json!({"green_zone_max": green, "yellow_zone_max": yellow})),
                ));
            }
        }
    }

    let id = parse_evaluation_id(&payload.evaluation_id)?;
    let evaluation = state
        .storage
        .get_evaluation(id)
        .await
        .map_err(|e| state.api_error(e))?;

    let history: Vec<f64> = evaluation.overall_score.into_iter().collect();
    let params = StatisticalAnalyzer::calculate_baseline(&history);

    let baseline = Baseline {
        id: Uuid::new_v4(),
        name: payload
            .name
            .unwrap_or_else(|| format!("Baseline for {}", evaluation.ai_system_name)),
        green_zone_max: payload.green_zone_max.unwrap_or(params.green_zone_max),
        yellow_zone_max: payload.yellow_zone_max.unwrap_or(params.yellow_zone_max),
        statistical_params: StatisticalParams {
            mean: params.mean,
            std_dev: params.std_dev,
            sample_size: params.sample_size,
        },
        created_at: Utc::now(),
    };

    state
        .storage
        .create_baseline(&baseline)
        .await
        .map_err(|e| state.api_error(e))?;

    info!("Created baseline {} ({})", baseline.id, baseline.name);
    Ok((StatusCode::CREATED, Json(baseline)))
}

/// `GET /api/baselines/{id}`
pub async fn get_baseline(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Baseline>, ApiError> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::not_found(format!("Baseline {} not found", id)))?;

    let baseline = state
        .storage
        .get_baseline(id)
        .await
        .map_err(|e| state.api_error(e))?;

    Ok(Json(baseline))
}

/// `GET /api/evaluations/{id}/trends`
///
/// Time series of scores with zone labels, trend direction, and drift
/// alerts. Requires the evaluation to have been executed.
pub async fn get_trends(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TrendsResponse>, ApiError> {
    let id = parse_evaluation_id(&id)?;
    let evaluation = state
        .storage
        .get_evaluation(id)
        .await
        .map_err(|e| state.api_error(e))?;

    let score = evaluation.overall_score.ok_or_else(|| {
        ApiError::bad_request(
            "EVALUATION_FAILED",
            "Evaluation has not been executed yet",
            None,
        )
    })?;

    let zone_label = |zone: Option<ZoneStatus>| {
        zone.map(|z| z.as_str().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    };

    let time_series = vec![TimeSeriesPoint {
        timestamp: evaluation.completed_at.unwrap_or(evaluation.created_at),
        score,
        zone: zone_label(evaluation.zone_status),
    }];

    let scores: Vec<f64> = time_series.iter().map(|p| p.score).collect();
    let drift = StatisticalAnalyzer::detect_drift(score, &scores, DRIFT_THRESHOLD);
    let drift_alerts = if drift.has_drift { vec![drift] } else { Vec::new() };

    Ok(Json(TrendsResponse {
        evaluation_id: id,
        current_zone: zone_label(evaluation.zone_status),
        trend: StatisticalAnalyzer::calculate_trend(&scores),
        time_series,
        drift_alerts,
    }))
}
