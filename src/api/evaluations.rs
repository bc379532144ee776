//! Evaluation endpoints: create, fetch, list, execute, report, delete

use super::{ApiError, ApiJson, ApiQuery, AppState};
use crate::services::{HeuristicDetector, ReportGenerator, StatisticalAnalyzer};
use crate::types::{Evaluation, EvaluationId, EvaluationStatus, HeuristicFinding, HeuristicType};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

/// Parse a path id, mapping garbage ids to the same 404 a missing row gets
pub(crate) fn parse_evaluation_id(id: &str) -> Result<EvaluationId, ApiError> {
    EvaluationId::from_string(id)
        .map_err(|_| ApiError::not_found(format!("Evaluation with id {} not found", id)))
}

#[derive(Debug, Deserialize)]
pub struct CreateEvaluationRequest {
    pub ai_system_name: String,
    pub heuristic_types: Vec<String>,
    pub iteration_count: u32,
}

#[derive(Debug, Serialize)]
pub struct EvaluationList {
    pub evaluations: Vec<Evaluation>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ReportParams {
    pub format: Option<String>,
}

/// `POST /api/evaluations`
///
/// Validates the payload before any database access: name length, heuristic
/// type membership, and the configured iteration bounds.
pub async fn create_evaluation(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateEvaluationRequest>,
) -> Result<(StatusCode, Json<Evaluation>), ApiError> {
    // Bound is in characters, not bytes; non-ASCII names count per char.
    let name_chars = payload.ai_system_name.chars().count();
    if name_chars == 0 || name_chars > 200 {
        return Err(ApiError::validation(
            "ai_system_name must be between 1 and 200 characters",
            Some(json!({"field": "ai_system_name"})),
        ));
    }

    if payload.heuristic_types.is_empty() {
        return Err(ApiError::validation(
            "heuristic_types must contain at least one entry",
            Some(json!({"field": "heuristic_types"})),
        ));
    }

    let mut heuristic_types = Vec::with_capacity(payload.heuristic_types.len());
    for raw in &payload.heuristic_types {
        let parsed: HeuristicType = raw.parse().map_err(|_| {
            ApiError::validation(
                format!(
                    "Invalid heuristic type: {}. Must be one of anchoring, loss_aversion, \
                     sunk_cost, confirmation_bias, availability_heuristic",
                    raw
                ),
                Some(json!({"field": "heuristic_types", "value": raw})),
            )
        })?;
        heuristic_types.push(parsed);
    }

    let (min, max) = (state.settings.min_iterations, state.settings.max_iterations);
    if payload.iteration_count < min || payload.iteration_count > max {
        return Err(ApiError::validation(
            format!("Iteration count must be between {} and {}", min, max),
            Some(json!({
                "field": "iteration_count",
                "value": payload.iteration_count,
            })),
        ));
    }

    let evaluation = Evaluation::new(
        payload.ai_system_name,
        heuristic_types,
        payload.iteration_count,
    );

    state
        .storage
        .create_evaluation(&evaluation)
        .await
        .map_err(|e| state.api_error(e))?;

    info!("Created evaluation {} for {}", evaluation.id, evaluation.ai_system_name);
    Ok((StatusCode::CREATED, Json(evaluation)))
}

/// `GET /api/evaluations/{id}`
pub async fn get_evaluation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Evaluation>, ApiError> {
    let id = parse_evaluation_id(&id)?;
    let evaluation = state
        .storage
        .get_evaluation(id)
        .await
        .map_err(|e| state.api_error(e))?;

    Ok(Json(evaluation))
}

/// `GET /api/evaluations?limit=&offset=`
pub async fn list_evaluations(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<EvaluationList>, ApiError> {
    let limit = params.limit.unwrap_or(10).clamp(1, 100);
    let offset = params.offset.unwrap_or(0);

    let (evaluations, total) = state
        .storage
        .list_evaluations(limit, offset)
        .await
        .map_err(|e| state.api_error(e))?;

    Ok(Json(EvaluationList {
        evaluations,
        total,
        limit,
        offset,
    }))
}

/// `DELETE /api/evaluations/{id}`
///
/// Cascades to the evaluation's findings and recommendations.
pub async fn delete_evaluation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_evaluation_id(&id)?;
    state
        .storage
        .delete_evaluation(id)
        .await
        .map_err(|e| state.api_error(e))?;

    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/evaluations/{id}/execute`
///
/// Runs the simulated detection across the requested heuristic types,
/// persists the findings, and completes the evaluation with its overall
/// score and zone classification.
pub async fn execute_evaluation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Evaluation>, ApiError> {
    let id = parse_evaluation_id(&id)?;
    let mut evaluation = state
        .storage
        .get_evaluation(id)
        .await
        .map_err(|e| state.api_error(e))?;

    if evaluation.status == EvaluationStatus::Completed {
        return Err(ApiError::bad_request(
            "EVALUATION_FAILED",
            "Evaluation has already been completed",
            None,
        ));
    }

    evaluation.status = EvaluationStatus::Running;
    state
        .storage
        .update_evaluation(&evaluation)
        .await
        .map_err(|e| state.api_error(e))?;

    match run_detection(&state, &mut evaluation).await {
        Ok(()) => Ok(Json(evaluation)),
        Err(err) => {
            warn!("Evaluation {} failed during execution: {}", id, err.message);
            evaluation.status = EvaluationStatus::Failed;
            if let Err(update_err) = state.storage.update_evaluation(&evaluation).await {
                warn!("Failed to mark evaluation {} as failed: {}", id, update_err);
            }
            Err(err)
        }
    }
}

async fn run_detection(state: &AppState, evaluation: &mut Evaluation) -> Result<(), ApiError> {
    let detector = HeuristicDetector::new(evaluation.iteration_count);
    let drafts = detector.run_detection(&evaluation.heuristic_types);

    let mut severity_scores = Vec::with_capacity(drafts.len());
    for draft in drafts {
        severity_scores.push(draft.severity_score);
        let finding = HeuristicFinding {
            id: Uuid::new_v4(),
            evaluation_id: evaluation.id,
            heuristic_type: draft.heuristic_type,
            severity: draft.severity,
            severity_score: draft.severity_score,
            confidence_level: draft.confidence_level,
            detection_count: draft.detection_count,
            example_instances: draft.example_instances,
            pattern_description: draft.pattern_description,
            created_at: Utc::now(),
        };
        state
            .storage
            .insert_finding(&finding)
            .await
            .map_err(|e| state.api_error(e))?;
    }

    let overall_score = StatisticalAnalyzer::calculate_overall_score(&severity_scores);

    // No score history yet for this system, so classify against the default
    // baseline.
    let baseline = StatisticalAnalyzer::calculate_baseline(&[]);
    let zone = StatisticalAnalyzer::determine_zone_status(
        overall_score,
        baseline.green_zone_max,
        baseline.yellow_zone_max,
    );

    evaluation.overall_score = Some(overall_score);
    evaluation.zone_status = Some(zone);
    evaluation.status = EvaluationStatus::Completed;
    evaluation.completed_at = Some(Utc::now());

    state
        .storage
        .update_evaluation(evaluation)
        .await
        .map_err(|e| state.api_error(e))?;

    info!(
        "Evaluation {} completed with score {:.2} ({})",
        evaluation.id, overall_score, zone
    );
    Ok(())
}

/// `GET /api/evaluations/{id}/reports?format=json|summary`
pub async fn generate_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiQuery(params): ApiQuery<ReportParams>,
) -> Result<Response, ApiError> {
    let format = params.format.unwrap_or_else(|| "json".to_string());
    if format != "json" && format != "summary" {
        return Err(ApiError::validation(
            format!("Invalid report format: {}. Must be json or summary", format),
            Some(json!({"field": "format", "value": format})),
        ));
    }

    let id = parse_evaluation_id(&id)?;
    let evaluation = state
        .storage
        .get_evaluation(id)
        .await
        .map_err(|e| state.api_error(e))?;

    if evaluation.status != EvaluationStatus::Completed {
        return Err(ApiError::bad_request(
            "EVALUATION_NOT_COMPLETED",
            "Cannot generate report for incomplete evaluation",
            Some(json!({"current_status": evaluation.status.as_str()})),
        ));
    }

    let findings = state
        .storage
        .list_findings(id)
        .await
        .map_err(|e| state.api_error(e))?;

    let generator = ReportGenerator::new(&evaluation, &findings);
    let response = if format == "summary" {
        Json(generator.generate_executive_summary()).into_response()
    } else {
        Json(generator.generate_json_report()).into_response()
    };

    Ok(response)
}
