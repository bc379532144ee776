//! Recommendation endpoints
//!
//! Recommendations are generated lazily: the first list request after an
//! evaluation completes expands the mitigation templates for its findings
//! and persists the result, so later reads and detail lookups are stable.

use super::{evaluations::parse_evaluation_id, ApiError, ApiQuery, AppState};
use crate::services::RecommendationGenerator;
use crate::types::{
    Difficulty, DisplayMode, EvaluationId, HeuristicType, Impact, Recommendation,
};
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct RecommendationParams {
    pub mode: Option<String>,
}

/// A recommendation shaped for the requested display mode
#[derive(Debug, Serialize)]
pub struct RecommendationView {
    pub id: Uuid,
    pub evaluation_id: EvaluationId,
    pub heuristic_type: HeuristicType,
    pub priority: u8,
    pub action_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technical_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simplified_description: Option<String>,
    pub estimated_impact: Impact,
    pub implementation_difficulty: Difficulty,
    pub created_at: DateTime<Utc>,
}

impl RecommendationView {
    fn from_recommendation(rec: Recommendation, mode: DisplayMode) -> Self {
        let (technical, simplified) = match mode {
            DisplayMode::Technical => (Some(rec.technical_description), None),
            DisplayMode::Simplified => (None, Some(rec.simplified_description)),
            DisplayMode::Both => (
                Some(rec.technical_description),
                Some(rec.simplified_description),
            ),
        };

        Self {
            id: rec.id,
            evaluation_id: rec.evaluation_id,
            heuristic_type: rec.heuristic_type,
            priority: rec.priority,
            action_title: rec.action_title,
            technical_description: technical,
            simplified_description: simplified,
            estimated_impact: rec.estimated_impact,
            implementation_difficulty: rec.implementation_difficulty,
            created_at: rec.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecommendationList {
    pub recommendations: Vec<RecommendationView>,
    pub total: u64,
    pub display_mode: DisplayMode,
}

fn parse_mode(raw: Option<String>) -> Result<DisplayMode, ApiError> {
    match raw {
        None => Ok(DisplayMode::default()),
        Some(raw) => raw.parse().map_err(|_| {
            ApiError::validation(
                format!(
                    "Invalid display mode: {}. Must be technical, simplified or both",
                    raw
                ),
                Some(json!({"field": "mode", "value": raw})),
            )
        }),
    }
}

/// `GET /api/evaluations/{id}/recommendations?mode=technical|simplified|both`
pub async fn list_recommendations(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiQuery(params): ApiQuery<RecommendationParams>,
) -> Result<Json<RecommendationList>, ApiError> {
    let mode = parse_mode(params.mode)?;
    let id = parse_evaluation_id(&id)?;
    state
        .storage
        .get_evaluation(id)
        .await
        .map_err(|e| state.api_error(e))?;

    let mut recommendations = state
        .storage
        .list_recommendations(id)
        .await
        .map_err(|e| state.api_error(e))?;

    if recommendations.is_empty() {
        recommendations = generate_and_persist(&state, id).await?;
    }

    let total = recommendations.len() as u64;
    let recommendations = recommendations
        .into_iter()
        .map(|rec| RecommendationView::from_recommendation(rec, mode))
        .collect();

    Ok(Json(RecommendationList {
        recommendations,
        total,
        display_mode: mode,
    }))
}

/// `GET /api/evaluations/{id}/recommendations/{rec_id}`
pub async fn get_recommendation(
    State(state): State<AppState>,
    Path((id, rec_id)): Path<(String, String)>,
    ApiQuery(params): ApiQuery<RecommendationParams>,
) -> Result<Json<RecommendationView>, ApiError> {
    let mode = parse_mode(params.mode)?;
    let id = parse_evaluation_id(&id)?;
    let rec_id = Uuid::parse_str(&rec_id)
        .map_err(|_| ApiError::not_found(format!("Recommendation {} not found", rec_id)))?;

    let recommendation = state
        .storage
        .get_recommendation(id, rec_id)
        .await
        .map_err(|e| state.api_error(e))?;

    Ok(Json(RecommendationView::from_recommendation(
        recommendation,
        mode,
    )))
}

/// Expand templates for the evaluation's findings and persist the result
///
/// An evaluation with no findings yields no recommendations.
async fn generate_and_persist(
    state: &AppState,
    id: EvaluationId,
) -> Result<Vec<Recommendation>, ApiError> {
    let findings = state
        .storage
        .list_findings(id)
        .await
        .map_err(|e| state.api_error(e))?;

    if findings.is_empty() {
        return Ok(Vec::new());
    }

    let drafts = RecommendationGenerator::generate(&findings);
    let mut recommendations = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let recommendation = Recommendation {
            id: Uuid::new_v4(),
            evaluation_id: id,
            heuristic_type: draft.heuristic_type,
            priority: draft.priority,
            action_title: draft.action_title,
            technical_description: draft.technical_description,
            simplified_description: draft.simplified_description,
            estimated_impact: draft.estimated_impact,
            implementation_difficulty: draft.implementation_difficulty,
            created_at: Utc::now(),
        };
        state
            .storage
            .insert_recommendation(&recommendation)
            .await
            .map_err(|e| state.api_error(e))?;
        recommendations.push(recommendation);
    }

    info!(
        "Generated {} recommendations for evaluation {}",
        recommendations.len(),
        id
    );
    Ok(recommendations)
}
