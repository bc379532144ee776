//! Heuristic finding endpoints

use super::{evaluations::parse_evaluation_id, ApiError, AppState};
use crate::types::{HeuristicFinding, HeuristicType};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct FindingList {
    pub findings: Vec<HeuristicFinding>,
    pub total: u64,
}

/// `GET /api/evaluations/{id}/heuristics`
///
/// Findings ordered by descending severity score. An evaluation that has
/// not been executed yet returns an empty list, not an error.
pub async fn list_findings(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FindingList>, ApiError> {
    let id = parse_evaluation_id(&id)?;
    state
        .storage
        .get_evaluation(id)
        .await
        .map_err(|e| state.api_error(e))?;

    let findings = state
        .storage
        .list_findings(id)
        .await
        .map_err(|e| state.api_error(e))?;

    let total = findings.len() as u64;
    Ok(Json(FindingList { findings, total }))
}

/// `GET /api/evaluations/{id}/heuristics/{heuristic_type}`
///
/// An unrecognized type segment behaves like any other missing finding.
pub async fn get_finding(
    State(state): State<AppState>,
    Path((id, heuristic_type)): Path<(String, String)>,
) -> Result<Json<HeuristicFinding>, ApiError> {
    let id = parse_evaluation_id(&id)?;
    state
        .storage
        .get_evaluation(id)
        .await
        .map_err(|e| state.api_error(e))?;

    let heuristic_type: HeuristicType = heuristic_type.parse().map_err(|_| {
        ApiError::not_found(format!(
            "No {} finding for evaluation {}",
            heuristic_type, id
        ))
    })?;

    let finding = state
        .storage
        .get_finding(id, heuristic_type)
        .await
        .map_err(|e| state.api_error(e))?;

    Ok(Json(finding))
}
