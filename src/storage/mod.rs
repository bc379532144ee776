//! Storage layer for the bias diagnostics service
//!
//! Provides the persistence abstraction and the libSQL-backed implementation
//! for evaluations, heuristic findings, recommendations, and baselines.

pub mod libsql;

pub use libsql::{ConnectionMode, LibsqlStorage};

use crate::error::Result;
use crate::types::{
    Baseline, Evaluation, EvaluationId, HeuristicFinding, HeuristicType, Recommendation,
};
use async_trait::async_trait;
use uuid::Uuid;

/// Storage backend trait defining all required operations
///
/// Every operation is a single read or write against the relational store.
/// Deleting an evaluation cascades to its findings and recommendations.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Persist a new evaluation
    async fn create_evaluation(&self, evaluation: &Evaluation) -> Result<()>;

    /// Retrieve an evaluation by ID
    async fn get_evaluation(&self, id: EvaluationId) -> Result<Evaluation>;

    /// List evaluations newest first, with the total row count
    async fn list_evaluations(&self, limit: u32, offset: u32) -> Result<(Vec<Evaluation>, u64)>;

    /// Update an evaluation's mutable fields (status, score, zone, completion)
    async fn update_evaluation(&self, evaluation: &Evaluation) -> Result<()>;

    /// Delete an evaluation, cascading to findings and recommendations
    async fn delete_evaluation(&self, id: EvaluationId) -> Result<()>;

    /// Persist a heuristic finding
    async fn insert_finding(&self, finding: &HeuristicFinding) -> Result<()>;

    /// List findings for an evaluation ordered by descending severity score
    async fn list_findings(&self, evaluation_id: EvaluationId) -> Result<Vec<HeuristicFinding>>;

    /// Retrieve the finding of a given type for an evaluation
    async fn get_finding(
        &self,
        evaluation_id: EvaluationId,
        heuristic_type: HeuristicType,
    ) -> Result<HeuristicFinding>;

    /// Persist a recommendation
    async fn insert_recommendation(&self, recommendation: &Recommendation) -> Result<()>;

    /// List recommendations for an evaluation ordered by descending priority
    async fn list_recommendations(
        &self,
        evaluation_id: EvaluationId,
    ) -> Result<Vec<Recommendation>>;

    /// Retrieve a single recommendation scoped to an evaluation
    async fn get_recommendation(
        &self,
        evaluation_id: EvaluationId,
        recommendation_id: Uuid,
    ) -> Result<Recommendation>;

    /// Persist a baseline
    async fn create_baseline(&self, baseline: &Baseline) -> Result<()>;

    /// Retrieve a baseline by ID
    async fn get_baseline(&self, id: Uuid) -> Result<Baseline>;
}
