//! Biascope - Heuristic Bias Diagnostics Service
//!
//! A REST backend for evaluating AI systems against known cognitive-bias
//! patterns (anchoring, loss aversion, sunk cost, confirmation bias,
//! availability heuristic). It provides:
//! - Evaluation records with simulated per-heuristic detection runs
//! - Findings with severity scores and confidence levels
//! - Statistical baselines, zone classification, and drift detection
//! - Prioritized mitigation recommendations and report assembly
//!
//! # Architecture
//!
//! The crate is organized into layers:
//! - **Types**: Core entities and enumerations (Evaluation, HeuristicFinding, ...)
//! - **Storage**: `StorageBackend` trait with a libSQL implementation
//! - **Services**: Pure detection, analysis, recommendation, and report logic
//! - **Api**: axum routers exposing the HTTP surface

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use api::{ApiServer, AppState};
pub use config::Settings;
pub use error::{BiascopeError, Result};
pub use storage::{libsql::LibsqlStorage, ConnectionMode, StorageBackend};
pub use types::{
    Baseline, Evaluation, EvaluationId, EvaluationStatus, HeuristicFinding, HeuristicType,
    Recommendation, Severity, ZoneStatus,
};
