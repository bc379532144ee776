//! Core data types for the bias diagnostics service
//!
//! This module defines the relational entities (evaluations, heuristic
//! findings, recommendations, baselines) and the fixed enumerations they
//! reference. Enum wire names are snake_case both in JSON and in the
//! database.

use crate::error::BiascopeError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for evaluations
///
/// Wraps a UUID to provide type safety and prevent mixing evaluation IDs
/// with the other UUID-based identifiers in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvaluationId(pub Uuid);

impl EvaluationId {
    /// Create a new random evaluation ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an evaluation ID from a string
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for EvaluationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EvaluationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of an evaluation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl EvaluationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationStatus::Pending => "pending",
            EvaluationStatus::Running => "running",
            EvaluationStatus::Completed => "completed",
            EvaluationStatus::Failed => "failed",
        }
    }
}

impl FromStr for EvaluationStatus {
    type Err = BiascopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(EvaluationStatus::Pending),
            "running" => Ok(EvaluationStatus::Running),
            "completed" => Ok(EvaluationStatus::Completed),
            "failed" => Ok(EvaluationStatus::Failed),
            _ => Err(BiascopeError::Other(format!(
                "Unknown evaluation status: {}",
                s
            ))),
        }
    }
}

/// Coarse classification of an overall score against zone thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneStatus {
    Green,
    Yellow,
    Red,
}

impl ZoneStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneStatus::Green => "green",
            ZoneStatus::Yellow => "yellow",
            ZoneStatus::Red => "red",
        }
    }
}

impl FromStr for ZoneStatus {
    type Err = BiascopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "green" => Ok(ZoneStatus::Green),
            "yellow" => Ok(ZoneStatus::Yellow),
            "red" => Ok(ZoneStatus::Red),
            _ => Err(BiascopeError::Other(format!("Unknown zone status: {}", s))),
        }
    }
}

impl std::fmt::Display for ZoneStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The fixed set of cognitive-bias patterns the detector probes for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeuristicType {
    Anchoring,
    LossAversion,
    SunkCost,
    ConfirmationBias,
    AvailabilityHeuristic,
}

impl HeuristicType {
    /// All supported heuristic types, in canonical order
    pub const ALL: [HeuristicType; 5] = [
        HeuristicType::Anchoring,
        HeuristicType::LossAversion,
        HeuristicType::SunkCost,
        HeuristicType::ConfirmationBias,
        HeuristicType::AvailabilityHeuristic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HeuristicType::Anchoring => "anchoring",
            HeuristicType::LossAversion => "loss_aversion",
            HeuristicType::SunkCost => "sunk_cost",
            HeuristicType::ConfirmationBias => "confirmation_bias",
            HeuristicType::AvailabilityHeuristic => "availability_heuristic",
        }
    }
}

impl FromStr for HeuristicType {
    type Err = BiascopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "anchoring" => Ok(HeuristicType::Anchoring),
            "loss_aversion" => Ok(HeuristicType::LossAversion),
            "sunk_cost" => Ok(HeuristicType::SunkCost),
            "confirmation_bias" => Ok(HeuristicType::ConfirmationBias),
            "availability_heuristic" => Ok(HeuristicType::AvailabilityHeuristic),
            _ => Err(BiascopeError::Validation(format!(
                "Invalid heuristic type: {}",
                s
            ))),
        }
    }
}

impl std::fmt::Display for HeuristicType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity classification of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl FromStr for Severity {
    type Err = BiascopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(BiascopeError::Other(format!("Unknown severity: {}", s))),
        }
    }
}

/// Estimated impact of applying a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    Low,
    Medium,
    High,
}

impl Impact {
    pub fn as_str(&self) -> &'static str {
        match self {
            Impact::Low => "low",
            Impact::Medium => "medium",
            Impact::High => "high",
        }
    }
}

impl FromStr for Impact {
    type Err = BiascopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Impact::Low),
            "medium" => Ok(Impact::Medium),
            "high" => Ok(Impact::High),
            _ => Err(BiascopeError::Other(format!("Unknown impact: {}", s))),
        }
    }
}

/// Implementation difficulty of a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Moderate,
    Complex,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Moderate => "moderate",
            Difficulty::Complex => "complex",
        }
    }
}

impl FromStr for Difficulty {
    type Err = BiascopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "moderate" => Ok(Difficulty::Moderate),
            "complex" => Ok(Difficulty::Complex),
            _ => Err(BiascopeError::Other(format!("Unknown difficulty: {}", s))),
        }
    }
}

/// Which recommendation description fields to serialize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    #[default]
    Technical,
    Simplified,
    Both,
}

impl FromStr for DisplayMode {
    type Err = BiascopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "technical" => Ok(DisplayMode::Technical),
            "simplified" => Ok(DisplayMode::Simplified),
            "both" => Ok(DisplayMode::Both),
            _ => Err(BiascopeError::Validation(format!(
                "Invalid display mode: {}. Must be technical, simplified or both",
                s
            ))),
        }
    }
}

/// An evaluation run against a named AI system
///
/// Status, score, zone and completion timestamp are the only fields that
/// mutate after creation, as the run progresses from pending to completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: EvaluationId,
    pub ai_system_name: String,
    pub heuristic_types: Vec<HeuristicType>,
    pub iteration_count: u32,
    pub status: EvaluationStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub overall_score: Option<f64>,
    pub zone_status: Option<ZoneStatus>,
}

impl Evaluation {
    /// Create a new pending evaluation
    pub fn new(
        ai_system_name: String,
        heuristic_types: Vec<HeuristicType>,
        iteration_count: u32,
    ) -> Self {
        Self {
            id: EvaluationId::new(),
            ai_system_name,
            heuristic_types,
            iteration_count,
            status: EvaluationStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
            overall_score: None,
            zone_status: None,
        }
    }
}

/// A detected instance of a cognitive-bias pattern within an evaluation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeuristicFinding {
    pub id: Uuid,
    pub evaluation_id: EvaluationId,
    pub heuristic_type: HeuristicType,
    pub severity: Severity,
    /// Severity score in 0..=100
    pub severity_score: f64,
    /// Confidence level in 0..=1
    pub confidence_level: f64,
    pub detection_count: u32,
    pub example_instances: Vec<String>,
    pub pattern_description: String,
    pub created_at: DateTime<Utc>,
}

/// A prioritized mitigation recommendation tied to an evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: Uuid,
    pub evaluation_id: EvaluationId,
    pub heuristic_type: HeuristicType,
    /// Priority in 1..=10, higher is more urgent
    pub priority: u8,
    pub action_title: String,
    pub technical_description: String,
    pub simplified_description: String,
    pub estimated_impact: Impact,
    pub implementation_difficulty: Difficulty,
    pub created_at: DateTime<Utc>,
}

/// Statistical parameters backing a baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalParams {
    pub mean: f64,
    pub std_dev: f64,
    pub sample_size: u32,
}

/// A named reference statistical profile used to classify scores into zones
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Baseline {
    pub id: Uuid,
    pub name: String,
    pub green_zone_max: f64,
    pub yellow_zone_max: f64,
    pub statistical_params: StatisticalParams,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heuristic_type_round_trip() {
        for htype in HeuristicType::ALL {
            let parsed: HeuristicType = htype.as_str().parse().unwrap();
            assert_eq!(parsed, htype);
        }
    }

    #[test]
    fn test_heuristic_type_rejects_unknown() {
        let err = "optimism".parse::<HeuristicType>().unwrap_err();
        assert!(matches!(err, BiascopeError::Validation(_)));
    }

    #[test]
    fn test_enum_wire_names_are_snake_case() {
        let json = serde_json::to_string(&HeuristicType::LossAversion).unwrap();
        assert_eq!(json, "\"loss_aversion\"");
        let json = serde_json::to_string(&EvaluationStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
    }

    #[test]
    fn test_new_evaluation_defaults() {
        let eval = Evaluation::new("TestBot".to_string(), vec![HeuristicType::Anchoring], 20);
        assert_eq!(eval.status, EvaluationStatus::Pending);
        assert!(eval.overall_score.is_none());
        assert!(eval.completed_at.is_none());
        assert!(eval.zone_status.is_none());
    }
}
