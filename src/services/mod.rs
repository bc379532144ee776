//! Domain services for the bias diagnostics service
//!
//! Pure logic with no I/O: simulated heuristic detection, statistical
//! analysis, recommendation generation, and report assembly. The API layer
//! wires these to the storage backend.

pub mod analyzer;
pub mod detector;
pub mod recommender;
pub mod report;

pub use analyzer::{BaselineParams, DriftReport, StatisticalAnalyzer, Trend};
pub use detector::{FindingDraft, HeuristicDetector};
pub use recommender::{RecommendationDraft, RecommendationGenerator};
pub use report::ReportGenerator;
