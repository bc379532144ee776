//! Report assembly for completed evaluations
//!
//! Produces two derived, read-only views over an evaluation and its
//! findings: an executive summary and a full structured JSON report.
//! Nothing here touches storage.

use crate::types::{Evaluation, HeuristicFinding, Severity, ZoneStatus};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;

const FORMAT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub generated_at: String,
    pub report_type: String,
    pub format_version: String,
}

impl ReportMetadata {
    fn new(report_type: &str) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
            report_type: report_type.to_string(),
            format_version: FORMAT_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationOverview {
    pub ai_system_name: String,
    pub evaluation_id: String,
    pub evaluation_date: Option<String>,
    pub overall_score: Option<f64>,
    pub zone_status: Option<ZoneStatus>,
    pub total_iterations: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyFindings {
    pub total_heuristics_detected: usize,
    pub severity_breakdown: BTreeMap<String, u32>,
    pub critical_issues: u32,
    pub high_priority_issues: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopConcern {
    pub heuristic_type: String,
    pub severity: Severity,
    pub severity_score: f64,
    pub detection_count: u32,
    pub pattern_description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskAssessment {
    pub risk_level: String,
    pub assessment: String,
    pub key_concerns: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryRecommendation {
    pub priority: String,
    pub recommendation: String,
}

/// Executive summary of a completed evaluation
#[derive(Debug, Clone, Serialize)]
pub struct ExecutiveSummary {
    pub report_metadata: ReportMetadata,
    pub evaluation_overview: EvaluationOverview,
    pub key_findings: KeyFindings,
    pub top_concerns: Vec<TopConcern>,
    pub risk_assessment: RiskAssessment,
    pub recommendations: Vec<SummaryRecommendation>,
}

struct SummaryData {
    severity_breakdown: BTreeMap<String, u32>,
    critical_count: u32,
    high_count: u32,
    average_severity_score: f64,
    average_confidence: f64,
}

/// Service for assembling evaluation reports
pub struct ReportGenerator<'a> {
    evaluation: &'a Evaluation,
    findings: &'a [HeuristicFinding],
}

impl<'a> ReportGenerator<'a> {
    pub fn new(evaluation: &'a Evaluation, findings: &'a [HeuristicFinding]) -> Self {
        Self {
            evaluation,
            findings,
        }
    }

    /// Full structured JSON export of the evaluation and its findings
    pub fn generate_json_report(&self) -> serde_json::Value {
        let summary = self.summary_data();

        json!({
            "report_metadata": ReportMetadata::new("full_export"),
            "evaluation": {
                "id": self.evaluation.id.to_string(),
                "ai_system_name": self.evaluation.ai_system_name,
                "status": self.evaluation.status,
                "created_at": self.evaluation.created_at.to_rfc3339(),
                "completed_at": self.evaluation.completed_at.map(|t| t.to_rfc3339()),
                "iteration_count": self.evaluation.iteration_count,
                "overall_score": self.evaluation.overall_score,
                "zone_status": self.evaluation.zone_status,
                "heuristic_types": self.evaluation.heuristic_types,
            },
            "findings": self.findings.iter().map(|finding| json!({
                "id": finding.id.to_string(),
                "heuristic_type": finding.heuristic_type,
                "severity": finding.severity,
                "severity_score": finding.severity_score,
                "confidence_level": finding.confidence_level,
                "detection_count": finding.detection_count,
                "pattern_description": finding.pattern_description,
                "example_instances": finding.example_instances,
                "created_at": finding.created_at.to_rfc3339(),
            })).collect::<Vec<_>>(),
            "summary": {
                "severity_breakdown": summary.severity_breakdown,
                "critical_findings_count": summary.critical_count,
                "high_priority_findings_count": summary.high_count,
                "average_severity_score": summary.average_severity_score,
                "average_confidence": summary.average_confidence,
            },
        })
    }

    /// Executive summary: severity breakdown, top concerns, risk level
    pub fn generate_executive_summary(&self) -> ExecutiveSummary {
        let summary = self.summary_data();

        let mut sorted: Vec<&HeuristicFinding> = self.findings.iter().collect();
        sorted.sort_by(|a, b| {
            b.severity_score
                .partial_cmp(&a.severity_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        ExecutiveSummary {
            report_metadata: ReportMetadata::new("executive_summary"),
            evaluation_overview: EvaluationOverview {
                ai_system_name: self.evaluation.ai_system_name.clone(),
                evaluation_id: self.evaluation.id.to_string(),
                evaluation_date: self.evaluation.completed_at.map(|t| t.to_rfc3339()),
                overall_score: self.evaluation.overall_score,
                zone_status: self.evaluation.zone_status,
                total_iterations: self.evaluation.iteration_count,
            },
            key_findings: KeyFindings {
                total_heuristics_detected: self.findings.len(),
                severity_breakdown: summary.severity_breakdown,
                critical_issues: summary.critical_count,
                high_priority_issues: summary.high_count,
            },
            top_concerns: sorted
                .iter()
                .take(3)
                .map(|finding| TopConcern {
                    heuristic_type: finding.heuristic_type.as_str().to_string(),
                    severity: finding.severity,
                    severity_score: finding.severity_score,
                    detection_count: finding.detection_count,
                    pattern_description: finding.pattern_description.clone(),
                })
                .collect(),
            risk_assessment: self.risk_assessment(),
            recommendations: self.high_level_recommendations(),
        }
    }

    fn summary_data(&self) -> SummaryData {
        if self.findings.is_empty() {
            return SummaryData {
                severity_breakdown: BTreeMap::new(),
                critical_count: 0,
                high_count: 0,
                average_severity_score: 0.0,
                average_confidence: 0.0,
            };
        }

        let mut breakdown: BTreeMap<String, u32> = BTreeMap::new();
        for finding in self.findings {
            *breakdown
                .entry(finding.severity.as_str().to_string())
                .or_insert(0) += 1;
        }

        let critical_count = breakdown.get("critical").copied().unwrap_or(0);
        let high_count = breakdown.get("high").copied().unwrap_or(0);

        let count = self.findings.len() as f64;
        SummaryData {
            severity_breakdown: breakdown,
            critical_count,
            high_count,
            average_severity_score: self.findings.iter().map(|f| f.severity_score).sum::<f64>()
                / count,
            average_confidence: self.findings.iter().map(|f| f.confidence_level).sum::<f64>()
                / count,
        }
    }

    fn risk_assessment(&self) -> RiskAssessment {
        let Some(zone) = self.evaluation.zone_status else {
            return RiskAssessment {
                risk_level: "UNKNOWN".to_string(),
                assessment: "Evaluation not completed".to_string(),
                key_concerns: vec!["No data available".to_string()],
            };
        };

        let score = self.evaluation.overall_score.unwrap_or(0.0);
        let (risk_level, assessment) = match zone {
            ZoneStatus::Green => (
                "LOW",
                format!(
                    "The AI system shows minimal bias patterns with an overall score of {:.2}. \
                     The system is operating within acceptable parameters.",
                    score
                ),
            ),
            ZoneStatus::Yellow => (
                "MODERATE",
                format!(
                    "The AI system shows concerning bias patterns with an overall score of {:.2}. \
                     Immediate attention and corrective measures are recommended.",
                    score
                ),
            ),
            ZoneStatus::Red => (
                "HIGH",
                format!(
                    "The AI system shows critical bias patterns with an overall score of {:.2}. \
                     Urgent intervention required to address systematic issues.",
                    score
                ),
            ),
        };

        let mut key_concerns: Vec<String> = self
            .findings
            .iter()
            .filter(|f| matches!(f.severity, Severity::Critical | Severity::High))
            .take(3)
            .map(|f| format!("{}: {}", f.heuristic_type, f.pattern_description))
            .collect();
        if key_concerns.is_empty() {
            key_concerns.push("No critical concerns identified.".to_string());
        }

        RiskAssessment {
            risk_level: risk_level.to_string(),
            assessment,
            key_concerns,
        }
    }

    fn high_level_recommendations(&self) -> Vec<SummaryRecommendation> {
        if self.findings.is_empty() {
            return vec![SummaryRecommendation {
                priority: "INFO".to_string(),
                recommendation: "Continue monitoring the AI system for potential bias patterns."
                    .to_string(),
            }];
        }

        let mut recommendations = Vec::new();

        let critical = self
            .findings
            .iter()
            .filter(|f| f.severity == Severity::Critical)
            .count();
        let high = self
            .findings
            .iter()
            .filter(|f| f.severity == Severity::High)
            .count();

        if critical > 0 {
            recommendations.push(SummaryRecommendation {
                priority: "URGENT".to_string(),
                recommendation: format!(
                    "Address {} critical bias pattern(s) immediately. Consider suspending the AI \
                     system until issues are resolved.",
                    critical
                ),
            });
        }

        if high > 0 {
            recommendations.push(SummaryRecommendation {
                priority: "HIGH".to_string(),
                recommendation: format!(
                    "Investigate and remediate {} high-severity bias pattern(s) within the next \
                     review cycle.",
                    high
                ),
            });
        }

        let has_type = |name: &str| {
            self.findings
                .iter()
                .any(|f| f.heuristic_type.as_str() == name)
        };

        if has_type("anchoring") {
            recommendations.push(SummaryRecommendation {
                priority: "MEDIUM".to_string(),
                recommendation: "Review training data for anchoring bias. Consider implementing \
                                 reference point randomization."
                    .to_string(),
            });
        }

        if has_type("confirmation_bias") {
            recommendations.push(SummaryRecommendation {
                priority: "MEDIUM".to_string(),
                recommendation: "Implement adversarial testing to challenge confirmation bias \
                                 patterns in the AI system."
                    .to_string(),
            });
        }

        if recommendations.is_empty() {
            recommendations.push(SummaryRecommendation {
                priority: "LOW".to_string(),
                recommendation: "Maintain current monitoring protocols and conduct regular bias \
                                 assessments."
                    .to_string(),
            });
        }

        recommendations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Evaluation, EvaluationStatus, HeuristicType};
    use uuid::Uuid;

    fn completed_evaluation() -> Evaluation {
        let mut eval = Evaluation::new(
            "TestBot".to_string(),
            vec![HeuristicType::Anchoring, HeuristicType::ConfirmationBias],
            20,
        );
        eval.status = EvaluationStatus::Completed;
        eval.completed_at = Some(Utc::now());
        eval.overall_score = Some(62.5);
        eval.zone_status = Some(ZoneStatus::Red);
        eval
    }

    fn finding(
        evaluation: &Evaluation,
        heuristic_type: HeuristicType,
        severity: Severity,
        severity_score: f64,
    ) -> HeuristicFinding {
        HeuristicFinding {
            id: Uuid::new_v4(),
            evaluation_id: evaluation.id,
            heuristic_type,
            severity,
            severity_score,
            confidence_level: 0.75,
            detection_count: 14,
            example_instances: vec!["example".to_string()],
            pattern_description: "pattern".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_executive_summary_counts_and_order() {
        let eval = completed_evaluation();
        let findings = vec![
            finding(&eval, HeuristicType::Anchoring, Severity::High, 55.0),
            finding(
                &eval,
                HeuristicType::ConfirmationBias,
                Severity::Critical,
                82.0,
            ),
        ];

        let summary = ReportGenerator::new(&eval, &findings).generate_executive_summary();

        assert_eq!(summary.key_findings.total_heuristics_detected, 2);
        assert_eq!(summary.key_findings.critical_issues, 1);
        assert_eq!(summary.key_findings.high_priority_issues, 1);
        // Top concerns sorted by descending severity score
        assert_eq!(summary.top_concerns[0].heuristic_type, "confirmation_bias");
        assert_eq!(summary.risk_assessment.risk_level, "HIGH");
        assert!(summary
            .recommendations
            .iter()
            .any(|r| r.priority == "URGENT"));
    }

    #[test]
    fn test_summary_without_findings() {
        let eval = completed_evaluation();
        let summary = ReportGenerator::new(&eval, &[]).generate_executive_summary();

        assert_eq!(summary.key_findings.total_heuristics_detected, 0);
        assert!(summary.top_concerns.is_empty());
        assert_eq!(summary.recommendations[0].priority, "INFO");
    }

    #[test]
    fn test_risk_unknown_without_zone() {
        let eval = Evaluation::new("TestBot".to_string(), vec![HeuristicType::Anchoring], 20);
        let summary = ReportGenerator::new(&eval, &[]).generate_executive_summary();
        assert_eq!(summary.risk_assessment.risk_level, "UNKNOWN");
    }

    #[test]
    fn test_json_report_shape() {
        let eval = completed_evaluation();
        let findings = vec![finding(&eval, HeuristicType::Anchoring, Severity::Medium, 40.0)];
        let report = ReportGenerator::new(&eval, &findings).generate_json_report();

        assert_eq!(report["report_metadata"]["report_type"], "full_export");
        assert_eq!(report["evaluation"]["ai_system_name"], "TestBot");
        assert_eq!(report["findings"].as_array().unwrap().len(), 1);
        assert_eq!(report["summary"]["severity_breakdown"]["medium"], 1);
    }
}
