//! Mitigation recommendation generation
//!
//! Recommendations come from a static template table, three per heuristic
//! type, each carrying technical and simplified descriptions. Priority blends
//! the finding's severity and confidence with the template's base priority.

use crate::types::{Difficulty, HeuristicFinding, HeuristicType, Impact};

/// A recommendation not yet persisted
#[derive(Debug, Clone)]
pub struct RecommendationDraft {
    pub heuristic_type: HeuristicType,
    pub priority: u8,
    pub action_title: String,
    pub technical_description: String,
    pub simplified_description: String,
    pub estimated_impact: Impact,
    pub implementation_difficulty: Difficulty,
}

struct Template {
    action_title: &'static str,
    technical: &'static str,
    simplified: &'static str,
    impact: Impact,
    difficulty: Difficulty,
    base_priority: u8,
}

const ANCHORING: [Template; 3] = [
    Template {
        action_title: "Implement multi-perspective prompting",
        technical: "Restructure prompts to present multiple baseline values before eliciting \
                    response. Use ensemble methods that aggregate responses from different anchor \
                    points to reduce single-anchor dependency.",
        simplified: "Present multiple starting points to prevent over-reliance on first value. \
                     Like getting multiple estimates before making a decision.",
        impact: Impact::High,
        difficulty: Difficulty::Easy,
        base_priority: 9,
    },
    Template {
        action_title: "Add anchor randomization layer",
        technical: "Implement preprocessing that randomly varies initial context values across \
                    inference calls. Monitor response variance and flag high-variance outputs for \
                    review.",
        simplified: "Change the starting information randomly to see if answers stay consistent. \
                     Flag cases where answers change too much.",
        impact: Impact::Medium,
        difficulty: Difficulty::Moderate,
        base_priority: 7,
    },
    Template {
        action_title: "Enable anchor-free reasoning mode",
        technical: "Develop alternative reasoning pipeline that derives responses from first \
                    principles without reference points. Compare outputs between anchored and \
                    anchor-free modes.",
        simplified: "Create a way to think through problems from scratch without initial \
                     reference points as a comparison.",
        impact: Impact::High,
        difficulty: Difficulty::Complex,
        base_priority: 6,
    },
];

const LOSS_AVERSION: [Template; 3] = [
    Template {
        action_title: "Implement gain-loss normalization",
        technical: "Add preprocessing layer that equalizes the salience of gain and loss framing. \
                    Apply calibration to ensure equivalent scenarios receive equal weighting \
                    regardless of framing.",
        simplified: "Make sure the system treats potential gains and losses equally when they're \
                     the same size.",
        impact: Impact::High,
        difficulty: Difficulty::Moderate,
        base_priority: 9,
    },
    Template {
        action_title: "Add framing diversity training",
        technical: "Augment training data with equivalent gain/loss scenarios. Fine-tune model to \
                    recognize and neutralize asymmetric loss sensitivity.",
        simplified: "Teach the system to recognize when it's being too sensitive to losses \
                     compared to gains.",
        impact: Impact::Medium,
        difficulty: Difficulty::Complex,
        base_priority: 7,
    },
    Template {
        action_title: "Enable risk-neutral evaluation mode",
        technical: "Implement utility-based decision framework that explicitly models risk \
                    preferences. Allow configuration of risk tolerance parameters.",
        simplified: "Add settings to control how much the system should care about avoiding \
                     losses versus seeking gains.",
        impact: Impact::Medium,
        difficulty: Difficulty::Moderate,
        base_priority: 6,
    },
];

const SUNK_COST: [Template; 3] = [
    Template {
        action_title: "Implement prospective-only analysis",
        technical: "Modify decision logic to exclude historical cost information from \
                    forward-looking evaluations. Create input filters that strip sunk cost \
                    references.",
        simplified: "Make decisions based only on future costs and benefits, ignoring money \
                     already spent.",
        impact: Impact::High,
        difficulty: Difficulty::Easy,
        base_priority: 8,
    },
    Template {
        action_title: "Add sunk cost detection layer",
        technical: "Build classifier to identify when past investments are mentioned in decision \
                    contexts. Flag these cases and provide alternative analysis excluding sunk \
                    costs.",
        simplified: "Automatically detect when past spending is mentioned and show what the \
                     decision would be without considering it.",
        impact: Impact::Medium,
        difficulty: Difficulty::Moderate,
        base_priority: 7,
    },
    Template {
        action_title: "Enable zero-based decision mode",
        technical: "Implement reasoning mode that evaluates scenarios as if starting from \
                    scratch. Present side-by-side comparison with sunk-cost-aware analysis.",
        simplified: "Show what the decision would be if starting fresh today, for comparison \
                     with current approach.",
        impact: Impact::High,
        difficulty: Difficulty::Moderate,
        base_priority: 8,
    },
];

const CONFIRMATION_BIAS: [Template; 3] = [
    Template {
        action_title: "Implement adversarial evidence search",
        technical: "Add dedicated search phase for evidence contradicting initial hypothesis. \
                    Weight contradictory evidence equally or higher in final reasoning.",
        simplified: "Actively look for information that disagrees with the first conclusion and \
                     give it fair consideration.",
        impact: Impact::High,
        difficulty: Difficulty::Moderate,
        base_priority: 9,
    },
    Template {
        action_title: "Enable red team reasoning mode",
        technical: "Implement dual-process reasoning where second pass actively argues against \
                    initial conclusion. Synthesize final output from thesis-antithesis analysis.",
        simplified: "Have the system argue against its own first answer, then combine both \
                     perspectives.",
        impact: Impact::High,
        difficulty: Difficulty::Complex,
        base_priority: 8,
    },
    Template {
        action_title: "Add evidence diversity metrics",
        technical: "Track ratio of confirming vs. contradicting evidence in reasoning chain. \
                    Alert when ratio exceeds threshold (e.g., >3:1).",
        simplified: "Monitor whether the system is only looking at evidence that supports its \
                     initial idea.",
        impact: Impact::Medium,
        difficulty: Difficulty::Easy,
        base_priority: 6,
    },
];

const AVAILABILITY_HEURISTIC: [Template; 3] = [
    Template {
        action_title: "Implement base rate integration",
        technical: "Augment reasoning with explicit statistical base rates from reliable sources. \
                    Weight base rate information higher than anecdotal examples in probability \
                    estimates.",
        simplified: "Use actual statistics and data instead of relying on memorable examples when \
                     estimating likelihood.",
        impact: Impact::High,
        difficulty: Difficulty::Moderate,
        base_priority: 9,
    },
    Template {
        action_title: "Add recency weighting correction",
        technical: "Implement temporal discounting that reduces influence of recent examples on \
                    probability judgments. Calibrate against known frequency distributions.",
        simplified: "Reduce the influence of recent dramatic examples on probability estimates.",
        impact: Impact::Medium,
        difficulty: Difficulty::Moderate,
        base_priority: 7,
    },
    Template {
        action_title: "Enable statistical grounding mode",
        technical: "Require all probability estimates to reference empirical frequency data. Flag \
                    estimates based solely on examples or intuition.",
        simplified: "Make the system show real data sources for probability claims instead of \
                     guessing from examples.",
        impact: Impact::High,
        difficulty: Difficulty::Easy,
        base_priority: 8,
    },
];

fn templates_for(heuristic_type: HeuristicType) -> &'static [Template] {
    match heuristic_type {
        HeuristicType::Anchoring => &ANCHORING,
        HeuristicType::LossAversion => &LOSS_AVERSION,
        HeuristicType::SunkCost => &SUNK_COST,
        HeuristicType::ConfirmationBias => &CONFIRMATION_BIAS,
        HeuristicType::AvailabilityHeuristic => &AVAILABILITY_HEURISTIC,
    }
}

/// Maximum number of recommendations kept per evaluation
const MAX_RECOMMENDATIONS: usize = 7;

/// Service for generating mitigation recommendations from findings
pub struct RecommendationGenerator;

impl RecommendationGenerator {
    /// Blend severity, confidence and template base priority into 1..=10
    ///
    /// Severity contributes up to 6 points, confidence up to 3, the template
    /// base up to 1.
    pub fn calculate_priority(severity_score: f64, confidence_level: f64, base_priority: u8) -> u8 {
        let priority = (severity_score / 100.0) * 6.0
            + confidence_level * 3.0
            + base_priority as f64 * 0.1;
        (priority.round() as i64).clamp(1, 10) as u8
    }

    /// Generate prioritized recommendations for the given findings
    ///
    /// Expands every template for each finding's heuristic type, sorts by
    /// descending priority, and keeps the top 7.
    pub fn generate(findings: &[HeuristicFinding]) -> Vec<RecommendationDraft> {
        let mut drafts: Vec<RecommendationDraft> = findings
            .iter()
            .flat_map(|finding| {
                templates_for(finding.heuristic_type)
                    .iter()
                    .map(|template| RecommendationDraft {
                        heuristic_type: finding.heuristic_type,
                        priority: Self::calculate_priority(
                            finding.severity_score,
                            finding.confidence_level,
                            template.base_priority,
                        ),
                        action_title: template.action_title.to_string(),
                        technical_description: template.technical.to_string(),
                        simplified_description: template.simplified.to_string(),
                        estimated_impact: template.impact,
                        implementation_difficulty: template.difficulty,
                    })
            })
            .collect();

        drafts.sort_by(|a, b| b.priority.cmp(&a.priority));
        drafts.truncate(MAX_RECOMMENDATIONS);
        drafts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EvaluationId, Severity};
    use chrono::Utc;
    use uuid::Uuid;

    fn finding(heuristic_type: HeuristicType, severity_score: f64) -> HeuristicFinding {
        HeuristicFinding {
            id: Uuid::new_v4(),
            evaluation_id: EvaluationId::new(),
            heuristic_type,
            severity: Severity::High,
            severity_score,
            confidence_level: 0.8,
            detection_count: 12,
            example_instances: vec![],
            pattern_description: "test".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_priority_clamped_to_range() {
        assert_eq!(RecommendationGenerator::calculate_priority(0.0, 0.0, 1), 1);
        assert_eq!(
            RecommendationGenerator::calculate_priority(100.0, 1.0, 10),
            10
        );
    }

    #[test]
    fn test_priority_blends_components() {
        // 50/100*6 + 0.5*3 + 8*0.1 = 3 + 1.5 + 0.8 = 5.3 -> 5
        assert_eq!(RecommendationGenerator::calculate_priority(50.0, 0.5, 8), 5);
    }

    #[test]
    fn test_generate_caps_at_seven() {
        let findings = vec![
            finding(HeuristicType::Anchoring, 80.0),
            finding(HeuristicType::ConfirmationBias, 70.0),
            finding(HeuristicType::SunkCost, 60.0),
        ];
        // 3 types x 3 templates = 9 candidates, capped at 7
        let drafts = RecommendationGenerator::generate(&findings);
        assert_eq!(drafts.len(), 7);
    }

    #[test]
    fn test_generate_sorted_descending() {
        let findings = vec![
            finding(HeuristicType::Anchoring, 90.0),
            finding(HeuristicType::SunkCost, 10.0),
        ];
        let drafts = RecommendationGenerator::generate(&findings);
        for pair in drafts.windows(2) {
            assert!(pair[0].priority >= pair[1].priority);
        }
    }

    #[test]
    fn test_no_findings_no_recommendations() {
        assert!(RecommendationGenerator::generate(&[]).is_empty());
    }
}
