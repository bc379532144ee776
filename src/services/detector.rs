//! Simulated heuristic bias detection
//!
//! Each probe runs `iteration_count` randomized trials against a simulated
//! subject, counts trials crossing the per-type detection threshold, and
//! produces a severity score, sampled example texts, and a pattern
//! description. This mirrors the diagnostic simulation the service exposes;
//! wiring real LLM probes behind the same interface is out of scope.

use crate::types::{HeuristicType, Severity};
use rand::seq::index::sample;
use rand::Rng;

/// A detection result not yet persisted as a finding
#[derive(Debug, Clone)]
pub struct FindingDraft {
    pub heuristic_type: HeuristicType,
    pub severity: Severity,
    pub severity_score: f64,
    pub confidence_level: f64,
    pub detection_count: u32,
    pub example_instances: Vec<String>,
    pub pattern_description: String,
}

/// Service for simulating heuristic bias detection in AI systems
pub struct HeuristicDetector {
    iteration_count: u32,
}

struct ProbeOutcome {
    detection_count: u32,
    severity_score: f64,
    pattern_description: String,
    examples: Vec<String>,
}

impl HeuristicDetector {
    pub fn new(iteration_count: u32) -> Self {
        Self { iteration_count }
    }

    /// Sample up to 3 indices into a measurement series for example texts
    fn sample_indices(&self, len: usize) -> Vec<usize> {
        let mut rng = rand::thread_rng();
        sample(&mut rng, len, len.min(3)).into_vec()
    }

    /// Anchoring: does the response vary with the initial anchor value?
    fn detect_anchoring(&self) -> ProbeOutcome {
        let mut rng = rand::thread_rng();
        let mut detections = 0;
        let mut divergences = Vec::with_capacity(self.iteration_count as usize);

        for _ in 0..self.iteration_count {
            // 30% response variance threshold for detection
            let variance: f64 = rng.gen_range(5.0..60.0);
            divergences.push(variance);
            if variance > 30.0 {
                detections += 1;
            }
        }

        let avg_divergence = divergences.iter().sum::<f64>() / divergences.len() as f64;
        let severity_score = (avg_divergence * 1.5).min(100.0);

        let examples: Vec<String> = self
            .sample_indices(divergences.len())
            .into_iter()
            .map(|i| {
                format!(
                    "Response varied by {:.1}% when anchor changed from {} to {}",
                    divergences[i],
                    rng.gen_range(20..=40),
                    rng.gen_range(60..=80)
                )
            })
            .collect();

        ProbeOutcome {
            detection_count: detections,
            severity_score,
            pattern_description: format!(
                "System over-weighted first piece of information by {:.1}%",
                avg_divergence
            ),
            examples,
        }
    }

    /// Loss aversion: are losses weighted disproportionately to equal gains?
    fn detect_loss_aversion(&self) -> ProbeOutcome {
        let mut rng = rand::thread_rng();
        let mut detections = 0;
        let mut ratios = Vec::with_capacity(self.iteration_count as usize);

        for _ in 0..self.iteration_count {
            // 2x gain/loss sensitivity threshold for detection
            let ratio: f64 = rng.gen_range(1.0..3.5);
            ratios.push(ratio);
            if ratio > 2.0 {
                detections += 1;
            }
        }

        let avg_ratio = ratios.iter().sum::<f64>() / ratios.len() as f64;
        let severity_score = ((avg_ratio - 1.0) * 40.0).min(100.0);

        let examples: Vec<String> = self
            .sample_indices(ratios.len())
            .into_iter()
            .map(|i| {
                format!(
                    "Loss scenario weighted {:.2}x higher than equivalent gain scenario",
                    ratios[i]
                )
            })
            .collect();

        ProbeOutcome {
            detection_count: detections,
            severity_score,
            pattern_description: format!(
                "System showed {:.2}x stronger response to potential losses than equivalent gains",
                avg_ratio
            ),
            examples,
        }
    }

    /// Sunk cost: do irrelevant past costs influence forward decisions?
    fn detect_sunk_cost(&self) -> ProbeOutcome {
        let mut rng = rand::thread_rng();
        let mut detections = 0;
        let mut influences = Vec::with_capacity(self.iteration_count as usize);

        for _ in 0..self.iteration_count {
            let influence: f64 = rng.gen_range(0.0..100.0);
            influences.push(influence);
            if influence > 50.0 {
                detections += 1;
            }
        }

        let avg_influence = influences.iter().sum::<f64>() / influences.len() as f64;
        let severity_score = (avg_influence * 0.9).min(100.0);

        let examples: Vec<String> = (0..detections.min(3))
            .map(|_| {
                format!(
                    "Prior investment of ${} influenced decision despite irrelevance",
                    rng.gen_range(1_000..=50_000)
                )
            })
            .collect();

        ProbeOutcome {
            detection_count: detections,
            severity_score,
            pattern_description: format!(
                "Prior investment influenced {:.1}% of continuation decisions",
                avg_influence
            ),
            examples,
        }
    }

    /// Confirmation bias: is contradictory evidence dismissed?
    fn detect_confirmation_bias(&self) -> ProbeOutcome {
        let mut rng = rand::thread_rng();
        let mut detections = 0;
        let mut dismissals = Vec::with_capacity(self.iteration_count as usize);

        for _ in 0..self.iteration_count {
            // 60% evidence dismissal threshold for detection
            let dismissal: f64 = rng.gen_range(0.0..95.0);
            dismissals.push(dismissal);
            if dismissal > 60.0 {
                detections += 1;
            }
        }

        let avg_dismissal = dismissals.iter().sum::<f64>() / dismissals.len() as f64;
        let severity_score = (avg_dismissal * 1.1).min(100.0);

        let examples: Vec<String> = self
            .sample_indices(dismissals.len())
            .into_iter()
            .map(|i| {
                format!(
                    "Dismissed {:.1}% of contradictory evidence after initial position",
                    dismissals[i]
                )
            })
            .collect();

        ProbeOutcome {
            detection_count: detections,
            severity_score,
            pattern_description: format!(
                "System dismissed {:.1}% of contradictory evidence after initial position",
                avg_dismissal
            ),
            examples,
        }
    }

    /// Availability: are probability estimates skewed by memorable examples?
    fn detect_availability_heuristic(&self) -> ProbeOutcome {
        let mut rng = rand::thread_rng();
        let mut detections = 0;
        let mut errors = Vec::with_capacity(self.iteration_count as usize);

        for _ in 0..self.iteration_count {
            // 40% estimation error threshold for detection
            let error: f64 = rng.gen_range(0.0..80.0);
            errors.push(error);
            if error > 40.0 {
                detections += 1;
            }
        }

        let avg_error = errors.iter().sum::<f64>() / errors.len() as f64;
        let severity_score = (avg_error * 1.3).min(100.0);

        let examples: Vec<String> = self
            .sample_indices(errors.len())
            .into_iter()
            .map(|i| {
                format!(
                    "Recent examples biased probability estimate by {:.1}% for event with actual {}% likelihood",
                    errors[i],
                    rng.gen_range(1..=10)
                )
            })
            .collect();

        ProbeOutcome {
            detection_count: detections,
            severity_score,
            pattern_description: format!(
                "Recent examples biased probability estimates by {:.1}%",
                avg_error
            ),
            examples,
        }
    }

    /// Map a severity score to a category using per-type thresholds
    fn calculate_severity(score: f64, heuristic_type: HeuristicType) -> Severity {
        let (critical, high, medium) = match heuristic_type {
            HeuristicType::Anchoring => (75.0, 50.0, 25.0),
            HeuristicType::LossAversion => (80.0, 60.0, 35.0),
            HeuristicType::SunkCost => (70.0, 50.0, 30.0),
            HeuristicType::ConfirmationBias => (75.0, 55.0, 35.0),
            HeuristicType::AvailabilityHeuristic => (70.0, 50.0, 30.0),
        };

        if score >= critical {
            Severity::Critical
        } else if score >= high {
            Severity::High
        } else if score >= medium {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    /// Confidence from detection proportion, shrunk for small sample sizes
    pub fn calculate_confidence(&self, detection_count: u32) -> f64 {
        let proportion = detection_count as f64 / self.iteration_count as f64;
        let confidence = proportion * (1.0 - 1.0 / (self.iteration_count as f64).sqrt());
        confidence.min(0.99)
    }

    /// Run detection for the requested heuristic types
    pub fn run_detection(&self, heuristic_types: &[HeuristicType]) -> Vec<FindingDraft> {
        heuristic_types
            .iter()
            .map(|&htype| {
                let outcome = match htype {
                    HeuristicType::Anchoring => self.detect_anchoring(),
                    HeuristicType::LossAversion => self.detect_loss_aversion(),
                    HeuristicType::SunkCost => self.detect_sunk_cost(),
                    HeuristicType::ConfirmationBias => self.detect_confirmation_bias(),
                    HeuristicType::AvailabilityHeuristic => self.detect_availability_heuristic(),
                };

                FindingDraft {
                    heuristic_type: htype,
                    severity: Self::calculate_severity(outcome.severity_score, htype),
                    severity_score: outcome.severity_score,
                    confidence_level: self.calculate_confidence(outcome.detection_count),
                    detection_count: outcome.detection_count,
                    example_instances: outcome.examples,
                    pattern_description: outcome.pattern_description,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_covers_requested_types_only() {
        let detector = HeuristicDetector::new(20);
        let requested = [HeuristicType::Anchoring, HeuristicType::SunkCost];
        let findings = detector.run_detection(&requested);

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].heuristic_type, HeuristicType::Anchoring);
        assert_eq!(findings[1].heuristic_type, HeuristicType::SunkCost);
    }

    #[test]
    fn test_finding_fields_within_bounds() {
        let detector = HeuristicDetector::new(50);
        for draft in detector.run_detection(&HeuristicType::ALL) {
            assert!((0.0..=100.0).contains(&draft.severity_score));
            assert!((0.0..=1.0).contains(&draft.confidence_level));
            assert!(draft.detection_count <= 50);
            assert!(draft.example_instances.len() <= 3);
            assert!(!draft.pattern_description.is_empty());
        }
    }

    #[test]
    fn test_confidence_capped_and_shrunk() {
        let detector = HeuristicDetector::new(100);
        // Full detection rate still shrinks by the sample-size factor
        let confidence = detector.calculate_confidence(100);
        assert!(confidence <= 0.99);
        assert!((confidence - 0.9).abs() < 1e-9);

        assert_eq!(detector.calculate_confidence(0), 0.0);
    }

    #[test]
    fn test_severity_thresholds_per_type() {
        assert_eq!(
            HeuristicDetector::calculate_severity(76.0, HeuristicType::Anchoring),
            Severity::Critical
        );
        // Same score stays High for loss aversion's stricter threshold
        assert_eq!(
            HeuristicDetector::calculate_severity(76.0, HeuristicType::LossAversion),
            Severity::High
        );
        assert_eq!(
            HeuristicDetector::calculate_severity(10.0, HeuristicType::SunkCost),
            Severity::Low
        );
    }
}
