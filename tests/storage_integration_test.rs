//! Integration tests for the libSQL storage backend

use biascope_core::types::{
    Difficulty, Evaluation, EvaluationId, EvaluationStatus, HeuristicFinding, HeuristicType,
    Impact, Recommendation, Severity, ZoneStatus,
};
use biascope_core::{BiascopeError, LibsqlStorage, StorageBackend};
use chrono::Utc;
use uuid::Uuid;

fn test_evaluation(name: &str) -> Evaluation {
    Evaluation::new(
        name.to_string(),
        vec![HeuristicType::Anchoring, HeuristicType::SunkCost],
        20,
    )
}

fn test_finding(evaluation_id: EvaluationId, heuristic_type: HeuristicType, score: f64) -> HeuristicFinding {
    HeuristicFinding {
        id: Uuid::new_v4(),
        evaluation_id,
        heuristic_type,
        severity: Severity::Medium,
        severity_score: score,
        confidence_level: 0.85,
        detection_count: 12,
        example_instances: vec!["Response varied by 40.0% when anchor changed".to_string()],
        pattern_description: "Detected in 12 of 20 iterations".to_string(),
        created_at: Utc::now(),
    }
}

fn test_recommendation(evaluation_id: EvaluationId, priority: u8) -> Recommendation {
    Recommendation {
        id: Uuid::new_v4(),
        evaluation_id,
        heuristic_type: HeuristicType::Anchoring,
        priority,
        action_title: "Implement anchor randomization".to_string(),
        technical_description: "Randomize initial reference values".to_string(),
        simplified_description: "Vary starting points".to_string(),
        estimated_impact: Impact::High,
        implementation_difficulty: Difficulty::Moderate,
        created_at: Utc::now(),
    }
}

// Each storage operation acquires its own connection, so this fails with
// "no such table" unless the in-memory mode keeps every operation on the
// same underlying database as the migrations.
#[tokio::test]
async fn test_in_memory_operations_share_one_database() {
    let storage = LibsqlStorage::in_memory().await.expect("storage");

    let evaluation = test_evaluation("SharedBot");
    storage
        .create_evaluation(&evaluation)
        .await
        .expect("create");

    let (page, total) = storage.list_evaluations(10, 0).await.expect("list");
    assert_eq!(total, 1);
    assert_eq!(page[0].ai_system_name, "SharedBot");

    storage
        .insert_finding(&test_finding(evaluation.id, HeuristicType::Anchoring, 44.0))
        .await
        .expect("insert finding");
    let findings = storage.list_findings(evaluation.id).await.expect("list");
    assert_eq!(findings.len(), 1);

    storage
        .delete_evaluation(evaluation.id)
        .await
        .expect("delete");
    let (_, total) = storage.list_evaluations(10, 0).await.expect("list");
    assert_eq!(total, 0);
}

#[tokio::test]
async fn test_evaluation_crud_round_trip() {
    let storage = LibsqlStorage::in_memory().await.expect("storage");

    let evaluation = test_evaluation("TestBot");
    storage
        .create_evaluation(&evaluation)
        .await
        .expect("create");

    let retrieved = storage.get_evaluation(evaluation.id).await.expect("get");
    assert_eq!(retrieved.id, evaluation.id);
    assert_eq!(retrieved.ai_system_name, "TestBot");
    assert_eq!(retrieved.heuristic_types, evaluation.heuristic_types);
    assert_eq!(retrieved.status, EvaluationStatus::Pending);
    assert!(retrieved.overall_score.is_none());
    assert!(retrieved.completed_at.is_none());
}

#[tokio::test]
async fn test_update_evaluation_completion_fields() {
    let storage = LibsqlStorage::in_memory().await.expect("storage");

    let mut evaluation = test_evaluation("UpdateBot");
    storage
        .create_evaluation(&evaluation)
        .await
        .expect("create");

    evaluation.status = EvaluationStatus::Completed;
    evaluation.completed_at = Some(Utc::now());
    evaluation.overall_score = Some(48.33);
    evaluation.zone_status = Some(ZoneStatus::Yellow);
    storage.update_evaluation(&evaluation).await.expect("update");

    let retrieved = storage.get_evaluation(evaluation.id).await.expect("get");
    assert_eq!(retrieved.status, EvaluationStatus::Completed);
    assert_eq!(retrieved.overall_score, Some(48.33));
    assert_eq!(retrieved.zone_status, Some(ZoneStatus::Yellow));
    assert!(retrieved.completed_at.is_some());
}

#[tokio::test]
async fn test_get_missing_evaluation_is_not_found() {
    let storage = LibsqlStorage::in_memory().await.expect("storage");

    let err = storage
        .get_evaluation(EvaluationId::new())
        .await
        .expect_err("missing id must error");
    assert!(matches!(err, BiascopeError::EvaluationNotFound(_)));

    let err = storage
        .delete_evaluation(EvaluationId::new())
        .await
        .expect_err("deleting missing id must error");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_list_evaluations_pagination_and_total() {
    let storage = LibsqlStorage::in_memory().await.expect("storage");

    for i in 0..5 {
        let evaluation = test_evaluation(&format!("Bot-{}", i));
        storage
            .create_evaluation(&evaluation)
            .await
            .expect("create");
    }

    let (page, total) = storage.list_evaluations(2, 0).await.expect("list");
    assert_eq!(page.len(), 2);
    assert_eq!(total, 5);

    let (rest, total) = storage.list_evaluations(10, 4).await.expect("list");
    assert_eq!(rest.len(), 1);
    assert_eq!(total, 5);
}

#[tokio::test]
async fn test_findings_ordered_by_severity_desc() {
    let storage = LibsqlStorage::in_memory().await.expect("storage");

    let evaluation = test_evaluation("OrderBot");
    storage
        .create_evaluation(&evaluation)
        .await
        .expect("create");

    for (htype, score) in [
        (HeuristicType::Anchoring, 42.0),
        (HeuristicType::SunkCost, 71.5),
        (HeuristicType::LossAversion, 55.0),
    ] {
        storage
            .insert_finding(&test_finding(evaluation.id, htype, score))
            .await
            .expect("insert");
    }

    let findings = storage.list_findings(evaluation.id).await.expect("list");
    assert_eq!(findings.len(), 3);
    let scores: Vec<f64> = findings.iter().map(|f| f.severity_score).collect();
    assert_eq!(scores, vec![71.5, 55.0, 42.0]);
}

#[tokio::test]
async fn test_get_finding_by_type() {
    let storage = LibsqlStorage::in_memory().await.expect("storage");

    let evaluation = test_evaluation("FindBot");
    storage
        .create_evaluation(&evaluation)
        .await
        .expect("create");

    storage
        .insert_finding(&test_finding(evaluation.id, HeuristicType::Anchoring, 60.0))
        .await
        .expect("insert");

    let finding = storage
        .get_finding(evaluation.id, HeuristicType::Anchoring)
        .await
        .expect("get");
    assert_eq!(finding.heuristic_type, HeuristicType::Anchoring);
    assert_eq!(finding.example_instances.len(), 1);

    let err = storage
        .get_finding(evaluation.id, HeuristicType::ConfirmationBias)
        .await
        .expect_err("missing type must error");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_delete_cascades_to_sub_resources() {
    let storage = LibsqlStorage::in_memory().await.expect("storage");

    let evaluation = test_evaluation("CascadeBot");
    storage
        .create_evaluation(&evaluation)
        .await
        .expect("create");

    storage
        .insert_finding(&test_finding(evaluation.id, HeuristicType::Anchoring, 50.0))
        .await
        .expect("insert finding");
    storage
        .insert_recommendation(&test_recommendation(evaluation.id, 8))
        .await
        .expect("insert recommendation");

    storage
        .delete_evaluation(evaluation.id)
        .await
        .expect("delete");

    // A fresh insert against the same parent id must now be rejected, and
    // the children must be gone.
    let findings = storage.list_findings(evaluation.id).await.expect("list");
    assert!(findings.is_empty());
    let recommendations = storage
        .list_recommendations(evaluation.id)
        .await
        .expect("list");
    assert!(recommendations.is_empty());

    let orphan = test_finding(evaluation.id, HeuristicType::SunkCost, 10.0);
    assert!(storage.insert_finding(&orphan).await.is_err());
}

#[tokio::test]
async fn test_recommendations_ordered_by_priority_desc() {
    let storage = LibsqlStorage::in_memory().await.expect("storage");

    let evaluation = test_evaluation("PriorityBot");
    storage
        .create_evaluation(&evaluation)
        .await
        .expect("create");

    for priority in [3u8, 9, 6] {
        storage
            .insert_recommendation(&test_recommendation(evaluation.id, priority))
            .await
            .expect("insert");
    }

    let recommendations = storage
        .list_recommendations(evaluation.id)
        .await
        .expect("list");
    let priorities: Vec<u8> = recommendations.iter().map(|r| r.priority).collect();
    assert_eq!(priorities, vec![9, 6, 3]);
}

#[tokio::test]
async fn test_recommendation_lookup_scoped_to_evaluation() {
    let storage = LibsqlStorage::in_memory().await.expect("storage");

    let eval_a = test_evaluation("BotA");
    let eval_b = test_evaluation("BotB");
    storage.create_evaluation(&eval_a).await.expect("create");
    storage.create_evaluation(&eval_b).await.expect("create");

    let rec = test_recommendation(eval_a.id, 5);
    storage
        .insert_recommendation(&rec)
        .await
        .expect("insert");

    let found = storage
        .get_recommendation(eval_a.id, rec.id)
        .await
        .expect("get");
    assert_eq!(found.id, rec.id);

    // The same id under the wrong parent does not resolve
    let err = storage
        .get_recommendation(eval_b.id, rec.id)
        .await
        .expect_err("wrong parent must error");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_baseline_round_trip() {
    use biascope_core::types::{Baseline, StatisticalParams};

    let storage = LibsqlStorage::in_memory().await.expect("storage");

    let baseline = Baseline {
        id: Uuid::new_v4(),
        name: "Baseline for TestBot".to_string(),
        green_zone_max: 37.5,
        yellow_zone_max: 52.5,
        statistical_params: StatisticalParams {
            mean: 30.0,
            std_dev: 15.0,
            sample_size: 0,
        },
        created_at: Utc::now(),
    };

    storage.create_baseline(&baseline).await.expect("create");

    let retrieved = storage.get_baseline(baseline.id).await.expect("get");
    assert_eq!(retrieved.name, baseline.name);
    assert_eq!(retrieved.green_zone_max, 37.5);
    assert_eq!(retrieved.statistical_params, baseline.statistical_params);

    let err = storage
        .get_baseline(Uuid::new_v4())
        .await
        .expect_err("missing baseline must error");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_on_disk_database_persists_across_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("biascope_test.db");
    let db_path = db_path.to_string_lossy().to_string();

    let evaluation = test_evaluation("DiskBot");
    {
        let storage = LibsqlStorage::from_path(&db_path, true)
            .await
            .expect("create storage");
        storage
            .create_evaluation(&evaluation)
            .await
            .expect("create");
    }

    let storage = LibsqlStorage::from_path(&db_path, false)
        .await
        .expect("reopen storage");
    let retrieved = storage.get_evaluation(evaluation.id).await.expect("get");
    assert_eq!(retrieved.ai_system_name, "DiskBot");
}
