//! LibSQL storage backend implementation
//!
//! Persistent storage for evaluations and their sub-resources using libSQL,
//! with file-based migrations and foreign-key cascade enforcement.

use crate::error::{BiascopeError, Result};
use crate::storage::StorageBackend;
use crate::types::{
    Baseline, Evaluation, EvaluationId, EvaluationStatus, HeuristicFinding, HeuristicType,
    Recommendation, StatisticalParams, ZoneStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{params, Builder, Connection, Database, Row};
use tracing::{debug, info};
use uuid::Uuid;

/// Split a migration file into executable statements, skipping comment lines
fn parse_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if current.is_empty() && (trimmed.is_empty() || trimmed.starts_with("--")) {
            continue;
        }

        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);

        if trimmed.ends_with(';') {
            statements.push(current.clone());
            current.clear();
        }
    }

    if !current.trim().is_empty() {
        statements.push(current);
    }

    statements
}

/// Database connection mode
#[derive(Debug, Clone)]
pub enum ConnectionMode {
    /// Local file-based database
    Local(String),
    /// In-memory database (for testing)
    InMemory,
}

/// LibSQL storage backend
pub struct LibsqlStorage {
    db: Database,
    // libSQL's ":memory:" gives every connection its own private database,
    // so the in-memory mode pins one connection and hands out clones of it.
    shared_conn: Option<Connection>,
}

impl LibsqlStorage {
    /// Validate a local database file before opening
    ///
    /// Checks the SQLite header so a corrupted or foreign file produces an
    /// actionable error instead of a cryptic failure at first query.
    fn validate_database_file(db_path: &str, must_exist: bool) -> Result<bool> {
        let path = std::path::Path::new(db_path);

        if !path.exists() {
            if must_exist {
                return Err(BiascopeError::Database(format!(
                    "Database file not found at '{}'. Run 'biascope init' first or check BIASCOPE_DATABASE_URL.",
                    db_path
                )));
            }
            return Ok(false);
        }

        let bytes = std::fs::read(path).map_err(|e| {
            BiascopeError::Database(format!("Cannot read database file at '{}': {}", db_path, e))
        })?;

        // SQLite files start with "SQLite format 3\0"; an empty file is a
        // freshly created database and is fine.
        if !bytes.is_empty() && !bytes.starts_with(b"SQLite format 3\0") {
            return Err(BiascopeError::Database(format!(
                "Database file at '{}' is not a valid SQLite database. Delete it and run 'biascope init' to reinitialize.",
                db_path
            )));
        }

        debug!("Database file validation passed: {}", db_path);
        Ok(true)
    }

    /// Create a new LibSQL storage backend
    ///
    /// # Arguments
    /// * `mode` - Connection mode (local file or in-memory)
    /// * `create_if_missing` - If false, error on a missing local database
    pub async fn new_with_validation(mode: ConnectionMode, create_if_missing: bool) -> Result<Self> {
        info!(
            "Connecting to LibSQL database: {:?} (create_if_missing: {})",
            mode, create_if_missing
        );

        let db = match mode {
            ConnectionMode::Local(ref path) => {
                Self::validate_database_file(path, !create_if_missing)?;

                if create_if_missing {
                    if let Some(parent) = std::path::Path::new(path).parent() {
                        if !parent.as_os_str().is_empty() {
                            std::fs::create_dir_all(parent).map_err(|e| {
                                BiascopeError::Database(format!(
                                    "Failed to create database directory {}: {}",
                                    parent.display(),
                                    e
                                ))
                            })?;
                        }
                    }
                }

                Builder::new_local(path).build().await.map_err(|e| {
                    BiascopeError::Database(format!("Failed to create local database: {}", e))
                })?
            }
            ConnectionMode::InMemory => Builder::new_local(":memory:").build().await.map_err(|e| {
                BiascopeError::Database(format!("Failed to create in-memory database: {}", e))
            })?,
        };

        info!("LibSQL database connection established");

        let shared_conn = match mode {
            ConnectionMode::InMemory => Some(db.connect().map_err(|e| {
                BiascopeError::Database(format!("Failed to get connection: {}", e))
            })?),
            ConnectionMode::Local(_) => None,
        };

        let storage = Self { db, shared_conn };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// Create storage from a database path string
    ///
    /// ":memory:" selects an ephemeral in-memory database, anything else is
    /// treated as a local file path.
    pub async fn from_path(database_url: &str, create_if_missing: bool) -> Result<Self> {
        let mode = if database_url == ":memory:" {
            ConnectionMode::InMemory
        } else {
            ConnectionMode::Local(database_url.to_string())
        };

        Self::new_with_validation(mode, create_if_missing).await
    }

    /// Create an in-memory storage (convenience for tests)
    pub async fn in_memory() -> Result<Self> {
        Self::new_with_validation(ConnectionMode::InMemory, true).await
    }

    /// Run database migrations
    ///
    /// Applies the numbered SQL files under `migrations/` in order, tracking
    /// applied migrations in `_migrations_applied` so reruns are no-ops.
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");

        let conn = self.get_conn().await?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations_applied (
                migration_name TEXT PRIMARY KEY,
                applied_at INTEGER NOT NULL
            )",
            params![],
        )
        .await
        .map_err(|e| {
            BiascopeError::Migration(format!("Failed to create migrations table: {}", e))
        })?;

        let migrations_path =
            std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations");

        let migration_files = ["001_initial_schema.sql", "002_add_indexes.sql"];

        for migration_file in migration_files {
            let mut rows = conn
                .query(
                    "SELECT COUNT(*) FROM _migrations_applied WHERE migration_name = ?",
                    params![migration_file],
                )
                .await?;

            let already_applied = if let Some(row) = rows.next().await? {
                row.get::<i64>(0).unwrap_or(0)
            } else {
                0
            };

            if already_applied > 0 {
                debug!("Skipping already applied migration: {}", migration_file);
                continue;
            }

            let file_path = migrations_path.join(migration_file);
            let sql = std::fs::read_to_string(&file_path).map_err(|e| {
                BiascopeError::Migration(format!(
                    "Failed to read migration file {}: {}",
                    migration_file, e
                ))
            })?;

            let statements = parse_sql_statements(&sql);
            for (i, statement) in statements.iter().enumerate() {
                conn.execute(statement, params![]).await.map_err(|e| {
                    BiascopeError::Migration(format!(
                        "Failed to execute statement #{} in {}: {}",
                        i + 1,
                        migration_file,
                        e
                    ))
                })?;
            }

            conn.execute(
                "INSERT INTO _migrations_applied (migration_name, applied_at) VALUES (?, ?)",
                params![migration_file, Utc::now().timestamp()],
            )
            .await
            .map_err(|e| BiascopeError::Migration(format!("Failed to record migration: {}", e)))?;

            info!("Executed migration: {}", migration_file);
        }

        info!("Database migrations completed");
        Ok(())
    }

    /// Get a connection with foreign-key enforcement enabled
    ///
    /// SQLite checks foreign keys per connection, so the cascade rules on
    /// findings and recommendations depend on this pragma.
    async fn get_conn(&self) -> Result<Connection> {
        let conn = match &self.shared_conn {
            Some(conn) => conn.clone(),
            None => self
                .db
                .connect()
                .map_err(|e| BiascopeError::Database(format!("Failed to get connection: {}", e)))?,
        };

        conn.execute("PRAGMA foreign_keys = ON", params![]).await?;

        Ok(conn)
    }

    fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| BiascopeError::Other(format!("Invalid timestamp: {}", e)))
    }

    fn row_to_evaluation(row: &Row) -> Result<Evaluation> {
        let id_str: String = row.get(0)?;
        let id = EvaluationId::from_string(&id_str)?;

        let ai_system_name: String = row.get(1)?;

        let heuristic_types_json: String = row.get(2)?;
        let heuristic_types: Vec<HeuristicType> = serde_json::from_str(&heuristic_types_json)?;

        let iteration_count: i64 = row.get(3)?;

        let status_str: String = row.get(4)?;
        let status: EvaluationStatus = status_str.parse()?;

        let created_at_str: String = row.get(5)?;
        let created_at = Self::parse_timestamp(&created_at_str)?;

        let completed_at_str: Option<String> = row.get(6)?;
        let completed_at = match completed_at_str {
            Some(ref s) => Some(Self::parse_timestamp(s)?),
            None => None,
        };

        let overall_score: Option<f64> = row.get(7)?;

        let zone_status_str: Option<String> = row.get(8)?;
        let zone_status = match zone_status_str {
            Some(ref s) => Some(s.parse::<ZoneStatus>()?),
            None => None,
        };

        Ok(Evaluation {
            id,
            ai_system_name,
            heuristic_types,
            iteration_count: iteration_count as u32,
            status,
            created_at,
            completed_at,
            overall_score,
            zone_status,
        })
    }

    fn row_to_finding(row: &Row) -> Result<HeuristicFinding> {
        let id_str: String = row.get(0)?;
        let evaluation_id_str: String = row.get(1)?;

        let heuristic_type_str: String = row.get(2)?;
        let severity_str: String = row.get(3)?;

        let example_instances_json: String = row.get(7)?;
        let example_instances: Vec<String> = serde_json::from_str(&example_instances_json)?;

        let created_at_str: String = row.get(9)?;

        Ok(HeuristicFinding {
            id: Uuid::parse_str(&id_str)?,
            evaluation_id: EvaluationId::from_string(&evaluation_id_str)?,
            heuristic_type: heuristic_type_str.parse()?,
            severity: severity_str.parse()?,
            severity_score: row.get(4)?,
            confidence_level: row.get(5)?,
            detection_count: row.get::<i64>(6)? as u32,
            example_instances,
            pattern_description: row.get(8)?,
            created_at: Self::parse_timestamp(&created_at_str)?,
        })
    }

    fn row_to_recommendation(row: &Row) -> Result<Recommendation> {
        let id_str: String = row.get(0)?;
        let evaluation_id_str: String = row.get(1)?;

        let heuristic_type_str: String = row.get(2)?;
        let impact_str: String = row.get(7)?;
        let difficulty_str: String = row.get(8)?;
        let created_at_str: String = row.get(9)?;

        Ok(Recommendation {
            id: Uuid::parse_str(&id_str)?,
            evaluation_id: EvaluationId::from_string(&evaluation_id_str)?,
            heuristic_type: heuristic_type_str.parse()?,
            priority: row.get::<i64>(3)? as u8,
            action_title: row.get(4)?,
            technical_description: row.get(5)?,
            simplified_description: row.get(6)?,
            estimated_impact: impact_str.parse()?,
            implementation_difficulty: difficulty_str.parse()?,
            created_at: Self::parse_timestamp(&created_at_str)?,
        })
    }

    fn row_to_baseline(row: &Row) -> Result<Baseline> {
        let id_str: String = row.get(0)?;

        let params_json: String = row.get(4)?;
        let statistical_params: StatisticalParams = serde_json::from_str(&params_json)?;

        let created_at_str: String = row.get(5)?;

        Ok(Baseline {
            id: Uuid::parse_str(&id_str)?,
            name: row.get(1)?,
            green_zone_max: row.get(2)?,
            yellow_zone_max: row.get(3)?,
            statistical_params,
            created_at: Self::parse_timestamp(&created_at_str)?,
        })
    }
}

const EVALUATION_COLUMNS: &str = "id, ai_system_name, heuristic_types, iteration_count, status, \
     created_at, completed_at, overall_score, zone_status";

const FINDING_COLUMNS: &str = "id, evaluation_id, heuristic_type, severity, severity_score, \
     confidence_level, detection_count, example_instances, pattern_description, created_at";

const RECOMMENDATION_COLUMNS: &str = "id, evaluation_id, heuristic_type, priority, action_title, \
     technical_description, simplified_description, estimated_impact, \
     implementation_difficulty, created_at";

#[async_trait]
impl StorageBackend for LibsqlStorage {
    async fn create_evaluation(&self, evaluation: &Evaluation) -> Result<()> {
        debug!("Storing evaluation: {}", evaluation.id);

        let conn = self.get_conn().await?;
        conn.execute(
            "INSERT INTO evaluations (id, ai_system_name, heuristic_types, iteration_count, \
             status, created_at, completed_at, overall_score, zone_status) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                evaluation.id.to_string(),
                evaluation.ai_system_name.clone(),
                serde_json::to_string(&evaluation.heuristic_types)?,
                evaluation.iteration_count as i64,
                evaluation.status.as_str(),
                evaluation.created_at.to_rfc3339(),
                evaluation.completed_at.map(|t| t.to_rfc3339()),
                evaluation.overall_score,
                evaluation.zone_status.map(|z| z.as_str().to_string()),
            ],
        )
        .await?;

        Ok(())
    }

    async fn get_evaluation(&self, id: EvaluationId) -> Result<Evaluation> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(
                &format!("SELECT {} FROM evaluations WHERE id = ?", EVALUATION_COLUMNS),
                params![id.to_string()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Self::row_to_evaluation(&row),
            None => Err(BiascopeError::EvaluationNotFound(id.to_string())),
        }
    }

    async fn list_evaluations(&self, limit: u32, offset: u32) -> Result<(Vec<Evaluation>, u64)> {
        let conn = self.get_conn().await?;

        let mut count_rows = conn
            .query("SELECT COUNT(*) FROM evaluations", params![])
            .await?;
        let total = match count_rows.next().await? {
            Some(row) => row.get::<i64>(0)? as u64,
            None => 0,
        };

        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM evaluations ORDER BY created_at DESC LIMIT ? OFFSET ?",
                    EVALUATION_COLUMNS
                ),
                params![limit as i64, offset as i64],
            )
            .await?;

        let mut evaluations = Vec::new();
        while let Some(row) = rows.next().await? {
            evaluations.push(Self::row_to_evaluation(&row)?);
        }

        Ok((evaluations, total))
    }

    async fn update_evaluation(&self, evaluation: &Evaluation) -> Result<()> {
        let conn = self.get_conn().await?;
        let affected = conn
            .execute(
                "UPDATE evaluations SET status = ?, completed_at = ?, overall_score = ?, \
                 zone_status = ? WHERE id = ?",
                params![
                    evaluation.status.as_str(),
                    evaluation.completed_at.map(|t| t.to_rfc3339()),
                    evaluation.overall_score,
                    evaluation.zone_status.map(|z| z.as_str().to_string()),
                    evaluation.id.to_string(),
                ],
            )
            .await?;

        if affected == 0 {
            return Err(BiascopeError::EvaluationNotFound(evaluation.id.to_string()));
        }

        Ok(())
    }

    async fn delete_evaluation(&self, id: EvaluationId) -> Result<()> {
        let conn = self.get_conn().await?;
        let affected = conn
            .execute(
                "DELETE FROM evaluations WHERE id = ?",
                params![id.to_string()],
            )
            .await?;

        if affected == 0 {
            return Err(BiascopeError::EvaluationNotFound(id.to_string()));
        }

        debug!("Deleted evaluation {} (cascade to sub-resources)", id);
        Ok(())
    }

    async fn insert_finding(&self, finding: &HeuristicFinding) -> Result<()> {
        let conn = self.get_conn().await?;
        conn.execute(
            "INSERT INTO heuristic_findings (id, evaluation_id, heuristic_type, severity, \
             severity_score, confidence_level, detection_count, example_instances, \
             pattern_description, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                finding.id.to_string(),
                finding.evaluation_id.to_string(),
                finding.heuristic_type.as_str(),
                finding.severity.as_str(),
                finding.severity_score,
                finding.confidence_level,
                finding.detection_count as i64,
                serde_json::to_string(&finding.example_instances)?,
                finding.pattern_description.clone(),
                finding.created_at.to_rfc3339(),
            ],
        )
        .await?;

        Ok(())
    }

    async fn list_findings(&self, evaluation_id: EvaluationId) -> Result<Vec<HeuristicFinding>> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM heuristic_findings WHERE evaluation_id = ? \
                     ORDER BY severity_score DESC",
                    FINDING_COLUMNS
                ),
                params![evaluation_id.to_string()],
            )
            .await?;

        let mut findings = Vec::new();
        while let Some(row) = rows.next().await? {
            findings.push(Self::row_to_finding(&row)?);
        }

        Ok(findings)
    }

    async fn get_finding(
        &self,
        evaluation_id: EvaluationId,
        heuristic_type: HeuristicType,
    ) -> Result<HeuristicFinding> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM heuristic_findings WHERE evaluation_id = ? \
                     AND heuristic_type = ?",
                    FINDING_COLUMNS
                ),
                params![evaluation_id.to_string(), heuristic_type.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Self::row_to_finding(&row),
            None => Err(BiascopeError::FindingNotFound {
                evaluation_id: evaluation_id.to_string(),
                heuristic_type: heuristic_type.as_str().to_string(),
            }),
        }
    }

    async fn insert_recommendation(&self, recommendation: &Recommendation) -> Result<()> {
        let conn = self.get_conn().await?;
        conn.execute(
            "INSERT INTO recommendations (id, evaluation_id, heuristic_type, priority, \
             action_title, technical_description, simplified_description, estimated_impact, \
             implementation_difficulty, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                recommendation.id.to_string(),
                recommendation.evaluation_id.to_string(),
                recommendation.heuristic_type.as_str(),
                recommendation.priority as i64,
                recommendation.action_title.clone(),
                recommendation.technical_description.clone(),
                recommendation.simplified_description.clone(),
                recommendation.estimated_impact.as_str(),
                recommendation.implementation_difficulty.as_str(),
                recommendation.created_at.to_rfc3339(),
            ],
        )
        .await?;

        Ok(())
    }

    async fn list_recommendations(
        &self,
        evaluation_id: EvaluationId,
    ) -> Result<Vec<Recommendation>> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM recommendations WHERE evaluation_id = ? \
                     ORDER BY priority DESC",
                    RECOMMENDATION_COLUMNS
                ),
                params![evaluation_id.to_string()],
            )
            .await?;

        let mut recommendations = Vec::new();
        while let Some(row) = rows.next().await? {
            recommendations.push(Self::row_to_recommendation(&row)?);
        }

        Ok(recommendations)
    }

    async fn get_recommendation(
        &self,
        evaluation_id: EvaluationId,
        recommendation_id: Uuid,
    ) -> Result<Recommendation> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM recommendations WHERE id = ? AND evaluation_id = ?",
                    RECOMMENDATION_COLUMNS
                ),
                params![recommendation_id.to_string(), evaluation_id.to_string()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Self::row_to_recommendation(&row),
            None => Err(BiascopeError::RecommendationNotFound(
                recommendation_id.to_string(),
            )),
        }
    }

    async fn create_baseline(&self, baseline: &Baseline) -> Result<()> {
        let conn = self.get_conn().await?;
        conn.execute(
            "INSERT INTO baselines (id, name, green_zone_max, yellow_zone_max, \
             statistical_params, created_at) VALUES (?, ?, ?, ?, ?, ?)",
            params![
                baseline.id.to_string(),
                baseline.name.clone(),
                baseline.green_zone_max,
                baseline.yellow_zone_max,
                serde_json::to_string(&baseline.statistical_params)?,
                baseline.created_at.to_rfc3339(),
            ],
        )
        .await?;

        Ok(())
    }

    async fn get_baseline(&self, id: Uuid) -> Result<Baseline> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(
                "SELECT id, name, green_zone_max, yellow_zone_max, statistical_params, \
                 created_at FROM baselines WHERE id = ?",
                params![id.to_string()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Self::row_to_baseline(&row),
            None => Err(BiascopeError::BaselineNotFound(id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sql_statements() {
        let sql = "-- comment\nCREATE TABLE a (id TEXT);\n\nCREATE TABLE b (\n  id TEXT\n);\n";
        let statements = parse_sql_statements(sql);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("CREATE TABLE a"));
        assert!(statements[1].contains("CREATE TABLE b"));
    }
}
