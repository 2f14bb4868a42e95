use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use mathwiz_algo::types::deserialize_skills;
use mathwiz_algo::LearnerProfile;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use super::sqlite_schema::{split_sql_statements, PROFILE_SCHEMA_SQL, SCHEMA_VERSION};
use super::{prepare_for_write, ProfileStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum SqliteInitError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Clone)]
pub struct SqliteProfileStore {
    pool: SqlitePool,
}

impl SqliteProfileStore {
    /// Open (creating if needed) the database behind `database_url` and apply the schema
    ///
    /// Accepts `sqlite:` URLs as well as bare file paths.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        let url = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite:{database_url}")
        };
        let in_memory = url.contains(":memory:");

        if !in_memory {
            let path = url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            let path = path.split('?').next().unwrap_or(path);
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| SqliteInitError::Io(e.to_string()))?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(&url)
            .map_err(|e| SqliteInitError::Config(e.to_string()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(30));

        // Each in-memory connection is a separate database.
        let max_connections = if in_memory { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;
        tracing::info!(in_memory, "sqlite profile store ready");
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn run_migrations(&self) -> Result<(), SqliteInitError> {
        let version: Option<String> = sqlx::query_scalar(
            r#"SELECT "value" FROM "_db_metadata" WHERE "key" = 'schema_version'"#,
        )
        .fetch_optional(&self.pool)
        .await
        .unwrap_or(None);

        if version.as_deref() == Some(SCHEMA_VERSION) {
            return Ok(());
        }

        for statement in split_sql_statements(PROFILE_SCHEMA_SQL) {
            sqlx::query(&statement).execute(&self.pool).await?;
        }

        sqlx::query(
            r#"INSERT OR REPLACE INTO "_db_metadata" ("key", "value") VALUES ('schema_version', ?)"#,
        )
        .bind(SCHEMA_VERSION)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

impl ProfileStore for SqliteProfileStore {
    async fn get(&self, id: &str) -> Result<Option<LearnerProfile>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT "id", "displayName", "gradeLevel", "xp", "streak", "lastPracticeDate",
                   "totalProblemsCompleted", "correctAnswers", "onboardingCompleted",
                   "achievements", "skills", "completedLessons", "completedProblems", "createdAt"
            FROM "learner_profiles"
            WHERE "id" = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| map_profile_row(&row)).transpose()
    }

    async fn upsert(&self, id: &str, profile: &LearnerProfile) -> Result<LearnerProfile, StoreError> {
        let stored = prepare_for_write(id, profile);

        let achievements = serde_json::to_string(&stored.achievements)?;
        let skills = serde_json::to_string(&stored.skills)?;
        let completed_lessons = serde_json::to_string(&stored.completed_lessons)?;
        let completed_problems = serde_json::to_string(&stored.completed_problems)?;

        sqlx::query(
            r#"
            INSERT INTO "learner_profiles" (
                "id", "displayName", "gradeLevel", "xp", "level", "streak", "lastPracticeDate",
                "totalProblemsCompleted", "correctAnswers", "accuracyRate", "onboardingCompleted",
                "achievements", "skills", "completedLessons", "completedProblems",
                "createdAt", "updatedAt"
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT("id") DO UPDATE SET
                "displayName" = excluded."displayName",
                "gradeLevel" = excluded."gradeLevel",
                "xp" = excluded."xp",
                "level" = excluded."level",
                "streak" = excluded."streak",
                "lastPracticeDate" = excluded."lastPracticeDate",
                "totalProblemsCompleted" = excluded."totalProblemsCompleted",
                "correctAnswers" = excluded."correctAnswers",
                "accuracyRate" = excluded."accuracyRate",
                "onboardingCompleted" = excluded."onboardingCompleted",
                "achievements" = excluded."achievements",
                "skills" = excluded."skills",
                "completedLessons" = excluded."completedLessons",
                "completedProblems" = excluded."completedProblems",
                "updatedAt" = excluded."updatedAt"
            "#,
        )
        .bind(&stored.id)
        .bind(&stored.display_name)
        .bind(i64::from(stored.grade_level))
        .bind(to_i64(stored.xp))
        .bind(i64::from(stored.level))
        .bind(i64::from(stored.streak))
        .bind(stored.last_practice_date)
        .bind(to_i64(stored.total_problems_completed))
        .bind(to_i64(stored.correct_answers))
        .bind(i64::from(stored.accuracy_rate))
        .bind(stored.onboarding_completed)
        .bind(achievements)
        .bind(skills)
        .bind(completed_lessons)
        .bind(completed_problems)
        .bind(stored.created_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.get(id).await?.ok_or_else(|| {
            StoreError::Unavailable(format!("profile {id} missing after upsert"))
        })
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_i64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn map_profile_row(row: &SqliteRow) -> Result<LearnerProfile, StoreError> {
    let achievements: String = row.try_get("achievements")?;
    let skills: String = row.try_get("skills")?;
    let completed_lessons: String = row.try_get("completedLessons")?;
    let completed_problems: String = row.try_get("completedProblems")?;
    let grade_level: i64 = row.try_get("gradeLevel")?;
    let streak: i64 = row.try_get("streak")?;

    let mut profile = LearnerProfile {
        id: row.try_get("id")?,
        display_name: row.try_get("displayName")?,
        grade_level: u8::try_from(grade_level).unwrap_or(u8::MAX),
        xp: from_i64(row.try_get("xp")?),
        streak: u32::try_from(streak).unwrap_or(0),
        last_practice_date: row.try_get::<Option<NaiveDate>, _>("lastPracticeDate")?,
        total_problems_completed: from_i64(row.try_get("totalProblemsCompleted")?),
        correct_answers: from_i64(row.try_get("correctAnswers")?),
        onboarding_completed: row.try_get("onboardingCompleted")?,
        achievements: serde_json::from_str(&achievements)?,
        completed_lessons: serde_json::from_str(&completed_lessons)?,
        completed_problems: serde_json::from_str(&completed_problems)?,
        created_at: row.try_get::<DateTime<Utc>, _>("createdAt")?,
        ..LearnerProfile::default()
    };
    // Same decoder as the HTTP boundary, so the legacy list shape also loads.
    let mut deserializer = serde_json::Deserializer::from_str(&skills);
    profile.skills = deserialize_skills(&mut deserializer)?;
    profile.normalize();
    Ok(profile)
}
