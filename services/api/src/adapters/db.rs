//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the SQLite database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, SqlitePool};
use study_tracker_core::domain::{Module, Recommendation, StudySession};
use study_tracker_core::ports::{DatabaseService, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: SqlitePool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates the schema if it does not exist yet. Safe to run at every startup.
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS modules (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                target_hours REAL NOT NULL,
                exam_date TEXT,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS learning_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                module_id INTEGER NOT NULL,
                duration REAL NOT NULL,
                date TEXT NOT NULL,
                notes TEXT,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS recommendations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                recommendation_text TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetches one session together with its module name.
    async fn fetch_session(&self, session_id: i64) -> PortResult<StudySession> {
        let record = sqlx::query_as::<_, SessionRecord>(&format!(
            "{SESSION_SELECT} WHERE s.id = ?"
        ))
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Session {} not found", session_id))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.to_domain())
    }
}

/// Shared SELECT for sessions; the module name is resolved by a LEFT JOIN so a
/// concurrently deleted parent yields NULL instead of an error.
const SESSION_SELECT: &str = "SELECT s.id, s.module_id, m.name AS module_name, s.duration, \
     s.date, s.notes, s.created_at \
     FROM learning_sessions s LEFT JOIN modules m ON m.id = s.module_id";

/// Shared SELECT for modules; `actual_hours` is aggregated from the live
/// sessions on every read, never stored.
const MODULE_SELECT: &str = "SELECT m.id, m.name, m.target_hours, m.exam_date, m.created_at, \
     COALESCE(SUM(s.duration), 0.0) AS actual_hours \
     FROM modules m LEFT JOIN learning_sessions s ON s.module_id = m.id";

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct ModuleRecord {
    id: i64,
    name: String,
    target_hours: f64,
    exam_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    actual_hours: f64,
}
impl ModuleRecord {
    fn to_domain(self) -> Module {
        Module {
            id: self.id,
            name: self.name,
            target_hours: self.target_hours,
            exam_date: self.exam_date,
            created_at: self.created_at,
            actual_hours: self.actual_hours,
        }
    }
}

#[derive(FromRow)]
struct SessionRecord {
    id: i64,
    module_id: i64,
    module_name: Option<String>,
    duration: f64,
    date: NaiveDate,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}
impl SessionRecord {
    fn to_domain(self) -> StudySession {
        StudySession {
            id: self.id,
            module_id: self.module_id,
            module_name: self.module_name,
            duration: self.duration,
            date: self.date,
            notes: self.notes,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct RecommendationRecord {
    id: i64,
    recommendation_text: String,
    created_at: DateTime<Utc>,
}
impl RecommendationRecord {
    fn to_domain(self) -> Recommendation {
        Recommendation {
            id: self.id,
            recommendation_text: self.recommendation_text,
            created_at: self.created_at,
        }
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_module(
        &self,
        name: &str,
        target_hours: f64,
        exam_date: Option<NaiveDate>,
    ) -> PortResult<Module> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO modules (name, target_hours, exam_date, created_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(name)
        .bind(target_hours)
        .bind(exam_date)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(Module {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            target_hours,
            exam_date,
            created_at,
            actual_hours: 0.0,
        })
    }

    async fn list_modules(&self) -> PortResult<Vec<Module>> {
        let records = sqlx::query_as::<_, ModuleRecord>(&format!(
            "{MODULE_SELECT} GROUP BY m.id ORDER BY m.id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_module(&self, module_id: i64) -> PortResult<Module> {
        let record = sqlx::query_as::<_, ModuleRecord>(&format!(
            "{MODULE_SELECT} WHERE m.id = ? GROUP BY m.id"
        ))
        .bind(module_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Module {} not found", module_id))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.to_domain())
    }

    async fn delete_module(&self, module_id: i64) -> PortResult<u64> {
        // Explicit cascade: sessions first, then the module, one transaction.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let sessions = sqlx::query("DELETE FROM learning_sessions WHERE module_id = ?")
            .bind(module_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let module = sqlx::query("DELETE FROM modules WHERE id = ?")
            .bind(module_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if module.rows_affected() == 0 {
            // Nothing deleted; dropping the transaction rolls it back.
            return Err(PortError::NotFound(format!(
                "Module {} not found",
                module_id
            )));
        }

        tx.commit()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(sessions.rows_affected())
    }

    async fn create_session(
        &self,
        module_id: i64,
        duration: f64,
        date: NaiveDate,
        notes: Option<&str>,
    ) -> PortResult<StudySession> {
        let result = sqlx::query(
            "INSERT INTO learning_sessions (module_id, duration, date, notes, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(module_id)
        .bind(duration)
        .bind(date)
        .bind(notes)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        self.fetch_session(result.last_insert_rowid()).await
    }

    async fn list_sessions(&self, limit: Option<i64>) -> PortResult<Vec<StudySession>> {
        // A negative LIMIT means "no limit" in SQLite.
        let records = sqlx::query_as::<_, SessionRecord>(&format!(
            "{SESSION_SELECT} ORDER BY s.date DESC, s.id DESC LIMIT ?"
        ))
        .bind(limit.unwrap_or(-1))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn delete_session(&self, session_id: i64) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM learning_sessions WHERE id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Session {} not found",
                session_id
            )));
        }
        Ok(())
    }

    async fn sessions_for_module(&self, module_id: i64) -> PortResult<Vec<StudySession>> {
        let records = sqlx::query_as::<_, SessionRecord>(&format!(
            "{SESSION_SELECT} WHERE s.module_id = ? ORDER BY s.date DESC, s.id DESC"
        ))
        .bind(module_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn sessions_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PortResult<Vec<StudySession>> {
        let records = sqlx::query_as::<_, SessionRecord>(&format!(
            "{SESSION_SELECT} WHERE s.date >= ? AND s.date <= ? \
             ORDER BY s.date DESC, s.id DESC"
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn save_recommendation(&self, text: &str) -> PortResult<Recommendation> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO recommendations (recommendation_text, created_at) VALUES (?, ?)",
        )
        .bind(text)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(Recommendation {
            id: result.last_insert_rowid(),
            recommendation_text: text.to_string(),
            created_at,
        })
    }

    async fn latest_recommendation(&self) -> PortResult<Option<Recommendation>> {
        let record = sqlx::query_as::<_, RecommendationRecord>(
            "SELECT id, recommendation_text, created_at FROM recommendations \
             ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(record.map(|r| r.to_domain()))
    }
}
