//! Database repository for CRUD operations

use super::migrations::INIT_SCHEMA;
use super::models::{DbGroup, DbMessage, Questionnaire};
use crate::grouping::{GroupRecord, RespondentRecord, RespondentSource, RosterSink, RosterWriteMode};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Database connection and operations
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection
    pub async fn new(path: &Path) -> Result<Self, DatabaseError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.ok();
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub async fn in_memory() -> Result<Self, DatabaseError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        // the database lives and dies with its single connection
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        sqlx::query(INIT_SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;

        Ok(())
    }

    // ========================================================================
    // Questionnaire operations
    // ========================================================================

    /// Insert a submission, replacing an earlier one from the same email
    pub async fn save_questionnaire(&self, entry: &Questionnaire) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO questionnaire (email, hobbies, topics, gender, year, purpose, submitted_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(email) DO UPDATE SET
                hobbies = excluded.hobbies,
                topics = excluded.topics,
                gender = excluded.gender,
                year = excluded.year,
                purpose = excluded.purpose,
                submitted_at = excluded.submitted_at
            "#,
        )
        .bind(&entry.email)
        .bind(&entry.hobbies)
        .bind(&entry.topics)
        .bind(&entry.gender)
        .bind(&entry.year)
        .bind(&entry.purpose)
        .bind(&entry.submitted_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All submissions in the order they were first received
    pub async fn get_questionnaire_data(&self) -> Result<Vec<Questionnaire>, DatabaseError> {
        Ok(
            sqlx::query_as::<_, Questionnaire>("SELECT * FROM questionnaire ORDER BY rowid ASC")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    /// Get one submission by email
    pub async fn get_questionnaire(&self, email: &str) -> Result<Questionnaire, DatabaseError> {
        sqlx::query_as::<_, Questionnaire>("SELECT * FROM questionnaire WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Questionnaire not found: {}", email)))
    }

    // ========================================================================
    // Group operations
    // ========================================================================

    /// Write a run's groups in one transaction
    pub async fn save_groups(
        &self,
        groups: &[GroupRecord],
        mode: RosterWriteMode,
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        if mode == RosterWriteMode::Replace {
            sqlx::query("DELETE FROM group_roster").execute(&mut *tx).await?;
        }

        for group in groups {
            let row = DbGroup::from(group);
            sqlx::query(
                r#"
                INSERT INTO group_roster (id, group_name, email, created_at)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(&row.id)
            .bind(&row.group_name)
            .bind(&row.email)
            .bind(&row.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Get the group roster
    pub async fn get_groups(&self) -> Result<Vec<DbGroup>, DatabaseError> {
        Ok(
            sqlx::query_as::<_, DbGroup>("SELECT * FROM group_roster ORDER BY created_at ASC, rowid ASC")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    /// Groups whose member list contains `email`
    pub async fn get_groups_for(&self, email: &str) -> Result<Vec<DbGroup>, DatabaseError> {
        let groups = self.get_groups().await?;
        Ok(groups
            .into_iter()
            .filter(|g| g.members().iter().any(|m| m == email))
            .collect())
    }

    // ========================================================================
    // Message operations
    // ========================================================================

    /// Store a chat message
    pub async fn save_message(&self, message: &DbMessage) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO messages (id, group_name, email, message, timestamp)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&message.id)
        .bind(&message.group_name)
        .bind(&message.email)
        .bind(&message.message)
        .bind(&message.timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Chat history for a group, oldest first
    pub async fn get_messages(&self, group_name: &str) -> Result<Vec<DbMessage>, DatabaseError> {
        Ok(sqlx::query_as::<_, DbMessage>(
            "SELECT * FROM messages WHERE group_name = ? ORDER BY timestamp ASC, rowid ASC",
        )
        .bind(group_name)
        .fetch_all(&self.pool)
        .await?)
    }
}

#[async_trait]
impl RespondentSource for Database {
    async fn load_respondents(&self) -> Result<Vec<RespondentRecord>, DatabaseError> {
        let rows = self.get_questionnaire_data().await?;
        Ok(rows.into_iter().map(RespondentRecord::from).collect())
    }
}

#[async_trait]
impl RosterSink for Database {
    async fn write_roster(
        &self,
        groups: &[GroupRecord],
        mode: RosterWriteMode,
    ) -> Result<(), DatabaseError> {
        self.save_groups(groups, mode).await
    }
}
