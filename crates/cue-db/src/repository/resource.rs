//! # Resource Repository
//!
//! Database operations for billable resources (tables, consoles).

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use cue_core::{Resource, Session};

/// Repository for resource database operations.
#[derive(Debug, Clone)]
pub struct ResourceRepository {
    pool: SqlitePool,
}

const SELECT_COLUMNS: &str =
    "id, name, category, rate_cents_per_hour, is_active, created_at, updated_at";

impl ResourceRepository {
    /// Creates a new ResourceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ResourceRepository { pool }
    }

    /// Lists every resource, active first, then by name.
    ///
    /// The dashboard shows disabled resources too (grayed out), so this
    /// does not filter on `is_active`.
    pub async fn list(&self) -> DbResult<Vec<Resource>> {
        let resources = sqlx::query_as::<_, Resource>(&format!(
            "SELECT {SELECT_COLUMNS} FROM resources ORDER BY is_active DESC, name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(resources)
    }

    /// Gets a resource by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Resource>> {
        let resource = sqlx::query_as::<_, Resource>(&format!(
            "SELECT {SELECT_COLUMNS} FROM resources WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(resource)
    }

    /// Inserts a new resource.
    pub async fn insert(&self, resource: &Resource) -> DbResult<()> {
        debug!(id = %resource.id, name = %resource.name, "Inserting resource");

        sqlx::query(
            r#"
            INSERT INTO resources (
                id, name, category, rate_cents_per_hour,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&resource.id)
        .bind(&resource.name)
        .bind(resource.category)
        .bind(resource.rate_cents_per_hour)
        .bind(resource.is_active)
        .bind(resource.created_at)
        .bind(resource.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing resource.
    pub async fn update(&self, resource: &Resource) -> DbResult<()> {
        debug!(id = %resource.id, "Updating resource");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE resources SET
                name = ?2,
                category = ?3,
                rate_cents_per_hour = ?4,
                is_active = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&resource.id)
        .bind(&resource.name)
        .bind(resource.category)
        .bind(resource.rate_cents_per_hour)
        .bind(resource.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Resource", &resource.id));
        }

        Ok(())
    }

    /// Soft-deletes a resource by setting is_active = false.
    ///
    /// Historical sessions still reference the row, so this is the
    /// normal way to retire a table.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting resource");

        let now = Utc::now();

        let result =
            sqlx::query("UPDATE resources SET is_active = 0, updated_at = ?2 WHERE id = ?1")
                .bind(id)
                .bind(now)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Resource", id));
        }

        Ok(())
    }

    /// Hard-deletes a resource.
    ///
    /// Fails with a foreign key violation while any session references
    /// the row; the service layer turns that into a Conflict.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting resource");

        let result = sqlx::query("DELETE FROM resources WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Resource", id));
        }

        Ok(())
    }

    /// The session currently occupying this resource, if any.
    pub async fn current_session(&self, resource_id: &str) -> DbResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT id, resource_id, shift_id, operator_id, mode, prepaid_minutes,
                   start_time, end_time, is_active
            FROM sessions
            WHERE resource_id = ?1 AND is_active = 1
            "#,
        )
        .bind(resource_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// Fetches a resource inside an open transaction.
pub(crate) async fn get(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Resource>> {
    let resource = sqlx::query_as::<_, Resource>(&format!(
        "SELECT {SELECT_COLUMNS} FROM resources WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(resource)
}
