//! # Sub-Admin Repository
//!
//! Storage for dispatch operator accounts. Usernames are unique ignoring case.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tilestock_core::{NewSubAdmin, SubAdmin, SubAdminPatch};

const COLUMNS: &str = "id, username, pass_key, display_name, is_active, created_by, created_at";

#[derive(Debug, Clone)]
pub struct SubAdminRepository {
    pool: SqlitePool,
}

impl SubAdminRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SubAdminRepository { pool }
    }

    /// Inserts a new, active account.
    ///
    /// ## When This Fails
    /// `DbError::UniqueViolation` when the username is taken (any case).
    pub async fn insert(&self, input: &NewSubAdmin, created_by: &str) -> DbResult<SubAdmin> {
        let account = SubAdmin {
            id: Uuid::new_v4().to_string(),
            username: input.username.trim().to_string(),
            pass_key: input.pass_key.clone(),
            display_name: input.display_name.trim().to_string(),
            is_active: true,
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        };

        debug!(username = %account.username, "Inserting sub admin");

        let result = sqlx::query(
            r#"
            INSERT INTO sub_admins (
                id, username, pass_key, display_name, is_active, created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&account.id)
        .bind(&account.username)
        .bind(&account.pass_key)
        .bind(&account.display_name)
        .bind(account.is_active)
        .bind(&account.created_by)
        .bind(account.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(account),
            Err(e) => match DbError::from(e) {
                DbError::UniqueViolation { field, .. } => Err(DbError::UniqueViolation {
                    field,
                    value: account.username,
                }),
                other => Err(other),
            },
        }
    }

    /// Looks an account up by username, ignoring case.
    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<SubAdmin>> {
        let sql = format!(
            "SELECT {} FROM sub_admins WHERE username = ?1 COLLATE NOCASE",
            COLUMNS
        );
        let account = sqlx::query_as::<_, SubAdmin>(&sql)
            .bind(username.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    /// Newest first.
    pub async fn list(&self) -> DbResult<Vec<SubAdmin>> {
        let sql = format!(
            "SELECT {} FROM sub_admins ORDER BY created_at DESC, rowid DESC",
            COLUMNS
        );
        let accounts = sqlx::query_as::<_, SubAdmin>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(accounts)
    }

    /// Applies the fields a patch sets. `Ok(None)` when the account is absent.
    pub async fn update(&self, id: &str, patch: &SubAdminPatch) -> DbResult<Option<SubAdmin>> {
        let sql = format!(
            r#"
            UPDATE sub_admins SET
                display_name = COALESCE(?1, display_name),
                pass_key     = COALESCE(?2, pass_key),
                is_active    = COALESCE(?3, is_active)
            WHERE id = ?4
            RETURNING {}
            "#,
            COLUMNS
        );
        let account = sqlx::query_as::<_, SubAdmin>(&sql)
            .bind(patch.display_name.as_deref().map(str::trim))
            .bind(&patch.pass_key)
            .bind(patch.is_active)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    /// Returns whether a row was deleted. Past exports keep the username.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM sub_admins WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
