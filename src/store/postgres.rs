//! Postgres-backed credential store.
//!
//! Expected schema:
//!
//! ```sql
//! CREATE TABLE users (
//!     id              UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     name            TEXT NOT NULL UNIQUE,
//!     credential_hash BYTEA NOT NULL,
//!     profile         TEXT
//! );
//! ```
//!
//! Every query runs under a `db.query` span. Unique violations (SQLSTATE
//! 23505) are surfaced as [`StoreError::Duplicate`] so callers can translate
//! them without parsing database errors themselves.

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::{digest_credential, CredentialStore, NewUser, StoreError, UserRecord};

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn query_span(operation: &'static str, statement: &'static str) -> tracing::Span {
    tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

fn record_from_row(row: &sqlx::postgres::PgRow) -> UserRecord {
    UserRecord {
        id: row.get("id"),
        name: row.get("name"),
        profile: row.get("profile"),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn map_query_error(err: sqlx::Error, what: &'static str) -> StoreError {
    if is_unique_violation(&err) {
        StoreError::Duplicate
    } else {
        StoreError::Backend(anyhow::Error::new(err).context(what))
    }
}

#[async_trait]
impl CredentialStore for PostgresStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<UserRecord>, StoreError> {
        let query = "SELECT id, name, profile FROM users WHERE name = $1";
        let row = sqlx::query(query)
            .bind(name)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .context("failed to look up user by name")?;

        Ok(row.as_ref().map(record_from_row))
    }

    async fn find_by_name_and_credential(
        &self,
        name: &str,
        credential: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let query = "SELECT id, name, profile FROM users WHERE name = $1 AND credential_hash = $2";
        let row = sqlx::query(query)
            .bind(name)
            .bind(digest_credential(credential))
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .context("failed to look up user by name and credential")?;

        Ok(row.as_ref().map(record_from_row))
    }

    async fn insert(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let query = r"
            INSERT INTO users (name, credential_hash, profile)
            VALUES ($1, $2, $3)
            RETURNING id, name, profile
        ";
        let row = sqlx::query(query)
            .bind(&user.name)
            .bind(digest_credential(&user.credential))
            .bind(&user.profile)
            .fetch_one(&self.pool)
            .instrument(query_span("INSERT", query))
            .await
            .map_err(|err| map_query_error(err, "failed to insert user"))?;

        Ok(record_from_row(&row))
    }

    async fn update(&self, record: &UserRecord) -> Result<(), StoreError> {
        let query = "UPDATE users SET name = $1, profile = $2 WHERE id = $3";
        let result = sqlx::query(query)
            .bind(&record.name)
            .bind(&record.profile)
            .bind(record.id)
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await
            .map_err(|err| map_query_error(err, "failed to update user"))?;

        // Zero rows means the record was removed between resolve and update.
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_by_name_and_credential(
        &self,
        name: &str,
        credential: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let query = r"
            DELETE FROM users
            WHERE name = $1 AND credential_hash = $2
            RETURNING id, name, profile
        ";
        let row = sqlx::query(query)
            .bind(name)
            .bind(digest_credential(credential))
            .fetch_optional(&self.pool)
            .instrument(query_span("DELETE", query))
            .await
            .context("failed to delete user")?;

        Ok(row.as_ref().map(record_from_row))
    }
}
