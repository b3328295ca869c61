//! PostgreSQL adapter for the append-only audit trail.

use async_trait::async_trait;
use sqlx::PgPool;

use silat_application::{AuditEvent, AuditRepository};
use silat_core::{AppError, AppResult};

/// PostgreSQL-backed audit appender.
#[derive(Clone)]
pub struct PostgresAuditRepository {
    pool: PgPool,
}

impl PostgresAuditRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for PostgresAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_events (user_id, action, assignment_id, detail)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(event.user_id.as_uuid())
        .bind(event.action.as_str())
        .bind(event.assignment_id.as_uuid())
        .bind(event.detail.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to append audit event: {error}")))?;

        Ok(())
    }
}
