//! PostgreSQL adapter for the assignment store port.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};

use silat_application::AssignmentRepository;
use silat_core::{AppError, AppResult, AssignmentId, RoleId, UserId};
use silat_domain::{AssignmentPeriod, HijriDate, RoleAssignment};

/// SQLSTATE raised by the `role_assignments_no_overlap` exclusion constraint.
const EXCLUSION_VIOLATION: &str = "23P01";

/// PostgreSQL-backed repository for role-assignment rows.
///
/// The schema carries an exclusion constraint over (user_id, role_id,
/// daterange) for active rows, so overlapping writes that slip past the
/// optimistic application check still fail atomically here.
#[derive(Clone)]
pub struct PostgresAssignmentRepository {
    pool: PgPool,
}

impl PostgresAssignmentRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AssignmentRow {
    id: uuid::Uuid,
    user_id: uuid::Uuid,
    role_id: uuid::Uuid,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    start_date_hijri: String,
    end_date_hijri: Option<String>,
    notes: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AssignmentRow {
    fn into_domain(self) -> AppResult<RoleAssignment> {
        let period = AssignmentPeriod::new(self.start_date, self.end_date).map_err(|error| {
            AppError::Internal(format!(
                "stored assignment '{}' has a corrupt period: {error}",
                self.id
            ))
        })?;

        let start_hijri = parse_stored_hijri(self.id, self.start_date_hijri.as_str())?;
        let end_hijri = self
            .end_date_hijri
            .as_deref()
            .map(|value| parse_stored_hijri(self.id, value))
            .transpose()?;

        Ok(RoleAssignment::from_storage(
            AssignmentId::from_uuid(self.id),
            UserId::from_uuid(self.user_id),
            RoleId::from_uuid(self.role_id),
            period,
            start_hijri,
            end_hijri,
            self.notes,
            self.is_active,
            self.created_at,
            self.updated_at,
        ))
    }
}

fn parse_stored_hijri(id: uuid::Uuid, value: &str) -> AppResult<HijriDate> {
    value.parse().map_err(|error| {
        AppError::Internal(format!(
            "stored assignment '{id}' has a corrupt hijri date '{value}': {error}"
        ))
    })
}

fn map_overlap_conflict(error: sqlx::Error, context: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some(EXCLUSION_VIOLATION)
    {
        return AppError::Conflict(
            "requested period is overlapping an active assignment of the same role".to_owned(),
        );
    }

    AppError::Internal(format!("{context}: {error}"))
}

#[async_trait]
impl AssignmentRepository for PostgresAssignmentRepository {
    async fn insert(&self, assignment: RoleAssignment) -> AppResult<RoleAssignment> {
        let row = sqlx::query_as::<_, AssignmentRow>(
            r#"
            INSERT INTO role_assignments (
                id, user_id, role_id,
                start_date, end_date, start_date_hijri, end_date_hijri,
                notes, is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING
                id, user_id, role_id,
                start_date, end_date, start_date_hijri, end_date_hijri,
                notes, is_active, created_at, updated_at
            "#,
        )
        .bind(assignment.assignment_id().as_uuid())
        .bind(assignment.user_id().as_uuid())
        .bind(assignment.role_id().as_uuid())
        .bind(assignment.period().start())
        .bind(assignment.period().end())
        .bind(assignment.start_hijri().to_string())
        .bind(assignment.end_hijri().map(|value| value.to_string()))
        .bind(assignment.notes())
        .bind(assignment.is_active())
        .bind(assignment.created_at())
        .bind(assignment.updated_at())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| map_overlap_conflict(error, "failed to insert assignment"))?;

        row.into_domain()
    }

    async fn update(&self, assignment: RoleAssignment) -> AppResult<RoleAssignment> {
        let row = sqlx::query_as::<_, AssignmentRow>(
            r#"
            UPDATE role_assignments
            SET
                start_date = $2,
                end_date = $3,
                start_date_hijri = $4,
                end_date_hijri = $5,
                notes = $6,
                is_active = $7,
                updated_at = $8
            WHERE id = $1
            RETURNING
                id, user_id, role_id,
                start_date, end_date, start_date_hijri, end_date_hijri,
                notes, is_active, created_at, updated_at
            "#,
        )
        .bind(assignment.assignment_id().as_uuid())
        .bind(assignment.period().start())
        .bind(assignment.period().end())
        .bind(assignment.start_hijri().to_string())
        .bind(assignment.end_hijri().map(|value| value.to_string()))
        .bind(assignment.notes())
        .bind(assignment.is_active())
        .bind(assignment.updated_at())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_overlap_conflict(error, "failed to update assignment"))?;

        row.ok_or_else(|| {
            AppError::NotFound(format!(
                "assignment '{}' does not exist",
                assignment.assignment_id()
            ))
        })?
        .into_domain()
    }

    async fn soft_delete(&self, assignment_id: AssignmentId) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE role_assignments
            SET is_active = false, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(assignment_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to soft-delete assignment '{assignment_id}': {error}"
            ))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "assignment '{assignment_id}' does not exist"
            )));
        }

        tracing::debug!(%assignment_id, "assignment soft-deleted");
        Ok(())
    }

    async fn find(&self, assignment_id: AssignmentId) -> AppResult<Option<RoleAssignment>> {
        let row = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT
                id, user_id, role_id,
                start_date, end_date, start_date_hijri, end_date_hijri,
                notes, is_active, created_at, updated_at
            FROM role_assignments
            WHERE id = $1
            "#,
        )
        .bind(assignment_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load assignment '{assignment_id}': {error}"
            ))
        })?;

        row.map(AssignmentRow::into_domain).transpose()
    }

    async fn list_by_user(&self, user_id: UserId) -> AppResult<Vec<RoleAssignment>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT
                id, user_id, role_id,
                start_date, end_date, start_date_hijri, end_date_hijri,
                notes, is_active, created_at, updated_at
            FROM role_assignments
            WHERE user_id = $1
            ORDER BY start_date, created_at
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list assignments for member '{user_id}': {error}"
            ))
        })?;

        rows.into_iter().map(AssignmentRow::into_domain).collect()
    }

    async fn list_active_by_user_role(
        &self,
        user_id: UserId,
        role_id: RoleId,
        exclude: Option<AssignmentId>,
    ) -> AppResult<Vec<RoleAssignment>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT
                id, user_id, role_id,
                start_date, end_date, start_date_hijri, end_date_hijri,
                notes, is_active, created_at, updated_at
            FROM role_assignments
            WHERE user_id = $1
              AND role_id = $2
              AND is_active
              AND ($3::uuid IS NULL OR id <> $3)
            ORDER BY start_date
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(role_id.as_uuid())
        .bind(exclude.map(|value| value.as_uuid()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list active assignments for member '{user_id}': {error}"
            ))
        })?;

        rows.into_iter().map(AssignmentRow::into_domain).collect()
    }
}
