//! In-memory assignment repository for tests and local development.

use async_trait::async_trait;
use tokio::sync::RwLock;

use silat_application::AssignmentRepository;
use silat_core::{AppError, AppResult, AssignmentId, RoleId, UserId};
use silat_domain::RoleAssignment;

/// In-memory assignment repository implementation.
///
/// Enforces the same no-overlap invariant as the PostgreSQL exclusion
/// constraint, so service-level behavior matches the production adapter.
#[derive(Debug, Default)]
pub struct InMemoryAssignmentRepository {
    rows: RwLock<Vec<RoleAssignment>>,
}

impl InMemoryAssignmentRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
        }
    }
}

fn check_overlap_invariant(
    rows: &[RoleAssignment],
    candidate: &RoleAssignment,
) -> AppResult<()> {
    if !candidate.is_active() {
        return Ok(());
    }

    let conflicting = rows.iter().any(|row| {
        row.is_active()
            && row.assignment_id() != candidate.assignment_id()
            && row.user_id() == candidate.user_id()
            && row.role_id() == candidate.role_id()
            && row.period().overlaps(&candidate.period())
    });

    if conflicting {
        return Err(AppError::Conflict(
            "requested period is overlapping an active assignment of the same role".to_owned(),
        ));
    }

    Ok(())
}

#[async_trait]
impl AssignmentRepository for InMemoryAssignmentRepository {
    async fn insert(&self, assignment: RoleAssignment) -> AppResult<RoleAssignment> {
        let mut rows = self.rows.write().await;

        if rows
            .iter()
            .any(|row| row.assignment_id() == assignment.assignment_id())
        {
            return Err(AppError::Conflict(format!(
                "assignment '{}' already exists",
                assignment.assignment_id()
            )));
        }

        check_overlap_invariant(&rows, &assignment)?;
        rows.push(assignment.clone());
        Ok(assignment)
    }

    async fn update(&self, assignment: RoleAssignment) -> AppResult<RoleAssignment> {
        let mut rows = self.rows.write().await;

        check_overlap_invariant(&rows, &assignment)?;

        let stored = rows
            .iter_mut()
            .find(|row| row.assignment_id() == assignment.assignment_id())
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "assignment '{}' does not exist",
                    assignment.assignment_id()
                ))
            })?;

        *stored = assignment.clone();
        Ok(assignment)
    }

    async fn soft_delete(&self, assignment_id: AssignmentId) -> AppResult<()> {
        let mut rows = self.rows.write().await;

        let stored = rows
            .iter_mut()
            .find(|row| row.assignment_id() == assignment_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("assignment '{assignment_id}' does not exist"))
            })?;

        stored.set_active(false);
        Ok(())
    }

    async fn find(&self, assignment_id: AssignmentId) -> AppResult<Option<RoleAssignment>> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .find(|row| row.assignment_id() == assignment_id)
            .cloned())
    }

    async fn list_by_user(&self, user_id: UserId) -> AppResult<Vec<RoleAssignment>> {
        let mut values: Vec<RoleAssignment> = self
            .rows
            .read()
            .await
            .iter()
            .filter(|row| row.user_id() == user_id)
            .cloned()
            .collect();
        values.sort_by_key(|row| (row.period().start(), row.created_at()));

        Ok(values)
    }

    async fn list_active_by_user_role(
        &self,
        user_id: UserId,
        role_id: RoleId,
        exclude: Option<AssignmentId>,
    ) -> AppResult<Vec<RoleAssignment>> {
        let mut values: Vec<RoleAssignment> = self
            .rows
            .read()
            .await
            .iter()
            .filter(|row| {
                row.is_active()
                    && row.user_id() == user_id
                    && row.role_id() == role_id
                    && Some(row.assignment_id()) != exclude
            })
            .cloned()
            .collect();
        values.sort_by_key(|row| row.period().start());

        Ok(values)
    }
}
