//! Administration of role assignments: assign, update, soft-delete, list.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use silat_core::{AppError, AppResult, AssignmentId, RoleId, UserId};
use silat_domain::{AssignmentDates, AssignmentStatus, RoleAssignment};

use crate::{
    AssignmentRepository, AuditAction, AuditEvent, AuditRepository, ConflictDetector,
    RoleRepository,
};

/// Input payload for creating an assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAssignment {
    /// Member receiving the role.
    pub user_id: UserId,
    /// Role being granted.
    pub role_id: RoleId,
    /// Validity period in one or both calendars.
    pub dates: AssignmentDates,
    /// Optional free-form notes.
    pub notes: Option<String>,
}

/// Partial update applied to an existing assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentUpdate {
    /// Replacement validity period, re-validated like a new assignment.
    pub dates: Option<AssignmentDates>,
    /// Replacement notes.
    pub notes: Option<String>,
    /// New soft-delete flag; setting `true` re-runs conflict detection.
    pub is_active: Option<bool>,
}

/// An assignment annotated with its status at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentWithStatus {
    /// The stored assignment row.
    pub assignment: RoleAssignment,
    /// Status resolved at the requested as-of date.
    pub status: AssignmentStatus,
}

/// Application service orchestrating the assignment lifecycle.
///
/// The conflict check here is an optimistic fast-fail; the storage layer
/// carries an exclusion constraint enforcing the same invariant atomically
/// under concurrent writes.
#[derive(Clone)]
pub struct AssignmentService {
    repository: Arc<dyn AssignmentRepository>,
    roles: Arc<dyn RoleRepository>,
    conflicts: Arc<dyn ConflictDetector>,
    audit: Arc<dyn AuditRepository>,
}

impl AssignmentService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        repository: Arc<dyn AssignmentRepository>,
        roles: Arc<dyn RoleRepository>,
        conflicts: Arc<dyn ConflictDetector>,
        audit: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            repository,
            roles,
            conflicts,
            audit,
        }
    }

    /// Creates a new assignment after validation and overlap detection.
    pub async fn assign(&self, input: NewAssignment) -> AppResult<RoleAssignment> {
        let role = self
            .roles
            .find_role(input.role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{}' does not exist", input.role_id)))?;

        if !role.is_active() {
            return Err(AppError::Validation(format!(
                "role '{}' has been retired and cannot be assigned",
                role.name().as_str()
            )));
        }

        let resolved = input.dates.resolve()?;
        let conflicts = self
            .conflicts
            .find_conflicts(input.user_id, input.role_id, resolved.period(), None)
            .await?;
        if !conflicts.is_empty() {
            return Err(overlap_error(&conflicts));
        }

        let assignment = RoleAssignment::new(input.user_id, input.role_id, resolved, input.notes);
        let stored = self.repository.insert(assignment).await?;

        self.audit
            .append_event(AuditEvent {
                user_id: stored.user_id(),
                action: AuditAction::AssignmentCreated,
                assignment_id: stored.assignment_id(),
                detail: Some(format!(
                    "assigned role '{}' from '{}'",
                    stored.role_id(),
                    stored.period().start()
                )),
            })
            .await?;

        Ok(stored)
    }

    /// Applies a partial update, re-validating as if newly created.
    ///
    /// Conflict detection runs again, excluding the row's own id, whenever
    /// the dates change or the row is being reactivated.
    pub async fn update(
        &self,
        assignment_id: AssignmentId,
        update: AssignmentUpdate,
    ) -> AppResult<RoleAssignment> {
        let mut assignment = self
            .repository
            .find(assignment_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("assignment '{assignment_id}' does not exist"))
            })?;

        let dates_changed = update.dates.is_some();
        if let Some(dates) = update.dates {
            assignment.set_period(dates.resolve()?);
        }

        if let Some(notes) = update.notes {
            assignment.set_notes(Some(notes));
        }

        let reactivating = update.is_active == Some(true);
        if let Some(is_active) = update.is_active {
            assignment.set_active(is_active);
        }

        if dates_changed || reactivating {
            let conflicts = self
                .conflicts
                .find_conflicts(
                    assignment.user_id(),
                    assignment.role_id(),
                    assignment.period(),
                    Some(assignment_id),
                )
                .await?;
            if !conflicts.is_empty() {
                return Err(overlap_error(&conflicts));
            }
        }

        assignment.touch(Utc::now());
        let stored = self.repository.update(assignment).await?;

        self.audit
            .append_event(AuditEvent {
                user_id: stored.user_id(),
                action: AuditAction::AssignmentUpdated,
                assignment_id: stored.assignment_id(),
                detail: None,
            })
            .await?;

        Ok(stored)
    }

    /// Marks an assignment inactive.
    ///
    /// Idempotent on existing ids; unknown ids fail with `NotFound`.
    /// Reactivation requires either a fresh `assign` or an `update` that
    /// passes conflict detection again.
    pub async fn soft_delete(&self, assignment_id: AssignmentId) -> AppResult<()> {
        let assignment = self
            .repository
            .find(assignment_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("assignment '{assignment_id}' does not exist"))
            })?;

        self.repository.soft_delete(assignment_id).await?;

        self.audit
            .append_event(AuditEvent {
                user_id: assignment.user_id(),
                action: AuditAction::AssignmentRevoked,
                assignment_id,
                detail: None,
            })
            .await
    }

    /// Lists every assignment of a member, annotated with its status.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        as_of: NaiveDate,
    ) -> AppResult<Vec<AssignmentWithStatus>> {
        let assignments = self.repository.list_by_user(user_id).await?;

        Ok(assignments
            .into_iter()
            .map(|assignment| {
                let status = assignment.status_at(as_of);
                AssignmentWithStatus { assignment, status }
            })
            .collect())
    }
}

fn overlap_error(conflicts: &[AssignmentId]) -> AppError {
    let ids = conflicts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("', '");

    AppError::Conflict(format!(
        "requested period is overlapping active assignment(s) '{ids}'"
    ))
}
