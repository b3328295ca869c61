//! Repository ports consumed by the application services.

use async_trait::async_trait;
use silat_core::{AppResult, AssignmentId, RoleId, UserId};
use silat_domain::{Role, RoleAssignment};

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditAction {
    /// Emitted when a role assignment is created.
    AssignmentCreated,
    /// Emitted when a role assignment is updated.
    AssignmentUpdated,
    /// Emitted when a role assignment is soft-deleted.
    AssignmentRevoked,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AssignmentCreated => "authorization.assignment.created",
            Self::AssignmentUpdated => "authorization.assignment.updated",
            Self::AssignmentRevoked => "authorization.assignment.revoked",
        }
    }
}

/// A single audit trail entry appended by a use-case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Member on whose assignments the action was performed.
    pub user_id: UserId,
    /// Stable action identifier.
    pub action: AuditAction,
    /// Identifier of the touched assignment.
    pub assignment_id: AssignmentId,
    /// Optional human-readable detail.
    pub detail: Option<String>,
}

/// Append-only port for the audit trail.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Appends one event to the audit trail.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;
}

/// Durable storage port for role-assignment rows.
///
/// Implementations must use parameterized queries and are expected to guard
/// the no-overlap invariant with a storage-level constraint, so that the
/// optimistic application-level check stays correct under concurrent writes.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Persists a new assignment row.
    async fn insert(&self, assignment: RoleAssignment) -> AppResult<RoleAssignment>;

    /// Persists the new state of an existing row, keyed by its id.
    async fn update(&self, assignment: RoleAssignment) -> AppResult<RoleAssignment>;

    /// Marks a row inactive; succeeds when the row is already inactive.
    async fn soft_delete(&self, assignment_id: AssignmentId) -> AppResult<()>;

    /// Finds a row by id.
    async fn find(&self, assignment_id: AssignmentId) -> AppResult<Option<RoleAssignment>>;

    /// Lists every row for a member, soft-deleted rows included.
    async fn list_by_user(&self, user_id: UserId) -> AppResult<Vec<RoleAssignment>>;

    /// Lists active rows for a member/role pair, optionally excluding one id.
    async fn list_active_by_user_role(
        &self,
        user_id: UserId,
        role_id: RoleId,
        exclude: Option<AssignmentId>,
    ) -> AppResult<Vec<RoleAssignment>>;
}

/// Read port for role definitions.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Finds a role definition by id.
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>>;
}
