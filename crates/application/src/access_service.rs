//! Effective-permission computation across a member's active assignments.

use std::sync::Arc;

use chrono::NaiveDate;
use silat_core::{AppError, AppResult, UserId};
use silat_domain::{AssignmentStatus, PermissionTree, RoleAssignment};

use crate::{AssignmentRepository, RoleRepository};

/// Application service answering authorization questions for one instant.
///
/// Reads are lock-free and may observe eventually-consistent state; a
/// just-committed assignment can lag behind a concurrent read.
#[derive(Clone)]
pub struct AccessService {
    assignments: Arc<dyn AssignmentRepository>,
    roles: Arc<dyn RoleRepository>,
}

impl AccessService {
    /// Creates a new service from repository implementations.
    #[must_use]
    pub fn new(assignments: Arc<dyn AssignmentRepository>, roles: Arc<dyn RoleRepository>) -> Self {
        Self { assignments, roles }
    }

    /// Returns the assignments whose resolved status is active at `as_of`.
    pub async fn active_roles(
        &self,
        user_id: UserId,
        as_of: NaiveDate,
    ) -> AppResult<Vec<RoleAssignment>> {
        let assignments = self.assignments.list_by_user(user_id).await?;

        Ok(assignments
            .into_iter()
            .filter(|assignment| assignment.status_at(as_of) == AssignmentStatus::Active)
            .collect())
    }

    /// Computes the union of permissions granted by all roles active at `as_of`.
    ///
    /// Boolean leaves combine with OR, numeric leaves with MAX; a truthy
    /// `all_access` leaf in any contributing tree grants everything. The
    /// result is independent of assignment order. Retired role definitions
    /// contribute nothing.
    pub async fn merged_permissions(
        &self,
        user_id: UserId,
        as_of: NaiveDate,
    ) -> AppResult<PermissionTree> {
        let mut merged = PermissionTree::new();

        for assignment in self.active_roles(user_id, as_of).await? {
            let role = self
                .roles
                .find_role(assignment.role_id())
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!(
                        "role '{}' referenced by assignment '{}' does not exist",
                        assignment.role_id(),
                        assignment.assignment_id()
                    ))
                })?;

            if !role.is_active() {
                continue;
            }

            merged = merged.merge(role.permissions().clone());
            if merged.grants_all_access() {
                break;
            }
        }

        Ok(merged)
    }

    /// Tests truthiness of the merged tree at a dotted path.
    ///
    /// An absent path is `false`, never an error.
    pub async fn has_permission(
        &self,
        user_id: UserId,
        path: &str,
        as_of: NaiveDate,
    ) -> AppResult<bool> {
        let merged = self.merged_permissions(user_id, as_of).await?;
        Ok(merged.is_granted(path))
    }

    /// Ensures the member holds a permission at `as_of`.
    pub async fn require_permission(
        &self,
        user_id: UserId,
        path: &str,
        as_of: NaiveDate,
    ) -> AppResult<()> {
        if self.has_permission(user_id, path, as_of).await? {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "member '{user_id}' is missing permission '{path}'"
        )))
    }
}
