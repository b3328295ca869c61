//! Role definitions held by association members.

use serde::{Deserialize, Serialize};
use silat_core::{AppResult, NonEmptyString, RoleId};

use crate::PermissionTree;

/// A named bundle of permissions granted to members through assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    role_id: RoleId,
    name: NonEmptyString,
    permissions: PermissionTree,
    is_active: bool,
}

impl Role {
    /// Creates a role definition with validated fields.
    pub fn new(
        role_id: RoleId,
        name: impl Into<String>,
        permissions: PermissionTree,
        is_active: bool,
    ) -> AppResult<Self> {
        Ok(Self {
            role_id,
            name: NonEmptyString::new(name)?,
            permissions,
            is_active,
        })
    }

    /// Returns the stable role identifier.
    #[must_use]
    pub fn role_id(&self) -> RoleId {
        self.role_id
    }

    /// Returns the role name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the permission tree granted by this role.
    #[must_use]
    pub fn permissions(&self) -> &PermissionTree {
        &self.permissions
    }

    /// Returns whether the role definition is still in service.
    ///
    /// A retired definition stops contributing permissions without touching
    /// the assignments that reference it.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }
}

#[cfg(test)]
mod tests {
    use silat_core::RoleId;

    use super::Role;
    use crate::PermissionTree;

    #[test]
    fn rejects_blank_names() {
        let role = Role::new(RoleId::new(), "  ", PermissionTree::new(), true);
        assert!(role.is_err());
    }
}
