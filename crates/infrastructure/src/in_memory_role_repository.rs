//! In-memory role repository for tests and local development.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use silat_application::RoleRepository;
use silat_core::{AppResult, RoleId};
use silat_domain::Role;

/// In-memory role repository implementation.
#[derive(Debug, Default)]
pub struct InMemoryRoleRepository {
    roles: RwLock<HashMap<RoleId, Role>>,
}

impl InMemoryRoleRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            roles: RwLock::new(HashMap::new()),
        }
    }

    /// Stores or replaces a role definition.
    ///
    /// Role CRUD belongs to the platform console; this helper only exists to
    /// seed local runs and tests.
    pub async fn put_role(&self, role: Role) {
        self.roles.write().await.insert(role.role_id(), role);
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self.roles.read().await.get(&role_id).cloned())
    }
}
