//! PostgreSQL adapter for role-definition lookups.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use silat_application::RoleRepository;
use silat_core::{AppError, AppResult, RoleId};
use silat_domain::{PermissionTree, Role};

/// PostgreSQL-backed read adapter for role definitions.
///
/// Role CRUD itself lives in the platform console; the engine only reads.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: uuid::Uuid,
    name: String,
    permissions: serde_json::Value,
    is_active: bool,
}

impl RoleRow {
    fn into_domain(self) -> AppResult<Role> {
        let permissions = PermissionTree::from_value(self.permissions).map_err(|error| {
            AppError::Internal(format!(
                "stored role '{}' has a corrupt permission tree: {error}",
                self.id
            ))
        })?;

        Role::new(
            RoleId::from_uuid(self.id),
            self.name,
            permissions,
            self.is_active,
        )
    }
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name, permissions, is_active
            FROM roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load role '{role_id}': {error}"))
        })?;

        row.map(RoleRow::into_domain).transpose()
    }
}
