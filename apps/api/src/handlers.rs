pub mod access;
pub mod assignments;
pub mod health;

use chrono::{NaiveDate, Utc};
use silat_core::{AppError, RoleId, UserId, UserIdentity};

use crate::error::ApiResult;
use crate::state::AppState;

/// Permission required to manage assignments of other members.
pub(crate) const MANAGE_ASSIGNMENTS_PERMISSION: &str = "assignments.manage";

pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub(crate) fn parse_user_id(value: &str) -> ApiResult<UserId> {
    uuid::Uuid::parse_str(value)
        .map(UserId::from_uuid)
        .map_err(|error| AppError::Validation(format!("invalid user id '{value}': {error}")).into())
}

pub(crate) fn parse_role_id(value: &str) -> ApiResult<RoleId> {
    uuid::Uuid::parse_str(value)
        .map(RoleId::from_uuid)
        .map_err(|error| AppError::Validation(format!("invalid role id '{value}': {error}")).into())
}

/// Allows a member to read their own data; anyone else needs the manage
/// permission. Caller-privilege policy lives here, not in the engine.
pub(crate) async fn require_self_or_manager(
    state: &AppState,
    actor: &UserIdentity,
    user_id: UserId,
) -> ApiResult<()> {
    if actor.user_id() == user_id {
        return Ok(());
    }

    state
        .access_service
        .require_permission(actor.user_id(), MANAGE_ASSIGNMENTS_PERMISSION, today())
        .await?;
    Ok(())
}
