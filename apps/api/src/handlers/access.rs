use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use chrono::NaiveDate;
use serde::Deserialize;
use silat_core::UserIdentity;

use crate::dto::{AssignmentResponse, PermissionCheckResponse, PermissionsResponse};
use crate::error::ApiResult;
use crate::handlers::{parse_user_id, require_self_or_manager, today};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AsOfQuery {
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct PermissionCheckQuery {
    pub path: String,
    pub as_of: Option<NaiveDate>,
}

pub async fn merged_permissions_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<UserIdentity>,
    Path(user_id): Path<String>,
    Query(query): Query<AsOfQuery>,
) -> ApiResult<Json<PermissionsResponse>> {
    let user_id = parse_user_id(user_id.as_str())?;
    require_self_or_manager(&state, &actor, user_id).await?;

    let merged = state
        .access_service
        .merged_permissions(user_id, query.as_of.unwrap_or_else(today))
        .await?;

    Ok(Json(PermissionsResponse {
        permissions: merged.to_value()?,
    }))
}

pub async fn check_permission_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<UserIdentity>,
    Path(user_id): Path<String>,
    Query(query): Query<PermissionCheckQuery>,
) -> ApiResult<Json<PermissionCheckResponse>> {
    let user_id = parse_user_id(user_id.as_str())?;
    require_self_or_manager(&state, &actor, user_id).await?;

    let granted = state
        .access_service
        .has_permission(
            user_id,
            query.path.as_str(),
            query.as_of.unwrap_or_else(today),
        )
        .await?;

    Ok(Json(PermissionCheckResponse {
        path: query.path,
        granted,
    }))
}

pub async fn active_roles_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<UserIdentity>,
    Path(user_id): Path<String>,
    Query(query): Query<AsOfQuery>,
) -> ApiResult<Json<Vec<AssignmentResponse>>> {
    let user_id = parse_user_id(user_id.as_str())?;
    require_self_or_manager(&state, &actor, user_id).await?;

    let assignments = state
        .access_service
        .active_roles(user_id, query.as_of.unwrap_or_else(today))
        .await?
        .into_iter()
        .map(AssignmentResponse::from)
        .collect();

    Ok(Json(assignments))
}
