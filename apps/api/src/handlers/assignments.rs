use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use chrono::NaiveDate;
use serde::Deserialize;
use silat_application::{AssignmentUpdate, NewAssignment};
use silat_core::{AppError, AssignmentId, UserIdentity};
use silat_domain::{AssignmentDates, HijriDate};

use crate::dto::{
    AssignmentResponse, AssignmentWithStatusResponse, CreateAssignmentRequest,
    UpdateAssignmentRequest,
};
use crate::error::ApiResult;
use crate::handlers::{
    MANAGE_ASSIGNMENTS_PERMISSION, parse_role_id, parse_user_id, require_self_or_manager, today,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AsOfQuery {
    pub as_of: Option<NaiveDate>,
}

fn parse_hijri(value: Option<&str>) -> ApiResult<Option<HijriDate>> {
    Ok(value.map(HijriDate::from_str).transpose()?)
}

fn parse_assignment_id(value: &str) -> ApiResult<AssignmentId> {
    uuid::Uuid::parse_str(value)
        .map(AssignmentId::from_uuid)
        .map_err(|error| {
            AppError::Validation(format!("invalid assignment id '{value}': {error}")).into()
        })
}

async fn require_manager(state: &AppState, actor: &UserIdentity) -> ApiResult<()> {
    state
        .access_service
        .require_permission(actor.user_id(), MANAGE_ASSIGNMENTS_PERMISSION, today())
        .await?;
    Ok(())
}

pub async fn create_assignment_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<UserIdentity>,
    Json(payload): Json<CreateAssignmentRequest>,
) -> ApiResult<(StatusCode, Json<AssignmentResponse>)> {
    require_manager(&state, &actor).await?;

    let dates = AssignmentDates {
        start_gregorian: payload.start_date_gregorian,
        end_gregorian: payload.end_date_gregorian,
        start_hijri: parse_hijri(payload.start_date_hijri.as_deref())?,
        end_hijri: parse_hijri(payload.end_date_hijri.as_deref())?,
    };

    let stored = state
        .assignment_service
        .assign(NewAssignment {
            user_id: parse_user_id(payload.user_id.as_str())?,
            role_id: parse_role_id(payload.role_id.as_str())?,
            dates,
            notes: payload.notes,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(AssignmentResponse::from(stored))))
}

pub async fn update_assignment_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<UserIdentity>,
    Path(assignment_id): Path<String>,
    Json(payload): Json<UpdateAssignmentRequest>,
) -> ApiResult<Json<AssignmentResponse>> {
    require_manager(&state, &actor).await?;

    let dates = if payload.has_dates() {
        Some(AssignmentDates {
            start_gregorian: payload.start_date_gregorian,
            end_gregorian: payload.end_date_gregorian,
            start_hijri: parse_hijri(payload.start_date_hijri.as_deref())?,
            end_hijri: parse_hijri(payload.end_date_hijri.as_deref())?,
        })
    } else {
        None
    };

    let stored = state
        .assignment_service
        .update(
            parse_assignment_id(assignment_id.as_str())?,
            AssignmentUpdate {
                dates,
                notes: payload.notes,
                is_active: payload.is_active,
            },
        )
        .await?;

    Ok(Json(AssignmentResponse::from(stored)))
}

pub async fn delete_assignment_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<UserIdentity>,
    Path(assignment_id): Path<String>,
) -> ApiResult<StatusCode> {
    require_manager(&state, &actor).await?;

    state
        .assignment_service
        .soft_delete(parse_assignment_id(assignment_id.as_str())?)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_user_assignments_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<UserIdentity>,
    Path(user_id): Path<String>,
    Query(query): Query<AsOfQuery>,
) -> ApiResult<Json<Vec<AssignmentWithStatusResponse>>> {
    let user_id = parse_user_id(user_id.as_str())?;
    require_self_or_manager(&state, &actor, user_id).await?;

    let assignments = state
        .assignment_service
        .list_for_user(user_id, query.as_of.unwrap_or_else(today))
        .await?
        .into_iter()
        .map(AssignmentWithStatusResponse::from)
        .collect();

    Ok(Json(assignments))
}
