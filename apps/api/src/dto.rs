use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use silat_application::AssignmentWithStatus;
use silat_domain::RoleAssignment;
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Incoming payload for assignment creation.
///
/// Dates may arrive in either calendar or both; Hijri values use the
/// `YYYY-MM-DD` (AH) wire format and are validated before use.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-assignment-request.ts"
)]
pub struct CreateAssignmentRequest {
    pub user_id: String,
    pub role_id: String,
    #[ts(type = "string | null")]
    pub start_date_gregorian: Option<NaiveDate>,
    #[ts(type = "string | null")]
    pub end_date_gregorian: Option<NaiveDate>,
    pub start_date_hijri: Option<String>,
    pub end_date_hijri: Option<String>,
    pub notes: Option<String>,
}

/// Incoming payload for partial assignment updates.
///
/// When any date field is present, the submitted fields replace the whole
/// period and are re-validated as if newly created.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-assignment-request.ts"
)]
pub struct UpdateAssignmentRequest {
    #[ts(type = "string | null")]
    pub start_date_gregorian: Option<NaiveDate>,
    #[ts(type = "string | null")]
    pub end_date_gregorian: Option<NaiveDate>,
    pub start_date_hijri: Option<String>,
    pub end_date_hijri: Option<String>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateAssignmentRequest {
    /// Returns whether any date field was submitted.
    pub fn has_dates(&self) -> bool {
        self.start_date_gregorian.is_some()
            || self.end_date_gregorian.is_some()
            || self.start_date_hijri.is_some()
            || self.end_date_hijri.is_some()
    }
}

/// API representation of an assignment row.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/assignment-response.ts"
)]
pub struct AssignmentResponse {
    pub id: String,
    pub user_id: String,
    pub role_id: String,
    pub start_date_gregorian: String,
    pub end_date_gregorian: Option<String>,
    pub start_date_hijri: String,
    pub end_date_hijri: Option<String>,
    /// Arabic rendering of the Hijri start date for the dashboard.
    pub start_date_hijri_display: String,
    pub end_date_hijri_display: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<RoleAssignment> for AssignmentResponse {
    fn from(value: RoleAssignment) -> Self {
        Self {
            id: value.assignment_id().to_string(),
            user_id: value.user_id().to_string(),
            role_id: value.role_id().to_string(),
            start_date_gregorian: value.period().start().to_string(),
            end_date_gregorian: value.period().end().map(|date| date.to_string()),
            start_date_hijri: value.start_hijri().to_string(),
            end_date_hijri: value.end_hijri().map(|date| date.to_string()),
            start_date_hijri_display: value.start_hijri().format_arabic(),
            end_date_hijri_display: value.end_hijri().map(|date| date.format_arabic()),
            notes: value.notes().map(str::to_owned),
            is_active: value.is_active(),
            created_at: value.created_at().to_rfc3339(),
            updated_at: value.updated_at().to_rfc3339(),
        }
    }
}

/// An assignment annotated with its resolved status.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/assignment-with-status-response.ts"
)]
pub struct AssignmentWithStatusResponse {
    pub assignment: AssignmentResponse,
    pub status: String,
}

impl From<AssignmentWithStatus> for AssignmentWithStatusResponse {
    fn from(value: AssignmentWithStatus) -> Self {
        Self {
            status: value.status.as_str().to_owned(),
            assignment: AssignmentResponse::from(value.assignment),
        }
    }
}

/// Merged permission tree for one member at one instant.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permissions-response.ts"
)]
pub struct PermissionsResponse {
    #[ts(type = "Record<string, unknown>")]
    pub permissions: serde_json::Value,
}

/// Result of a single permission check.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-check-response.ts"
)]
pub struct PermissionCheckResponse {
    pub path: String,
    pub granted: bool,
}
