use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use silat_core::{AppError, UserId, UserIdentity};

use crate::error::ApiResult;

/// Header carrying the authenticated member id, set by the hosting gateway.
pub const USER_HEADER: &str = "x-silat-user";

/// Header carrying the member display name.
pub const NAME_HEADER: &str = "x-silat-name";

/// Header carrying the member email, when known.
pub const EMAIL_HEADER: &str = "x-silat-email";

/// Builds the caller identity from gateway-forwarded headers.
///
/// The platform gateway terminates authentication; requests reaching this
/// service without identity headers are rejected as unauthenticated.
pub async fn identity_from_gateway(mut request: Request, next: Next) -> ApiResult<Response> {
    let headers = request.headers();

    let user_id = headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;
    let user_id = uuid::Uuid::parse_str(user_id)
        .map(UserId::from_uuid)
        .map_err(|error| {
            AppError::Unauthorized(format!("invalid identity header '{USER_HEADER}': {error}"))
        })?;

    let display_name = headers
        .get(NAME_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("member")
        .to_owned();
    let email = headers
        .get(EMAIL_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let identity = UserIdentity::new(user_id, display_name, email);
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}
