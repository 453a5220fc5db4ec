//! Actor identity extractor for Axum handlers.
//!
//! Authentication happens upstream. The gateway forwards the caller's
//! identity in three headers:
//!
//! | Header          | Value                          |
//! |-----------------|--------------------------------|
//! | `x-actor-id`    | numeric user id (required)     |
//! | `x-actor-role`  | `student`, `staff` or `admin`  |
//! | `x-actor-name`  | display name (optional)        |

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use campusdesk_core::actor::Actor;
use campusdesk_core::status::ActorRole;
use campusdesk_core::types::DbId;

use crate::error::AppError;
use crate::state::AppState;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";
pub const ACTOR_NAME_HEADER: &str = "x-actor-name";

/// The human behind the current request.
///
/// ```ignore
/// async fn my_handler(RequestActor(actor): RequestActor) -> AppResult<Json<()>> {
///     tracing::info!(actor = %actor.name, role = %actor.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequestActor(pub Actor);

impl FromRequestParts<AppState> for RequestActor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let headers = &parts.headers;

        let user_id: DbId = header_str(headers, ACTOR_ID_HEADER)?
            .parse()
            .map_err(|_| AppError::Unauthorized(format!("{ACTOR_ID_HEADER} must be numeric")))?;

        let role: ActorRole = header_str(headers, ACTOR_ROLE_HEADER)?
            .parse()
            .map_err(|_| {
                AppError::Unauthorized(format!(
                    "{ACTOR_ROLE_HEADER} must be one of student, staff, admin"
                ))
            })?;

        let name = headers
            .get(ACTOR_NAME_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("user {user_id}"));

        Ok(RequestActor(Actor::user(user_id, name, role)))
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AppError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Unauthorized(format!("Missing {name} header")))
}
