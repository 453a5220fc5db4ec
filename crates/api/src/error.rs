use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use campusdesk_core::error::CoreError;
use campusdesk_core::status::TicketStatus;
use serde_json::{json, Value};

/// Application-level error type for HTTP handlers.
///
/// Wraps domain errors from `campusdesk-core` and adds HTTP-specific
/// variants. Implements [`IntoResponse`] to produce consistent JSON error
/// bodies.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A rejected status change, remembered together with the status the
    /// caller asked for.
    #[error("{source}")]
    TransitionRejected {
        source: CoreError,
        requested: TicketStatus,
    },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    /// Attach the requested status to transition rejections so the response
    /// can report both sides. Other errors pass through unchanged.
    pub fn transition(error: CoreError, requested: TicketStatus) -> Self {
        match error {
            CoreError::InvalidTransition { .. } | CoreError::TerminalStateViolation { .. } => {
                AppError::TransitionRejected {
                    source: error,
                    requested,
                }
            }
            other => AppError::Core(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) | AppError::TransitionRejected { source: core, .. } => {
                classify_core_error(core)
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let mut body = json!({ "error": message, "code": code });
        match &self {
            AppError::Core(core) => annotate(&mut body, core, None),
            AppError::TransitionRejected { source, requested } => {
                annotate(&mut body, source, Some(*requested))
            }
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}

/// Map a [`CoreError`] variant to an HTTP status, error code and message.
fn classify_core_error(err: &CoreError) -> (StatusCode, &'static str, String) {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
        CoreError::InvalidTransition { .. } => {
            (StatusCode::CONFLICT, "INVALID_TRANSITION", err.to_string())
        }
        CoreError::TerminalStateViolation { .. } => {
            (StatusCode::CONFLICT, "TERMINAL_STATE", err.to_string())
        }
        CoreError::InvalidSlaConfiguration { .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "INVALID_SLA_CONFIGURATION",
            err.to_string(),
        ),
        CoreError::RepositoryUnavailable(detail) => {
            tracing::warn!(error = %detail, "Ticket storage unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "REPOSITORY_UNAVAILABLE",
                "Ticket storage is temporarily unavailable".to_string(),
            )
        }
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

fn annotate(body: &mut Value, err: &CoreError, requested: Option<TicketStatus>) {
    match err {
        CoreError::InvalidTransition { from, to } => {
            body["current_status"] = json!(from);
            body["requested_status"] = json!(to);
        }
        CoreError::TerminalStateViolation { status } => {
            body["current_status"] = json!(status);
            if let Some(requested) = requested {
                body["requested_status"] = json!(requested);
            }
        }
        CoreError::RepositoryUnavailable(_) => {
            body["retryable"] = json!(true);
        }
        _ => {}
    }
}

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;
