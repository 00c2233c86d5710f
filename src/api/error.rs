use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::clients::UpstreamError;
use crate::services::LeadError;

pub const CODE_NO_CURSOR: &str = "NO_CURSOR";
pub const CODE_PROVIDER_KEY_MISSING: &str = "PROVIDER_KEY_MISSING";
pub const CODE_CURSOR_CONFLICT: &str = "CURSOR_CONFLICT";
pub const CODE_UPSTREAM: &str = "UPSTREAM_ERROR";
pub const CODE_COST_TRACKING: &str = "COST_TRACKING_FAILED";

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    DatabaseError(String),

    /// A collaborator failed; `message` is passed through to the caller.
    ExternalApiError {
        service: String,
        code: &'static str,
        message: String,
    },

    ValidationError {
        message: String,
        details: Vec<String>,
    },

    /// A client error callers are expected to branch on.
    BadRequest {
        code: &'static str,
        message: String,
    },

    Conflict(String),

    InternalError(String),

    Unauthorized(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::ExternalApiError {
                service, message, ..
            } => {
                write!(f, "{} error: {}", service, message)
            }
            ApiError::ValidationError { message, .. } => {
                write!(f, "Validation error: {}", message)
            }
            ApiError::BadRequest { code, message } => write!(f, "{}: {}", code, message),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, code, details) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None, Vec::new()),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                    None,
                    Vec::new(),
                )
            }
            ApiError::ExternalApiError {
                service,
                code,
                message,
            } => {
                tracing::warn!("{} error: {}", service, message);
                (
                    StatusCode::BAD_GATEWAY,
                    format!("{service}: {message}"),
                    Some(code),
                    Vec::new(),
                )
            }
            ApiError::ValidationError { message, details } => {
                (StatusCode::BAD_REQUEST, message, None, details)
            }
            ApiError::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, message, Some(code), Vec::new())
            }
            ApiError::Conflict(msg) => (
                StatusCode::CONFLICT,
                msg,
                Some(CODE_CURSOR_CONFLICT),
                Vec::new(),
            ),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                    None,
                    Vec::new(),
                )
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, None, Vec::new()),
        };

        let body = ApiResponse::<()>::error(error_message)
            .with_code(code)
            .with_details(details);
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<LeadError> for ApiError {
    fn from(err: LeadError) -> Self {
        let message = err.to_string();
        match err {
            LeadError::Validation(msg) => Self::validation(msg),
            LeadError::NoCursor { .. } => Self::BadRequest {
                code: CODE_NO_CURSOR,
                message,
            },
            LeadError::ProviderKeyMissing { .. } => Self::BadRequest {
                code: CODE_PROVIDER_KEY_MISSING,
                message,
            },
            LeadError::KeyService(msg) => Self::ExternalApiError {
                service: "Key service".to_string(),
                code: CODE_UPSTREAM,
                message: msg,
            },
            LeadError::Upstream(upstream) => Self::ExternalApiError {
                service: "People API".to_string(),
                code: CODE_UPSTREAM,
                message: upstream_message(&upstream),
            },
            LeadError::Billing { operation, message } => Self::ExternalApiError {
                service: format!("Cost tracking ({operation})"),
                code: CODE_COST_TRACKING,
                message,
            },
            LeadError::CursorConflict { .. } => Self::Conflict(message),
            LeadError::NotFound(what) => Self::NotFound(format!("{what} not found")),
            LeadError::Database(msg) => Self::DatabaseError(msg),
            LeadError::Internal(msg) => Self::internal(msg),
        }
    }
}

fn upstream_message(err: &UpstreamError) -> String {
    match err {
        UpstreamError::Status { status, message } => format!("status {status}: {message}"),
        other => other.to_string(),
    }
}

impl ApiError {
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        ApiError::NotFound(format!("{} {} not found", resource, id))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError {
            message: msg.into(),
            details: Vec::new(),
        }
    }

    pub fn validation_details(details: Vec<String>) -> Self {
        ApiError::ValidationError {
            message: "Invalid request".to_string(),
            details,
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{RunOperation, RunsError};

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn no_cursor_is_a_coded_bad_request() {
        let err = ApiError::from(LeadError::NoCursor {
            campaign_id: "c1".to_string(),
        });
        assert!(matches!(
            err,
            ApiError::BadRequest {
                code: CODE_NO_CURSOR,
                ..
            }
        ));
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn upstream_status_is_embedded() {
        let err = ApiError::from(LeadError::Upstream(UpstreamError::Status {
            status: 422,
            message: "bad filter".to_string(),
        }));
        match &err {
            ApiError::ExternalApiError { message, .. } => {
                assert_eq!(message, "status 422: bad filter");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(status_of(err), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn billing_failure_names_the_step() {
        let runs = RunsError::Status {
            operation: RunOperation::AddCosts,
            status: 503,
            message: "down".to_string(),
        };
        let err = ApiError::from(LeadError::from(runs));
        match &err {
            ApiError::ExternalApiError { service, code, .. } => {
                assert_eq!(service, "Cost tracking (posting costs)");
                assert_eq!(*code, CODE_COST_TRACKING);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn conflict_and_database_statuses() {
        let conflict = ApiError::from(LeadError::CursorConflict {
            campaign_id: "c1".to_string(),
        });
        assert_eq!(status_of(conflict), StatusCode::CONFLICT);

        let db = ApiError::from(LeadError::Database("locked".to_string()));
        assert_eq!(status_of(db), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
