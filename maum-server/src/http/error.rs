//! API error types with IntoResponse
//!
//! Every failure leaves the server as `{"error": <code>, "message": <text>}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::CookieJar;
use maum_core::ValidationError;
use serde_json::json;

use crate::auth::cookies::{removal_cookie, STUDENT_COOKIE};
use crate::auth::{AuthError, Denied, SessionError, TeacherAuthError};
use crate::db::repos::DbError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Per-student quota reached (400)
    LimitExceeded { message: String },

    /// No or unusable credentials (401)
    Unauthorized { message: String },

    /// Student session past its expiry (401, clears the cookie)
    SessionExpired,

    /// Authenticated but not allowed (403)
    Forbidden { reason: String },

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Uniqueness or ambiguity conflict (409)
    Conflict { message: String },

    /// Identity provider refused the request (400 or 401)
    Provider { status: StatusCode, message: String },

    /// Database error (500, logged)
    Database(DbError),

    /// Internal error (500, logged)
    Internal { message: String },
}

impl ApiError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Map a provider failure. Refusals get `status`; transport and
    /// protocol failures are internal.
    pub fn from_provider(e: AuthError, status: StatusCode) -> Self {
        match e {
            AuthError::Rejected(message) => Self::Provider { status, message },
            other => Self::Internal {
                message: other.to_string(),
            },
        }
    }
}

fn body(code: &str, message: impl Into<String>) -> serde_json::Value {
    json!({
        "error": code,
        "message": message.into()
    })
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Validation(e) => (StatusCode::BAD_REQUEST, body("validation_error", e.to_string())),
            Self::LimitExceeded { message } => (StatusCode::BAD_REQUEST, body("limit_exceeded", message)),
            Self::Unauthorized { message } => (StatusCode::UNAUTHORIZED, body("unauthorized", message)),
            Self::SessionExpired => {
                let jar = CookieJar::new().add(removal_cookie(STUDENT_COOKIE));
                return (
                    StatusCode::UNAUTHORIZED,
                    jar,
                    Json(body("unauthorized", "Session expired")),
                )
                    .into_response();
            }
            Self::Forbidden { reason } => (StatusCode::FORBIDDEN, body("forbidden", reason)),
            Self::NotFound { resource, id } => (
                StatusCode::NOT_FOUND,
                body("not_found", format!("{} '{}' not found", resource, id)),
            ),
            Self::Conflict { message } => (StatusCode::CONFLICT, body("conflict", message)),
            Self::Provider { status, message } => {
                tracing::warn!(%status, "Identity provider refused request: {}", message);
                (status, body("auth_error", message))
            }
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    body("internal_error", "an internal error occurred"),
                )
            }
            Self::Internal { message } => {
                tracing::error!("Internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    body("internal_error", "an internal error occurred"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            DbError::Conflict(message) => Self::Conflict { message },
            DbError::LimitExceeded { resource, limit } => Self::LimitExceeded {
                message: format!("at most {} {} allowed", limit, resource),
            },
            _ => Self::Database(e),
        }
    }
}

impl From<Denied> for ApiError {
    fn from(e: Denied) -> Self {
        Self::forbidden(e.to_string())
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Expired => Self::SessionExpired,
            SessionError::Database(e) => e.into(),
            other => Self::unauthorized(other.to_string()),
        }
    }
}

impl From<TeacherAuthError> for ApiError {
    fn from(e: TeacherAuthError) -> Self {
        match e {
            TeacherAuthError::Unauthenticated => Self::unauthorized("Unauthorized"),
            TeacherAuthError::NoProfile => Self::forbidden("Teacher profile not found"),
            TeacherAuthError::Provider(e) => Self::from_provider(e, StatusCode::UNAUTHORIZED),
            TeacherAuthError::Database(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::header::SET_COOKIE;

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_error_is_400() {
        let err = ApiError::Validation(ValidationError::Empty { field: "name" });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["message"], "name cannot be empty");
    }

    #[tokio::test]
    async fn limit_is_400_with_own_code() {
        let err: ApiError = DbError::LimitExceeded {
            resource: "active plans",
            limit: 5,
        }
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "limit_exceeded");
    }

    #[tokio::test]
    async fn conflict_is_409() {
        let err: ApiError = DbError::Conflict("students_class_id_student_number_key".into()).into();
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn not_found_is_404() {
        let err = ApiError::NotFound {
            resource: "feed",
            id: "test".into(),
        };
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn denied_access_is_403() {
        let err: ApiError = Denied::Class.into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = json_body(response).await;
        assert_eq!(body["error"], "forbidden");
        assert_eq!(body["message"], "You do not have access to this class");
    }

    #[tokio::test]
    async fn forbidden_is_403() {
        let err: ApiError = TeacherAuthError::NoProfile.into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(response).await["message"], "Teacher profile not found");
    }

    #[tokio::test]
    async fn expired_session_clears_cookie() {
        let err: ApiError = SessionError::Expired.into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let cookie = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_owned();
        assert!(cookie.starts_with("maum_student_session="));
        assert!(cookie.contains("Max-Age=0"));
        assert_eq!(json_body(response).await["message"], "Session expired");
    }

    #[tokio::test]
    async fn missing_session_is_401() {
        let err: ApiError = SessionError::Missing.into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["message"], "Student session required");
    }

    #[tokio::test]
    async fn provider_rejection_keeps_status_and_message() {
        let err = ApiError::from_provider(
            AuthError::Rejected("Invalid login credentials".into()),
            StatusCode::UNAUTHORIZED,
        );
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["error"], "auth_error");
        assert_eq!(body["message"], "Invalid login credentials");
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let err = ApiError::from_provider(
            AuthError::Protocol("502 Bad Gateway: upstream".into()),
            StatusCode::BAD_REQUEST,
        );
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["message"], "an internal error occurred");
    }
}
