//! Custom Axum extractors

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::Json;
use axum_extra::extract::CookieJar;
use chrono::Utc;
use maum_core::ValidationError;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::error::ApiError;
use crate::auth::access::student_in_class;
use crate::auth::{student, teacher, SessionError, TeacherAuthError, STUDENT_COOKIE, TEACHER_COOKIE};
use crate::db::repos::{ClassRepo, StudentSession, TeacherProfile};
use crate::state::AppState;

fn cookie_value(parts: &Parts, name: &str) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(name)
        .map(|c| c.value().to_owned())
}

/// Logged-in teacher with a profile
pub struct AuthTeacher(pub TeacherProfile);

impl FromRequestParts<Arc<AppState>> for AuthTeacher {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = cookie_value(parts, TEACHER_COOKIE);
        let profile = teacher::resolve(state.identity.as_ref(), &state.pool, token.as_deref()).await?;
        Ok(Self(profile))
    }
}

/// Student with a live session
pub struct AuthStudent(pub StudentSession);

impl FromRequestParts<Arc<AppState>> for AuthStudent {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = cookie_value(parts, STUDENT_COOKIE);
        let session = student::resolve(&state.pool, token.as_deref(), Utc::now()).await?;
        Ok(Self(session))
    }
}

/// Who may read a class board: its teacher, or one of its students
#[derive(Debug)]
pub enum ClassViewer {
    Teacher(TeacherProfile),
    Student(StudentSession),
}

impl ClassViewer {
    /// Teacher cookie first; a teacher who does not own the class falls
    /// through to the student cookie.
    pub async fn resolve(state: &AppState, jar: &CookieJar, class_id: Uuid) -> Result<Self, ApiError> {
        let teacher_token = jar.get(TEACHER_COOKIE).map(|c| c.value().to_owned());
        match teacher::resolve(state.identity.as_ref(), &state.pool, teacher_token.as_deref()).await {
            Ok(profile) => {
                if ClassRepo::new(&state.pool)
                    .owned_by(class_id, profile.id)
                    .await?
                    .is_some()
                {
                    return Ok(Self::Teacher(profile));
                }
            }
            Err(TeacherAuthError::Database(e)) => return Err(e.into()),
            Err(TeacherAuthError::Provider(e)) => {
                tracing::warn!(error = %e, "Identity provider failed; checking student session instead");
            }
            Err(e) => {
                tracing::debug!(reason = %e, "Not a teacher session; checking student session");
            }
        }

        let student_token = jar.get(STUDENT_COOKIE).map(|c| c.value().to_owned());
        let session = match student::resolve(&state.pool, student_token.as_deref(), Utc::now()).await {
            Ok(session) => session,
            Err(SessionError::Missing) | Err(SessionError::Invalid) => {
                return Err(ApiError::unauthorized("Unauthorized"))
            }
            Err(e) => return Err(e.into()),
        };

        student_in_class(&session, class_id)?;
        Ok(Self::Student(session))
    }
}

/// JSON body whose parse failures become 400 validation errors
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            let reason = match rejection {
                JsonRejection::MissingJsonContentType(_) => "expected Content-Type: application/json",
                JsonRejection::JsonSyntaxError(_) => "malformed JSON",
                JsonRejection::JsonDataError(_) => "fields have the wrong type",
                _ => "unreadable request body",
            };
            ApiError::Validation(ValidationError::InvalidFormat { field: "body", reason })
        })?;

        Ok(Self(value))
    }
}

/// Extract and validate a UUID from path
pub struct ValidUuid(pub Uuid);

impl<S> FromRequestParts<S> for ValidUuid
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Validation(ValidationError::Empty { field: "id" }))?;

        let uuid = Uuid::parse_str(&id).map_err(|_| {
            ApiError::Validation(ValidationError::InvalidFormat {
                field: "id",
                reason: "invalid UUID format",
            })
        })?;

        Ok(Self(uuid))
    }
}
