//! Login, logout and "who am I" for teachers and students

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use axum_extra::extract::cookie::Cookie;
use axum_extra::extract::CookieJar;
use maum_core::models::{StudentCredentials, StudentLoginRequest, TeacherLoginRequest, TeacherSignupRequest};
use serde::Serialize;
use uuid::Uuid;

use super::{ok, ClassSummary, OkResponse, StudentSummary};
use crate::auth::cookies::{removal_cookie, session_cookie};
use crate::auth::{student, STUDENT_COOKIE, TEACHER_COOKIE};
use crate::db::repos::{ClassRepo, StudentRepo, TeacherRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{AuthStudent, AuthTeacher, ValidJson};
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub ok: bool,
    pub user_id: Uuid,
}

#[derive(Serialize)]
pub struct TeacherView {
    pub id: Uuid,
    pub name: String,
}

#[derive(Serialize)]
pub struct TeacherMeResponse {
    pub teacher: TeacherView,
}

#[derive(Serialize)]
pub struct StudentSessionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    pub student: StudentSummary,
    pub class: ClassSummary,
}

fn teacher_cookie(state: &AppState, access_token: String, expires_in: i64) -> Cookie<'static> {
    session_cookie(
        TEACHER_COOKIE,
        access_token,
        time::Duration::seconds(expires_in.max(0)),
        state.settings.cookie_secure,
    )
}

/// POST /api/auth/teacher/signup - create provider account and profile
async fn teacher_signup(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidJson(req): ValidJson<TeacherSignupRequest>,
) -> Result<(CookieJar, Json<SignupResponse>), ApiError> {
    let teacher = req.validate()?;

    let outcome = state
        .identity
        .sign_up(&teacher.email, &teacher.password)
        .await
        .map_err(|e| ApiError::from_provider(e, StatusCode::BAD_REQUEST))?;

    TeacherRepo::new(&state.pool)
        .upsert_profile(outcome.user.id, &teacher.name)
        .await?;
    tracing::info!(teacher_id = %outcome.user.id, "Teacher signed up");

    let jar = match outcome.session {
        Some(session) => jar.add(teacher_cookie(&state, session.access_token, session.expires_in)),
        None => jar,
    };

    Ok((
        jar,
        Json(SignupResponse {
            ok: true,
            user_id: outcome.user.id,
        }),
    ))
}

/// POST /api/auth/teacher/login
async fn teacher_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidJson(req): ValidJson<TeacherLoginRequest>,
) -> Result<(CookieJar, Json<OkResponse>), ApiError> {
    let credentials = req.validate()?;

    let outcome = state
        .identity
        .sign_in(&credentials.email, &credentials.password)
        .await
        .map_err(|e| ApiError::from_provider(e, StatusCode::UNAUTHORIZED))?;
    tracing::info!(teacher_id = %outcome.user.id, "Teacher logged in");

    let jar = jar.add(teacher_cookie(
        &state,
        outcome.session.access_token,
        outcome.session.expires_in,
    ));
    Ok((jar, ok()))
}

/// POST /api/auth/teacher/logout
async fn teacher_logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<OkResponse>), ApiError> {
    if let Some(token) = jar.get(TEACHER_COOKIE).map(|c| c.value().to_owned()) {
        state
            .identity
            .sign_out(&token)
            .await
            .map_err(|e| ApiError::from_provider(e, StatusCode::BAD_REQUEST))?;
    }

    Ok((jar.add(removal_cookie(TEACHER_COOKIE)), ok()))
}

/// GET /api/auth/teacher/me
async fn teacher_me(AuthTeacher(teacher): AuthTeacher) -> Json<TeacherMeResponse> {
    Json(TeacherMeResponse {
        teacher: TeacherView {
            id: teacher.id,
            name: teacher.name,
        },
    })
}

/// POST /api/auth/student/login - class code plus name, or number plus PIN
async fn student_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidJson(req): ValidJson<StudentLoginRequest>,
) -> Result<(CookieJar, Json<StudentSessionResponse>), ApiError> {
    let credentials = req.validate()?;

    let class = ClassRepo::new(&state.pool)
        .find_by_code(credentials.class_code())
        .await?
        .ok_or_else(|| ApiError::unauthorized("Check the class code"))?;

    let students = StudentRepo::new(&state.pool);
    let student = match &credentials {
        StudentCredentials::ByName { name, .. } => {
            let mut matches = students.find_by_name(class.id, name).await?;
            if matches.len() > 1 {
                return Err(ApiError::conflict(
                    "Several students share this name; ask your teacher to log in by number",
                ));
            }
            matches.pop().ok_or_else(|| ApiError::unauthorized("Check your name"))?
        }
        StudentCredentials::ByNumber {
            student_number,
            pin_code,
            ..
        } => students
            .find_by_number_and_pin(class.id, *student_number, pin_code)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Check your student number and PIN"))?,
    };

    let days = state.settings.limits.student_session_days;
    let issued = student::create(&state.pool, student.id, days).await?;
    let cookie = session_cookie(
        STUDENT_COOKIE,
        issued.token,
        time::Duration::days(days),
        state.settings.cookie_secure,
    );

    Ok((
        jar.add(cookie),
        Json(StudentSessionResponse {
            ok: Some(true),
            student: StudentSummary {
                id: student.id,
                name: student.name,
                student_number: student.student_number,
            },
            class: ClassSummary {
                id: class.id,
                class_name: class.class_name,
                class_code: class.class_code,
            },
        }),
    ))
}

/// POST /api/auth/student/logout
async fn student_logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<OkResponse>), ApiError> {
    if let Some(token) = jar.get(STUDENT_COOKIE).map(|c| c.value().to_owned()) {
        student::revoke(&state.pool, &token).await?;
    }

    Ok((jar.add(removal_cookie(STUDENT_COOKIE)), ok()))
}

/// GET /api/auth/student/me
async fn student_me(AuthStudent(session): AuthStudent) -> Json<StudentSessionResponse> {
    Json(StudentSessionResponse {
        ok: None,
        student: StudentSummary::from(&session),
        class: ClassSummary::from(&session),
    })
}

/// Auth routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/teacher/signup", post(teacher_signup))
        .route("/api/auth/teacher/login", post(teacher_login))
        .route("/api/auth/teacher/logout", post(teacher_logout))
        .route("/api/auth/teacher/me", get(teacher_me))
        .route("/api/auth/student/login", post(student_login))
        .route("/api/auth/student/logout", post(student_logout))
        .route("/api/auth/student/me", get(student_me))
}
