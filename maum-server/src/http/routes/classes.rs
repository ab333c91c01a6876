//! Class and roster endpoints (teacher only)

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use chrono::{DateTime, Utc};
use maum_core::models::{ClassCreateRequest, StudentCreateRequest};
use serde::Serialize;
use uuid::Uuid;

use super::{ok, OkResponse};
use crate::auth::access::{owned, Denied};
use crate::db::repos::{Class, ClassRepo, Student, StudentRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{AuthTeacher, ValidJson, ValidUuid};
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassResponse {
    pub id: Uuid,
    pub class_name: String,
    pub grade: i32,
    pub section: i32,
    pub class_code: String,
    pub created_at: DateTime<Utc>,
}

impl From<Class> for ClassResponse {
    fn from(c: Class) -> Self {
        Self {
            id: c.id,
            class_name: c.class_name,
            grade: c.grade,
            section: c.section,
            class_code: c.class_code,
            created_at: c.created_at,
        }
    }
}

/// Roster entry; the PIN is shown to the teacher so they can hand it out
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterStudent {
    pub id: Uuid,
    pub name: String,
    pub student_number: i32,
    pub pin_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Student> for RosterStudent {
    fn from(s: Student) -> Self {
        Self {
            id: s.id,
            name: s.name,
            student_number: s.student_number,
            pin_code: s.pin_code,
            created_at: s.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct ClassListResponse {
    pub classes: Vec<ClassResponse>,
}

#[derive(Serialize)]
pub struct ClassCreatedResponse {
    pub class: ClassResponse,
}

#[derive(Serialize)]
pub struct RosterResponse {
    pub students: Vec<RosterStudent>,
}

#[derive(Serialize)]
pub struct StudentCreatedResponse {
    pub student: RosterStudent,
}

async fn require_owned_class(state: &AppState, class_id: Uuid, teacher_id: Uuid) -> Result<Class, ApiError> {
    let class = ClassRepo::new(&state.pool).owned_by(class_id, teacher_id).await?;
    Ok(owned(class, Denied::Class)?)
}

/// GET /api/classes - the teacher's classes, newest first
async fn list_classes(
    State(state): State<Arc<AppState>>,
    AuthTeacher(teacher): AuthTeacher,
) -> Result<Json<ClassListResponse>, ApiError> {
    let classes = ClassRepo::new(&state.pool).list_for_teacher(teacher.id).await?;
    Ok(Json(ClassListResponse {
        classes: classes.into_iter().map(ClassResponse::from).collect(),
    }))
}

/// POST /api/classes - create a class with a fresh join code
async fn create_class(
    State(state): State<Arc<AppState>>,
    AuthTeacher(teacher): AuthTeacher,
    ValidJson(req): ValidJson<ClassCreateRequest>,
) -> Result<(StatusCode, Json<ClassCreatedResponse>), ApiError> {
    let new_class = req.validate()?;
    let class = ClassRepo::new(&state.pool).create(teacher.id, &new_class).await?;
    tracing::info!(class_id = %class.id, teacher_id = %teacher.id, "Class created");

    Ok((
        StatusCode::CREATED,
        Json(ClassCreatedResponse {
            class: ClassResponse::from(class),
        }),
    ))
}

/// DELETE /api/classes/{id}
async fn delete_class(
    State(state): State<Arc<AppState>>,
    AuthTeacher(teacher): AuthTeacher,
    ValidUuid(class_id): ValidUuid,
) -> Result<Json<OkResponse>, ApiError> {
    require_owned_class(&state, class_id, teacher.id).await?;
    ClassRepo::new(&state.pool).delete(class_id, teacher.id).await?;
    tracing::info!(%class_id, "Class deleted");
    Ok(ok())
}

/// GET /api/classes/{id}/students - roster by student number
async fn list_students(
    State(state): State<Arc<AppState>>,
    AuthTeacher(teacher): AuthTeacher,
    ValidUuid(class_id): ValidUuid,
) -> Result<Json<RosterResponse>, ApiError> {
    require_owned_class(&state, class_id, teacher.id).await?;
    let students = StudentRepo::new(&state.pool).list_for_class(class_id).await?;
    Ok(Json(RosterResponse {
        students: students.into_iter().map(RosterStudent::from).collect(),
    }))
}

/// POST /api/classes/{id}/students - add a student
async fn create_student(
    State(state): State<Arc<AppState>>,
    AuthTeacher(teacher): AuthTeacher,
    ValidUuid(class_id): ValidUuid,
    ValidJson(req): ValidJson<StudentCreateRequest>,
) -> Result<(StatusCode, Json<StudentCreatedResponse>), ApiError> {
    require_owned_class(&state, class_id, teacher.id).await?;
    let new_student = req.validate()?;
    let student = StudentRepo::new(&state.pool).create(class_id, &new_student).await?;

    Ok((
        StatusCode::CREATED,
        Json(StudentCreatedResponse {
            student: RosterStudent::from(student),
        }),
    ))
}

/// DELETE /api/students/{id}
async fn delete_student(
    State(state): State<Arc<AppState>>,
    AuthTeacher(teacher): AuthTeacher,
    ValidUuid(student_id): ValidUuid,
) -> Result<Json<OkResponse>, ApiError> {
    let repo = StudentRepo::new(&state.pool);
    repo.get(student_id).await?;
    owned(repo.owned_by_teacher(student_id, teacher.id).await?, Denied::Student)?;

    repo.delete(student_id).await?;
    Ok(ok())
}

/// Class routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/classes", get(list_classes).post(create_class))
        .route("/api/classes/{id}", delete(delete_class))
        .route("/api/classes/{id}/students", get(list_students).post(create_student))
        .route("/api/students/{id}", delete(delete_student))
}
