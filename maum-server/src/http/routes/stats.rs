//! Teacher statistics over a period window
//!
//! Rows are fetched already filtered by class, student and date range; the
//! aggregation itself lives in `maum_core::stats`.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use maum_core::period::PeriodRange;
use maum_core::stats::{
    class_overview, daily_trend, emotion_distribution, student_plan_stats, student_snapshot,
    CheckRecord, ClassOverview, DailyPoint, EmotionDistribution, PlanAchievement, PlanRef,
    StudentSnapshot,
};
use maum_core::Period;
use serde::Serialize;
use uuid::Uuid;

use super::PeriodQuery;
use crate::auth::access::{owned, Denied};
use crate::db::repos::{CheckRepo, ClassRepo, FeedRepo, PlanRepo, Student, StudentRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{AuthTeacher, ValidUuid};
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRef {
    pub id: Uuid,
    pub name: String,
    pub student_number: i32,
}

impl From<Student> for StudentRef {
    fn from(s: Student) -> Self {
        Self {
            id: s.id,
            name: s.name,
            student_number: s.student_number,
        }
    }
}

#[derive(Serialize)]
pub struct EmotionStatsResponse {
    pub range: PeriodRange,
    #[serde(flatten)]
    pub distribution: EmotionDistribution,
}

#[derive(Serialize)]
pub struct StudentPlansResponse {
    pub range: PeriodRange,
    pub student: StudentRef,
    pub plans: Vec<PlanAchievement>,
}

#[derive(Serialize)]
pub struct SnapshotResponse {
    pub range: PeriodRange,
    pub student: StudentRef,
    #[serde(flatten)]
    pub snapshot: StudentSnapshot,
}

#[derive(Serialize)]
pub struct TrendResponse {
    pub range: PeriodRange,
    pub student: StudentRef,
    pub points: Vec<DailyPoint>,
}

fn range_for(query: &PeriodQuery) -> PeriodRange {
    PeriodRange::current(Period::from_query(query.period.as_deref()))
}

async fn require_owned_student(state: &AppState, student_id: Uuid, teacher_id: Uuid) -> Result<Student, ApiError> {
    let student = StudentRepo::new(&state.pool)
        .owned_by_teacher(student_id, teacher_id)
        .await?;
    Ok(owned(student, Denied::Student)?)
}

/// Active plans of one student plus their completed checks in `range`.
async fn plans_and_checks(
    state: &AppState,
    student_id: Uuid,
    range: &PeriodRange,
) -> Result<(Vec<PlanRef>, Vec<CheckRecord>), ApiError> {
    let plans: Vec<PlanRef> = PlanRepo::new(&state.pool)
        .list_active_for_student(student_id)
        .await?
        .iter()
        .map(PlanRef::from)
        .collect();

    let plan_ids: Vec<Uuid> = plans.iter().map(|p| p.id).collect();
    let checks = CheckRepo::new(&state.pool)
        .completed_in_range(&plan_ids, range.start_date, range.end_date)
        .await?;

    Ok((plans, checks))
}

/// GET /api/stats/class/{id}/overview - class achievement and plan ranking
async fn class_overview_stats(
    State(state): State<Arc<AppState>>,
    AuthTeacher(teacher): AuthTeacher,
    ValidUuid(class_id): ValidUuid,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<ClassOverview>, ApiError> {
    owned(
        ClassRepo::new(&state.pool).owned_by(class_id, teacher.id).await?,
        Denied::Class,
    )?;

    let range = range_for(&query);
    let student_ids = StudentRepo::new(&state.pool).ids_for_class(class_id).await?;
    let plans: Vec<PlanRef> = PlanRepo::new(&state.pool)
        .list_active_for_students(&student_ids)
        .await?
        .iter()
        .map(PlanRef::from)
        .collect();

    let plan_ids: Vec<Uuid> = plans.iter().map(|p| p.id).collect();
    let checks = CheckRepo::new(&state.pool)
        .completed_in_range(&plan_ids, range.start_date, range.end_date)
        .await?;

    Ok(Json(class_overview(range, student_ids.len() as u64, &plans, &checks)))
}

/// GET /api/stats/class/{id}/emotions - emotion mix of visible feeds
async fn class_emotions(
    State(state): State<Arc<AppState>>,
    AuthTeacher(teacher): AuthTeacher,
    ValidUuid(class_id): ValidUuid,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<EmotionStatsResponse>, ApiError> {
    owned(
        ClassRepo::new(&state.pool).owned_by(class_id, teacher.id).await?,
        Denied::Class,
    )?;

    let range = range_for(&query);
    let counts = FeedRepo::new(&state.pool)
        .emotion_counts_for_class(class_id, range.start_iso, range.end_iso)
        .await?;

    Ok(Json(EmotionStatsResponse {
        range,
        distribution: emotion_distribution(counts),
    }))
}

/// GET /api/stats/student/{id}/plans - per-plan achievement
async fn student_plans(
    State(state): State<Arc<AppState>>,
    AuthTeacher(teacher): AuthTeacher,
    ValidUuid(student_id): ValidUuid,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<StudentPlansResponse>, ApiError> {
    let student = require_owned_student(&state, student_id, teacher.id).await?;
    let range = range_for(&query);
    let (plans, checks) = plans_and_checks(&state, student_id, &range).await?;

    Ok(Json(StudentPlansResponse {
        plans: student_plan_stats(&range, &plans, &checks),
        range,
        student: StudentRef::from(student),
    }))
}

/// GET /api/stats/student/{id}/snapshot - today, plans and emotions at once
async fn student_snapshot_stats(
    State(state): State<Arc<AppState>>,
    AuthTeacher(teacher): AuthTeacher,
    ValidUuid(student_id): ValidUuid,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<SnapshotResponse>, ApiError> {
    let student = require_owned_student(&state, student_id, teacher.id).await?;
    let range = range_for(&query);
    let (plans, checks) = plans_and_checks(&state, student_id, &range).await?;
    let emotions = FeedRepo::new(&state.pool)
        .emotion_counts_for_student(student_id, range.start_iso, range.end_iso)
        .await?;

    Ok(Json(SnapshotResponse {
        snapshot: student_snapshot(&range, &plans, &checks, emotions),
        range,
        student: StudentRef::from(student),
    }))
}

/// GET /api/stats/student/{id}/monthly - daily achievement trend
async fn student_trend(
    State(state): State<Arc<AppState>>,
    AuthTeacher(teacher): AuthTeacher,
    ValidUuid(student_id): ValidUuid,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<TrendResponse>, ApiError> {
    let student = require_owned_student(&state, student_id, teacher.id).await?;
    let range = range_for(&query);
    let (plans, checks) = plans_and_checks(&state, student_id, &range).await?;

    Ok(Json(TrendResponse {
        points: daily_trend(&range, plans.len() as u64, &checks),
        range,
        student: StudentRef::from(student),
    }))
}

/// Statistics routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/stats/class/{id}/overview", get(class_overview_stats))
        .route("/api/stats/class/{id}/emotions", get(class_emotions))
        .route("/api/stats/student/{id}/plans", get(student_plans))
        .route("/api/stats/student/{id}/snapshot", get(student_snapshot_stats))
        .route("/api/stats/student/{id}/monthly", get(student_trend))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_period_falls_back_to_month() {
        let range = range_for(&PeriodQuery {
            period: Some("fortnight".into()),
        });
        assert_eq!(range.period, Period::Month);
        assert_eq!(range.days, 30);

        let range = range_for(&PeriodQuery {
            period: Some("week".into()),
        });
        assert_eq!(range.days, 7);
    }

    #[test]
    fn emotion_response_is_flat() {
        let range = range_for(&PeriodQuery::default());
        let response = EmotionStatsResponse {
            range,
            distribution: emotion_distribution(Vec::new()),
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["totalFeeds"], 0);
        assert_eq!(value["distribution"].as_array().unwrap().len(), 8);
        assert_eq!(value["range"]["days"], 30);
    }
}
