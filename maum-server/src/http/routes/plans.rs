//! Student daily plans and checks

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use maum_core::models::{PlanCheckRequest, PlanCreateRequest};
use maum_core::period::today_utc;
use maum_core::stats::{today_summary, TodaySummary};
use serde::Serialize;
use uuid::Uuid;

use super::{ok, OkResponse};
use crate::db::repos::{CheckRepo, Plan, PlanCheck, PlanRepo, TodayPlan};
use crate::http::error::ApiError;
use crate::http::extractors::{AuthStudent, ValidJson, ValidUuid};
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    pub id: Uuid,
    pub title: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Plan> for PlanResponse {
    fn from(p: Plan) -> Self {
        Self {
            id: p.id,
            title: p.title,
            is_active: p.is_active,
            created_at: p.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct PlanEnvelope {
    pub plan: PlanResponse,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub check_date: NaiveDate,
    pub is_completed: Option<bool>,
    pub checked_at: Option<DateTime<Utc>>,
}

impl From<PlanCheck> for CheckResponse {
    fn from(c: PlanCheck) -> Self {
        Self {
            id: c.id,
            plan_id: c.plan_id,
            check_date: c.check_date,
            is_completed: c.is_completed,
            checked_at: c.checked_at,
        }
    }
}

#[derive(Serialize)]
pub struct CheckEnvelope {
    pub check: CheckResponse,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayPlanResponse {
    pub id: Uuid,
    pub title: String,
    pub is_completed: Option<bool>,
    pub checked_at: Option<DateTime<Utc>>,
}

impl From<TodayPlan> for TodayPlanResponse {
    fn from(p: TodayPlan) -> Self {
        Self {
            id: p.id,
            title: p.title,
            is_completed: p.is_completed,
            checked_at: p.checked_at,
        }
    }
}

#[derive(Serialize)]
pub struct TodayResponse {
    pub date: NaiveDate,
    pub plans: Vec<TodayPlanResponse>,
    pub summary: TodaySummary,
}

/// POST /api/plans - add a plan, within the active-plan limit
async fn create_plan(
    State(state): State<Arc<AppState>>,
    AuthStudent(session): AuthStudent,
    ValidJson(req): ValidJson<PlanCreateRequest>,
) -> Result<(StatusCode, Json<PlanEnvelope>), ApiError> {
    let new_plan = req.validate()?;
    let limit = state.settings.limits.max_active_plans;

    let plan = PlanRepo::new(&state.pool)
        .create_within_limit(session.student_id, &new_plan, limit)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PlanEnvelope {
            plan: PlanResponse::from(plan),
        }),
    ))
}

/// DELETE /api/plans/{id} - archive one of your active plans
async fn archive_plan(
    State(state): State<Arc<AppState>>,
    AuthStudent(session): AuthStudent,
    ValidUuid(plan_id): ValidUuid,
) -> Result<Json<OkResponse>, ApiError> {
    PlanRepo::new(&state.pool)
        .archive(plan_id, session.student_id)
        .await?;
    Ok(ok())
}

/// POST /api/plans/{id}/check - record today's result for a plan
async fn check_plan(
    State(state): State<Arc<AppState>>,
    AuthStudent(session): AuthStudent,
    ValidUuid(plan_id): ValidUuid,
    ValidJson(req): ValidJson<PlanCheckRequest>,
) -> Result<Json<CheckEnvelope>, ApiError> {
    let is_completed = req.validate()?;

    PlanRepo::new(&state.pool)
        .get_active_owned(plan_id, session.student_id)
        .await?;

    let check = CheckRepo::new(&state.pool)
        .upsert(plan_id, today_utc(), is_completed, Utc::now())
        .await?;

    Ok(Json(CheckEnvelope {
        check: CheckResponse::from(check),
    }))
}

/// GET /api/plans/today - active plans with today's checks
async fn today(
    State(state): State<Arc<AppState>>,
    AuthStudent(session): AuthStudent,
) -> Result<Json<TodayResponse>, ApiError> {
    let date = today_utc();
    let plans = PlanRepo::new(&state.pool)
        .today_with_checks(session.student_id, date)
        .await?;

    let summary = today_summary(plans.iter().map(|p| p.is_completed));
    Ok(Json(TodayResponse {
        date,
        plans: plans.into_iter().map(TodayPlanResponse::from).collect(),
        summary,
    }))
}

/// Plan routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/plans", post(create_plan))
        .route("/api/plans/today", get(today))
        .route("/api/plans/{id}", delete(archive_plan))
        .route("/api/plans/{id}/check", post(check_plan))
}
