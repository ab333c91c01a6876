//! Emotion feeds and reactions

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use axum_extra::extract::CookieJar;
use chrono::{DateTime, NaiveDate, Utc};
use maum_core::models::{FeedCreateRequest, FeedVisibilityRequest, ReactionRequest};
use maum_core::period::{day_bounds, resolve_day, today_utc};
use maum_core::{EmotionType, ReactionType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ok, OkResponse};
use crate::auth::access::{student_may_react, teacher_may_moderate};
use crate::db::repos::{ClassFeed, Feed, FeedReactionRow, FeedRepo, ReactionRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{AuthStudent, AuthTeacher, ClassViewer, ValidJson, ValidUuid};
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    pub id: Uuid,
    pub emotion_type: EmotionType,
    pub content: String,
    pub image_url: Option<String>,
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Feed> for FeedResponse {
    fn from(f: Feed) -> Self {
        Self {
            id: f.id,
            emotion_type: f.emotion_type,
            content: f.content,
            image_url: f.image_url,
            is_visible: f.is_visible,
            created_at: f.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct FeedEnvelope {
    pub feed: FeedResponse,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedAuthor {
    pub id: Uuid,
    pub name: String,
    pub student_number: i32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionResponse {
    pub id: Uuid,
    pub reaction_type: ReactionType,
    pub student_id: Uuid,
}

impl From<FeedReactionRow> for ReactionResponse {
    fn from(r: FeedReactionRow) -> Self {
        Self {
            id: r.id,
            reaction_type: r.reaction_type,
            student_id: r.student_id,
        }
    }
}

#[derive(Serialize)]
pub struct ClassFeedResponse {
    #[serde(flatten)]
    pub feed: FeedResponse,
    pub student: FeedAuthor,
    pub reactions: Vec<ReactionResponse>,
}

impl From<ClassFeed> for ClassFeedResponse {
    fn from(item: ClassFeed) -> Self {
        let student = FeedAuthor {
            id: item.feed.student_id,
            name: item.author_name,
            student_number: item.author_number,
        };
        Self {
            feed: FeedResponse::from(item.feed),
            student,
            reactions: item.reactions.into_iter().map(ReactionResponse::from).collect(),
        }
    }
}

#[derive(Serialize)]
pub struct ClassFeedsResponse {
    pub feeds: Vec<ClassFeedResponse>,
    pub date: NaiveDate,
}

#[derive(Debug, Default, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

/// POST /api/feeds - post today's feed, within the daily limit
async fn create_feed(
    State(state): State<Arc<AppState>>,
    AuthStudent(session): AuthStudent,
    ValidJson(req): ValidJson<FeedCreateRequest>,
) -> Result<(StatusCode, Json<FeedEnvelope>), ApiError> {
    let new_feed = req.validate()?;
    let limit = state.settings.limits.daily_feed_limit;

    let feed = FeedRepo::new(&state.pool)
        .create_within_daily_limit(session.student_id, &new_feed, limit, day_bounds(today_utc()))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(FeedEnvelope {
            feed: FeedResponse::from(feed),
        }),
    ))
}

/// PATCH /api/feeds/{id}/visibility - teacher hides or shows a feed
async fn set_visibility(
    State(state): State<Arc<AppState>>,
    AuthTeacher(teacher): AuthTeacher,
    ValidUuid(feed_id): ValidUuid,
    ValidJson(req): ValidJson<FeedVisibilityRequest>,
) -> Result<Json<FeedEnvelope>, ApiError> {
    let is_visible = req.validate()?;
    let repo = FeedRepo::new(&state.pool);

    let owner = repo.get_owner(feed_id).await?;
    teacher_may_moderate(&owner, teacher.id)?;

    let feed = repo.set_visibility(feed_id, is_visible).await?;
    tracing::info!(%feed_id, is_visible, "Feed visibility changed");
    Ok(Json(FeedEnvelope {
        feed: FeedResponse::from(feed),
    }))
}

/// GET /api/feeds/class/{classId}?date=YYYY-MM-DD - the class board for one day
async fn class_feeds(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidUuid(class_id): ValidUuid,
    Query(query): Query<DateQuery>,
) -> Result<Json<ClassFeedsResponse>, ApiError> {
    ClassViewer::resolve(&state, &jar, class_id).await?;

    let date = resolve_day(query.date.as_deref(), today_utc());
    let feeds = FeedRepo::new(&state.pool)
        .list_for_class_day(class_id, day_bounds(date))
        .await?;

    Ok(Json(ClassFeedsResponse {
        feeds: feeds.into_iter().map(ClassFeedResponse::from).collect(),
        date,
    }))
}

/// POST /api/feeds/{id}/reactions - react to a classmate's feed
async fn react(
    State(state): State<Arc<AppState>>,
    AuthStudent(session): AuthStudent,
    ValidUuid(feed_id): ValidUuid,
    ValidJson(req): ValidJson<ReactionRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    let reaction_type = req.validate()?;

    let owner = FeedRepo::new(&state.pool).get_owner(feed_id).await?;
    student_may_react(&owner, &session)?;

    ReactionRepo::new(&state.pool)
        .upsert(feed_id, session.student_id, reaction_type)
        .await?;
    Ok(ok())
}

/// DELETE /api/feeds/{id}/reactions - take back your reaction
async fn unreact(
    State(state): State<Arc<AppState>>,
    AuthStudent(session): AuthStudent,
    ValidUuid(feed_id): ValidUuid,
) -> Result<Json<OkResponse>, ApiError> {
    ReactionRepo::new(&state.pool)
        .delete(feed_id, session.student_id)
        .await?;
    Ok(ok())
}

/// Feed routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/feeds", post(create_feed))
        .route("/api/feeds/{id}/visibility", patch(set_visibility))
        .route("/api/feeds/class/{class_id}", get(class_feeds))
        .route("/api/feeds/{id}/reactions", post(react).delete(unreact))
}
