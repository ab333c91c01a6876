//! Route handlers organized by resource

pub mod auth;
pub mod classes;
pub mod feeds;
pub mod health;
pub mod plans;
pub mod stats;

use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::repos::StudentSession;

/// `{"ok": true}`
#[derive(Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

pub fn ok() -> Json<OkResponse> {
    Json(OkResponse { ok: true })
}

/// `?period=week|month|semester`
#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    pub period: Option<String>,
}

/// Student as shown next to their session
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    pub id: Uuid,
    pub name: String,
    pub student_number: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSummary {
    pub id: Uuid,
    pub class_name: String,
    pub class_code: String,
}

impl From<&StudentSession> for StudentSummary {
    fn from(s: &StudentSession) -> Self {
        Self {
            id: s.student_id,
            name: s.student_name.clone(),
            student_number: s.student_number,
        }
    }
}

impl From<&StudentSession> for ClassSummary {
    fn from(s: &StudentSession) -> Self {
        Self {
            id: s.class_id,
            class_name: s.class_name.clone(),
            class_code: s.class_code.clone(),
        }
    }
}
