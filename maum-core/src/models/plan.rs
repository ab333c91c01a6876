//! Daily plan payloads

use serde::Deserialize;

use super::validation::{present, text, ValidationError};

const MAX_TITLE_LEN: usize = 50;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlanCreateRequest {
    pub title: String,
}

/// Validated plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlan {
    pub title: String,
}

impl PlanCreateRequest {
    pub fn validate(self) -> Result<NewPlan, ValidationError> {
        Ok(NewPlan {
            title: text("title", &self.title, 1, MAX_TITLE_LEN)?,
        })
    }
}

/// Today's check for a plan.
///
/// `isCompleted` must be sent; `null` clears the check back to "unanswered".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlanCheckRequest {
    #[serde(deserialize_with = "present")]
    pub is_completed: Option<Option<bool>>,
}

impl PlanCheckRequest {
    pub fn validate(self) -> Result<Option<bool>, ValidationError> {
        self.is_completed
            .ok_or(ValidationError::Empty { field: "isCompleted" })
    }
}
