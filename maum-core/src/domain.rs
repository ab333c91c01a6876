//! Closed vocabularies shared by requests, storage and statistics

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::ValidationError;

// ============================================================================
// Emotions
// ============================================================================

/// Emotion attached to a feed post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionType {
    Joy,
    Sad,
    Angry,
    Anxious,
    Calm,
    Thinking,
    Excited,
    Tired,
}

impl EmotionType {
    /// Canonical order; every distribution is reported in this order.
    pub const ALL: [EmotionType; 8] = [
        EmotionType::Joy,
        EmotionType::Sad,
        EmotionType::Angry,
        EmotionType::Anxious,
        EmotionType::Calm,
        EmotionType::Thinking,
        EmotionType::Excited,
        EmotionType::Tired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionType::Joy => "joy",
            EmotionType::Sad => "sad",
            EmotionType::Angry => "angry",
            EmotionType::Anxious => "anxious",
            EmotionType::Calm => "calm",
            EmotionType::Thinking => "thinking",
            EmotionType::Excited => "excited",
            EmotionType::Tired => "tired",
        }
    }

    /// Position in [`EmotionType::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for EmotionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmotionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EmotionType::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidVariant {
                field: "emotionType",
                value: s.to_owned(),
            })
    }
}

// ============================================================================
// Reactions
// ============================================================================

/// Reaction a classmate leaves on a feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionType {
    Heart,
    Thumbsup,
    Hug,
    Fighting,
}

impl ReactionType {
    pub const ALL: [ReactionType; 4] = [
        ReactionType::Heart,
        ReactionType::Thumbsup,
        ReactionType::Hug,
        ReactionType::Fighting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionType::Heart => "heart",
            ReactionType::Thumbsup => "thumbsup",
            ReactionType::Hug => "hug",
            ReactionType::Fighting => "fighting",
        }
    }
}

impl fmt::Display for ReactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReactionType::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidVariant {
                field: "reactionType",
                value: s.to_owned(),
            })
    }
}

// ============================================================================
// Periods
// ============================================================================

/// Statistics window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    #[default]
    Month,
    Semester,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Week => "week",
            Period::Month => "month",
            Period::Semester => "semester",
        }
    }

    /// Number of days covered, today included.
    pub fn days(&self) -> u32 {
        match self {
            Period::Week => 7,
            Period::Month => 30,
            Period::Semester => 182,
        }
    }

    /// Parse the `period` query parameter. Missing or unknown values fall
    /// back to [`Period::Month`].
    pub fn from_query(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "semester" => Ok(Period::Semester),
            _ => Err(ValidationError::InvalidVariant {
                field: "period",
                value: s.to_owned(),
            }),
        }
    }
}
