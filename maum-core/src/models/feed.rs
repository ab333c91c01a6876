//! Emotion feed and reaction payloads

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use super::validation::{present, text, ValidationError};
use crate::domain::{EmotionType, ReactionType};

const MAX_CONTENT_LEN: usize = 100;
const MAX_IMAGE_URL_LEN: usize = 2048;

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/?#]+[^\s]*$").expect("invalid url regex"));

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeedCreateRequest {
    pub emotion_type: String,
    pub content: String,
    pub image_url: Option<String>,
}

/// Validated feed post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFeed {
    pub emotion_type: EmotionType,
    pub content: String,
    pub image_url: Option<String>,
}

impl FeedCreateRequest {
    pub fn validate(self) -> Result<NewFeed, ValidationError> {
        if self.emotion_type.is_empty() {
            return Err(ValidationError::Empty { field: "emotionType" });
        }
        let emotion_type = self.emotion_type.parse()?;
        let content = text("content", &self.content, 1, MAX_CONTENT_LEN)?;

        let image_url = match self.image_url.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(url) if url.len() > MAX_IMAGE_URL_LEN => {
                return Err(ValidationError::TooLong {
                    field: "imageUrl",
                    max: MAX_IMAGE_URL_LEN,
                })
            }
            Some(url) if !URL_RE.is_match(url) => {
                return Err(ValidationError::InvalidFormat {
                    field: "imageUrl",
                    reason: "must be an http(s) URL",
                })
            }
            Some(url) => Some(url.to_owned()),
        };

        Ok(NewFeed {
            emotion_type,
            content,
            image_url,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReactionRequest {
    pub reaction_type: String,
}

impl ReactionRequest {
    pub fn validate(self) -> Result<ReactionType, ValidationError> {
        if self.reaction_type.is_empty() {
            return Err(ValidationError::Empty { field: "reactionType" });
        }
        self.reaction_type.parse()
    }
}

/// Teacher toggles whether a feed shows up on the class board
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeedVisibilityRequest {
    #[serde(deserialize_with = "present")]
    pub is_visible: Option<bool>,
}

impl FeedVisibilityRequest {
    pub fn validate(self) -> Result<bool, ValidationError> {
        self.is_visible
            .ok_or(ValidationError::Empty { field: "isVisible" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(emotion: &str, content: &str, image: Option<&str>) -> FeedCreateRequest {
        FeedCreateRequest {
            emotion_type: emotion.into(),
            content: content.into(),
            image_url: image.map(Into::into),
        }
    }

    #[test]
    fn accepts_valid_feed() {
        let new = feed("calm", "오늘은 평온해요", Some("https://cdn.example.com/a.png"))
            .validate()
            .unwrap();
        assert_eq!(new.emotion_type, EmotionType::Calm);
        assert_eq!(new.image_url.as_deref(), Some("https://cdn.example.com/a.png"));
    }

    #[test]
    fn rejects_unknown_emotion() {
        assert!(matches!(
            feed("bored", "hi", None).validate(),
            Err(ValidationError::InvalidVariant { field: "emotionType", .. })
        ));
    }

    #[test]
    fn content_limit_is_100_chars() {
        assert!(feed("joy", &"가".repeat(100), None).validate().is_ok());
        assert!(matches!(
            feed("joy", &"가".repeat(101), None).validate(),
            Err(ValidationError::TooLong { field: "content", max: 100 })
        ));
    }

    #[test]
    fn rejects_non_http_image() {
        assert!(matches!(
            feed("joy", "hi", Some("javascript:alert(1)")).validate(),
            Err(ValidationError::InvalidFormat { field: "imageUrl", .. })
        ));
    }

    #[test]
    fn blank_image_is_none() {
        assert_eq!(feed("joy", "hi", Some("  ")).validate().unwrap().image_url, None);
    }

    #[test]
    fn reaction_parses() {
        let req = ReactionRequest {
            reaction_type: "hug".into(),
        };
        assert_eq!(req.validate().unwrap(), ReactionType::Hug);
    }

    #[test]
    fn visibility_requires_value() {
        let req: FeedVisibilityRequest = serde_json::from_str("{}").unwrap();
        assert!(req.validate().is_err());

        let req: FeedVisibilityRequest = serde_json::from_str(r#"{"isVisible":false}"#).unwrap();
        assert!(!req.validate().unwrap());
    }
}
