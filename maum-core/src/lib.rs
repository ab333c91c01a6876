//! maum-core: classroom domain model without I/O
//!
//! Holds everything the server needs that does not touch the network or
//! the database:
//! - Emotion / reaction / period enums
//! - Request validation (validated at construction)
//! - Period ranges and the statistics aggregation passes
//! - Per-student quota decisions
//! - Class codes, PINs and session token hashing

pub mod credentials;
pub mod domain;
pub mod limits;
pub mod models;
pub mod period;
pub mod stats;

pub use domain::{EmotionType, Period, ReactionType};
pub use models::ValidationError;
pub use period::PeriodRange;
