//! Request models with validation at construction
//!
//! Raw request bodies deserialize into `*Request` structs (camelCase JSON).
//! `validate()` turns them into the typed values the repositories accept.
//! Invalid input returns ValidationError, not panic.

pub mod auth;
pub mod classroom;
pub mod feed;
pub mod plan;
pub mod validation;

pub use auth::{
    NewTeacher, StudentCredentials, StudentLoginRequest, TeacherCredentials, TeacherLoginRequest,
    TeacherSignupRequest,
};
pub use classroom::{ClassCreateRequest, NewClass, NewStudent, StudentCreateRequest};
pub use feed::{FeedCreateRequest, FeedVisibilityRequest, NewFeed, ReactionRequest};
pub use plan::{NewPlan, PlanCheckRequest, PlanCreateRequest};
pub use validation::ValidationError;
