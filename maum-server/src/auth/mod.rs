//! Authentication
//!
//! Two session models live side by side:
//! - teachers: the identity provider's access token in `maum_teacher_session`
//! - students: a random token in `maum_student_session`, stored hashed

pub mod access;
pub mod cookies;
pub mod identity;
pub mod student;
pub mod teacher;

pub use access::Denied;
pub use cookies::{STUDENT_COOKIE, TEACHER_COOKIE};
pub use identity::{IdentityProvider, MemoryIdentity, ProviderSession, ProviderUser, SupabaseIdentity};
pub use student::{IssuedSession, SessionError};
pub use teacher::TeacherAuthError;

/// Identity provider failure
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The provider refused the request (bad credentials, taken email, ...)
    #[error("{0}")]
    Rejected(String),

    #[error("identity provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected identity provider response: {0}")]
    Protocol(String),
}
