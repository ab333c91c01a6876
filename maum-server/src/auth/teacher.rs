//! Teacher sessions: provider token in, profile out

use sqlx::PgPool;

use super::identity::IdentityProvider;
use super::AuthError;
use crate::db::repos::{DbError, TeacherProfile, TeacherRepo};

#[derive(Debug, thiserror::Error)]
pub enum TeacherAuthError {
    #[error("Unauthorized")]
    Unauthenticated,

    #[error("Teacher profile not found")]
    NoProfile,

    #[error(transparent)]
    Provider(#[from] AuthError),

    #[error(transparent)]
    Database(#[from] DbError),
}

/// Resolve the teacher behind a provider access token.
pub async fn resolve(
    identity: &dyn IdentityProvider,
    pool: &PgPool,
    access_token: Option<&str>,
) -> Result<TeacherProfile, TeacherAuthError> {
    let token = access_token
        .filter(|t| !t.is_empty())
        .ok_or(TeacherAuthError::Unauthenticated)?;

    let user = identity
        .user(token)
        .await?
        .ok_or(TeacherAuthError::Unauthenticated)?;

    TeacherRepo::new(pool)
        .get_profile(user.id)
        .await?
        .ok_or(TeacherAuthError::NoProfile)
}
