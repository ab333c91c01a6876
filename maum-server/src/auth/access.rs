//! Ownership rules
//!
//! Repositories fetch the owning ids; these functions decide whether the
//! caller may act on what was found.

use uuid::Uuid;

use crate::db::repos::{FeedOwner, StudentSession};

/// Why a caller was turned away (403)
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Denied {
    #[error("You do not have access to this class")]
    Class,

    #[error("You do not have access to this student")]
    Student,

    #[error("You do not have access to this feed")]
    Feed,

    #[error("You can only react to feeds in your own class")]
    OtherClassFeed,
}

/// Row from an owner-scoped lookup; `None` means another teacher owns it.
pub fn owned<T>(row: Option<T>, denied: Denied) -> Result<T, Denied> {
    row.ok_or(denied)
}

/// Only the teacher of the author's class may hide or show a feed.
pub fn teacher_may_moderate(owner: &FeedOwner, teacher_id: Uuid) -> Result<(), Denied> {
    if owner.teacher_id == teacher_id {
        Ok(())
    } else {
        Err(Denied::Feed)
    }
}

/// Students react only to feeds posted in their own class.
pub fn student_may_react(owner: &FeedOwner, session: &StudentSession) -> Result<(), Denied> {
    if owner.class_id == session.class_id {
        Ok(())
    } else {
        Err(Denied::OtherClassFeed)
    }
}

/// A student may read only their own class board.
pub fn student_in_class(session: &StudentSession, class_id: Uuid) -> Result<(), Denied> {
    if session.class_id == class_id {
        Ok(())
    } else {
        Err(Denied::Class)
    }
}
