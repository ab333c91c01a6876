//! Per-student quotas
//!
//! The server counts rows while holding the student's row lock and asks
//! [`ensure_room`] whether one more may be inserted.

/// Feeds a student may post per calendar day.
pub const FEEDS_PER_DAY: &str = "feeds per day";
/// Plans a student may keep active at once.
pub const ACTIVE_PLANS: &str = "active plans";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("at most {limit} {resource}")]
pub struct LimitReached {
    pub resource: &'static str,
    pub limit: i64,
}

/// `Ok` when `current` existing rows leave room for one more under `limit`.
pub fn ensure_room(resource: &'static str, current: i64, limit: i64) -> Result<(), LimitReached> {
    if current < limit {
        Ok(())
    } else {
        Err(LimitReached { resource, limit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn third_feed_allowed_fourth_rejected() {
        assert!(ensure_room(FEEDS_PER_DAY, 0, 3).is_ok());
        assert!(ensure_room(FEEDS_PER_DAY, 2, 3).is_ok());
        assert_eq!(
            ensure_room(FEEDS_PER_DAY, 3, 3),
            Err(LimitReached { resource: FEEDS_PER_DAY, limit: 3 })
        );
    }

    #[test]
    fn sixth_active_plan_rejected() {
        assert!(ensure_room(ACTIVE_PLANS, 4, 5).is_ok());
        let err = ensure_room(ACTIVE_PLANS, 5, 5).unwrap_err();
        assert_eq!(err.to_string(), "at most 5 active plans");
    }

    #[test]
    fn over_limit_rows_stay_rejected() {
        // A lowered limit must not let a student who is already over it add more
        assert!(ensure_room(ACTIVE_PLANS, 7, 5).is_err());
        assert!(ensure_room(FEEDS_PER_DAY, 1, 1).is_err());
    }
}
