//! Plan repository
//!
//! Plans are never deleted by students, only archived (`is_active = false`),
//! so their past checks keep counting in history.

use chrono::{DateTime, NaiveDate, Utc};
use maum_core::limits::{ensure_room, ACTIVE_PLANS};
use maum_core::models::NewPlan;
use maum_core::stats::PlanRef;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{lock_student, DbError};

#[derive(Debug, Clone, FromRow)]
pub struct Plan {
    pub id: Uuid,
    pub student_id: Uuid,
    pub title: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Plan> for PlanRef {
    fn from(plan: &Plan) -> Self {
        PlanRef {
            id: plan.id,
            title: plan.title.clone(),
        }
    }
}

/// An active plan with the state of its check for one day
#[derive(Debug, Clone, FromRow)]
pub struct TodayPlan {
    pub id: Uuid,
    pub title: String,
    pub is_completed: Option<bool>,
    pub checked_at: Option<DateTime<Utc>>,
}

pub struct PlanRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> PlanRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a plan unless the student already has `limit` active ones.
    pub async fn create_within_limit(
        &self,
        student_id: Uuid,
        plan: &NewPlan,
        limit: i64,
    ) -> Result<Plan, DbError> {
        let mut tx = self.pool.begin().await?;
        lock_student(&mut tx, student_id).await?;

        let (active,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM plans WHERE student_id = $1 AND is_active")
                .bind(student_id)
                .fetch_one(&mut *tx)
                .await?;
        ensure_room(ACTIVE_PLANS, active, limit)?;

        let created = sqlx::query_as::<_, Plan>(
            r#"
            INSERT INTO plans (student_id, title)
            VALUES ($1, $2)
            RETURNING id, student_id, title, is_active, created_at
            "#,
        )
        .bind(student_id)
        .bind(&plan.title)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    /// Active plans of one student, oldest first.
    pub async fn list_active_for_student(&self, student_id: Uuid) -> Result<Vec<Plan>, DbError> {
        let plans = sqlx::query_as::<_, Plan>(
            r#"
            SELECT id, student_id, title, is_active, created_at
            FROM plans
            WHERE student_id = $1 AND is_active
            ORDER BY created_at
            "#,
        )
        .bind(student_id)
        .fetch_all(self.pool)
        .await?;

        Ok(plans)
    }

    /// Active plans of several students, oldest first.
    pub async fn list_active_for_students(&self, student_ids: &[Uuid]) -> Result<Vec<Plan>, DbError> {
        if student_ids.is_empty() {
            return Ok(Vec::new());
        }

        let plans = sqlx::query_as::<_, Plan>(
            r#"
            SELECT id, student_id, title, is_active, created_at
            FROM plans
            WHERE student_id = ANY($1) AND is_active
            ORDER BY created_at
            "#,
        )
        .bind(student_ids)
        .fetch_all(self.pool)
        .await?;

        Ok(plans)
    }

    /// The plan, if it is active and belongs to the student.
    pub async fn get_active_owned(&self, plan_id: Uuid, student_id: Uuid) -> Result<Plan, DbError> {
        sqlx::query_as::<_, Plan>(
            r#"
            SELECT id, student_id, title, is_active, created_at
            FROM plans
            WHERE id = $1 AND student_id = $2 AND is_active
            "#,
        )
        .bind(plan_id)
        .bind(student_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound {
            resource: "plan",
            id: plan_id.to_string(),
        })
    }

    /// Mark an active plan of the student inactive.
    pub async fn archive(&self, plan_id: Uuid, student_id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query(
            "UPDATE plans SET is_active = FALSE WHERE id = $1 AND student_id = $2 AND is_active",
        )
        .bind(plan_id)
        .bind(student_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound {
                resource: "plan",
                id: plan_id.to_string(),
            });
        }
        Ok(())
    }

    /// Active plans with the check recorded on `date`, if any.
    pub async fn today_with_checks(
        &self,
        student_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<TodayPlan>, DbError> {
        let plans = sqlx::query_as::<_, TodayPlan>(
            r#"
            SELECT p.id, p.title, pc.is_completed, pc.checked_at
            FROM plans p
            LEFT JOIN plan_checks pc ON pc.plan_id = p.id AND pc.check_date = $2
            WHERE p.student_id = $1 AND p.is_active
            ORDER BY p.created_at
            "#,
        )
        .bind(student_id)
        .bind(date)
        .fetch_all(self.pool)
        .await?;

        Ok(plans)
    }
}
