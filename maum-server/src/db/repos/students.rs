//! Student roster repository

use chrono::{DateTime, Utc};
use maum_core::models::NewStudent;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::DbError;

const STUDENT_COLUMNS: &str = "s.id, s.class_id, s.name, s.student_number, s.pin_code, s.created_at";

#[derive(Debug, Clone, FromRow)]
pub struct Student {
    pub id: Uuid,
    pub class_id: Uuid,
    pub name: String,
    pub student_number: i32,
    pub pin_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub struct StudentRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> StudentRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Roster ordered by student number.
    pub async fn list_for_class(&self, class_id: Uuid) -> Result<Vec<Student>, DbError> {
        let students = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students s WHERE s.class_id = $1 ORDER BY s.student_number"
        ))
        .bind(class_id)
        .fetch_all(self.pool)
        .await?;

        Ok(students)
    }

    /// Add a student. A taken student number surfaces as `DbError::Conflict`.
    pub async fn create(&self, class_id: Uuid, student: &NewStudent) -> Result<Student, DbError> {
        let created = sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students (class_id, name, student_number, pin_code)
            VALUES ($1, $2, $3, $4)
            RETURNING id, class_id, name, student_number, pin_code, created_at
            "#,
        )
        .bind(class_id)
        .bind(&student.name)
        .bind(student.student_number)
        .bind(&student.pin_code)
        .fetch_one(self.pool)
        .await
        .map_err(DbError::from)
        .map_err(|e| match e {
            DbError::Conflict(_) => DbError::Conflict(format!(
                "student number {} is already taken in this class",
                student.student_number
            )),
            other => other,
        })?;

        Ok(created)
    }

    pub async fn get(&self, id: Uuid) -> Result<Student, DbError> {
        sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students s WHERE s.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound {
            resource: "student",
            id: id.to_string(),
        })
    }

    /// Every student in the class with exactly this name. More than one
    /// row means the name alone cannot identify anyone.
    pub async fn find_by_name(&self, class_id: Uuid, name: &str) -> Result<Vec<Student>, DbError> {
        let students = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students s WHERE s.class_id = $1 AND s.name = $2 LIMIT 2"
        ))
        .bind(class_id)
        .bind(name)
        .fetch_all(self.pool)
        .await?;

        Ok(students)
    }

    pub async fn find_by_number_and_pin(
        &self,
        class_id: Uuid,
        student_number: i32,
        pin_code: &str,
    ) -> Result<Option<Student>, DbError> {
        let student = sqlx::query_as::<_, Student>(&format!(
            r#"
            SELECT {STUDENT_COLUMNS} FROM students s
            WHERE s.class_id = $1 AND s.student_number = $2 AND s.pin_code = $3
            "#
        ))
        .bind(class_id)
        .bind(student_number)
        .bind(pin_code)
        .fetch_optional(self.pool)
        .await?;

        Ok(student)
    }

    pub async fn ids_for_class(&self, class_id: Uuid) -> Result<Vec<Uuid>, DbError> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM students WHERE class_id = $1")
            .bind(class_id)
            .fetch_all(self.pool)
            .await?;

        Ok(ids)
    }

    /// The student, if their class belongs to the teacher.
    pub async fn owned_by_teacher(
        &self,
        student_id: Uuid,
        teacher_id: Uuid,
    ) -> Result<Option<Student>, DbError> {
        let student = sqlx::query_as::<_, Student>(&format!(
            r#"
            SELECT {STUDENT_COLUMNS} FROM students s
            JOIN classes c ON c.id = s.class_id
            WHERE s.id = $1 AND c.teacher_id = $2
            "#
        ))
        .bind(student_id)
        .bind(teacher_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(student)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound {
                resource: "student",
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
