//! Schema migrations
//!
//! Every statement is idempotent so `run` is safe on each startup.

use sqlx::PgPool;

const STATEMENTS: &[(&str, &str)] = &[
    (
        "teacher_profiles",
        r#"
        CREATE TABLE IF NOT EXISTS teacher_profiles (
            id UUID PRIMARY KEY,
            name TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "classes",
        r#"
        CREATE TABLE IF NOT EXISTS classes (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            teacher_id UUID NOT NULL REFERENCES teacher_profiles(id) ON DELETE CASCADE,
            class_name TEXT NOT NULL,
            grade INTEGER NOT NULL CHECK (grade BETWEEN 1 AND 6),
            section INTEGER NOT NULL CHECK (section BETWEEN 1 AND 20),
            class_code TEXT NOT NULL UNIQUE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "students",
        r#"
        CREATE TABLE IF NOT EXISTS students (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            class_id UUID NOT NULL REFERENCES classes(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            student_number INTEGER NOT NULL CHECK (student_number BETWEEN 1 AND 99),
            pin_code TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            UNIQUE (class_id, student_number)
        )
        "#,
    ),
    (
        "student_sessions",
        r#"
        CREATE TABLE IF NOT EXISTS student_sessions (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            student_id UUID NOT NULL REFERENCES students(id) ON DELETE CASCADE,
            token_hash TEXT NOT NULL UNIQUE,
            expires_at TIMESTAMPTZ NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "plans",
        r#"
        CREATE TABLE IF NOT EXISTS plans (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            student_id UUID NOT NULL REFERENCES students(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "plan_checks",
        r#"
        CREATE TABLE IF NOT EXISTS plan_checks (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            plan_id UUID NOT NULL REFERENCES plans(id) ON DELETE CASCADE,
            check_date DATE NOT NULL,
            is_completed BOOLEAN,
            checked_at TIMESTAMPTZ,
            UNIQUE (plan_id, check_date)
        )
        "#,
    ),
    (
        "emotion_feeds",
        r#"
        CREATE TABLE IF NOT EXISTS emotion_feeds (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            student_id UUID NOT NULL REFERENCES students(id) ON DELETE CASCADE,
            emotion_type TEXT NOT NULL CHECK (emotion_type IN
                ('joy', 'sad', 'angry', 'anxious', 'calm', 'thinking', 'excited', 'tired')),
            content TEXT NOT NULL,
            image_url TEXT,
            is_visible BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "feed_reactions",
        r#"
        CREATE TABLE IF NOT EXISTS feed_reactions (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            feed_id UUID NOT NULL REFERENCES emotion_feeds(id) ON DELETE CASCADE,
            student_id UUID NOT NULL REFERENCES students(id) ON DELETE CASCADE,
            reaction_type TEXT NOT NULL CHECK (reaction_type IN
                ('heart', 'thumbsup', 'hug', 'fighting')),
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            UNIQUE (feed_id, student_id)
        )
        "#,
    ),
    (
        "idx_classes_teacher",
        "CREATE INDEX IF NOT EXISTS idx_classes_teacher ON classes(teacher_id, created_at DESC)",
    ),
    (
        "idx_student_sessions_expires",
        "CREATE INDEX IF NOT EXISTS idx_student_sessions_expires ON student_sessions(expires_at)",
    ),
    (
        "idx_plans_student_active",
        "CREATE INDEX IF NOT EXISTS idx_plans_student_active ON plans(student_id) WHERE is_active",
    ),
    (
        "idx_plan_checks_date",
        "CREATE INDEX IF NOT EXISTS idx_plan_checks_date ON plan_checks(check_date)",
    ),
    (
        "idx_emotion_feeds_student_created",
        "CREATE INDEX IF NOT EXISTS idx_emotion_feeds_student_created ON emotion_feeds(student_id, created_at DESC)",
    ),
];

/// Run all migrations in order.
pub async fn run(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running migrations...");

    for (name, statement) in STATEMENTS {
        tracing::debug!(migration = name, "applying");
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::info!(count = STATEMENTS.len(), "Migrations complete");
    Ok(())
}
