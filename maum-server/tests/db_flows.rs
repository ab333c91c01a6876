//! Repository flows against a real PostgreSQL.
//!
//! Run with: DATABASE_URL=postgres://... cargo test -p maum-server -- --ignored

use chrono::{Duration, Utc};
use maum_core::credentials::hash_token;
use maum_core::models::{NewClass, NewFeed, NewPlan, NewStudent};
use maum_core::period::{day_bounds, today_utc};
use maum_core::{EmotionType, ReactionType};
use maum_server::auth::{student, SessionError};
use maum_server::db::repos::*;
use maum_server::{create_pool, migrations};
use sqlx::PgPool;
use uuid::Uuid;

async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let pool = create_pool(&url).await.expect("pool creation failed");
    migrations::run(&pool).await.expect("migrations failed");
    pool
}

/// A fresh teacher with one class and two students.
async fn classroom(pool: &PgPool) -> (Class, Student, Student) {
    let teacher = TeacherRepo::new(pool)
        .upsert_profile(Uuid::new_v4(), "Ms. Park")
        .await
        .unwrap();
    let class = ClassRepo::new(pool)
        .create(
            teacher.id,
            &NewClass {
                class_name: "Sunflowers".into(),
                grade: 3,
                section: 2,
            },
        )
        .await
        .unwrap();

    let students = StudentRepo::new(pool);
    let first = students
        .create(
            class.id,
            &NewStudent {
                name: "Minji".into(),
                student_number: 1,
                pin_code: "1234".into(),
            },
        )
        .await
        .unwrap();
    let second = students
        .create(
            class.id,
            &NewStudent {
                name: "Jisoo".into(),
                student_number: 2,
                pin_code: "5678".into(),
            },
        )
        .await
        .unwrap();

    (class, first, second)
}

#[tokio::test]
#[ignore = "requires database"]
async fn duplicate_student_number_conflicts() {
    let pool = pool().await;
    let (class, _, _) = classroom(&pool).await;

    let err = StudentRepo::new(&pool)
        .create(
            class.id,
            &NewStudent {
                name: "Other".into(),
                student_number: 1,
                pin_code: "0000".into(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Conflict(_)));
}

#[tokio::test]
#[ignore = "requires database"]
async fn shared_names_are_ambiguous() {
    let pool = pool().await;
    let (class, _, _) = classroom(&pool).await;
    let students = StudentRepo::new(&pool);
    students
        .create(
            class.id,
            &NewStudent {
                name: "Minji".into(),
                student_number: 3,
                pin_code: "4321".into(),
            },
        )
        .await
        .unwrap();

    assert_eq!(students.find_by_name(class.id, "Minji").await.unwrap().len(), 2);
    assert_eq!(students.find_by_name(class.id, "Jisoo").await.unwrap().len(), 1);

    let by_pin = students
        .find_by_number_and_pin(class.id, 3, "4321")
        .await
        .unwrap();
    assert_eq!(by_pin.map(|s| s.student_number), Some(3));
    assert!(students
        .find_by_number_and_pin(class.id, 3, "9999")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
#[ignore = "requires database"]
async fn active_plan_limit() {
    let pool = pool().await;
    let (_, student, _) = classroom(&pool).await;
    let plans = PlanRepo::new(&pool);

    let mut created = Vec::new();
    for i in 0..5 {
        let plan = plans
            .create_within_limit(student.id, &NewPlan { title: format!("plan {}", i) }, 5)
            .await
            .unwrap();
        created.push(plan);
    }

    let err = plans
        .create_within_limit(student.id, &NewPlan { title: "sixth".into() }, 5)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::LimitExceeded { limit: 5, .. }));

    plans.archive(created[0].id, student.id).await.unwrap();
    plans
        .create_within_limit(student.id, &NewPlan { title: "sixth".into() }, 5)
        .await
        .unwrap();

    assert!(matches!(
        plans.archive(created[0].id, student.id).await,
        Err(DbError::NotFound { .. })
    ));
}

#[tokio::test]
#[ignore = "requires database"]
async fn daily_feed_limit() {
    let pool = pool().await;
    let (_, student, _) = classroom(&pool).await;
    let feeds = FeedRepo::new(&pool);
    let feed = NewFeed {
        emotion_type: EmotionType::Calm,
        content: "quiet morning".into(),
        image_url: None,
    };
    let today = day_bounds(today_utc());

    for _ in 0..3 {
        feeds
            .create_within_daily_limit(student.id, &feed, 3, today)
            .await
            .unwrap();
    }
    let err = feeds
        .create_within_daily_limit(student.id, &feed, 3, today)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::LimitExceeded { limit: 3, .. }));
}

#[tokio::test]
#[ignore = "requires database"]
async fn reactions_replace_and_board_lists_them() {
    let pool = pool().await;
    let (class, author, reader) = classroom(&pool).await;
    let feeds = FeedRepo::new(&pool);
    let feed = feeds
        .create_within_daily_limit(
            author.id,
            &NewFeed {
                emotion_type: EmotionType::Joy,
                content: "won the relay".into(),
                image_url: Some("https://img.example/relay.png".into()),
            },
            3,
            day_bounds(today_utc()),
        )
        .await
        .unwrap();

    let reactions = ReactionRepo::new(&pool);
    reactions.upsert(feed.id, reader.id, ReactionType::Heart).await.unwrap();
    reactions.upsert(feed.id, reader.id, ReactionType::Hug).await.unwrap();

    let board = feeds
        .list_for_class_day(class.id, day_bounds(today_utc()))
        .await
        .unwrap();
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].author_name, "Minji");
    assert_eq!(board[0].reactions.len(), 1);
    assert_eq!(board[0].reactions[0].reaction_type, ReactionType::Hug);

    feeds.set_visibility(feed.id, false).await.unwrap();
    assert!(feeds
        .list_for_class_day(class.id, day_bounds(today_utc()))
        .await
        .unwrap()
        .is_empty());

    let owner = feeds.get_owner(feed.id).await.unwrap();
    assert_eq!(owner.class_id, class.id);
    assert_eq!(owner.teacher_id, class.teacher_id);

    assert!(reactions.delete(feed.id, reader.id).await.unwrap());
    assert!(!reactions.delete(feed.id, reader.id).await.unwrap());
}

#[tokio::test]
#[ignore = "requires database"]
async fn check_upsert_stamps_only_completion() {
    let pool = pool().await;
    let (_, student, _) = classroom(&pool).await;
    let plan = PlanRepo::new(&pool)
        .create_within_limit(student.id, &NewPlan { title: "read".into() }, 5)
        .await
        .unwrap();
    let checks = CheckRepo::new(&pool);
    let today = today_utc();

    let done = checks.upsert(plan.id, today, Some(true), Utc::now()).await.unwrap();
    assert_eq!(done.is_completed, Some(true));
    assert!(done.checked_at.is_some());

    let cleared = checks.upsert(plan.id, today, None, Utc::now()).await.unwrap();
    assert_eq!(cleared.id, done.id);
    assert_eq!(cleared.is_completed, None);
    assert!(cleared.checked_at.is_none());

    checks.upsert(plan.id, today, Some(true), Utc::now()).await.unwrap();
    let records = checks
        .completed_in_range(&[plan.id], today - Duration::days(6), today)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);

    let today_plans = PlanRepo::new(&pool)
        .today_with_checks(student.id, today)
        .await
        .unwrap();
    assert_eq!(today_plans.len(), 1);
    assert_eq!(today_plans[0].is_completed, Some(true));
}

#[tokio::test]
#[ignore = "requires database"]
async fn student_sessions_expire_and_prune() {
    let pool = pool().await;
    let (class, student, _) = classroom(&pool).await;

    let issued = student::create(&pool, student.id, 14).await.unwrap();
    let session = student::resolve(&pool, Some(&issued.token), Utc::now()).await.unwrap();
    assert_eq!(session.student_id, student.id);
    assert_eq!(session.class_id, class.id);
    assert_eq!(session.class_code, class.class_code);

    // Past expiry: rejected once, then gone
    let stale = "stale-token";
    SessionRepo::new(&pool)
        .create(student.id, &hash_token(stale), Utc::now() - Duration::minutes(1))
        .await
        .unwrap();
    assert!(matches!(
        student::resolve(&pool, Some(stale), Utc::now()).await,
        Err(SessionError::Expired)
    ));
    assert!(matches!(
        student::resolve(&pool, Some(stale), Utc::now()).await,
        Err(SessionError::Invalid)
    ));

    let pruned = SessionRepo::new(&pool)
        .prune_expired(Utc::now() + Duration::days(15))
        .await
        .unwrap();
    assert!(pruned >= 1);
    assert!(matches!(
        student::resolve(&pool, Some(&issued.token), Utc::now()).await,
        Err(SessionError::Invalid)
    ));
}

#[tokio::test]
#[ignore = "requires database"]
async fn emotion_counts_group_visible_feeds() {
    let pool = pool().await;
    let (class, first, second) = classroom(&pool).await;
    let feeds = FeedRepo::new(&pool);
    let today = day_bounds(today_utc());

    for (student, emotion) in [
        (&first, EmotionType::Joy),
        (&first, EmotionType::Joy),
        (&second, EmotionType::Tired),
    ] {
        feeds
            .create_within_daily_limit(
                student.id,
                &NewFeed {
                    emotion_type: emotion,
                    content: "today".into(),
                    image_url: None,
                },
                3,
                today,
            )
            .await
            .unwrap();
    }

    let mut class_counts = feeds
        .emotion_counts_for_class(class.id, today.0, today.1)
        .await
        .unwrap();
    class_counts.sort_by_key(|(e, _)| e.index());
    assert_eq!(class_counts, vec![(EmotionType::Joy, 2), (EmotionType::Tired, 1)]);

    let student_counts = feeds
        .emotion_counts_for_student(second.id, today.0, today.1)
        .await
        .unwrap();
    assert_eq!(student_counts, vec![(EmotionType::Tired, 1)]);
}

#[tokio::test]
#[ignore = "requires database"]
async fn ownership_is_scoped_to_owner() {
    let pool = pool().await;
    let (class, student, classmate) = classroom(&pool).await;
    let (_, other_student, _) = classroom(&pool).await;

    let stranger = Uuid::new_v4();
    let classes = ClassRepo::new(&pool);
    assert!(classes.owned_by(class.id, class.teacher_id).await.unwrap().is_some());
    assert!(classes.owned_by(class.id, stranger).await.unwrap().is_none());

    let students = StudentRepo::new(&pool);
    assert!(students
        .owned_by_teacher(student.id, class.teacher_id)
        .await
        .unwrap()
        .is_some());
    assert!(students
        .owned_by_teacher(other_student.id, class.teacher_id)
        .await
        .unwrap()
        .is_none());

    let plans = PlanRepo::new(&pool);
    let plan = plans
        .create_within_limit(student.id, &NewPlan { title: "read".into() }, 5)
        .await
        .unwrap();
    assert!(matches!(
        plans.archive(plan.id, classmate.id).await,
        Err(DbError::NotFound { .. })
    ));
    assert!(matches!(
        plans.get_active_owned(plan.id, classmate.id).await,
        Err(DbError::NotFound { .. })
    ));
    plans.archive(plan.id, student.id).await.unwrap();
}
