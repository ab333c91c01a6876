//! Statistics aggregation
//!
//! Every function here is a grouping/reduction pass over rows the server
//! already filtered by class, student and date window. Rates are rounded
//! whole percentages (see [`safe_rate`]).

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::EmotionType;
use crate::period::PeriodRange;

/// Active plan as seen by the aggregation passes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRef {
    pub id: Uuid,
    pub title: String,
}

/// One day's check of one plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckRecord {
    pub plan_id: Uuid,
    pub check_date: NaiveDate,
    /// `None` means the student opened the check but has not answered.
    pub is_completed: Option<bool>,
}

impl CheckRecord {
    fn counts_in(&self, range: &PeriodRange) -> bool {
        self.is_completed == Some(true) && range.contains(self.check_date)
    }
}

/// `numerator / denominator` as a rounded percentage; 0 for an empty
/// denominator. Halves round up.
pub fn safe_rate(numerator: u64, denominator: u64) -> u32 {
    if denominator == 0 {
        return 0;
    }
    ((numerator as f64 / denominator as f64) * 100.0).round() as u32
}

fn completed_by_plan(range: &PeriodRange, checks: &[CheckRecord]) -> HashMap<Uuid, u64> {
    let mut counts = HashMap::new();
    for check in checks.iter().filter(|c| c.counts_in(range)) {
        *counts.entry(check.plan_id).or_insert(0) += 1;
    }
    counts
}

// ============================================================================
// Plans
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRankEntry {
    pub title: String,
    pub completed: u64,
    pub total_possible: u64,
    pub achievement_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassOverview {
    pub range: PeriodRange,
    pub total_students: u64,
    pub total_plans: u64,
    pub average_achievement_rate: u32,
    pub plan_ranking: Vec<PlanRankEntry>,
}

/// Class-wide achievement over `range`.
///
/// Plans sharing a title (e.g. every student's "reading") are ranked as one
/// entry whose denominator is `plan_count × days`. The ranking is sorted by
/// rate, highest first; ties keep plan order.
pub fn class_overview(
    range: PeriodRange,
    student_count: u64,
    plans: &[PlanRef],
    checks: &[CheckRecord],
) -> ClassOverview {
    if student_count == 0 || plans.is_empty() {
        return ClassOverview {
            range,
            total_students: student_count,
            total_plans: 0,
            average_achievement_rate: 0,
            plan_ranking: Vec::new(),
        };
    }

    let days = u64::from(range.days);
    let completed = completed_by_plan(&range, checks);

    let mut order: Vec<(String, u64, u64)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut total_completed = 0;

    for plan in plans {
        let done = completed.get(&plan.id).copied().unwrap_or(0);
        total_completed += done;

        let slot = *index.entry(plan.title.as_str()).or_insert_with(|| {
            order.push((plan.title.clone(), 0, 0));
            order.len() - 1
        });
        order[slot].1 += 1;
        order[slot].2 += done;
    }

    let mut plan_ranking: Vec<PlanRankEntry> = order
        .into_iter()
        .map(|(title, plan_count, completed)| {
            let total_possible = plan_count * days;
            PlanRankEntry {
                title,
                completed,
                total_possible,
                achievement_rate: safe_rate(completed, total_possible),
            }
        })
        .collect();
    plan_ranking.sort_by(|a, b| b.achievement_rate.cmp(&a.achievement_rate));

    let total_plans = plans.len() as u64;
    ClassOverview {
        range,
        total_students: student_count,
        total_plans,
        average_achievement_rate: safe_rate(total_completed, total_plans * days),
        plan_ranking,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanAchievement {
    pub plan_id: Uuid,
    pub title: String,
    pub completed: u64,
    pub total_possible: u64,
    pub achievement_rate: u32,
}

/// Per-plan achievement for one student; each plan can be completed once a
/// day, so the denominator is the window length.
pub fn student_plan_stats(
    range: &PeriodRange,
    plans: &[PlanRef],
    checks: &[CheckRecord],
) -> Vec<PlanAchievement> {
    let completed = completed_by_plan(range, checks);
    let total_possible = u64::from(range.days);

    plans
        .iter()
        .map(|plan| {
            let done = completed.get(&plan.id).copied().unwrap_or(0);
            PlanAchievement {
                plan_id: plan.id,
                title: plan.title.clone(),
                completed: done,
                total_possible,
                achievement_rate: safe_rate(done, total_possible),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodaySummary {
    pub completed: u64,
    pub total: u64,
    pub achievement_rate: u32,
}

impl TodaySummary {
    pub fn new(completed: u64, total: u64) -> Self {
        Self {
            completed,
            total,
            achievement_rate: safe_rate(completed, total),
        }
    }
}

/// Summary of today's checks, one entry per active plan.
pub fn today_summary<I>(statuses: I) -> TodaySummary
where
    I: IntoIterator<Item = Option<bool>>,
{
    let (completed, total) = statuses
        .into_iter()
        .fold((0, 0), |(done, total), status| {
            (done + u64::from(status == Some(true)), total + 1)
        });
    TodaySummary::new(completed, total)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub completed: u64,
    pub total: u64,
    pub achievement_rate: u32,
}

/// One point per day of `range`: completed checks against the number of
/// active plans.
pub fn daily_trend(range: &PeriodRange, plan_count: u64, checks: &[CheckRecord]) -> Vec<DailyPoint> {
    let mut by_date: HashMap<NaiveDate, u64> = HashMap::new();
    if plan_count > 0 {
        for check in checks.iter().filter(|c| c.counts_in(range)) {
            *by_date.entry(check.check_date).or_insert(0) += 1;
        }
    }

    range
        .dates()
        .map(|date| {
            let completed = by_date.get(&date).copied().unwrap_or(0);
            DailyPoint {
                date,
                completed,
                total: plan_count,
                achievement_rate: safe_rate(completed, plan_count),
            }
        })
        .collect()
}

// ============================================================================
// Emotions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionShare {
    pub emotion_type: EmotionType,
    pub count: u64,
    pub ratio: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionDistribution {
    pub total_feeds: u64,
    pub distribution: Vec<EmotionShare>,
}

/// Build the distribution from per-emotion counts. Emotions may repeat in
/// the input; all eight appear in the output in canonical order.
pub fn emotion_distribution<I>(counts: I) -> EmotionDistribution
where
    I: IntoIterator<Item = (EmotionType, u64)>,
{
    let mut tally = [0u64; EmotionType::ALL.len()];
    for (emotion, count) in counts {
        tally[emotion.index()] += count;
    }
    let total_feeds: u64 = tally.iter().sum();

    EmotionDistribution {
        total_feeds,
        distribution: EmotionType::ALL
            .into_iter()
            .map(|emotion_type| {
                let count = tally[emotion_type.index()];
                EmotionShare {
                    emotion_type,
                    count,
                    ratio: safe_rate(count, total_feeds),
                }
            })
            .collect(),
    }
}

// ============================================================================
// Student snapshot
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSnapshot {
    pub today: TodaySummary,
    pub plans: Vec<PlanAchievement>,
    pub emotions: EmotionDistribution,
}

/// Everything a teacher sees on one student's card: today's progress, plan
/// achievement over the window and the emotion mix.
pub fn student_snapshot<I>(
    range: &PeriodRange,
    plans: &[PlanRef],
    checks: &[CheckRecord],
    emotion_counts: I,
) -> StudentSnapshot
where
    I: IntoIterator<Item = (EmotionType, u64)>,
{
    let today_completed = checks
        .iter()
        .filter(|c| c.check_date == range.end_date && c.is_completed == Some(true))
        .count() as u64;

    StudentSnapshot {
        today: TodaySummary::new(today_completed, plans.len() as u64),
        plans: student_plan_stats(range, plans, checks),
        emotions: emotion_distribution(emotion_counts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Period;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn plan(title: &str) -> PlanRef {
        PlanRef {
            id: Uuid::new_v4(),
            title: title.to_owned(),
        }
    }

    fn done(plan: &PlanRef, date: &str) -> CheckRecord {
        CheckRecord {
            plan_id: plan.id,
            check_date: day(date),
            is_completed: Some(true),
        }
    }

    fn week() -> PeriodRange {
        PeriodRange::ending(Period::Week, day("2024-03-10"))
    }

    #[test]
    fn safe_rate_rounding() {
        assert_eq!(safe_rate(0, 0), 0);
        assert_eq!(safe_rate(1, 3), 33);
        assert_eq!(safe_rate(2, 3), 67);
        assert_eq!(safe_rate(1, 8), 13);
        assert_eq!(safe_rate(7, 7), 100);
    }

    #[test]
    fn overview_groups_titles_and_ranks() {
        let reading_a = plan("reading");
        let reading_b = plan("reading");
        let running = plan("running");
        let plans = vec![running.clone(), reading_a.clone(), reading_b.clone()];

        let mut checks = vec![done(&running, "2024-03-10")];
        for date in ["2024-03-04", "2024-03-05", "2024-03-06", "2024-03-07"] {
            checks.push(done(&reading_a, date));
            checks.push(done(&reading_b, date));
        }
        // unanswered and out-of-window checks do not count
        checks.push(CheckRecord {
            plan_id: running.id,
            check_date: day("2024-03-09"),
            is_completed: None,
        });
        checks.push(done(&running, "2024-03-01"));

        let overview = class_overview(week(), 2, &plans, &checks);
        assert_eq!(overview.total_students, 2);
        assert_eq!(overview.total_plans, 3);
        // 9 completed of 3 plans * 7 days
        assert_eq!(overview.average_achievement_rate, 43);

        assert_eq!(overview.plan_ranking.len(), 2);
        assert_eq!(overview.plan_ranking[0].title, "reading");
        assert_eq!(overview.plan_ranking[0].completed, 8);
        assert_eq!(overview.plan_ranking[0].total_possible, 14);
        assert_eq!(overview.plan_ranking[0].achievement_rate, 57);
        assert_eq!(overview.plan_ranking[1].title, "running");
        assert_eq!(overview.plan_ranking[1].achievement_rate, 14);
    }

    #[test]
    fn overview_ties_keep_plan_order() {
        let a = plan("a");
        let b = plan("b");
        let overview = class_overview(week(), 1, &[a, b], &[]);
        let titles: Vec<_> = overview.plan_ranking.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["a", "b"]);
    }

    #[test]
    fn overview_without_students_or_plans() {
        let empty = class_overview(week(), 0, &[plan("x")], &[]);
        assert_eq!(empty.total_students, 0);
        assert_eq!(empty.total_plans, 0);
        assert!(empty.plan_ranking.is_empty());

        let no_plans = class_overview(week(), 4, &[], &[]);
        assert_eq!(no_plans.total_students, 4);
        assert_eq!(no_plans.average_achievement_rate, 0);
    }

    #[test]
    fn student_plans_use_window_length() {
        let p = plan("stretch");
        let checks = vec![done(&p, "2024-03-09"), done(&p, "2024-03-10")];
        let stats = student_plan_stats(&week(), &[p.clone()], &checks);
        assert_eq!(stats[0].plan_id, p.id);
        assert_eq!(stats[0].completed, 2);
        assert_eq!(stats[0].total_possible, 7);
        assert_eq!(stats[0].achievement_rate, 29);
    }

    #[test]
    fn trend_has_one_point_per_day() {
        let p = plan("x");
        let q = plan("y");
        let checks = vec![done(&p, "2024-03-10"), done(&q, "2024-03-10"), done(&p, "2024-03-08")];
        let points = daily_trend(&week(), 2, &checks);
        assert_eq!(points.len(), 7);
        assert_eq!(points[0].date, day("2024-03-04"));
        assert_eq!(points[6].completed, 2);
        assert_eq!(points[6].achievement_rate, 100);
        assert_eq!(points[4].achievement_rate, 50);
        assert_eq!(points[5].completed, 0);
    }

    #[test]
    fn trend_without_plans_is_zero() {
        let points = daily_trend(&week(), 0, &[]);
        assert_eq!(points.len(), 7);
        assert!(points.iter().all(|p| p.total == 0 && p.achievement_rate == 0));
    }

    #[test]
    fn distribution_lists_every_emotion() {
        let dist = emotion_distribution([
            (EmotionType::Joy, 3),
            (EmotionType::Tired, 1),
            (EmotionType::Joy, 1),
        ]);
        assert_eq!(dist.total_feeds, 5);
        assert_eq!(dist.distribution.len(), 8);
        assert_eq!(dist.distribution[0].emotion_type, EmotionType::Joy);
        assert_eq!(dist.distribution[0].count, 4);
        assert_eq!(dist.distribution[0].ratio, 80);
        assert_eq!(dist.distribution[7].ratio, 20);
        assert_eq!(dist.distribution[1].ratio, 0);
    }

    #[test]
    fn empty_distribution() {
        let dist = emotion_distribution(std::iter::empty());
        assert_eq!(dist.total_feeds, 0);
        assert!(dist.distribution.iter().all(|s| s.count == 0 && s.ratio == 0));
    }

    #[test]
    fn snapshot_today_uses_end_date() {
        let p = plan("x");
        let q = plan("y");
        let checks = vec![done(&p, "2024-03-10"), done(&q, "2024-03-09")];
        let snap = student_snapshot(&week(), &[p, q], &checks, [(EmotionType::Calm, 2)]);
        assert_eq!(snap.today, TodaySummary::new(1, 2));
        assert_eq!(snap.today.achievement_rate, 50);
        assert_eq!(snap.plans.len(), 2);
        assert_eq!(snap.emotions.total_feeds, 2);
    }

    #[test]
    fn today_summary_counts_only_true() {
        let summary = today_summary([Some(true), Some(false), None, Some(true)]);
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.achievement_rate, 50);
        assert_eq!(today_summary(std::iter::empty()).achievement_rate, 0);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(TodaySummary::new(1, 4)).unwrap();
        assert_eq!(json["achievementRate"], 25);
    }
}
