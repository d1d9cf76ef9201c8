// libs/exercise-cell/src/services/analytics.rs
use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::{CompletionStatus, DailyAggregate, ExerciseProgress, ProgressStats};

/// A named numeric value pulled out of a record.
pub struct Metric<T> {
    pub name: &'static str,
    pub value: fn(&T) -> f64,
}

impl<T> Metric<T> {
    pub const fn new(name: &'static str, value: fn(&T) -> f64) -> Self {
        Self { name, value }
    }
}

pub const PROGRESS_METRICS: [Metric<ExerciseProgress>; 5] = [
    Metric::new("pain_improvement", |p: &ExerciseProgress| f64::from(p.pain_improvement())),
    Metric::new("difficulty_rating", |p: &ExerciseProgress| f64::from(p.difficulty_rating)),
    Metric::new("actual_duration", |p: &ExerciseProgress| f64::from(p.actual_duration)),
    Metric::new("energy_level", |p: &ExerciseProgress| f64::from(p.energy_level)),
    Metric::new("mood_rating", |p: &ExerciseProgress| f64::from(p.mood_rating)),
];

impl DailyAggregate {
    /// A day with no records: count 0 and every mean 0.
    pub fn empty<T>(metrics: &[Metric<T>]) -> Self {
        Self {
            count: 0,
            means: metrics.iter().map(|m| (m.name.to_string(), 0.0)).collect(),
        }
    }
}

struct Accumulator {
    count: usize,
    sums: Vec<f64>,
}

/// Groups records by calendar day and averages each metric. Days come out in
/// ascending order whatever the input order.
pub fn aggregate_daily<T, F>(
    records: &[T],
    date_of: F,
    metrics: &[Metric<T>],
) -> BTreeMap<NaiveDate, DailyAggregate>
where
    F: Fn(&T) -> NaiveDate,
{
    let mut days: BTreeMap<NaiveDate, Accumulator> = BTreeMap::new();

    for record in records {
        let acc = days.entry(date_of(record)).or_insert_with(|| Accumulator {
            count: 0,
            sums: vec![0.0; metrics.len()],
        });
        acc.count += 1;
        for (sum, metric) in acc.sums.iter_mut().zip(metrics) {
            *sum += (metric.value)(record);
        }
    }

    days.into_iter()
        .map(|(date, acc)| {
            let means = metrics
                .iter()
                .zip(acc.sums)
                .map(|(metric, sum)| (metric.name.to_string(), mean(sum, acc.count)))
                .collect();
            (date, DailyAggregate { count: acc.count, means })
        })
        .collect()
}

/// Like [`aggregate_daily`] but restricted to `[from, to]` with every day of
/// the range present, including days without records.
pub fn aggregate_daily_range<T, F>(
    records: &[T],
    date_of: F,
    metrics: &[Metric<T>],
    from: NaiveDate,
    to: NaiveDate,
) -> BTreeMap<NaiveDate, DailyAggregate>
where
    F: Fn(&T) -> NaiveDate,
{
    let mut days = aggregate_daily(records, &date_of, metrics);
    days.retain(|date, _| *date >= from && *date <= to);

    let mut day = from;
    while day <= to {
        days.entry(day).or_insert_with(|| DailyAggregate::empty(metrics));
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    days
}

fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn average<F>(records: &[ExerciseProgress], value: F) -> f64
where
    F: Fn(&ExerciseProgress) -> f64,
{
    mean(records.iter().map(value).sum::<f64>(), records.len())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Summary figures over a set of sessions. Weeks start on Monday and months
/// on the 1st, both relative to `today`.
pub fn progress_stats(records: &[ExerciseProgress], today: NaiveDate) -> ProgressStats {
    let total = records.len();
    let completed = records
        .iter()
        .filter(|p| p.completion_status == CompletionStatus::Completed)
        .count();

    let avg_difficulty = average(records, |p| f64::from(p.difficulty_rating));
    let avg_pain_before = average(records, |p| f64::from(p.pain_level_before));
    let avg_pain_after = average(records, |p| f64::from(p.pain_level_after));

    let week_start = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    let week_end = week_start + Duration::days(6);
    let month_start = today.with_day(1).unwrap_or(today);

    ProgressStats {
        total_sessions: total,
        completed_sessions: completed,
        completion_rate: round2(mean(completed as f64 * 100.0, total)),
        average_difficulty_rating: round2(avg_difficulty),
        average_pain_before: round2(avg_pain_before),
        average_pain_after: round2(avg_pain_after),
        pain_improvement: round2(avg_pain_before - avg_pain_after),
        weekly_sessions: records
            .iter()
            .filter(|p| p.date_completed >= week_start && p.date_completed <= week_end)
            .count(),
        monthly_sessions: records
            .iter()
            .filter(|p| p.date_completed >= month_start)
            .count(),
    }
}
