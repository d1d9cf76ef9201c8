use chrono::{Duration, NaiveDate};

use exercise_cell::services::streak::StreakCalculator;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 3, 15).unwrap()
}

fn days_ago(n: i64) -> NaiveDate {
    today() - Duration::days(n)
}

#[test]
fn test_three_consecutive_days() {
    let calculator = StreakCalculator::default();
    assert_eq!(calculator.compute_streak(today(), vec![today(), days_ago(1), days_ago(2)]), 3);
}

#[test]
fn test_missing_reference_day_breaks_streak() {
    let calculator = StreakCalculator::default();
    assert_eq!(calculator.compute_streak(today(), vec![days_ago(1)]), 0);
    assert_eq!(calculator.compute_streak(today(), Vec::new()), 0);
}

#[test]
fn test_gap_stops_the_walk() {
    let calculator = StreakCalculator::default();
    let dates = vec![today(), days_ago(1), days_ago(3), days_ago(4), days_ago(5)];
    assert_eq!(calculator.compute_streak(today(), dates), 2);
}

#[test]
fn test_order_and_duplicates_do_not_matter() {
    let calculator = StreakCalculator::default();
    let dates = vec![days_ago(2), today(), days_ago(1), today(), days_ago(2)];
    assert_eq!(calculator.compute_streak(today(), dates), 3);
}

#[test]
fn test_future_dates_are_ignored() {
    let calculator = StreakCalculator::default();
    let dates = vec![today() + Duration::days(1), today()];
    assert_eq!(calculator.compute_streak(today(), dates), 1);
}

#[test]
fn test_streak_is_capped() {
    let every_day: Vec<NaiveDate> = (0..1000).map(days_ago).collect();

    assert_eq!(StreakCalculator::default().compute_streak(today(), every_day.clone()), 365);
    assert_eq!(StreakCalculator::new(30).compute_streak(today(), every_day.clone()), 30);
    assert_eq!(StreakCalculator::new(2000).compute_streak(today(), every_day), 1000);
}

#[test]
fn test_walk_stops_at_earliest_representable_date() {
    let calculator = StreakCalculator::new(10);
    assert_eq!(calculator.compute_streak(NaiveDate::MIN, vec![NaiveDate::MIN]), 1);
}
