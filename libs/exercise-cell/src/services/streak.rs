// libs/exercise-cell/src/services/streak.rs
use std::collections::HashSet;

use chrono::NaiveDate;

pub const DEFAULT_MAX_STREAK_DAYS: u32 = 365;

/// Counts consecutive activity days ending at a reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakCalculator {
    max_days: u32,
}

impl Default for StreakCalculator {
    fn default() -> Self {
        Self { max_days: DEFAULT_MAX_STREAK_DAYS }
    }
}

impl StreakCalculator {
    pub fn new(max_days: u32) -> Self {
        Self { max_days }
    }

    pub fn max_days(&self) -> u32 {
        self.max_days
    }

    /// Walks backward from `reference` one day at a time and stops at the first
    /// day without activity. A missing `reference` day gives 0. The walk never
    /// exceeds `max_days` steps.
    pub fn compute_streak<I>(&self, reference: NaiveDate, activity_dates: I) -> u32
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let days: HashSet<NaiveDate> = activity_dates.into_iter().collect();

        let mut streak = 0;
        let mut day = reference;
        while streak < self.max_days && days.contains(&day) {
            streak += 1;
            day = match day.pred_opt() {
                Some(previous) => previous,
                None => break,
            };
        }

        streak
    }
}
