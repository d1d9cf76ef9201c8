// libs/exercise-cell/src/models.rs
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;

// ==============================================================================
// EXERCISE PROGRESS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseProgress {
    pub id: Uuid,
    pub patient_id: Uuid,
    /// Physiotherapist who owns the plan this session belongs to.
    pub physiotherapist_id: Option<Uuid>,
    pub exercise_plan_item_id: Uuid,
    pub date_completed: NaiveDate,
    #[serde(default)]
    pub completion_status: CompletionStatus,
    #[serde(default)]
    pub completed_repetitions: u32,
    #[serde(default)]
    pub completed_sets: u32,
    /// Minutes.
    #[serde(default)]
    pub actual_duration: u32,
    #[serde(default = "default_rating")]
    pub difficulty_rating: u8,
    #[serde(default)]
    pub pain_level_before: u8,
    #[serde(default)]
    pub pain_level_after: u8,
    #[serde(default = "default_rating")]
    pub energy_level: u8,
    #[serde(default = "default_rating")]
    pub mood_rating: u8,
    pub notes: Option<String>,
    #[serde(default)]
    pub side_effects: Option<String>,
    #[serde(default)]
    pub modifications_made: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ExerciseProgress {
    /// Positive when pain dropped during the session.
    pub fn pain_improvement(&self) -> i32 {
        i32::from(self.pain_level_before) - i32::from(self.pain_level_after)
    }

    pub fn counts_as_activity(&self) -> bool {
        self.completion_status.counts_as_activity()
    }
}

fn default_rating() -> u8 {
    3
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    #[default]
    Completed,
    Partial,
    Skipped,
    Modified,
}

impl CompletionStatus {
    /// Any session that was at least partly performed.
    pub fn counts_as_activity(&self) -> bool {
        !matches!(self, CompletionStatus::Skipped)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionStatus::Completed => "completed",
            CompletionStatus::Partial => "partial",
            CompletionStatus::Skipped => "skipped",
            CompletionStatus::Modified => "modified",
        }
    }
}

/// A date on which a patient performed exercise.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivityRecord {
    pub date_completed: NaiveDate,
    #[serde(default)]
    pub completion_status: CompletionStatus,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordProgressRequest {
    pub exercise_plan_item_id: Uuid,
    pub physiotherapist_id: Option<Uuid>,
    /// Defaults to today.
    pub date_completed: Option<NaiveDate>,
    #[serde(default)]
    pub completion_status: CompletionStatus,
    #[serde(default)]
    pub completed_repetitions: u32,
    #[serde(default)]
    pub completed_sets: u32,
    #[serde(default)]
    pub actual_duration: u32,
    #[serde(default = "default_rating")]
    pub difficulty_rating: u8,
    #[serde(default)]
    pub pain_level_before: u8,
    #[serde(default)]
    pub pain_level_after: u8,
    #[serde(default = "default_rating")]
    pub energy_level: u8,
    #[serde(default = "default_rating")]
    pub mood_rating: u8,
    pub notes: Option<String>,
    pub side_effects: Option<String>,
    pub modifications_made: Option<String>,
}

impl RecordProgressRequest {
    pub fn validate(&self, today: NaiveDate) -> Result<(), ExerciseError> {
        check_range("difficulty_rating", self.difficulty_rating, 1, 5)?;
        check_range("pain_level_before", self.pain_level_before, 0, 4)?;
        check_range("pain_level_after", self.pain_level_after, 0, 4)?;
        check_range("energy_level", self.energy_level, 1, 5)?;
        check_range("mood_rating", self.mood_rating, 1, 5)?;

        if let Some(date) = self.date_completed {
            if date > today {
                return Err(ExerciseError::ValidationError(
                    "date_completed cannot be in the future".to_string(),
                ));
            }
        }

        Ok(())
    }
}

fn check_range(field: &str, value: u8, min: u8, max: u8) -> Result<(), ExerciseError> {
    if value < min || value > max {
        return Err(ExerciseError::ValidationError(format!(
            "{} must be between {} and {}, got {}",
            field, min, max, value
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgressListQuery {
    pub patient_id: Option<Uuid>,
    pub completion_status: Option<CompletionStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubjectQuery {
    pub patient_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreakQuery {
    pub patient_id: Option<Uuid>,
    pub reference_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DailyAnalyticsQuery {
    pub patient_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressStats {
    pub total_sessions: usize,
    pub completed_sessions: usize,
    pub completion_rate: f64,
    pub average_difficulty_rating: f64,
    pub average_pain_before: f64,
    pub average_pain_after: f64,
    pub pain_improvement: f64,
    pub weekly_sessions: usize,
    pub monthly_sessions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreakResponse {
    pub patient_id: Uuid,
    pub reference_date: NaiveDate,
    pub current_streak: u32,
    pub max_days: u32,
}

/// Count and per-metric means for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub count: usize,
    pub means: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub aggregate: DailyAggregate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyAnalyticsResponse {
    pub patient_id: Option<Uuid>,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub total_sessions: usize,
    pub days: Vec<DailyPoint>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExerciseError {
    #[error("Progress record not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<ExerciseError> for AppError {
    fn from(err: ExerciseError) -> Self {
        let message = err.to_string();
        match err {
            ExerciseError::NotFound => AppError::NotFound(message),
            ExerciseError::ValidationError(_) => AppError::ValidationError(message),
            ExerciseError::PermissionDenied(_) => AppError::Forbidden(message),
            ExerciseError::DatabaseError(_) => AppError::Database(message),
        }
    }
}
