// libs/exercise-cell/src/services/progress.rs
use chrono::{Duration, NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::{AccessScope, Role, User};

use crate::models::{
    ActivityRecord, DailyAnalyticsResponse, DailyPoint, ExerciseError, ExerciseProgress,
    ProgressListQuery, ProgressStats, RecordProgressRequest, StreakResponse,
};
use crate::services::analytics::{aggregate_daily_range, progress_stats, PROGRESS_METRICS};
use crate::services::streak::StreakCalculator;

const DEFAULT_ANALYTICS_DAYS: i64 = 30;
const MAX_ANALYTICS_DAYS: i64 = 366;
const NEWEST_FIRST: &str = "order=date_completed.desc,created_at.desc";

pub struct ExerciseProgressService {
    supabase: SupabaseClient,
    streak_calculator: StreakCalculator,
}

impl ExerciseProgressService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            streak_calculator: StreakCalculator::new(config.scheduling.streak_max_days),
        }
    }

    pub async fn list_progress(
        &self,
        user: &User,
        query: &ProgressListQuery,
        auth_token: &str,
    ) -> Result<Vec<ExerciseProgress>, ExerciseError> {
        let Some(mut filters) = Self::subject_filters(user, query.patient_id)? else {
            return Ok(Vec::new());
        };

        if let Some(status) = query.completion_status {
            filters.push(format!("completion_status=eq.{}", status.as_str()));
        }
        if let Some(from) = query.from {
            filters.push(format!("date_completed=gte.{}", from));
        }
        if let Some(to) = query.to {
            filters.push(format!("date_completed=lte.{}", to));
        }

        self.fetch_progress(filters, auth_token).await
    }

    pub async fn get_progress(
        &self,
        user: &User,
        progress_id: Uuid,
        auth_token: &str,
    ) -> Result<ExerciseProgress, ExerciseError> {
        let path = format!("/rest/v1/exercise_progress?id=eq.{}", progress_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| ExerciseError::DatabaseError(e.to_string()))?;

        let progress = match result.into_iter().next() {
            Some(row) => Self::parse(row)?,
            None => return Err(ExerciseError::NotFound),
        };

        let scope = AccessScope::for_user(user);
        if !scope.permits(&progress.patient_id, progress.physiotherapist_id.as_ref()) {
            return Err(ExerciseError::NotFound);
        }

        Ok(progress)
    }

    /// Patients log their own sessions; nobody else may write progress.
    pub async fn record_progress(
        &self,
        user: &User,
        request: RecordProgressRequest,
        today: NaiveDate,
        auth_token: &str,
    ) -> Result<ExerciseProgress, ExerciseError> {
        let patient_id = match (user.role(), user.user_id()) {
            (Some(Role::Patient), Some(id)) => id,
            _ => {
                return Err(ExerciseError::PermissionDenied(
                    "Only patients can record exercise progress".to_string(),
                ))
            }
        };

        request.validate(today)?;

        let now = Utc::now();
        let progress_data = json!({
            "patient_id": patient_id,
            "physiotherapist_id": request.physiotherapist_id,
            "exercise_plan_item_id": request.exercise_plan_item_id,
            "date_completed": request.date_completed.unwrap_or(today),
            "completion_status": request.completion_status,
            "completed_repetitions": request.completed_repetitions,
            "completed_sets": request.completed_sets,
            "actual_duration": request.actual_duration,
            "difficulty_rating": request.difficulty_rating,
            "pain_level_before": request.pain_level_before,
            "pain_level_after": request.pain_level_after,
            "energy_level": request.energy_level,
            "mood_rating": request.mood_rating,
            "notes": request.notes,
            "side_effects": request.side_effects,
            "modifications_made": request.modifications_made,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/exercise_progress",
            Some(auth_token),
            Some(progress_data),
            Some(SupabaseClient::return_representation()),
        ).await.map_err(|e| ExerciseError::DatabaseError(e.to_string()))?;

        let progress = match result.into_iter().next() {
            Some(row) => Self::parse(row)?,
            None => return Err(ExerciseError::DatabaseError("Failed to record progress".to_string())),
        };

        info!("Patient {} recorded progress {} for {}", patient_id, progress.id, progress.date_completed);
        Ok(progress)
    }

    pub async fn progress_stats(
        &self,
        user: &User,
        patient_id: Option<Uuid>,
        today: NaiveDate,
        auth_token: &str,
    ) -> Result<ProgressStats, ExerciseError> {
        let records = match Self::subject_filters(user, patient_id)? {
            Some(filters) => self.fetch_progress(filters, auth_token).await?,
            None => Vec::new(),
        };

        Ok(progress_stats(&records, today))
    }

    /// Consecutive days up to `reference_date` on which the patient exercised.
    /// Skipped sessions do not count.
    pub async fn current_streak(
        &self,
        user: &User,
        patient_id: Option<Uuid>,
        reference_date: NaiveDate,
        auth_token: &str,
    ) -> Result<StreakResponse, ExerciseError> {
        let requested = patient_id;
        let patient_id = Self::subject(user, requested)
            .ok_or_else(|| ExerciseError::ValidationError("patient_id is required".to_string()))?;

        let Some(mut filters) = Self::subject_filters(user, requested.or(Some(patient_id)))? else {
            return Err(ExerciseError::PermissionDenied("No access to exercise records".to_string()));
        };

        let window_start = reference_date
            .checked_sub_signed(Duration::days(i64::from(self.streak_calculator.max_days())))
            .ok_or_else(|| {
                ExerciseError::ValidationError(format!("reference_date {} is out of range", reference_date))
            })?;
        filters.push("select=date_completed,completion_status".to_string());
        filters.push("completion_status=neq.skipped".to_string());
        filters.push(format!("date_completed=lte.{}", reference_date));
        filters.push(format!("date_completed=gt.{}", window_start));

        let path = format!("/rest/v1/exercise_progress?{}", filters.join("&"));
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| ExerciseError::DatabaseError(e.to_string()))?;

        let records: Vec<ActivityRecord> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<_, _>>()
            .map_err(|e| ExerciseError::DatabaseError(format!("Failed to parse activity: {}", e)))?;

        let current_streak = self.streak_calculator.compute_streak(
            reference_date,
            records
                .iter()
                .filter(|r| r.completion_status.counts_as_activity())
                .map(|r| r.date_completed),
        );

        debug!("Patient {} has a {} day streak at {}", patient_id, current_streak, reference_date);

        Ok(StreakResponse {
            patient_id,
            reference_date,
            current_streak,
            max_days: self.streak_calculator.max_days(),
        })
    }

    /// Daily rollup of performed sessions over `[from, to]`, one entry per day.
    /// Defaults to the 30 days ending today.
    pub async fn daily_analytics(
        &self,
        user: &User,
        patient_id: Option<Uuid>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        today: NaiveDate,
        auth_token: &str,
    ) -> Result<DailyAnalyticsResponse, ExerciseError> {
        let to = to.unwrap_or(today);
        let from = match from {
            Some(from) => from,
            None => to
                .checked_sub_signed(Duration::days(DEFAULT_ANALYTICS_DAYS - 1))
                .ok_or_else(|| ExerciseError::ValidationError(format!("to {} is out of range", to)))?,
        };

        if from > to {
            return Err(ExerciseError::ValidationError("from must not be after to".to_string()));
        }
        if (to - from).num_days() >= MAX_ANALYTICS_DAYS {
            return Err(ExerciseError::ValidationError(format!(
                "Date range cannot exceed {} days",
                MAX_ANALYTICS_DAYS
            )));
        }

        let records = match Self::subject_filters(user, patient_id)? {
            Some(mut filters) => {
                filters.push("completion_status=neq.skipped".to_string());
                filters.push(format!("date_completed=gte.{}", from));
                filters.push(format!("date_completed=lte.{}", to));
                self.fetch_progress(filters, auth_token).await?
            }
            None => Vec::new(),
        };

        let performed: Vec<ExerciseProgress> =
            records.into_iter().filter(|p| p.counts_as_activity()).collect();

        let days = aggregate_daily_range(&performed, |p| p.date_completed, &PROGRESS_METRICS, from, to)
            .into_iter()
            .map(|(date, aggregate)| DailyPoint { date, aggregate })
            .collect();

        Ok(DailyAnalyticsResponse {
            patient_id: Self::subject(user, patient_id),
            from,
            to,
            total_sessions: performed.len(),
            days,
        })
    }

    /// The patient a per-subject query is about: patients always mean themselves.
    fn subject(user: &User, patient_id: Option<Uuid>) -> Option<Uuid> {
        match user.role() {
            Some(Role::Patient) => user.user_id(),
            _ => patient_id,
        }
    }

    /// PostgREST filters limiting a query to what `user` may read, narrowed to
    /// one patient when asked. `None` means the user can read nothing.
    fn subject_filters(
        user: &User,
        patient_id: Option<Uuid>,
    ) -> Result<Option<Vec<String>>, ExerciseError> {
        let scope = AccessScope::for_user(user);

        match (&scope, patient_id) {
            (AccessScope::Nothing, _) => Ok(None),
            (AccessScope::OwnRecords(own), Some(requested)) if *own != requested => {
                Err(ExerciseError::PermissionDenied(
                    "Patients can only view their own progress".to_string(),
                ))
            }
            (AccessScope::OwnRecords(_), _) => {
                Ok(Some(scope.query_filters("patient_id", "physiotherapist_id")))
            }
            (_, requested) => {
                let mut filters = scope.query_filters("patient_id", "physiotherapist_id");
                if let Some(id) = requested {
                    filters.push(format!("patient_id=eq.{}", id));
                }
                Ok(Some(filters))
            }
        }
    }

    async fn fetch_progress(
        &self,
        mut filters: Vec<String>,
        auth_token: &str,
    ) -> Result<Vec<ExerciseProgress>, ExerciseError> {
        filters.push(NEWEST_FIRST.to_string());
        let path = format!("/rest/v1/exercise_progress?{}", filters.join("&"));

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| ExerciseError::DatabaseError(e.to_string()))?;

        result.into_iter().map(Self::parse).collect()
    }

    fn parse(row: Value) -> Result<ExerciseProgress, ExerciseError> {
        serde_json::from_value(row)
            .map_err(|e| ExerciseError::DatabaseError(format!("Failed to parse progress: {}", e)))
    }
}
