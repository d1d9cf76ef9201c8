// libs/appointment-cell/src/services/booking.rs
use chrono::{DateTime, Duration, NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::{AppConfig, SchedulingConfig};
use shared_database::supabase::SupabaseClient;
use shared_models::auth::{AccessScope, Role, User};

use crate::models::{
    Appointment, AppointmentError, AppointmentListQuery, AppointmentStats, AppointmentStatusChange,
    AvailableSlotsResponse, BookAppointmentRequest, BookedInterval, CancelAppointmentRequest,
    CompleteAppointmentRequest, TimeInterval,
};
use crate::services::conflict::ConflictDetectionService;
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::slots::SlotPlanner;

const ACTIVE_STATUS_FILTER: &str = "status=in.(scheduled,confirmed)";
const CHRONOLOGICAL: &str = "order=date.asc,start_time.asc";

pub struct AppointmentBookingService {
    supabase: SupabaseClient,
    rules: SchedulingConfig,
    conflict_service: ConflictDetectionService,
    lifecycle_service: AppointmentLifecycleService,
    slot_planner: SlotPlanner,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            rules: config.scheduling.clone(),
            conflict_service: ConflictDetectionService::new(),
            lifecycle_service: AppointmentLifecycleService::new(&config.scheduling),
            slot_planner: SlotPlanner::new(),
        }
    }

    // ==========================================================================
    // BOOKING
    // ==========================================================================

    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
        actor: &User,
        now: DateTime<Utc>,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Booking request from {} for physiotherapist {}", actor.id, request.physiotherapist_id);

        let patient_id = self.resolve_patient(&request, actor)?;

        if request.reason.trim().is_empty() {
            return Err(AppointmentError::ValidationError("Reason is required".to_string()));
        }

        let interval = TimeInterval::new(request.start_time, request.end_time)?;
        self.lifecycle_service
            .validate_appointment_timing(request.date, &interval, now.date_naive())?;

        let booked = self
            .fetch_active_bookings(request.physiotherapist_id, request.date, auth_token)
            .await?;
        self.conflict_service.ensure_slot_free(&interval, &booked)?;

        let appointment_data = json!({
            "patient_id": patient_id,
            "physiotherapist_id": request.physiotherapist_id,
            "date": request.date,
            "start_time": request.start_time,
            "end_time": request.end_time,
            "status": "scheduled",
            "appointment_type": request.appointment_type,
            "reason": request.reason,
            "symptoms": request.symptoms,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/appointments",
            Some(auth_token),
            Some(appointment_data),
            Some(SupabaseClient::return_representation()),
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let appointment = Self::first_row(result, "Failed to create appointment")?;

        info!(
            "Appointment {} booked for patient {} with physiotherapist {} on {} {}",
            appointment.id, patient_id, appointment.physiotherapist_id, appointment.date, interval
        );

        Ok(appointment)
    }

    /// Patients book for themselves. Physiotherapists book into their own
    /// calendar and staff into anyone's; both must name the patient.
    fn resolve_patient(
        &self,
        request: &BookAppointmentRequest,
        actor: &User,
    ) -> Result<Uuid, AppointmentError> {
        let actor_id = actor.user_id().ok_or_else(|| {
            AppointmentError::PermissionDenied("Caller has no valid user id".to_string())
        })?;

        match actor.role() {
            Some(Role::Patient) => match request.patient_id {
                Some(patient_id) if patient_id != actor_id => Err(AppointmentError::PermissionDenied(
                    "Patients can only book appointments for themselves".to_string(),
                )),
                _ => Ok(actor_id),
            },
            Some(Role::Physiotherapist) if request.physiotherapist_id != actor_id => {
                Err(AppointmentError::PermissionDenied(
                    "Physiotherapists can only book into their own calendar".to_string(),
                ))
            }
            Some(Role::Physiotherapist) | Some(Role::Admin) => request.patient_id.ok_or_else(|| {
                AppointmentError::ValidationError("patient_id is required".to_string())
            }),
            None => Err(AppointmentError::PermissionDenied(
                "Unknown role cannot book appointments".to_string(),
            )),
        }
    }

    // ==========================================================================
    // QUERIES
    // ==========================================================================

    /// Fetches one appointment, hiding records outside the caller's scope.
    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        scope: &AccessScope,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let appointment = match result.into_iter().next() {
            Some(row) => Self::parse(row)?,
            None => return Err(AppointmentError::NotFound),
        };

        if !scope.permits(&appointment.patient_id, Some(&appointment.physiotherapist_id)) {
            debug!("Appointment {} is outside the caller's scope", appointment_id);
            return Err(AppointmentError::NotFound);
        }

        Ok(appointment)
    }

    pub async fn list_appointments(
        &self,
        scope: &AccessScope,
        query: &AppointmentListQuery,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut filters = Vec::new();
        if let Some(status) = query.status {
            filters.push(format!("status=eq.{}", status));
        }
        if let Some(date) = query.date {
            filters.push(format!("date=eq.{}", date));
        }
        self.fetch_scoped(scope, filters, auth_token).await
    }

    /// Active appointments that have not started yet as of `now`.
    pub async fn upcoming_appointments(
        &self,
        scope: &AccessScope,
        now: DateTime<Utc>,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let today = now.date_naive();
        let filters = vec![
            format!(
                "or=(date.gt.{},and(date.eq.{},start_time.gt.{}))",
                today,
                today,
                now.time().format("%H:%M:%S")
            ),
            ACTIVE_STATUS_FILTER.to_string(),
        ];
        self.fetch_scoped(scope, filters, auth_token).await
    }

    pub async fn todays_appointments(
        &self,
        scope: &AccessScope,
        today: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        self.fetch_scoped(scope, vec![format!("date=eq.{}", today)], auth_token).await
    }

    /// Per-status, monthly and weekly counts over the caller's appointments.
    pub async fn appointment_statistics(
        &self,
        scope: &AccessScope,
        today: NaiveDate,
        auth_token: &str,
    ) -> Result<AppointmentStats, AppointmentError> {
        let appointments = self.fetch_scoped(scope, Vec::new(), auth_token).await?;
        Ok(AppointmentStats::from_appointments(&appointments, today))
    }

    pub async fn get_available_slots(
        &self,
        physiotherapist_id: Uuid,
        date: NaiveDate,
        duration_minutes: Option<i64>,
        auth_token: &str,
    ) -> Result<AvailableSlotsResponse, AppointmentError> {
        let slot_duration_minutes = duration_minutes.unwrap_or(self.rules.slot_duration_minutes);
        if slot_duration_minutes < self.rules.min_appointment_minutes
            || slot_duration_minutes > self.rules.max_appointment_minutes
        {
            return Err(AppointmentError::ValidationError(format!(
                "duration_minutes must be between {} and {}",
                self.rules.min_appointment_minutes, self.rules.max_appointment_minutes
            )));
        }

        let booked = self.fetch_active_bookings(physiotherapist_id, date, auth_token).await?;

        let slots = self.slot_planner.compute_available_slots(
            self.rules.work_day_start,
            self.rules.work_day_end,
            Duration::minutes(slot_duration_minutes),
            &booked,
        )?;

        debug!(
            "{} open slots for physiotherapist {} on {} ({} bookings)",
            slots.len(), physiotherapist_id, date, booked.len()
        );

        Ok(AvailableSlotsResponse {
            physiotherapist_id,
            date,
            slot_duration_minutes,
            total: slots.len(),
            slots,
        })
    }

    // ==========================================================================
    // LIFECYCLE
    // ==========================================================================

    pub async fn confirm_appointment(
        &self,
        appointment_id: Uuid,
        actor: &User,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self
            .get_appointment(appointment_id, &AccessScope::for_user(actor), auth_token)
            .await?;
        let change = self.lifecycle_service.confirm(&appointment)?;
        self.apply_change(appointment_id, change, auth_token).await
    }

    pub async fn complete_appointment(
        &self,
        appointment_id: Uuid,
        actor: &User,
        outcome: CompleteAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self
            .get_appointment(appointment_id, &AccessScope::for_user(actor), auth_token)
            .await?;
        let change = self.lifecycle_service.complete(&appointment, actor, outcome)?;
        self.apply_change(appointment_id, change, auth_token).await
    }

    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        actor: &User,
        request: CancelAppointmentRequest,
        now: DateTime<Utc>,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self
            .get_appointment(appointment_id, &AccessScope::for_user(actor), auth_token)
            .await?;
        let change = self.lifecycle_service.cancel(&appointment, actor, request.reason, now)?;
        self.apply_change(appointment_id, change, auth_token).await
    }

    // ==========================================================================
    // STORAGE HELPERS
    // ==========================================================================

    /// Scheduled and confirmed bookings of a physiotherapist on a date.
    async fn fetch_active_bookings(
        &self,
        physiotherapist_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<BookedInterval>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?physiotherapist_id=eq.{}&date=eq.{}&{}&{}",
            physiotherapist_id, date, ACTIVE_STATUS_FILTER, CHRONOLOGICAL
        );
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let mut booked = Vec::with_capacity(result.len());
        for row in result {
            let appointment = Self::parse(row)?;
            match appointment.booked_interval() {
                Ok(interval) => booked.push(interval),
                Err(e) => warn!("Skipping appointment {} with unusable times: {}", appointment.id, e),
            }
        }

        Ok(booked)
    }

    async fn fetch_scoped(
        &self,
        scope: &AccessScope,
        mut filters: Vec<String>,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        if scope.is_nothing() {
            return Ok(Vec::new());
        }

        filters.extend(scope.query_filters("patient_id", "physiotherapist_id"));
        filters.push(CHRONOLOGICAL.to_string());

        let path = format!("/rest/v1/appointments?{}", filters.join("&"));
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        result.into_iter().map(Self::parse).collect()
    }

    async fn apply_change(
        &self,
        appointment_id: Uuid,
        change: AppointmentStatusChange,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let mut update_data = serde_json::to_value(&change)
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;
        if let Some(fields) = update_data.as_object_mut() {
            fields.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));
        }

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(update_data),
            Some(SupabaseClient::return_representation()),
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let updated = Self::first_row(result, "Failed to update appointment")?;
        info!("Appointment {} is now {}", updated.id, updated.status);
        Ok(updated)
    }

    fn parse(row: Value) -> Result<Appointment, AppointmentError> {
        serde_json::from_value(row)
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))
    }

    fn first_row(rows: Vec<Value>, context: &str) -> Result<Appointment, AppointmentError> {
        match rows.into_iter().next() {
            Some(row) => Self::parse(row),
            None => Err(AppointmentError::DatabaseError(context.to_string())),
        }
    }
}
