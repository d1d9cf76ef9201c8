// libs/appointment-cell/src/services/lifecycle.rs
use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::{debug, info, warn};

use shared_config::SchedulingConfig;
use shared_models::auth::User;

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, AppointmentStatusChange,
    CompleteAppointmentRequest, TimeInterval,
};

/// Status guards for appointments. Every method is pure: it inspects an
/// appointment and either rejects the action or returns the fields to write.
pub struct AppointmentLifecycleService {
    cancellation_lead: Duration,
    min_duration: Duration,
    max_duration: Duration,
    work_day: Option<TimeInterval>,
}

impl AppointmentLifecycleService {
    pub fn new(rules: &SchedulingConfig) -> Self {
        Self {
            cancellation_lead: Duration::hours(rules.cancellation_lead_hours),
            min_duration: Duration::minutes(rules.min_appointment_minutes),
            max_duration: Duration::minutes(rules.max_appointment_minutes),
            work_day: TimeInterval::new(rules.work_day_start, rules.work_day_end).ok(),
        }
    }

    /// Validates the time window of a new booking against the clinic's rules.
    pub fn validate_appointment_timing(
        &self,
        date: NaiveDate,
        interval: &TimeInterval,
        today: NaiveDate,
    ) -> Result<(), AppointmentError> {
        let duration = interval.duration();

        if duration < self.min_duration {
            return Err(AppointmentError::ValidationError(format!(
                "Appointment must be at least {} minutes long",
                self.min_duration.num_minutes()
            )));
        }

        if duration > self.max_duration {
            return Err(AppointmentError::ValidationError(format!(
                "Appointment cannot be longer than {} minutes",
                self.max_duration.num_minutes()
            )));
        }

        if date < today {
            return Err(AppointmentError::ValidationError(
                "Appointment date cannot be in the past".to_string(),
            ));
        }

        if let Some(work_day) = &self.work_day {
            if !work_day.contains(interval) {
                return Err(AppointmentError::ValidationError(format!(
                    "Appointment {} falls outside working hours {}",
                    interval, work_day
                )));
            }
        }

        Ok(())
    }

    /// `scheduled -> confirmed`. Any other source state is rejected.
    pub fn confirm(&self, appointment: &Appointment) -> Result<AppointmentStatusChange, AppointmentError> {
        debug!("Confirming appointment {} (status {})", appointment.id, appointment.status);

        if !appointment.status.can_transition_to(AppointmentStatus::Confirmed) {
            warn!("Rejected confirm of appointment {} in status {}", appointment.id, appointment.status);
            return Err(AppointmentError::InvalidStateTransition {
                action: "confirm",
                status: appointment.status,
            });
        }

        Ok(AppointmentStatusChange::to(AppointmentStatus::Confirmed))
    }

    /// Marks an appointment completed and records the treatment outcome.
    /// Only the assigned physiotherapist or staff may do this.
    pub fn complete(
        &self,
        appointment: &Appointment,
        actor: &User,
        outcome: CompleteAppointmentRequest,
    ) -> Result<AppointmentStatusChange, AppointmentError> {
        let is_assigned = actor.user_id() == Some(appointment.physiotherapist_id);
        if !is_assigned && !actor.is_admin() {
            return Err(AppointmentError::PermissionDenied(
                "Only the assigned physiotherapist can complete this appointment".to_string(),
            ));
        }

        if !appointment.status.can_transition_to(AppointmentStatus::Completed) {
            return Err(AppointmentError::InvalidStateTransition {
                action: "complete",
                status: appointment.status,
            });
        }

        info!("Appointment {} completed by {}", appointment.id, actor.id);

        Ok(AppointmentStatusChange {
            notes: outcome.notes,
            treatment_plan: outcome.treatment_plan,
            prescription: outcome.prescription,
            ..AppointmentStatusChange::to(AppointmentStatus::Completed)
        })
    }

    /// True when the appointment is still active and starts strictly more than
    /// the lead time after `now`. Appointment times are treated as UTC.
    pub fn can_be_cancelled(&self, appointment: &Appointment, now: DateTime<Utc>) -> bool {
        let Some(deadline) = now.checked_add_signed(self.cancellation_lead) else {
            return false;
        };

        appointment.status.can_transition_to(AppointmentStatus::Cancelled)
            && appointment.starts_at() > deadline.naive_utc()
    }

    pub fn cancel(
        &self,
        appointment: &Appointment,
        actor: &User,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<AppointmentStatusChange, AppointmentError> {
        if !appointment.status.can_transition_to(AppointmentStatus::Cancelled) {
            return Err(AppointmentError::NotCancellable(format!(
                "appointment is already {}",
                appointment.status
            )));
        }

        if !self.can_be_cancelled(appointment, now) {
            return Err(AppointmentError::NotCancellable(format!(
                "cancellations require at least {} hours notice",
                self.cancellation_lead.num_hours()
            )));
        }

        let cancelled_by = actor.user_id().ok_or_else(|| {
            AppointmentError::PermissionDenied("Caller has no valid user id".to_string())
        })?;

        info!("Appointment {} cancelled by {}", appointment.id, cancelled_by);

        Ok(AppointmentStatusChange {
            cancelled_by: Some(cancelled_by),
            cancellation_reason: reason.filter(|r| !r.trim().is_empty()),
            ..AppointmentStatusChange::to(AppointmentStatus::Cancelled)
        })
    }
}
