// libs/appointment-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;

// ==============================================================================
// TIME INTERVALS AND SLOTS
// ==============================================================================

/// Half-open time-of-day interval `[start, end)` with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct TimeInterval {
    #[serde(rename = "start_time")]
    start: NaiveTime,
    #[serde(rename = "end_time")]
    end: NaiveTime,
}

#[derive(Deserialize)]
struct RawInterval {
    start_time: NaiveTime,
    end_time: NaiveTime,
}

impl TryFrom<RawInterval> for TimeInterval {
    type Error = AppointmentError;

    fn try_from(raw: RawInterval) -> Result<Self, Self::Error> {
        TimeInterval::new(raw.start_time, raw.end_time)
    }
}

impl TimeInterval {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, AppointmentError> {
        if start >= end {
            return Err(AppointmentError::InvalidTimeRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// `[a,b)` and `[c,d)` overlap iff `a < d && c < b`; touching intervals do not.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, other: &TimeInterval) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

/// An existing booking's interval together with the status it is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookedInterval {
    pub interval: TimeInterval,
    pub status: AppointmentStatus,
}

impl BookedInterval {
    pub fn new(interval: TimeInterval, status: AppointmentStatus) -> Self {
        Self { interval, status }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    #[serde(flatten)]
    pub interval: TimeInterval,
    pub is_available: bool,
}

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub physiotherapist_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub appointment_type: AppointmentType,
    pub reason: String,
    pub symptoms: Option<String>,
    pub notes: Option<String>,
    pub treatment_plan: Option<String>,
    pub prescription: Option<String>,
    pub cancelled_by: Option<Uuid>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn interval(&self) -> Result<TimeInterval, AppointmentError> {
        TimeInterval::new(self.start_time, self.end_time)
    }

    pub fn booked_interval(&self) -> Result<BookedInterval, AppointmentError> {
        Ok(BookedInterval::new(self.interval()?, self.status))
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }

    /// Start of the appointment as a naive UTC timestamp.
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    /// Active appointments occupy their slot.
    pub fn is_active(&self) -> bool {
        matches!(self, AppointmentStatus::Scheduled | AppointmentStatus::Confirmed)
    }

    /// Statuses reachable in one step. Terminal statuses have none.
    pub fn valid_transitions(&self) -> &'static [AppointmentStatus] {
        match self {
            AppointmentStatus::Scheduled => &[
                AppointmentStatus::Confirmed,
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::Confirmed => &[
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::Completed | AppointmentStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        self.valid_transitions().contains(&next)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentType {
    #[default]
    #[serde(alias = "initial_consultation")]
    Consultation,
    #[serde(alias = "followup")]
    FollowUp,
    Therapy,
    Assessment,
    Treatment,
    Emergency,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    /// Required when staff or a physiotherapist books on a patient's behalf.
    pub patient_id: Option<Uuid>,
    pub physiotherapist_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub appointment_type: AppointmentType,
    pub reason: String,
    pub symptoms: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompleteAppointmentRequest {
    pub notes: Option<String>,
    pub treatment_plan: Option<String>,
    pub prescription: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CancelAppointmentRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentListQuery {
    pub status: Option<AppointmentStatus>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailableSlotsQuery {
    pub physiotherapist_id: Uuid,
    pub date: NaiveDate,
    pub duration_minutes: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableSlotsResponse {
    pub physiotherapist_id: Uuid,
    pub date: NaiveDate,
    pub slot_duration_minutes: i64,
    pub slots: Vec<Slot>,
    pub total: usize,
}

/// Dashboard counts. The week starts on Monday; both windows contain `today`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentStats {
    pub total: usize,
    pub scheduled: usize,
    pub confirmed: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub current_month: usize,
    pub current_week: usize,
}

impl AppointmentStats {
    pub fn from_appointments(appointments: &[Appointment], today: NaiveDate) -> Self {
        let with_status = |status: AppointmentStatus| {
            appointments.iter().filter(|a| a.status == status).count()
        };

        let week_start = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
        let week_end = week_start + Duration::days(6);

        Self {
            total: appointments.len(),
            scheduled: with_status(AppointmentStatus::Scheduled),
            confirmed: with_status(AppointmentStatus::Confirmed),
            completed: with_status(AppointmentStatus::Completed),
            cancelled: with_status(AppointmentStatus::Cancelled),
            current_month: appointments
                .iter()
                .filter(|a| a.date.year() == today.year() && a.date.month() == today.month())
                .count(),
            current_week: appointments
                .iter()
                .filter(|a| a.date >= week_start && a.date <= week_end)
                .count(),
        }
    }
}

/// Fields written back to storage when an appointment changes status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppointmentStatusChange {
    pub status: AppointmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub treatment_plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prescription: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
}

impl AppointmentStatusChange {
    pub fn to(status: AppointmentStatus) -> Self {
        Self {
            status,
            notes: None,
            treatment_plan: None,
            prescription: None,
            cancelled_by: None,
            cancellation_reason: None,
        }
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Start time {start} must be before end time {end}")]
    InvalidTimeRange { start: NaiveTime, end: NaiveTime },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Cannot {action} an appointment that is {status}")]
    InvalidStateTransition { action: &'static str, status: AppointmentStatus },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Appointment cannot be cancelled: {0}")]
    NotCancellable(String),

    #[error("Requested time overlaps an existing booking ({existing})")]
    SlotConflict { existing: TimeInterval },

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        let message = err.to_string();
        match err {
            AppointmentError::NotFound => AppError::NotFound(message),
            AppointmentError::InvalidTimeRange { .. }
            | AppointmentError::ValidationError(_) => AppError::ValidationError(message),
            AppointmentError::InvalidStateTransition { .. }
            | AppointmentError::NotCancellable(_) => AppError::BadRequest(message),
            AppointmentError::PermissionDenied(_) => AppError::Forbidden(message),
            AppointmentError::SlotConflict { .. } => AppError::Conflict(message),
            AppointmentError::DatabaseError(_) => AppError::Database(message),
        }
    }
}
