use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use appointment_cell::models::{Appointment, AppointmentStats, AppointmentStatus, AppointmentType};

fn d(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, month, day).unwrap()
}

fn appointment(date: NaiveDate, status: AppointmentStatus) -> Appointment {
    let start = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
    Appointment {
        id: Uuid::new_v4(),
        patient_id: Uuid::new_v4(),
        physiotherapist_id: Uuid::new_v4(),
        date,
        start_time: start,
        end_time: start + Duration::hours(1),
        status,
        appointment_type: AppointmentType::Consultation,
        reason: "Back pain".to_string(),
        symptoms: None,
        notes: None,
        treatment_plan: None,
        prescription: None,
        cancelled_by: None,
        cancellation_reason: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn test_stats_count_statuses_and_calendar_windows() {
    // 2030-04-10 is a Wednesday; its week runs 8th to 14th.
    let today = d(4, 10);
    let appointments = vec![
        appointment(d(4, 8), AppointmentStatus::Completed),
        appointment(d(4, 14), AppointmentStatus::Scheduled),
        appointment(d(4, 15), AppointmentStatus::Confirmed),
        appointment(d(4, 1), AppointmentStatus::Cancelled),
        appointment(d(3, 31), AppointmentStatus::Completed),
    ];

    let stats = AppointmentStats::from_appointments(&appointments, today);

    assert_eq!(
        stats,
        AppointmentStats {
            total: 5,
            scheduled: 1,
            confirmed: 1,
            completed: 2,
            cancelled: 1,
            current_month: 4,
            current_week: 2,
        }
    );
}

#[test]
fn test_week_starts_on_monday() {
    // 2030-04-14 is a Sunday; the 15th opens the next week.
    let appointments = vec![
        appointment(d(4, 8), AppointmentStatus::Scheduled),
        appointment(d(4, 15), AppointmentStatus::Scheduled),
    ];

    assert_eq!(AppointmentStats::from_appointments(&appointments, d(4, 14)).current_week, 1);
    assert_eq!(AppointmentStats::from_appointments(&appointments, d(4, 15)).current_week, 1);
    assert_eq!(AppointmentStats::from_appointments(&appointments, d(4, 16)).current_week, 1);
}

#[test]
fn test_stats_on_no_appointments_are_zero() {
    let stats = AppointmentStats::from_appointments(&[], d(4, 10));

    assert_eq!(stats.total, 0);
    assert_eq!(stats.current_month, 0);
    assert_eq!(stats.current_week, 0);
}
