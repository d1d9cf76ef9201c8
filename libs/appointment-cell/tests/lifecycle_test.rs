use assert_matches::assert_matches;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use uuid::Uuid;

use appointment_cell::models::{
    Appointment, AppointmentError, AppointmentStatus, AppointmentType, CompleteAppointmentRequest,
};
use appointment_cell::services::lifecycle::AppointmentLifecycleService;
use shared_config::SchedulingConfig;
use shared_utils::test_utils::TestUser;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 7, 9, 0, 0).unwrap()
}

fn appointment_on(
    date: NaiveDate,
    start: NaiveTime,
    status: AppointmentStatus,
    physiotherapist_id: Uuid,
) -> Appointment {
    Appointment {
        id: Uuid::new_v4(),
        patient_id: Uuid::new_v4(),
        physiotherapist_id,
        date,
        start_time: start,
        end_time: start + Duration::hours(1),
        status,
        appointment_type: AppointmentType::Therapy,
        reason: "Knee rehabilitation".to_string(),
        symptoms: None,
        notes: None,
        treatment_plan: None,
        prescription: None,
        cancelled_by: None,
        cancellation_reason: None,
        created_at: now(),
        updated_at: now(),
    }
}

fn in_days(days: i64, status: AppointmentStatus) -> Appointment {
    let date = now().date_naive() + Duration::days(days);
    appointment_on(date, NaiveTime::from_hms_opt(10, 0, 0).unwrap(), status, Uuid::new_v4())
}

fn service() -> AppointmentLifecycleService {
    AppointmentLifecycleService::new(&SchedulingConfig::default())
}

#[test]
fn test_confirm_only_from_scheduled() {
    let service = service();

    let change = service.confirm(&in_days(3, AppointmentStatus::Scheduled)).unwrap();
    assert_eq!(change.status, AppointmentStatus::Confirmed);

    for status in [
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
    ] {
        assert_matches!(
            service.confirm(&in_days(3, status)),
            Err(AppointmentError::InvalidStateTransition { action: "confirm", .. })
        );
    }
}

#[test]
fn test_complete_by_assigned_physiotherapist_records_outcome() {
    let service = service();
    let physio = TestUser::physiotherapist("physio@example.com");
    let mut appointment = in_days(0, AppointmentStatus::Confirmed);
    appointment.physiotherapist_id = physio.uuid();

    let outcome = CompleteAppointmentRequest {
        notes: Some("Good range of motion".to_string()),
        treatment_plan: Some("Continue quad sets".to_string()),
        prescription: None,
    };

    let change = service.complete(&appointment, &physio.to_user(), outcome).unwrap();

    assert_eq!(change.status, AppointmentStatus::Completed);
    assert_eq!(change.notes.as_deref(), Some("Good range of motion"));
    assert_eq!(change.treatment_plan.as_deref(), Some("Continue quad sets"));
    assert!(change.prescription.is_none());

    let body = serde_json::to_value(&change).unwrap();
    assert!(body.get("prescription").is_none());
    assert!(body.get("cancelled_by").is_none());
}

#[test]
fn test_complete_from_scheduled_is_allowed() {
    let service = service();
    let physio = TestUser::physiotherapist("physio@example.com");
    let mut appointment = in_days(0, AppointmentStatus::Scheduled);
    appointment.physiotherapist_id = physio.uuid();

    assert!(service
        .complete(&appointment, &physio.to_user(), CompleteAppointmentRequest::default())
        .is_ok());
}

#[test]
fn test_complete_by_other_actor_is_denied() {
    let service = service();
    let appointment = in_days(0, AppointmentStatus::Confirmed);

    let other_physio = TestUser::physiotherapist("other@example.com").to_user();
    let patient = TestUser::patient("patient@example.com").to_user();

    assert_matches!(
        service.complete(&appointment, &other_physio, CompleteAppointmentRequest::default()),
        Err(AppointmentError::PermissionDenied(_))
    );
    assert_matches!(
        service.complete(&appointment, &patient, CompleteAppointmentRequest::default()),
        Err(AppointmentError::PermissionDenied(_))
    );

    let admin = TestUser::admin("staff@example.com").to_user();
    assert!(service
        .complete(&appointment, &admin, CompleteAppointmentRequest::default())
        .is_ok());
}

#[test]
fn test_complete_from_terminal_state_fails() {
    let service = service();
    let admin = TestUser::admin("staff@example.com").to_user();

    for status in [AppointmentStatus::Completed, AppointmentStatus::Cancelled] {
        assert_matches!(
            service.complete(&in_days(0, status), &admin, CompleteAppointmentRequest::default()),
            Err(AppointmentError::InvalidStateTransition { action: "complete", .. })
        );
    }
}

#[test]
fn test_cancel_records_actor_and_reason() {
    let service = service();
    let patient = TestUser::patient("patient@example.com");

    let change = service
        .cancel(
            &in_days(3, AppointmentStatus::Scheduled),
            &patient.to_user(),
            Some("Feeling better".to_string()),
            now(),
        )
        .unwrap();

    assert_eq!(change.status, AppointmentStatus::Cancelled);
    assert_eq!(change.cancelled_by, Some(patient.uuid()));
    assert_eq!(change.cancellation_reason.as_deref(), Some("Feeling better"));
}

#[test]
fn test_cancel_from_completed_always_fails() {
    let service = service();
    let admin = TestUser::admin("staff@example.com").to_user();

    for days in [0, 3, 30] {
        assert_matches!(
            service.cancel(&in_days(days, AppointmentStatus::Completed), &admin, None, now()),
            Err(AppointmentError::NotCancellable(_))
        );
    }
    assert_matches!(
        service.cancel(&in_days(3, AppointmentStatus::Cancelled), &admin, None, now()),
        Err(AppointmentError::NotCancellable(_))
    );
}

#[test]
fn test_cancel_requires_lead_time() {
    let service = service();
    let admin = TestUser::admin("staff@example.com").to_user();
    let date = now().date_naive();

    // Starts exactly 24h from now: not strictly later, so not cancellable.
    let tomorrow_same_time = appointment_on(
        date + Duration::days(1),
        NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        AppointmentStatus::Confirmed,
        Uuid::new_v4(),
    );
    assert!(!service.can_be_cancelled(&tomorrow_same_time, now()));
    assert_matches!(
        service.cancel(&tomorrow_same_time, &admin, None, now()),
        Err(AppointmentError::NotCancellable(_))
    );

    let one_minute_later = appointment_on(
        date + Duration::days(1),
        NaiveTime::from_hms_opt(9, 1, 0).unwrap(),
        AppointmentStatus::Confirmed,
        Uuid::new_v4(),
    );
    assert!(service.can_be_cancelled(&one_minute_later, now()));
}

#[test]
fn test_cancellation_lead_is_configurable() {
    let rules = SchedulingConfig {
        cancellation_lead_hours: 2,
        ..SchedulingConfig::default()
    };
    let service = AppointmentLifecycleService::new(&rules);

    let later_today = appointment_on(
        now().date_naive(),
        NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        AppointmentStatus::Scheduled,
        Uuid::new_v4(),
    );
    assert!(service.can_be_cancelled(&later_today, now()));
}

#[test]
fn test_guards_follow_transition_table() {
    let service = service();
    let physio = TestUser::physiotherapist("physio@example.com");

    for status in [
        AppointmentStatus::Scheduled,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
    ] {
        let appointment = appointment_on(
            now().date_naive() + Duration::days(5),
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            status,
            physio.uuid(),
        );

        assert_eq!(
            service.confirm(&appointment).is_ok(),
            status.can_transition_to(AppointmentStatus::Confirmed),
            "confirm from {}",
            status
        );
        assert_eq!(
            service
                .complete(&appointment, &physio.to_user(), CompleteAppointmentRequest::default())
                .is_ok(),
            status.can_transition_to(AppointmentStatus::Completed),
            "complete from {}",
            status
        );
        assert_eq!(
            service.cancel(&appointment, &physio.to_user(), None, now()).is_ok(),
            status.can_transition_to(AppointmentStatus::Cancelled),
            "cancel from {}",
            status
        );
    }
}

#[test]
fn test_huge_cancellation_lead_refuses_instead_of_overflowing() {
    let rules = SchedulingConfig {
        cancellation_lead_hours: 10_000_000_000,
        ..SchedulingConfig::default()
    };
    let service = AppointmentLifecycleService::new(&rules);
    let appointment = in_days(30, AppointmentStatus::Scheduled);

    assert!(!service.can_be_cancelled(&appointment, now()));
    assert_matches!(
        service.cancel(&appointment, &TestUser::patient("p@example.com").to_user(), None, now()),
        Err(AppointmentError::NotCancellable(_))
    );
}
