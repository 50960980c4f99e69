//! End-to-end coordinator scenarios over the in-memory store.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;
use uuid::Uuid;

use atrium_server::checkin::{
    clock, CheckInCoordinator, CheckInError, TokenService, WindowConfig, WindowState,
};
use atrium_server::models::{CheckInMethod, Event, Member};
use atrium_server::store::{AttendanceStore, MemoryStore};

const STEP_SECONDS: u64 = 30;
const TOLERANCE_STEPS: i64 = 1;

fn window_config() -> WindowConfig {
    WindowConfig {
        pre_buffer: Duration::minutes(15),
        post_buffer: Duration::minutes(30),
    }
}

fn coordinator(store: MemoryStore) -> CheckInCoordinator<MemoryStore> {
    CheckInCoordinator::new(
        store,
        TokenService::new(STEP_SECONDS, TOLERANCE_STEPS),
        window_config(),
    )
}

fn event_starting(start: DateTime<Utc>) -> Event {
    Event {
        id: Uuid::new_v4(),
        name: "Monthly social".to_string(),
        location: "Main hall".to_string(),
        start_time: start,
        end_time: start + Duration::hours(2),
        image_url: None,
        created_at: start - Duration::days(7),
        updated_at: start - Duration::days(7),
    }
}

fn member() -> Member {
    let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    Member {
        id: Uuid::new_v4(),
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        created_at: now,
        updated_at: now,
    }
}

fn valid_token(member_id: Uuid, now: DateTime<Utc>) -> String {
    TokenService::new(STEP_SECONDS, TOLERANCE_STEPS)
        .generate(&member_id.to_string(), clock::step_at(now, STEP_SECONDS))
}

/// Mid-event instant for an event starting 2025-01-01T18:00Z.
fn during(event: &Event) -> DateTime<Utc> {
    event.start_time + Duration::minutes(30)
}

#[tokio::test]
async fn automatic_check_in_records_attendance_once() {
    let store = MemoryStore::new();
    let event = event_starting(Utc.with_ymd_and_hms(2025, 1, 1, 18, 0, 0).unwrap());
    let member_id = Uuid::new_v4();
    store.add_event(event.clone()).await;

    let now = during(&event);
    let token = valid_token(member_id, now);
    let coordinator = coordinator(store);

    coordinator
        .automatic_check_in(event.id, member_id, &token, now)
        .await
        .unwrap();

    assert!(coordinator
        .attendance_status(event.id, member_id)
        .await
        .unwrap());
}

#[tokio::test]
async fn repeat_check_in_is_idempotent() {
    let store = Arc::new(MemoryStore::new());
    let event = event_starting(Utc.with_ymd_and_hms(2025, 1, 1, 18, 0, 0).unwrap());
    let member_id = Uuid::new_v4();
    store.add_event(event.clone()).await;

    let now = during(&event);
    let token = valid_token(member_id, now);
    let coordinator = CheckInCoordinator::new(
        store.clone(),
        TokenService::new(STEP_SECONDS, TOLERANCE_STEPS),
        window_config(),
    );

    coordinator
        .automatic_check_in(event.id, member_id, &token, now)
        .await
        .unwrap();

    // Second scan succeeds without a second row; the token is not even
    // re-validated once attendance exists.
    coordinator
        .automatic_check_in(event.id, member_id, "not-even-a-token", now)
        .await
        .unwrap();

    assert_eq!(store.attendance_count().await, 1);
}

#[tokio::test]
async fn unknown_event_is_reported_as_not_found() {
    let store = MemoryStore::new();
    let coordinator = coordinator(store);
    let now = Utc.with_ymd_and_hms(2025, 1, 1, 18, 30, 0).unwrap();

    let err = coordinator
        .automatic_check_in(Uuid::new_v4(), Uuid::new_v4(), "token", now)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckInError::EventNotFound));
}

#[tokio::test]
async fn check_in_outside_the_window_reports_which_side() {
    let store = MemoryStore::new();
    let event = event_starting(Utc.with_ymd_and_hms(2025, 1, 1, 18, 0, 0).unwrap());
    let member_id = Uuid::new_v4();
    store.add_event(event.clone()).await;
    let coordinator = coordinator(store);

    let too_early = Utc.with_ymd_and_hms(2025, 1, 1, 17, 44, 0).unwrap();
    let err = coordinator
        .automatic_check_in(event.id, member_id, &valid_token(member_id, too_early), too_early)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CheckInError::EventNotActive {
            state: WindowState::Upcoming
        }
    ));

    let too_late = Utc.with_ymd_and_hms(2025, 1, 1, 20, 31, 0).unwrap();
    let err = coordinator
        .automatic_check_in(event.id, member_id, &valid_token(member_id, too_late), too_late)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CheckInError::EventNotActive {
            state: WindowState::Closed
        }
    ));
}

#[tokio::test]
async fn invalid_token_is_rejected_without_recording_attendance() {
    let store = MemoryStore::new();
    let event = event_starting(Utc.with_ymd_and_hms(2025, 1, 1, 18, 0, 0).unwrap());
    let member_id = Uuid::new_v4();
    store.add_event(event.clone()).await;

    let now = during(&event);
    let other_member_token = valid_token(Uuid::new_v4(), now);
    let coordinator = coordinator(store);

    let err = coordinator
        .automatic_check_in(event.id, member_id, &other_member_token, now)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckInError::InvalidToken));
    assert!(!coordinator
        .attendance_status(event.id, member_id)
        .await
        .unwrap());
}

#[tokio::test]
async fn concurrent_scans_record_exactly_one_row() {
    let store = Arc::new(MemoryStore::new());
    let event = event_starting(Utc.with_ymd_and_hms(2025, 1, 1, 18, 0, 0).unwrap());
    let member_id = Uuid::new_v4();
    store.add_event(event.clone()).await;

    let now = during(&event);
    let token = valid_token(member_id, now);
    let coordinator = Arc::new(CheckInCoordinator::new(
        store.clone(),
        TokenService::new(STEP_SECONDS, TOLERANCE_STEPS),
        window_config(),
    ));

    let mut handles = Vec::new();
    for _ in 0..16 {
        let coordinator = coordinator.clone();
        let token = token.clone();
        let event_id = event.id;
        handles.push(tokio::spawn(async move {
            coordinator
                .automatic_check_in(event_id, member_id, &token, now)
                .await
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.attendance_count().await, 1);
}

#[tokio::test]
async fn manual_check_in_records_the_verifying_actor() {
    let store = Arc::new(MemoryStore::new());
    let event = event_starting(Utc.with_ymd_and_hms(2025, 1, 1, 18, 0, 0).unwrap());
    let profile = member();
    let staff_id = Uuid::new_v4();
    store.add_event(event.clone()).await;
    store.add_member(profile.clone()).await;

    // Outside the active window: the manual path does not gate on it.
    let now = Utc.with_ymd_and_hms(2025, 1, 2, 9, 0, 0).unwrap();
    let coordinator = CheckInCoordinator::new(
        store.clone(),
        TokenService::new(STEP_SECONDS, TOLERANCE_STEPS),
        window_config(),
    );

    let returned = coordinator
        .manual_check_in(event.id, profile.id, staff_id, now)
        .await
        .unwrap();
    assert_eq!(returned.id, profile.id);

    let row = store.attendance(event.id, profile.id).await.unwrap().unwrap();
    assert_eq!(row.method, CheckInMethod::Manual);
    assert_eq!(row.verifying_actor, Some(staff_id));

    // Second manual check-in succeeds without a second row.
    coordinator
        .manual_check_in(event.id, profile.id, staff_id, now)
        .await
        .unwrap();
    assert_eq!(store.attendance_count().await, 1);
}

#[tokio::test]
async fn manual_check_in_requires_a_known_profile() {
    let store = MemoryStore::new();
    let event = event_starting(Utc.with_ymd_and_hms(2025, 1, 1, 18, 0, 0).unwrap());
    store.add_event(event.clone()).await;
    let coordinator = coordinator(store);

    let err = coordinator
        .manual_check_in(
            event.id,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Utc.with_ymd_and_hms(2025, 1, 1, 19, 0, 0).unwrap(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CheckInError::MemberNotFound));
}

#[tokio::test]
async fn active_events_lists_open_windows_and_the_next_event() {
    let store = MemoryStore::new();
    let running = event_starting(Utc.with_ymd_and_hms(2025, 1, 1, 18, 0, 0).unwrap());
    let later = event_starting(Utc.with_ymd_and_hms(2025, 1, 1, 22, 0, 0).unwrap());
    let tomorrow = event_starting(Utc.with_ymd_and_hms(2025, 1, 2, 18, 0, 0).unwrap());
    store.add_event(running.clone()).await;
    store.add_event(later.clone()).await;
    store.add_event(tomorrow.clone()).await;

    let now = Utc.with_ymd_and_hms(2025, 1, 1, 19, 0, 0).unwrap();
    let (active, next) = coordinator(store).active_events(now).await.unwrap();

    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, running.id);
    assert_eq!(next.unwrap().id, later.id);
}
