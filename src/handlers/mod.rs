use axum::async_trait;
use axum::extract::{FromRequestParts, Path, State};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::checkin::CheckInCoordinator;
use crate::models::{Event, Member};
use crate::store::PgStore;
use crate::utils::error::AppError;
use crate::utils::response::success;

/// Shared per-process state: one coordinator over one pooled store handle.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<CheckInCoordinator<PgStore>>,
}

/// Member identity resolved by the upstream session service and forwarded
/// by the gateway. Session handling itself lives outside this service.
pub struct MemberIdentity(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for MemberIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identity_header(parts, "x-member-id").map(Self)
    }
}

/// Staff identity forwarded by the external auth guard; becomes the
/// verifying actor on manual check-ins.
pub struct StaffIdentity(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for StaffIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identity_header(parts, "x-staff-id").map(Self)
    }
}

fn identity_header(parts: &Parts, name: &'static str) -> Result<Uuid, AppError> {
    let raw = parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::AuthError(format!("Missing {} header", name)))?;

    Uuid::parse_str(raw).map_err(|_| AppError::AuthError(format!("Malformed {} header", name)))
}

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "atrium-api",
    };

    success(payload, "Health check successful").into_response()
}

#[derive(Deserialize)]
pub struct AutomaticCheckInRequest {
    pub token: String,
}

#[derive(Serialize)]
struct CheckedInPayload {
    checked_in: bool,
}

/// `POST /api/events/:event_id/check-in` — scanner submits the token a
/// member's device is displaying.
pub async fn automatic_check_in(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    member: MemberIdentity,
    Json(body): Json<AutomaticCheckInRequest>,
) -> Result<Response, AppError> {
    state
        .coordinator
        .automatic_check_in(event_id, member.0, &body.token, Utc::now())
        .await?;

    Ok(success(CheckedInPayload { checked_in: true }, "Checked in").into_response())
}

#[derive(Deserialize)]
pub struct ManualCheckInRequest {
    pub profile_id: Uuid,
}

#[derive(Serialize)]
struct ManualCheckInPayload {
    profile: Member,
}

/// `POST /api/events/:event_id/check-in/manual` — staff override, audited
/// with the acting staff identity.
pub async fn manual_check_in(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    staff: StaffIdentity,
    Json(body): Json<ManualCheckInRequest>,
) -> Result<Response, AppError> {
    let profile = state
        .coordinator
        .manual_check_in(event_id, body.profile_id, staff.0, Utc::now())
        .await?;

    Ok(success(ManualCheckInPayload { profile }, "Member checked in").into_response())
}

/// `GET /api/events/:event_id/check-in/status`
pub async fn attendance_status(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    member: MemberIdentity,
) -> Result<Response, AppError> {
    let checked_in = state
        .coordinator
        .attendance_status(event_id, member.0)
        .await?;

    Ok(success(CheckedInPayload { checked_in }, "Attendance status").into_response())
}

#[derive(Serialize)]
struct ActiveEventsPayload {
    active: Vec<Event>,
    next_upcoming: Option<Event>,
}

/// `GET /api/events/active` — polled by clients to decide whether to show
/// the check-in screen.
pub async fn active_events(State(state): State<AppState>) -> Result<Response, AppError> {
    let (active, next_upcoming) = state.coordinator.active_events(Utc::now()).await?;

    Ok(success(
        ActiveEventsPayload {
            active,
            next_upcoming,
        },
        "Active events",
    )
    .into_response())
}

#[derive(Serialize)]
struct TokenPayload {
    token: String,
}

/// `GET /api/check-in/token` — the rotating code the member's device
/// renders as a QR for the scanner.
pub async fn current_token(
    State(state): State<AppState>,
    member: MemberIdentity,
) -> Result<Response, AppError> {
    let token = state.coordinator.current_token(member.0, Utc::now());
    Ok(success(TokenPayload { token }, "Current check-in token").into_response())
}
