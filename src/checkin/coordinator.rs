use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Event, Member, NewAttendance};
use crate::store::{AttendanceStore, EventStore, MemberDirectory};

use super::token::TokenService;
use super::window::{self, WindowConfig, WindowState};

/// Why a check-in was refused. Every variant is recoverable at the API
/// boundary; callers map each kind to its own user-facing message.
#[derive(Debug, Error)]
pub enum CheckInError {
    #[error("event not found")]
    EventNotFound,

    /// Carries the window state so the caller can tell "not yet open"
    /// apart from "already closed".
    #[error("event is not open for check-in")]
    EventNotActive { state: WindowState },

    /// The token matched no candidate in the tolerance window. A
    /// user-correctable failure (rescan), not a security incident.
    #[error("token did not match any accepted time step")]
    InvalidToken,

    #[error("member profile not found")]
    MemberNotFound,

    #[error("store error")]
    Store(#[from] sqlx::Error),
}

/// Drives the check-in state machine for each (event, member) pair.
///
/// The only persisted state is the attendance row: `NoRecord -> CheckedIn`,
/// and nothing leaves `CheckedIn`. All operations take `now` explicitly;
/// request handlers pass the wall clock.
pub struct CheckInCoordinator<S> {
    store: S,
    tokens: TokenService,
    window: WindowConfig,
}

impl<S> CheckInCoordinator<S>
where
    S: EventStore + AttendanceStore + MemberDirectory,
{
    pub fn new(store: S, tokens: TokenService, window: WindowConfig) -> Self {
        Self {
            store,
            tokens,
            window,
        }
    }

    /// Scanner-driven check-in: gate on the event window, validate the
    /// rotating token, record attendance at most once.
    ///
    /// Idempotent: a member who is already checked in gets success without
    /// token re-validation, and a lost insert race reads as success too.
    pub async fn automatic_check_in(
        &self,
        event_id: Uuid,
        member_id: Uuid,
        submitted_token: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CheckInError> {
        let event = self
            .store
            .event(event_id)
            .await?
            .ok_or(CheckInError::EventNotFound)?;

        let state = window::classify(&event, &self.window, now);
        if state != WindowState::Active {
            return Err(CheckInError::EventNotActive { state });
        }

        if self.store.attendance(event_id, member_id).await?.is_some() {
            return Ok(());
        }

        if !self
            .tokens
            .validate_at(&member_id.to_string(), submitted_token, now)
        {
            return Err(CheckInError::InvalidToken);
        }

        // Two scans can both pass the existence check above; the store's
        // uniqueness constraint picks one winner and the other outcome is
        // still a completed check-in.
        self.store
            .insert_if_absent(NewAttendance::token(event_id, member_id, now))
            .await?;

        tracing::info!(%event_id, %member_id, "member checked in via token");
        Ok(())
    }

    /// Staff-driven check-in: no window or token checks, but the verifying
    /// actor is recorded for audit and the at-most-once write still holds.
    pub async fn manual_check_in(
        &self,
        event_id: Uuid,
        member_id: Uuid,
        verifying_actor: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Member, CheckInError> {
        self.store
            .event(event_id)
            .await?
            .ok_or(CheckInError::EventNotFound)?;

        let member = self
            .store
            .member(member_id)
            .await?
            .ok_or(CheckInError::MemberNotFound)?;

        self.store
            .insert_if_absent(NewAttendance::manual(event_id, member_id, verifying_actor, now))
            .await?;

        tracing::info!(%event_id, %member_id, %verifying_actor, "member checked in manually");
        Ok(member)
    }

    /// Pure read used to render "already checked in".
    pub async fn attendance_status(
        &self,
        event_id: Uuid,
        member_id: Uuid,
    ) -> Result<bool, CheckInError> {
        Ok(self.store.attendance(event_id, member_id).await?.is_some())
    }

    /// Events open for check-in right now, plus the next upcoming event,
    /// for client polling.
    pub async fn active_events(
        &self,
        now: DateTime<Utc>,
    ) -> Result<(Vec<Event>, Option<Event>), CheckInError> {
        let events = self.store.events().await?;
        let active = window::active(&events, &self.window, now)
            .into_iter()
            .cloned()
            .collect();
        let next = window::next_upcoming(&events, &self.window, now).cloned();
        Ok((active, next))
    }

    /// The rotating token a member presents at the scanner, for the
    /// client's QR display.
    pub fn current_token(&self, member_id: Uuid, now: DateTime<Utc>) -> String {
        self.tokens.token_at(&member_id.to_string(), now)
    }
}
