use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// How an attendance record came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckInMethod {
    /// The member presented a valid rotating token at a scanner.
    Token,
    /// A staff member checked the member in by hand.
    Manual,
}

impl CheckInMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckInMethod::Token => "token",
            CheckInMethod::Manual => "manual",
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown check-in method '{0}'")]
pub struct UnknownMethod(String);

impl FromStr for CheckInMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "token" => Ok(CheckInMethod::Token),
            "manual" => Ok(CheckInMethod::Manual),
            other => Err(UnknownMethod(other.to_string())),
        }
    }
}

/// One attendance row per (event, member). Inserted exactly once by the
/// check-in coordinator and never mutated or deleted afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendance {
    pub event_id: Uuid,
    pub member_id: Uuid,
    pub checked_in_at: DateTime<Utc>,
    pub method: CheckInMethod,
    /// Staff identity recorded for audit; populated only for `Manual`.
    pub verifying_actor: Option<Uuid>,
}

/// Insert payload for a new attendance row.
#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub event_id: Uuid,
    pub member_id: Uuid,
    pub checked_in_at: DateTime<Utc>,
    pub method: CheckInMethod,
    pub verifying_actor: Option<Uuid>,
}

impl NewAttendance {
    pub fn token(event_id: Uuid, member_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            event_id,
            member_id,
            checked_in_at: now,
            method: CheckInMethod::Token,
            verifying_actor: None,
        }
    }

    pub fn manual(event_id: Uuid, member_id: Uuid, actor: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            event_id,
            member_id,
            checked_in_at: now,
            method: CheckInMethod::Manual,
            verifying_actor: Some(actor),
        }
    }

    pub fn into_attendance(self) -> Attendance {
        Attendance {
            event_id: self.event_id,
            member_id: self.member_id,
            checked_in_at: self.checked_in_at,
            method: self.method,
            verifying_actor: self.verifying_actor,
        }
    }
}
