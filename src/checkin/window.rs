use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::Event;

/// Where an instant falls relative to an event's buffered check-in window.
/// Exactly one state applies to any (event, instant) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowState {
    Upcoming,
    Active,
    Closed,
}

/// Buffers applied around an event's scheduled times. Check-in opens
/// `pre_buffer` before start and closes `post_buffer` after end.
#[derive(Debug, Clone, Copy)]
pub struct WindowConfig {
    pub pre_buffer: Duration,
    pub post_buffer: Duration,
}

/// Classifies an event against `now`. Both ends of the active interval are
/// inclusive: an event whose window opens exactly at `now` is active.
pub fn classify(event: &Event, config: &WindowConfig, now: DateTime<Utc>) -> WindowState {
    let opens = event.start_time - config.pre_buffer;
    let closes = event.end_time + config.post_buffer;

    if now < opens {
        WindowState::Upcoming
    } else if now > closes {
        WindowState::Closed
    } else {
        WindowState::Active
    }
}

/// Events currently open for check-in.
pub fn active<'a>(
    events: &'a [Event],
    config: &WindowConfig,
    now: DateTime<Utc>,
) -> Vec<&'a Event> {
    events
        .iter()
        .filter(|event| classify(event, config, now) == WindowState::Active)
        .collect()
}

/// The upcoming event with the earliest start time, ties broken by event id
/// so concurrent pollers see the same answer.
pub fn next_upcoming<'a>(
    events: &'a [Event],
    config: &WindowConfig,
    now: DateTime<Utc>,
) -> Option<&'a Event> {
    events
        .iter()
        .filter(|event| classify(event, config, now) == WindowState::Upcoming)
        .min_by_key(|event| (event.start_time, event.id))
}
