use chrono::{DateTime, Utc};

/// Quantizes an instant into a fixed-size time step.
///
/// Floor division, so steps stay consistent across the epoch boundary.
pub fn step_at(now: DateTime<Utc>, step_size_seconds: u64) -> i64 {
    now.timestamp().div_euclid(step_size_seconds as i64)
}

/// The time step containing the current instant. Reads the wall clock on
/// every call; results are never cached, so validation always sees real time.
pub fn current_step(step_size_seconds: u64) -> i64 {
    step_at(Utc::now(), step_size_seconds)
}
