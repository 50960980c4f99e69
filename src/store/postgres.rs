use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::{Attendance, Event, Member, NewAttendance};

use super::{AttendanceStore, EventStore, InsertOutcome, MemberDirectory};

/// Postgres-backed store sharing one pooled connection handle per process.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct AttendanceRow {
    event_id: Uuid,
    member_id: Uuid,
    checked_in_at: DateTime<Utc>,
    method: String,
    verifying_actor: Option<Uuid>,
}

impl TryFrom<AttendanceRow> for Attendance {
    type Error = sqlx::Error;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let method = row
            .method
            .parse()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(Attendance {
            event_id: row.event_id,
            member_id: row.member_id,
            checked_in_at: row.checked_in_at,
            method,
            verifying_actor: row.verifying_actor,
        })
    }
}

#[async_trait]
impl EventStore for PgStore {
    async fn event(&self, id: Uuid) -> Result<Option<Event>, sqlx::Error> {
        sqlx::query_as::<_, Event>(
            "SELECT id, name, location, start_time, end_time, image_url, created_at, updated_at
             FROM events
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn events(&self) -> Result<Vec<Event>, sqlx::Error> {
        sqlx::query_as::<_, Event>(
            "SELECT id, name, location, start_time, end_time, image_url, created_at, updated_at
             FROM events
             ORDER BY start_time, id",
        )
        .fetch_all(&self.pool)
        .await
    }
}

#[async_trait]
impl AttendanceStore for PgStore {
    async fn attendance(
        &self,
        event_id: Uuid,
        member_id: Uuid,
    ) -> Result<Option<Attendance>, sqlx::Error> {
        let row = sqlx::query_as::<_, AttendanceRow>(
            "SELECT event_id, member_id, checked_in_at, method, verifying_actor
             FROM attendance
             WHERE event_id = $1 AND member_id = $2",
        )
        .bind(event_id)
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Attendance::try_from).transpose()
    }

    async fn insert_if_absent(&self, row: NewAttendance) -> Result<InsertOutcome, sqlx::Error> {
        // The composite primary key resolves concurrent inserts from any
        // number of scanner processes; the loser affects zero rows.
        let result = sqlx::query(
            "INSERT INTO attendance (event_id, member_id, checked_in_at, method, verifying_actor)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (event_id, member_id) DO NOTHING",
        )
        .bind(row.event_id)
        .bind(row.member_id)
        .bind(row.checked_in_at)
        .bind(row.method.as_str())
        .bind(row.verifying_actor)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            Ok(InsertOutcome::AlreadyExists)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }
}

#[async_trait]
impl MemberDirectory for PgStore {
    async fn member(&self, id: Uuid) -> Result<Option<Member>, sqlx::Error> {
        sqlx::query_as::<_, Member>(
            "SELECT id, name, email, created_at, updated_at
             FROM members
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }
}
