use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Attendance, Event, Member, NewAttendance};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Outcome of an attendance insert attempt.
///
/// `AlreadyExists` covers both a repeat scan and the losing side of a
/// concurrent race; the coordinator folds it into success either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
}

/// Read access to events. Events are staff-managed elsewhere; this core
/// never writes them.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn event(&self, id: Uuid) -> Result<Option<Event>, sqlx::Error>;
    async fn events(&self) -> Result<Vec<Event>, sqlx::Error>;
}

/// The attendance table, the one shared mutable resource in this core.
/// Serialization across processes happens at the store's uniqueness
/// constraint on (event_id, member_id), not with in-process locks.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn attendance(
        &self,
        event_id: Uuid,
        member_id: Uuid,
    ) -> Result<Option<Attendance>, sqlx::Error>;

    /// Inserts the row unless one already exists for its (event, member)
    /// pair. Must never report a uniqueness conflict as an error.
    async fn insert_if_absent(&self, row: NewAttendance) -> Result<InsertOutcome, sqlx::Error>;
}

/// Resolves member ids against the membership directory.
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    async fn member(&self, id: Uuid) -> Result<Option<Member>, sqlx::Error>;
}

#[async_trait]
impl<T> EventStore for std::sync::Arc<T>
where
    T: EventStore + ?Sized,
{
    async fn event(&self, id: Uuid) -> Result<Option<Event>, sqlx::Error> {
        (**self).event(id).await
    }

    async fn events(&self) -> Result<Vec<Event>, sqlx::Error> {
        (**self).events().await
    }
}

#[async_trait]
impl<T> AttendanceStore for std::sync::Arc<T>
where
    T: AttendanceStore + ?Sized,
{
    async fn attendance(
        &self,
        event_id: Uuid,
        member_id: Uuid,
    ) -> Result<Option<Attendance>, sqlx::Error> {
        (**self).attendance(event_id, member_id).await
    }

    async fn insert_if_absent(&self, row: NewAttendance) -> Result<InsertOutcome, sqlx::Error> {
        (**self).insert_if_absent(row).await
    }
}

#[async_trait]
impl<T> MemberDirectory for std::sync::Arc<T>
where
    T: MemberDirectory + ?Sized,
{
    async fn member(&self, id: Uuid) -> Result<Option<Member>, sqlx::Error> {
        (**self).member(id).await
    }
}
