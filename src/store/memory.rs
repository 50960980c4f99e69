use async_trait::async_trait;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{Attendance, Event, Member, NewAttendance};

use super::{AttendanceStore, EventStore, InsertOutcome, MemberDirectory};

/// In-process store used by tests and local development. Models the
/// database's (event_id, member_id) uniqueness constraint with a map entry
/// check under a single lock.
#[derive(Default)]
pub struct MemoryStore {
    events: Mutex<HashMap<Uuid, Event>>,
    members: Mutex<HashMap<Uuid, Member>>,
    attendance: Mutex<HashMap<(Uuid, Uuid), Attendance>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_event(&self, event: Event) {
        self.events.lock().await.insert(event.id, event);
    }

    pub async fn add_member(&self, member: Member) {
        self.members.lock().await.insert(member.id, member);
    }

    pub async fn attendance_count(&self) -> usize {
        self.attendance.lock().await.len()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn event(&self, id: Uuid) -> Result<Option<Event>, sqlx::Error> {
        Ok(self.events.lock().await.get(&id).cloned())
    }

    async fn events(&self) -> Result<Vec<Event>, sqlx::Error> {
        let mut events: Vec<Event> = self.events.lock().await.values().cloned().collect();
        events.sort_by_key(|event| (event.start_time, event.id));
        Ok(events)
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn attendance(
        &self,
        event_id: Uuid,
        member_id: Uuid,
    ) -> Result<Option<Attendance>, sqlx::Error> {
        Ok(self
            .attendance
            .lock()
            .await
            .get(&(event_id, member_id))
            .cloned())
    }

    async fn insert_if_absent(&self, row: NewAttendance) -> Result<InsertOutcome, sqlx::Error> {
        let mut attendance = self.attendance.lock().await;
        match attendance.entry((row.event_id, row.member_id)) {
            Entry::Occupied(_) => Ok(InsertOutcome::AlreadyExists),
            Entry::Vacant(slot) => {
                slot.insert(row.into_attendance());
                Ok(InsertOutcome::Inserted)
            }
        }
    }
}

#[async_trait]
impl MemberDirectory for MemoryStore {
    async fn member(&self, id: Uuid) -> Result<Option<Member>, sqlx::Error> {
        Ok(self.members.lock().await.get(&id).cloned())
    }
}
