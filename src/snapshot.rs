use log::info;
use serde::{Deserialize, Serialize};

use crate::data::{
    CourseAssignment, Preference, Room, Schedule, Semester, SemesterId, TimeSlot,
};
use crate::error::ScheduleError;

/// Read-only view of the catalogs and committed schedules, implemented by the
/// persistence layer. The generator never writes through this trait; bulk
/// inserting the placements it proposes is the caller's job.
pub trait ScheduleStore {
    fn semester(&self, id: SemesterId) -> Result<Option<Semester>, ScheduleError>;
    fn assignments_for_semester(
        &self,
        id: SemesterId,
    ) -> Result<Vec<CourseAssignment>, ScheduleError>;
    /// All time slots, across colleges.
    fn time_slots(&self) -> Result<Vec<TimeSlot>, ScheduleError>;
    fn rooms(&self) -> Result<Vec<Room>, ScheduleError>;
    /// All preferences, across users.
    fn preferences(&self) -> Result<Vec<Preference>, ScheduleError>;
    fn schedules_for_semester(&self, id: SemesterId) -> Result<Vec<Schedule>, ScheduleError>;
}

/// Everything one generation run reads, gathered once up front. Immutable for
/// the duration of the run; nothing holds a reference past it.
#[derive(Debug, Clone)]
pub struct SemesterSnapshot {
    pub semester: Semester,
    pub assignments: Vec<CourseAssignment>,
    pub time_slots: Vec<TimeSlot>,
    pub rooms: Vec<Room>,
    pub preferences: Vec<Preference>,
    pub existing_schedules: Vec<Schedule>,
}

/// Gathers the snapshot for one semester.
pub fn load_snapshot(
    store: &impl ScheduleStore,
    semester_id: SemesterId,
) -> Result<SemesterSnapshot, ScheduleError> {
    let semester = store
        .semester(semester_id)?
        .ok_or(ScheduleError::SemesterNotFound(semester_id))?;

    let assignments = store.assignments_for_semester(semester_id)?;
    let mut time_slots = store.time_slots()?;
    let mut rooms = store.rooms()?;
    let preferences = store.preferences()?;
    let existing_schedules = store.schedules_for_semester(semester_id)?;

    // Candidate enumeration walks these catalogs in order; pin the order down
    // so equal-score ties resolve identically on every storage backend.
    time_slots.sort_by(|a, b| {
        (a.day_of_week, a.start_time.as_str(), a.id)
            .cmp(&(b.day_of_week, b.start_time.as_str(), b.id))
    });
    rooms.sort_by_key(|room| room.id);

    info!(
        "Loaded snapshot for semester {} ({}): {} assignments, {} time slots, {} rooms, {} preferences, {} committed schedules",
        semester.id,
        semester.name,
        assignments.len(),
        time_slots.len(),
        rooms.len(),
        preferences.len(),
        existing_schedules.len()
    );

    Ok(SemesterSnapshot {
        semester,
        assignments,
        time_slots,
        rooms,
        preferences,
        existing_schedules,
    })
}

/// Whole catalog held in memory. Backs the HTTP endpoint, where it arrives as
/// the request body, and serves as the fixture type in tests.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InMemoryStore {
    #[serde(default)]
    pub semesters: Vec<Semester>,
    #[serde(default)]
    pub assignments: Vec<CourseAssignment>,
    #[serde(default)]
    pub time_slots: Vec<TimeSlot>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub preferences: Vec<Preference>,
    #[serde(default)]
    pub schedules: Vec<Schedule>,
}

impl ScheduleStore for InMemoryStore {
    fn semester(&self, id: SemesterId) -> Result<Option<Semester>, ScheduleError> {
        Ok(self.semesters.iter().find(|s| s.id == id).cloned())
    }

    fn assignments_for_semester(
        &self,
        id: SemesterId,
    ) -> Result<Vec<CourseAssignment>, ScheduleError> {
        Ok(self
            .assignments
            .iter()
            .filter(|a| a.semester_id == id)
            .cloned()
            .collect())
    }

    fn time_slots(&self) -> Result<Vec<TimeSlot>, ScheduleError> {
        Ok(self.time_slots.clone())
    }

    fn rooms(&self) -> Result<Vec<Room>, ScheduleError> {
        Ok(self.rooms.clone())
    }

    fn preferences(&self) -> Result<Vec<Preference>, ScheduleError> {
        Ok(self.preferences.clone())
    }

    fn schedules_for_semester(&self, id: SemesterId) -> Result<Vec<Schedule>, ScheduleError> {
        Ok(self
            .schedules
            .iter()
            .filter(|s| s.semester_id == id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Capacity, CourseType, PreferenceLevel, PreferenceTarget};
    use serde_json::json;

    fn slot(id: u32, day: u8, start: &str) -> TimeSlot {
        TimeSlot {
            id,
            college_id: 1,
            name: format!("Slot {id}"),
            day_of_week: day,
            start_time: start.to_string(),
            end_time: "23:00".to_string(),
        }
    }

    fn room(id: u32) -> Room {
        Room {
            id,
            building_id: 1,
            building: "Main".to_string(),
            name: format!("R{id}"),
            capacity: 40,
            kind: None,
        }
    }

    #[test]
    fn missing_semester_is_reported() {
        let store = InMemoryStore::default();
        let result = load_snapshot(&store, 7);
        assert!(matches!(result, Err(ScheduleError::SemesterNotFound(7))));
    }

    #[test]
    fn catalogs_come_back_in_a_fixed_order() {
        let store = InMemoryStore {
            semesters: vec![Semester {
                id: 1,
                name: "Fall 2025".to_string(),
            }],
            time_slots: vec![
                slot(3, 2, "08:00"),
                slot(1, 1, "10:00"),
                slot(5, 1, "08:00"),
                slot(2, 1, "08:00"),
            ],
            rooms: vec![room(3), room(1), room(2)],
            ..Default::default()
        };

        let snapshot = load_snapshot(&store, 1).unwrap();
        let slot_ids: Vec<u32> = snapshot.time_slots.iter().map(|s| s.id).collect();
        assert_eq!(slot_ids, vec![2, 5, 1, 3]);
        let room_ids: Vec<u32> = snapshot.rooms.iter().map(|r| r.id).collect();
        assert_eq!(room_ids, vec![1, 2, 3]);
    }

    #[test]
    fn deserializes_the_catalog_wire_format() {
        let store: InMemoryStore = serde_json::from_value(json!({
            "semesters": [{ "id": 1, "name": "Fall 2025" }],
            "assignments": [{
                "id": 10,
                "semesterId": 1,
                "course": { "code": "CS101", "name": "Intro to CS", "type": "THEORY", "credits": 4 },
                "teacherId": 7,
                "capacity": { "source": "section", "size": 40 }
            }, {
                "id": 11,
                "semesterId": 1,
                "course": { "code": "CS102L", "name": "CS Lab", "type": "SEMINAR", "credits": 2 }
            }],
            "timeSlots": [{
                "id": 1, "collegeId": 1, "name": "Mon 09:00-10:30",
                "dayOfWeek": 1, "startTime": "09:00", "endTime": "10:30"
            }],
            "rooms": [{
                "id": 1, "buildingId": 1, "building": "Main", "name": "A-101",
                "capacity": 60, "type": "Lecture"
            }],
            "preferences": [{
                "id": 1, "userId": 7, "level": "PREFERRED",
                "type": "TIME_SLOT", "timeSlotId": 1
            }, {
                "id": 2, "userId": 7, "level": "NOT_PREFERRED",
                "type": "ROOM", "roomId": 1, "note": "projector is broken"
            }],
            "schedules": []
        }))
        .unwrap();

        assert_eq!(store.assignments[0].course.kind, CourseType::Theory);
        assert_eq!(store.assignments[0].capacity, Capacity::Section(40));
        assert_eq!(store.assignments[0].teacher_id, Some(7));
        assert_eq!(store.assignments[0].assistant_id, None);
        // Unknown course type labels and omitted capacity fall back.
        assert_eq!(store.assignments[1].course.kind, CourseType::Other);
        assert_eq!(store.assignments[1].capacity, Capacity::Default);
        assert_eq!(
            store.preferences[0].target,
            PreferenceTarget::TimeSlot { time_slot_id: 1 }
        );
        assert_eq!(store.preferences[0].level, PreferenceLevel::Preferred);
        assert_eq!(
            store.preferences[1].target,
            PreferenceTarget::Room { room_id: 1 }
        );
        assert_eq!(store.preferences[1].note.as_deref(), Some("projector is broken"));
    }
}
