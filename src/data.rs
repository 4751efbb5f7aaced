use serde::{Deserialize, Serialize};
use std::fmt;

// Type aliases for clarity
pub type SemesterId = u32;
pub type AssignmentId = u32;
pub type TimeSlotId = u32;
pub type RoomId = u32;
pub type UserId = u32;
pub type CollegeId = u32;
pub type BuildingId = u32;

/// Headcount assumed when an assignment has neither a section nor a group.
pub const DEFAULT_HEADCOUNT: u32 = 30;

/// A semester whose assignments are to be scheduled.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Semester {
    pub id: SemesterId,
    pub name: String,
}

/// Kind of teaching a course delivers. Catalogs store this as free text, so
/// unrecognized labels deserialize to `Other` and sort last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum CourseType {
    Theory,
    Lab,
    Tutorial,
    Other,
}

impl CourseType {
    /// Scheduling priority rank: theory claims preferred slots first.
    pub fn priority_rank(self) -> u8 {
        match self {
            CourseType::Theory => 1,
            CourseType::Lab => 2,
            CourseType::Tutorial => 3,
            CourseType::Other => 4,
        }
    }
}

impl From<String> for CourseType {
    fn from(label: String) -> Self {
        match label.as_str() {
            "THEORY" => CourseType::Theory,
            "LAB" => CourseType::Lab,
            "TUTORIAL" => CourseType::Tutorial,
            _ => CourseType::Other,
        }
    }
}

impl From<CourseType> for String {
    fn from(kind: CourseType) -> Self {
        match kind {
            CourseType::Theory => "THEORY",
            CourseType::Lab => "LAB",
            CourseType::Tutorial => "TUTORIAL",
            CourseType::Other => "OTHER",
        }
        .to_string()
    }
}

/// Course facts carried on each assignment, joined in by the store.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CourseType,
    pub credits: u32,
}

/// Where an assignment's headcount requirement comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", tag = "source", content = "size")]
pub enum Capacity {
    /// Enrollment strength of the section being taught.
    Section(u32),
    /// Size of the student group being taught.
    Group(u32),
    /// Neither a section nor a group applies.
    Default,
}

impl Capacity {
    /// Seats the assignment needs in a room.
    pub fn headcount(self) -> u32 {
        match self {
            Capacity::Section(strength) => strength,
            Capacity::Group(size) => size,
            Capacity::Default => DEFAULT_HEADCOUNT,
        }
    }
}

impl Default for Capacity {
    fn default() -> Self {
        Capacity::Default
    }
}

/// One teaching obligation to place: a course taught in a semester,
/// optionally by a teacher and an assistant.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseAssignment {
    pub id: AssignmentId,
    pub semester_id: SemesterId,
    pub course: Course,
    #[serde(default)]
    pub teacher_id: Option<UserId>,
    #[serde(default)]
    pub assistant_id: Option<UserId>,
    #[serde(default)]
    pub capacity: Capacity,
}

/// A weekly recurring interval available for scheduling.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub id: TimeSlotId,
    pub college_id: CollegeId,
    pub name: String,
    /// 1 = Monday .. 7 = Sunday.
    pub day_of_week: u8,
    /// Zero-padded "HH:MM", 24-hour.
    pub start_time: String,
    pub end_time: String,
}

/// A physical room with a seating capacity and an optional type label.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub building_id: BuildingId,
    pub building: String,
    pub name: String,
    pub capacity: u32,
    /// Free text, e.g. "Lecture" or "Computer Lab".
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// How strongly a user feels about a time slot or room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PreferenceLevel {
    Preferred,
    Acceptable,
    NotPreferred,
}

/// What a preference record points at; never both on one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PreferenceTarget {
    TimeSlot {
        #[serde(rename = "timeSlotId")]
        time_slot_id: TimeSlotId,
    },
    Room {
        #[serde(rename = "roomId")]
        room_id: RoomId,
    },
}

/// One user's stated affinity for a slot or room, consumed only by scoring.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preference {
    pub id: u32,
    pub user_id: UserId,
    pub level: PreferenceLevel,
    #[serde(flatten)]
    pub target: PreferenceTarget,
    #[serde(default)]
    pub note: Option<String>,
}

/// A committed placement. Rows persisted before a run are immutable hard
/// constraints; the generator never moves them.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: u32,
    pub course_assignment_id: AssignmentId,
    pub time_slot_id: TimeSlotId,
    pub room_id: RoomId,
    pub semester_id: SemesterId,
}

/// A scored, not-yet-committed placement proposal for one assignment.
/// Created and discarded within a single generation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleCandidate {
    pub assignment_id: AssignmentId,
    pub time_slot_id: TimeSlotId,
    pub room_id: RoomId,
    pub score: i32,
    pub conflicts: Vec<String>,
}

impl fmt::Display for ScheduleCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "assignment {} at slot {} in room {} (score {})",
            self.assignment_id, self.time_slot_id, self.room_id, self.score
        )
    }
}

/// A single chosen placement in the final output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub assignment_id: AssignmentId,
    pub time_slot_id: TimeSlotId,
    pub room_id: RoomId,
}

impl From<&ScheduleCandidate> for Placement {
    fn from(candidate: &ScheduleCandidate) -> Self {
        Placement {
            assignment_id: candidate.assignment_id,
            time_slot_id: candidate.time_slot_id,
            room_id: candidate.room_id,
        }
    }
}

/// The final output of a generation run. Persisting `placements` is the
/// caller's job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutput {
    pub placements: Vec<Placement>,
    pub conflicts: Vec<String>,
    pub unscheduled: Vec<AssignmentId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headcount_resolves_once_per_source() {
        assert_eq!(Capacity::Section(45).headcount(), 45);
        assert_eq!(Capacity::Group(20).headcount(), 20);
        assert_eq!(Capacity::Default.headcount(), DEFAULT_HEADCOUNT);
    }

    #[test]
    fn course_type_rank_orders_theory_first() {
        assert!(CourseType::Theory.priority_rank() < CourseType::Lab.priority_rank());
        assert!(CourseType::Lab.priority_rank() < CourseType::Tutorial.priority_rank());
        assert!(CourseType::Tutorial.priority_rank() < CourseType::Other.priority_rank());
    }

    #[test]
    fn unknown_course_labels_fall_back_to_other() {
        assert_eq!(CourseType::from("THEORY".to_string()), CourseType::Theory);
        assert_eq!(CourseType::from("LAB".to_string()), CourseType::Lab);
        assert_eq!(CourseType::from("SEMINAR".to_string()), CourseType::Other);
    }
}
