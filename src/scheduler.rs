use std::cmp::Reverse;
use std::collections::HashMap;
use std::time::Instant;

use itertools::Itertools;
use log::{debug, info, trace};

use crate::data::{
    AssignmentId, CourseAssignment, CourseType, GenerationOutput, Placement, Preference,
    PreferenceLevel, PreferenceTarget, Room, ScheduleCandidate, SemesterId, TimeSlot, TimeSlotId,
    UserId,
};
use crate::error::ScheduleError;
use crate::snapshot::{load_snapshot, ScheduleStore, SemesterSnapshot};

/// Every candidate starts from this before the soft deltas apply.
const BASE_SCORE: i32 = 100;

/// Per-level score deltas for one class of preference records.
struct PreferenceWeights {
    preferred: i32,
    acceptable: i32,
    not_preferred: i32,
}

impl PreferenceWeights {
    fn delta(&self, level: PreferenceLevel) -> i32 {
        match level {
            PreferenceLevel::Preferred => self.preferred,
            PreferenceLevel::Acceptable => self.acceptable,
            PreferenceLevel::NotPreferred => self.not_preferred,
        }
    }
}

// soft score weights; teacher opinions outweigh assistant ones, and
// assistants are never asked about rooms
const TEACHER_TIME: PreferenceWeights = PreferenceWeights {
    preferred: 50,
    acceptable: 10,
    not_preferred: -30,
};
const TEACHER_ROOM: PreferenceWeights = PreferenceWeights {
    preferred: 30,
    acceptable: 5,
    not_preferred: -20,
};
const ASSISTANT_TIME: PreferenceWeights = PreferenceWeights {
    preferred: 20,
    acceptable: 5,
    not_preferred: -15,
};

// room utilization: reward comfortably full rooms, discourage half-empty ones
const GOOD_UTILIZATION_BONUS: i32 = 20;
const LOW_UTILIZATION_PENALTY: i32 = 10;

// theory belongs in mornings, labs in afternoons
const DAYPART_BONUS: i32 = 15;

/// Generates placements for every unscheduled assignment in a semester.
///
/// Committed schedules are hard constraints and are never moved. Assignments
/// with no conflict-free candidate come back in `unscheduled` with one
/// conflict message each; they never fail the run.
pub fn generate_schedule(
    store: &impl ScheduleStore,
    semester_id: SemesterId,
) -> Result<GenerationOutput, ScheduleError> {
    let snapshot = load_snapshot(store, semester_id)?;
    generate_from_snapshot(&snapshot)
}

/// Pure generation pass over an already-loaded snapshot. Single forward
/// pass: decisions are final, an assignment that fails placement is not
/// reconsidered even if later choices would have freed a slot.
pub fn generate_from_snapshot(
    snapshot: &SemesterSnapshot,
) -> Result<GenerationOutput, ScheduleError> {
    let start_time = Instant::now();
    let run = RunContext::new(snapshot);

    let pending = run.pending_assignments();
    info!(
        "Scheduling {} of {} assignments ({} already committed)",
        pending.len(),
        snapshot.assignments.len(),
        snapshot.assignments.len() - pending.len()
    );

    let mut chosen: Vec<ScheduleCandidate> = Vec::new();
    let mut conflicts: Vec<String> = Vec::new();
    let mut unscheduled: Vec<AssignmentId> = Vec::new();

    for assignment in &pending {
        let candidates = run.candidates_for(assignment)?;
        trace!(
            "{} feasible candidates for assignment {} ({})",
            candidates.len(),
            assignment.id,
            assignment.course.code
        );

        match run.select(&candidates, &chosen) {
            Some(candidate) => {
                debug!("Placed {}", candidate);
                chosen.push(candidate);
            }
            None => {
                unscheduled.push(assignment.id);
                conflicts.push(format!(
                    "Could not schedule {} ({})",
                    assignment.course.name, assignment.course.code
                ));
            }
        }
    }

    info!(
        "Placed {}/{} assignments ({} unscheduled) in {:.2?}",
        chosen.len(),
        pending.len(),
        unscheduled.len(),
        start_time.elapsed()
    );

    Ok(GenerationOutput {
        placements: chosen.iter().map(Placement::from).collect(),
        conflicts,
        unscheduled,
    })
}

/// Lookup maps shared by scoring, conflict checks and selection for one run.
struct RunContext<'a> {
    snapshot: &'a SemesterSnapshot,
    assignment_map: HashMap<AssignmentId, &'a CourseAssignment>,
    prefs_by_user: HashMap<UserId, Vec<&'a Preference>>,
}

impl<'a> RunContext<'a> {
    fn new(snapshot: &'a SemesterSnapshot) -> Self {
        // lookups
        let assignment_map = snapshot.assignments.iter().map(|a| (a.id, a)).collect();
        let prefs_by_user = snapshot
            .preferences
            .iter()
            .map(|p| (p.user_id, p))
            .into_group_map();
        Self {
            snapshot,
            assignment_map,
            prefs_by_user,
        }
    }

    /// Assignments still needing a schedule, hardest-to-place first: theory
    /// before labs before tutorials, higher credits breaking ties. The sort
    /// is stable, so otherwise-equal assignments keep their catalog order.
    fn pending_assignments(&self) -> Vec<&'a CourseAssignment> {
        let mut pending: Vec<&CourseAssignment> = self
            .snapshot
            .assignments
            .iter()
            .filter(|a| {
                !self
                    .snapshot
                    .existing_schedules
                    .iter()
                    .any(|s| s.course_assignment_id == a.id)
            })
            .collect();
        pending.sort_by(|a, b| {
            a.course
                .kind
                .priority_rank()
                .cmp(&b.course.kind.priority_rank())
                .then(b.course.credits.cmp(&a.course.credits))
        });
        pending
    }

    /// Enumerates every feasible (slot, room) pair for one assignment,
    /// scored and sorted best-first. Conflicts against committed schedules
    /// are recorded on each candidate here, not enforced; the selector
    /// enforces them.
    fn candidates_for(
        &self,
        assignment: &CourseAssignment,
    ) -> Result<Vec<ScheduleCandidate>, ScheduleError> {
        let headcount = assignment.capacity.headcount();
        let mut candidates = Vec::new();

        for slot in &self.snapshot.time_slots {
            let hour = start_hour(slot)?;
            for room in &self.snapshot.rooms {
                if !room_suits(room, assignment.course.kind, headcount) {
                    continue;
                }
                candidates.push(ScheduleCandidate {
                    assignment_id: assignment.id,
                    time_slot_id: slot.id,
                    room_id: room.id,
                    score: self.score(assignment, slot, room, headcount, hour),
                    conflicts: self.committed_conflicts(assignment, slot, room),
                });
            }
        }

        // stable, so equal scores keep slot-major enumeration order
        candidates.sort_by_key(|c| Reverse(c.score));
        Ok(candidates)
    }

    /// Conflicts against already-committed schedules only. Collisions with
    /// placements made earlier in the same run are the selector's concern.
    fn committed_conflicts(
        &self,
        assignment: &CourseAssignment,
        slot: &TimeSlot,
        room: &Room,
    ) -> Vec<String> {
        let mut conflicts = Vec::new();

        if let Some(teacher) = assignment.teacher_id {
            if self.committed_at(slot.id, |a| a.teacher_id == Some(teacher)) {
                conflicts.push("Teacher already scheduled at this time".to_string());
            }
        }
        if let Some(assistant) = assignment.assistant_id {
            if self.committed_at(slot.id, |a| a.assistant_id == Some(assistant)) {
                conflicts.push("Assistant already scheduled at this time".to_string());
            }
        }
        if self
            .snapshot
            .existing_schedules
            .iter()
            .any(|s| s.time_slot_id == slot.id && s.room_id == room.id)
        {
            conflicts.push("Room already booked at this time".to_string());
        }

        conflicts
    }

    /// True if some committed schedule at `slot` belongs to an assignment
    /// matching the predicate.
    fn committed_at(&self, slot: TimeSlotId, matches: impl Fn(&CourseAssignment) -> bool) -> bool {
        self.snapshot.existing_schedules.iter().any(|s| {
            s.time_slot_id == slot
                && self
                    .assignment_map
                    .get(&s.course_assignment_id)
                    .is_some_and(|a| matches(a))
        })
    }

    /// Soft score for one (slot, room) pair. Hard constraints never touch
    /// the score; an unusable pair is filtered or conflict-listed instead.
    fn score(
        &self,
        assignment: &CourseAssignment,
        slot: &TimeSlot,
        room: &Room,
        headcount: u32,
        start_hour: u32,
    ) -> i32 {
        let mut score = BASE_SCORE;

        if let Some(teacher) = assignment.teacher_id {
            for pref in self.preferences_of(teacher) {
                match pref.target {
                    PreferenceTarget::TimeSlot { time_slot_id } if time_slot_id == slot.id => {
                        score += TEACHER_TIME.delta(pref.level);
                    }
                    PreferenceTarget::Room { room_id } if room_id == room.id => {
                        score += TEACHER_ROOM.delta(pref.level);
                    }
                    _ => {}
                }
            }
        }

        if let Some(assistant) = assignment.assistant_id {
            for pref in self.preferences_of(assistant) {
                if let PreferenceTarget::TimeSlot { time_slot_id } = pref.target {
                    if time_slot_id == slot.id {
                        score += ASSISTANT_TIME.delta(pref.level);
                    }
                }
            }
        }

        let utilization = headcount as f64 / room.capacity as f64;
        if (0.7..=0.9).contains(&utilization) {
            score += GOOD_UTILIZATION_BONUS;
        } else if utilization < 0.5 {
            score -= LOW_UTILIZATION_PENALTY;
        }

        match assignment.course.kind {
            CourseType::Theory if (8..=11).contains(&start_hour) => score += DAYPART_BONUS,
            CourseType::Lab if (13..=17).contains(&start_hour) => score += DAYPART_BONUS,
            _ => {}
        }

        score
    }

    fn preferences_of(&self, user: UserId) -> impl Iterator<Item = &&'a Preference> {
        self.prefs_by_user.get(&user).into_iter().flatten()
    }

    /// Walks the score-sorted candidates and takes the first that is clean
    /// against both the committed schedules and every placement chosen
    /// earlier in this run. None means the assignment stays unscheduled.
    fn select(
        &self,
        candidates: &[ScheduleCandidate],
        chosen: &[ScheduleCandidate],
    ) -> Option<ScheduleCandidate> {
        candidates
            .iter()
            .find(|candidate| {
                candidate.conflicts.is_empty()
                    && !chosen.iter().any(|placed| self.collides(candidate, placed))
            })
            .cloned()
    }

    /// Same-run collision: shared room, teacher or assistant at one slot.
    fn collides(&self, a: &ScheduleCandidate, b: &ScheduleCandidate) -> bool {
        if a.time_slot_id != b.time_slot_id {
            return false;
        }
        if a.room_id == b.room_id {
            return true;
        }
        let (Some(left), Some(right)) = (
            self.assignment_map.get(&a.assignment_id),
            self.assignment_map.get(&b.assignment_id),
        ) else {
            return false;
        };
        (left.teacher_id.is_some() && left.teacher_id == right.teacher_id)
            || (left.assistant_id.is_some() && left.assistant_id == right.assistant_id)
    }
}

/// Capacity and room-type feasibility. Infeasible pairs are never scored and
/// never become candidates.
fn room_suits(room: &Room, kind: CourseType, headcount: u32) -> bool {
    if room.capacity < headcount {
        return false;
    }
    // labs only go into rooms labelled as labs
    if kind == CourseType::Lab {
        return room
            .kind
            .as_deref()
            .is_some_and(|label| label.to_lowercase().contains("lab"));
    }
    true
}

/// Hour component of a slot's "HH:MM" start time.
fn start_hour(slot: &TimeSlot) -> Result<u32, ScheduleError> {
    let (hour, _) = slot
        .start_time
        .split_once(':')
        .unwrap_or((slot.start_time.as_str(), ""));
    hour.parse().map_err(|_| {
        ScheduleError::Generation(format!(
            "time slot {} has unparsable start time '{}'",
            slot.id, slot.start_time
        ))
    })
}
