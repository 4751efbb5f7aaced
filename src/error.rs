use crate::data::SemesterId;

/// Errors that abort a generation run outright. Per-assignment placement
/// failures are not errors; they come back as conflict strings in the output.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// The requested semester does not exist.
    #[error("Semester {0} not found")]
    SemesterNotFound(SemesterId),

    /// Malformed catalog data or a failed store read. The whole run fails;
    /// no partial results are returned.
    #[error("Schedule generation failed: {0}")]
    Generation(String),
}
