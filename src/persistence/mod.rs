use crate::calendar::CalendarConfigError;
use crate::timetable::Timetable;
use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeJsonError;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum PersistenceError {
    Serialization(SerdeJsonError),
    Io(io::Error),
    #[cfg(feature = "sqlite")]
    Sqlite(rusqlite::Error),
    Csv(csv::Error),
    Calendar(CalendarConfigError),
    InvalidData(String),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Serialization(err) => write!(f, "serialization error: {err}"),
            PersistenceError::Io(err) => write!(f, "io error: {err}"),
            #[cfg(feature = "sqlite")]
            PersistenceError::Sqlite(err) => write!(f, "sqlite error: {err}"),
            PersistenceError::Csv(err) => write!(f, "csv error: {err}"),
            PersistenceError::Calendar(err) => write!(f, "calendar error: {err}"),
            PersistenceError::InvalidData(msg) => write!(f, "invalid data: {msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<SerdeJsonError> for PersistenceError {
    fn from(value: SerdeJsonError) -> Self {
        Self::Serialization(value)
    }
}

impl From<io::Error> for PersistenceError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<csv::Error> for PersistenceError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<CalendarConfigError> for PersistenceError {
    fn from(value: CalendarConfigError) -> Self {
        Self::Calendar(value)
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// A stored timetable together with its owner and last write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableRecord {
    pub student_id: String,
    pub timetable: Timetable,
    /// RFC 3339 UTC timestamp of the last save.
    pub updated_at: String,
}

impl TimetableRecord {
    pub fn new(student_id: impl Into<String>, timetable: Timetable) -> Self {
        Self {
            student_id: student_id.into(),
            timetable,
            updated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// One timetable per student. Saving replaces any existing timetable.
pub trait TimetableStore {
    fn load_timetable(&self, student_id: &str) -> PersistenceResult<Option<Timetable>>;
    fn save_timetable(&self, student_id: &str, timetable: &Timetable) -> PersistenceResult<()>;
}

pub fn validate_student_id(student_id: &str) -> PersistenceResult<()> {
    if student_id.trim().is_empty() {
        return Err(PersistenceError::InvalidData(
            "student id must not be empty".into(),
        ));
    }
    Ok(())
}

pub fn validate_timetable(timetable: &Timetable) -> PersistenceResult<()> {
    timetable
        .validate()
        .map_err(|err| PersistenceError::InvalidData(err.to_string()))
}

pub fn validate_record(record: &TimetableRecord) -> PersistenceResult<()> {
    validate_student_id(&record.student_id)?;
    validate_timetable(&record.timetable)
}

pub mod file;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    JsonTimetableStore, load_calendar_config, load_timetables_from_csv, save_calendar_config,
    save_timetables_to_csv,
};
pub use memory::MemoryTimetableStore;
