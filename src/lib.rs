pub mod calendar;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod ledger;
pub mod logging;
pub mod persistence;
pub mod projection;
pub mod timetable;

pub use calendar::{CalendarConfigError, SemesterCalendar, SemesterCalendarConfig};
pub use ledger::session_ledger;
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteTimetableStore;
pub use persistence::{
    JsonTimetableStore, MemoryTimetableStore, PersistenceError, TimetableRecord, TimetableStore,
    load_calendar_config, load_timetables_from_csv, save_calendar_config, save_timetables_to_csv,
};
pub use projection::{
    AttendanceQuery, CheckpointProjection, Inconsistency, ProjectionError, ProjectionResult,
    TodayStatus, project, should_ask_about_today,
};
pub use timetable::{Timetable, TimetableError};
