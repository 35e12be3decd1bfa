use crate::calendar::SemesterCalendar;
use crate::timetable::Timetable;
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

pub const LEDGER_COLUMNS: [&str; 5] = ["date", "weekday", "teaching_day", "sessions", "cumulative"];

/// Day-by-day session breakdown for `[start, end]`, one row per calendar day.
///
/// `cumulative` is the running total of sessions from `start`, so the last row
/// equals `calendar.sessions_between(start, end, timetable)` when the range is
/// within the semester.
pub fn session_ledger(
    calendar: &SemesterCalendar,
    timetable: &Timetable,
    start: NaiveDate,
    end: NaiveDate,
) -> PolarsResult<DataFrame> {
    let mut dates = Vec::new();
    let mut weekdays = Vec::new();
    let mut teaching = Vec::new();
    let mut sessions = Vec::new();
    let mut cumulative = Vec::new();

    let mut running: i64 = 0;
    let mut current = start;
    while current <= end {
        let count = i64::from(calendar.sessions_on(current, timetable));
        running += count;

        dates.push(current.format("%Y-%m-%d").to_string());
        weekdays.push(current.weekday().to_string());
        teaching.push(calendar.is_working_day(current));
        sessions.push(count);
        cumulative.push(running);

        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }

    polars::df!(
        "date" => dates,
        "weekday" => weekdays,
        "teaching_day" => teaching,
        "sessions" => sessions,
        "cumulative" => cumulative,
    )
}
