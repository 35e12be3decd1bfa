use crate::timetable::Timetable;
use chrono::{Datelike, NaiveDate, Weekday};
use log::error;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

const EVEN_SEMESTER_START: NaiveDate = ymd(2025, 12, 1);
const EVEN_SEMESTER_END: NaiveDate = ymd(2026, 4, 15);
const EVEN_SEMESTER_CHECKPOINT: NaiveDate = ymd(2026, 2, 3);

// Only evaluated in const items, so a bad literal fails the build.
const fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => date,
        None => panic!("invalid built-in calendar date"),
    }
}

/// Teaching calendar for a single semester.
///
/// A date is a working day when it falls inside the semester bounds, is a
/// Monday through Friday, and is not listed as a non-teaching date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemesterCalendar {
    semester_start: NaiveDate,
    semester_end: NaiveDate,
    checkpoint_date: NaiveDate,
    non_teaching_dates: HashSet<NaiveDate>,
}

/// Serializable form of [`SemesterCalendar`].
///
/// Non-teaching dates are grouped per month (`"YYYY-MM"` -> days of month).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemesterCalendarConfig {
    pub semester_start: NaiveDate,
    pub semester_end: NaiveDate,
    pub checkpoint_date: NaiveDate,
    #[serde(default)]
    pub non_teaching_dates: BTreeMap<String, Vec<u32>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarConfigError {
    StartAfterEnd {
        start: NaiveDate,
        end: NaiveDate,
    },
    CheckpointOutOfRange {
        checkpoint: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    },
    InvalidMonthKey(String),
    InvalidDay {
        month: String,
        day: u32,
    },
}

impl fmt::Display for CalendarConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalendarConfigError::StartAfterEnd { start, end } => write!(
                f,
                "semester start {start} must be on or before semester end {end}"
            ),
            CalendarConfigError::CheckpointOutOfRange {
                checkpoint,
                start,
                end,
            } => write!(
                f,
                "checkpoint date {checkpoint} must lie within the semester {start}..={end}"
            ),
            CalendarConfigError::InvalidMonthKey(key) => {
                write!(f, "invalid month key '{key}' (expected YYYY-MM)")
            }
            CalendarConfigError::InvalidDay { month, day } => {
                write!(f, "day {day} does not exist in month {month}")
            }
        }
    }
}

impl std::error::Error for CalendarConfigError {}

impl Default for SemesterCalendar {
    fn default() -> Self {
        Self::even_semester_2026()
    }
}

impl SemesterCalendar {
    pub fn new<I>(
        semester_start: NaiveDate,
        semester_end: NaiveDate,
        checkpoint_date: NaiveDate,
        non_teaching_dates: I,
    ) -> Result<Self, CalendarConfigError>
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        if semester_start > semester_end {
            return Err(CalendarConfigError::StartAfterEnd {
                start: semester_start,
                end: semester_end,
            });
        }
        if checkpoint_date < semester_start || checkpoint_date > semester_end {
            return Err(CalendarConfigError::CheckpointOutOfRange {
                checkpoint: checkpoint_date,
                start: semester_start,
                end: semester_end,
            });
        }
        Ok(Self {
            semester_start,
            semester_end,
            checkpoint_date,
            non_teaching_dates: non_teaching_dates.into_iter().collect(),
        })
    }

    pub fn from_config(config: &SemesterCalendarConfig) -> Result<Self, CalendarConfigError> {
        let mut dates = Vec::new();
        for (month_key, days) in &config.non_teaching_dates {
            let (year, month) = parse_month_key(month_key)?;
            for &day in days {
                let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
                    CalendarConfigError::InvalidDay {
                        month: month_key.clone(),
                        day,
                    }
                })?;
                dates.push(date);
            }
        }
        Self::new(
            config.semester_start,
            config.semester_end,
            config.checkpoint_date,
            dates,
        )
    }

    pub fn to_config(&self) -> SemesterCalendarConfig {
        SemesterCalendarConfig::from(self)
    }

    /// The Dec 2025 - Apr 2026 term with its published holiday list.
    fn even_semester_2026() -> Self {
        match Self::from_config(&SemesterCalendarConfig::even_semester_2026()) {
            Ok(calendar) => calendar,
            Err(err) => {
                error!("event=default_calendar_invalid module=calendar error=\"{err}\"");
                Self {
                    semester_start: EVEN_SEMESTER_START,
                    semester_end: EVEN_SEMESTER_END,
                    checkpoint_date: EVEN_SEMESTER_CHECKPOINT,
                    non_teaching_dates: HashSet::new(),
                }
            }
        }
    }

    pub fn semester_start(&self) -> NaiveDate {
        self.semester_start
    }

    pub fn semester_end(&self) -> NaiveDate {
        self.semester_end
    }

    pub fn checkpoint_date(&self) -> NaiveDate {
        self.checkpoint_date
    }

    /// Non-teaching dates in ascending order.
    pub fn non_teaching_dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.non_teaching_dates.iter().copied().collect();
        dates.sort();
        dates
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.semester_start && date <= self.semester_end
    }

    /// Check if classes are held on a date
    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        if !self.contains(date) {
            return false;
        }
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        !self.non_teaching_dates.contains(&date)
    }

    /// Sessions held on a single date under the weekly timetable.
    pub fn sessions_on(&self, date: NaiveDate, timetable: &Timetable) -> u32 {
        if !self.is_working_day(date) {
            return 0;
        }
        timetable.sessions_on(date.weekday())
    }

    /// Sum of sessions over `[start, end]` clipped to the semester.
    ///
    /// Walks day by day so every date is checked against the holiday set.
    /// Returns 0 when `start > end`.
    pub fn sessions_between(&self, start: NaiveDate, end: NaiveDate, timetable: &Timetable) -> u32 {
        let mut total = 0;
        let mut current = start.max(self.semester_start);

        while current <= end && current <= self.semester_end {
            total += self.sessions_on(current, timetable);
            match current.succ_opt() {
                Some(next) => current = next,
                None => break,
            }
        }
        total
    }

    /// Sessions strictly after `date` through the end of the semester.
    pub fn sessions_after(&self, date: NaiveDate, timetable: &Timetable) -> u32 {
        match date.succ_opt() {
            Some(next) => self.sessions_between(next, self.semester_end, timetable),
            None => 0,
        }
    }

    /// Get all working days in a date range
    pub fn teaching_days_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let mut days = Vec::new();
        let mut current = start.max(self.semester_start);

        while current <= end && current <= self.semester_end {
            if self.is_working_day(current) {
                days.push(current);
            }
            match current.succ_opt() {
                Some(next) => current = next,
                None => break,
            }
        }
        days
    }

    /// Count working days in a date range
    pub fn count_teaching_days(&self, start: NaiveDate, end: NaiveDate) -> u32 {
        self.teaching_days_in_range(start, end).len() as u32
    }
}

fn parse_month_key(key: &str) -> Result<(i32, u32), CalendarConfigError> {
    let invalid = || CalendarConfigError::InvalidMonthKey(key.to_string());
    let (year, month) = key.trim().split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((year, month))
}

fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

impl SemesterCalendarConfig {
    fn even_semester_2026() -> Self {
        let holidays: [(&str, &[u32]); 5] = [
            (
                "2025-12",
                &[6, 7, 13, 14, 20, 21, 22, 23, 24, 25, 26, 27, 28],
            ),
            (
                "2026-01",
                &[3, 4, 10, 11, 12, 13, 14, 15, 16, 17, 18, 24, 25, 26, 31],
            ),
            (
                "2026-02",
                &[1, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 21, 22, 28],
            ),
            ("2026-03", &[1, 7, 8, 14, 15, 20, 21, 22, 28, 29]),
            ("2026-04", &[3, 4, 5, 11, 12, 14]),
        ];

        Self {
            semester_start: EVEN_SEMESTER_START,
            semester_end: EVEN_SEMESTER_END,
            checkpoint_date: EVEN_SEMESTER_CHECKPOINT,
            non_teaching_dates: holidays
                .iter()
                .map(|(key, days)| (key.to_string(), days.to_vec()))
                .collect(),
        }
    }
}

impl Default for SemesterCalendarConfig {
    fn default() -> Self {
        Self::even_semester_2026()
    }
}

impl From<&SemesterCalendar> for SemesterCalendarConfig {
    fn from(calendar: &SemesterCalendar) -> Self {
        let mut grouped: BTreeMap<String, BTreeSet<u32>> = BTreeMap::new();
        for date in &calendar.non_teaching_dates {
            grouped.entry(month_key(*date)).or_default().insert(date.day());
        }

        Self {
            semester_start: calendar.semester_start,
            semester_end: calendar.semester_end,
            checkpoint_date: calendar.checkpoint_date,
            non_teaching_dates: grouped
                .into_iter()
                .map(|(key, days)| (key, days.into_iter().collect()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn month_keys_parse_and_reject_garbage() {
        assert_eq!(parse_month_key("2026-02").unwrap(), (2026, 2));
        assert!(parse_month_key("2026-13").is_err());
        assert!(parse_month_key("202602").is_err());
        assert!(parse_month_key("abcd-01").is_err());
    }

    #[test]
    fn default_config_matches_default_calendar() {
        let from_config =
            SemesterCalendar::from_config(&SemesterCalendarConfig::default()).unwrap();
        assert_eq!(from_config, SemesterCalendar::default());
        assert_eq!(from_config.checkpoint_date(), d(2026, 2, 3));
    }

    #[test]
    fn default_calendar_keeps_every_published_holiday() {
        let config = SemesterCalendarConfig::default();
        let listed: usize = config.non_teaching_dates.values().map(Vec::len).sum();
        let cal = SemesterCalendar::default();

        assert_eq!(cal.semester_start(), d(2025, 12, 1));
        assert_eq!(cal.semester_end(), d(2026, 4, 15));
        assert_eq!(cal.non_teaching_dates().len(), listed);
        assert!(!cal.is_working_day(d(2025, 12, 25)));
    }

    #[test]
    fn config_groups_dates_by_month_sorted() {
        let cal = SemesterCalendar::new(
            d(2025, 12, 1),
            d(2026, 1, 31),
            d(2026, 1, 5),
            [d(2026, 1, 12), d(2025, 12, 25), d(2026, 1, 2)],
        )
        .unwrap();
        let config = cal.to_config();
        assert_eq!(config.non_teaching_dates["2025-12"], vec![25]);
        assert_eq!(config.non_teaching_dates["2026-01"], vec![2, 12]);
    }
}
