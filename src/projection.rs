//! Attendance requirement solver.
//!
//! Works out how many of the remaining classes a student has to attend to be
//! at 75% at the interim checkpoint and at semester end, starting from the
//! percentage the attendance portal currently shows.

use crate::calendar::SemesterCalendar;
use crate::timetable::Timetable;
use chrono::NaiveDate;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Required share of conducted classes, as a fraction `NUMERATOR / DENOMINATOR`.
const REQUIRED_NUMERATOR: u32 = 3;
const REQUIRED_DENOMINATOR: u32 = 4;

/// Whether the reported percentage already includes today's classes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TodayStatus {
    #[default]
    NotReflected,
    Reflected { conducted: u32, attended: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttendanceQuery {
    pub reported_percent: f64,
    #[serde(default)]
    pub today: TodayStatus,
}

impl AttendanceQuery {
    pub fn new(reported_percent: f64, today: TodayStatus) -> Self {
        Self {
            reported_percent,
            today,
        }
    }

    pub fn not_reflected(reported_percent: f64) -> Self {
        Self::new(reported_percent, TodayStatus::NotReflected)
    }

    pub fn reflected(reported_percent: f64, conducted: u32, attended: u32) -> Self {
        Self::new(
            reported_percent,
            TodayStatus::Reflected {
                conducted,
                attended,
            },
        )
    }

    /// Parse a percentage typed by the user, e.g. `"74.84"`.
    pub fn parse_percent(input: &str) -> Result<f64, ProjectionError> {
        let percent: f64 = input
            .trim()
            .trim_end_matches('%')
            .parse()
            .map_err(|_| ProjectionError::NotANumber(input.to_string()))?;
        validate_percent(percent)?;
        Ok(percent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointProjection {
    pub date: NaiveDate,
    pub classes_remaining: u32,
    pub must_attend: u32,
    pub can_skip: u32,
    pub feasible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionResult {
    pub today: NaiveDate,
    pub sessions_today: u32,
    pub today_reflected: bool,
    pub conducted_so_far: u32,
    pub attended_so_far: u32,
    pub classes_remaining: u32,
    pub must_attend: u32,
    pub can_skip: u32,
    pub final_feasible: bool,
    /// Absent once `today` is past the checkpoint date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<CheckpointProjection>,
}

impl ProjectionResult {
    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("remaining={}", self.classes_remaining));
        parts.push(format!("must_attend={}", self.must_attend));
        parts.push(format!("can_skip={}", self.can_skip));
        if !self.final_feasible {
            parts.push("final=not_possible".to_string());
        }
        if let Some(checkpoint) = &self.checkpoint {
            parts.push(format!(
                "checkpoint({})={}/{}",
                checkpoint.date, checkpoint.must_attend, checkpoint.classes_remaining
            ));
            if !checkpoint.feasible {
                parts.push("checkpoint=not_possible".to_string());
            }
        }
        parts.join(", ")
    }
}

/// Ways the reported figures can contradict each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inconsistency {
    AttendedExceedsConducted { attended: u32, conducted: u32 },
    ConductedExceedsScheduled { conducted: u32, scheduled: u32 },
    /// The percentage implies attendance before today outside `0..=conducted_before`.
    ReportedPercentMismatch {
        attended_before: i64,
        conducted_before: i64,
    },
}

impl fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inconsistency::AttendedExceedsConducted {
                attended,
                conducted,
            } => write!(
                f,
                "attended classes ({attended}) cannot exceed conducted classes ({conducted})"
            ),
            Inconsistency::ConductedExceedsScheduled {
                conducted,
                scheduled,
            } => write!(
                f,
                "only {scheduled} classes scheduled today (got {conducted} conducted)"
            ),
            Inconsistency::ReportedPercentMismatch {
                attended_before,
                conducted_before,
            } => write!(
                f,
                "reported percentage implies {attended_before} attended out of {conducted_before} before today; check your inputs"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionError {
    /// Reported percentage outside `[0, 100]` or not finite.
    PercentOutOfRange(f64),
    NotANumber(String),
    Inconsistent(Inconsistency),
}

impl ProjectionError {
    pub fn is_input_range(&self) -> bool {
        matches!(
            self,
            ProjectionError::PercentOutOfRange(_) | ProjectionError::NotANumber(_)
        )
    }
}

impl fmt::Display for ProjectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectionError::PercentOutOfRange(value) => write!(
                f,
                "invalid attendance percentage {value} (must be between 0 and 100)"
            ),
            ProjectionError::NotANumber(input) => {
                write!(f, "invalid attendance percentage '{input}'")
            }
            ProjectionError::Inconsistent(reason) => write!(f, "inconsistent input: {reason}"),
        }
    }
}

impl std::error::Error for ProjectionError {}

impl From<Inconsistency> for ProjectionError {
    fn from(value: Inconsistency) -> Self {
        ProjectionError::Inconsistent(value)
    }
}

fn validate_percent(percent: f64) -> Result<(), ProjectionError> {
    if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
        return Err(ProjectionError::PercentOutOfRange(percent));
    }
    Ok(())
}

/// `ceil(total * 0.75)` in integer arithmetic.
fn required_sessions(total: u32) -> u32 {
    let total = u64::from(total);
    let numerator = u64::from(REQUIRED_NUMERATOR);
    let denominator = u64::from(REQUIRED_DENOMINATOR);
    ((total * numerator).div_ceil(denominator)) as u32
}

fn attended_from_percent(percent: f64, conducted: u32) -> u32 {
    (percent / 100.0 * f64::from(conducted)).round() as u32
}

/// Only ask whether today is reflected when classes are actually held today.
pub fn should_ask_about_today(
    today: NaiveDate,
    calendar: &SemesterCalendar,
    timetable: &Timetable,
) -> bool {
    calendar.sessions_on(today, timetable) > 0
}

/// Project attendance requirements at the checkpoint and at semester end.
///
/// Pure: identical inputs always produce identical results. Validation
/// failures return before any partial result is built.
pub fn project(
    today: NaiveDate,
    calendar: &SemesterCalendar,
    timetable: &Timetable,
    query: &AttendanceQuery,
) -> Result<ProjectionResult, ProjectionError> {
    if let Err(err) = validate_percent(query.reported_percent) {
        warn!("event=projection_rejected module=projection reason=percent_out_of_range");
        return Err(err);
    }

    let sessions_today = calendar.sessions_on(today, timetable);
    let reflected_today = match query.today {
        TodayStatus::Reflected {
            conducted,
            attended,
        } if sessions_today > 0 => Some((conducted, attended)),
        TodayStatus::Reflected { .. } => {
            debug!(
                "event=today_ignored module=projection today={today} reason=no_sessions_today"
            );
            None
        }
        TodayStatus::NotReflected => None,
    };

    let history = match reflected_today {
        Some((conducted, attended)) => reflected_history(
            today,
            calendar,
            timetable,
            query,
            sessions_today,
            conducted,
            attended,
        ),
        None => Ok(not_reflected_history(today, calendar, timetable, query, sessions_today)),
    };
    let history = history.inspect_err(|err| {
        warn!("event=projection_rejected module=projection reason=\"{err}\"");
    })?;

    let final_remaining = history.today_remaining + calendar.sessions_after(today, timetable);
    let final_target = Target::evaluate(
        history.conducted_so_far,
        history.attended_so_far,
        final_remaining,
    );

    let checkpoint_date = calendar.checkpoint_date();
    let checkpoint = if today <= checkpoint_date {
        let after_today = match today.succ_opt() {
            Some(tomorrow) => calendar.sessions_between(tomorrow, checkpoint_date, timetable),
            None => 0,
        };
        let remaining = history.today_remaining + after_today;
        let target = Target::evaluate(history.conducted_so_far, history.attended_so_far, remaining);
        Some(CheckpointProjection {
            date: checkpoint_date,
            classes_remaining: remaining,
            must_attend: target.must_attend,
            can_skip: target.can_skip,
            feasible: target.feasible,
        })
    } else {
        None
    };

    debug!(
        "event=projection module=projection today={} reflected={} conducted={} attended={} remaining={} must_attend={}",
        today,
        reflected_today.is_some(),
        history.conducted_so_far,
        history.attended_so_far,
        final_remaining,
        final_target.must_attend
    );

    Ok(ProjectionResult {
        today,
        sessions_today,
        today_reflected: reflected_today.is_some(),
        conducted_so_far: history.conducted_so_far,
        attended_so_far: history.attended_so_far,
        classes_remaining: final_remaining,
        must_attend: final_target.must_attend,
        can_skip: final_target.can_skip,
        final_feasible: final_target.feasible,
        checkpoint,
    })
}

/// Attendance history as of the portal cutoff, plus how much of today is still ahead.
struct History {
    conducted_so_far: u32,
    attended_so_far: u32,
    today_remaining: u32,
}

fn reflected_history(
    today: NaiveDate,
    calendar: &SemesterCalendar,
    timetable: &Timetable,
    query: &AttendanceQuery,
    sessions_today: u32,
    conducted_today: u32,
    attended_today: u32,
) -> Result<History, ProjectionError> {
    let conducted_so_far = calendar.sessions_between(calendar.semester_start(), today, timetable);

    if attended_today > conducted_today {
        return Err(Inconsistency::AttendedExceedsConducted {
            attended: attended_today,
            conducted: conducted_today,
        }
        .into());
    }
    if conducted_today > sessions_today {
        return Err(Inconsistency::ConductedExceedsScheduled {
            conducted: conducted_today,
            scheduled: sessions_today,
        }
        .into());
    }

    let attended_so_far = attended_from_percent(query.reported_percent, conducted_so_far);

    let attended_before = i64::from(attended_so_far) - i64::from(attended_today);
    let conducted_before = i64::from(conducted_so_far) - i64::from(conducted_today);
    if attended_before < 0 || attended_before > conducted_before {
        return Err(Inconsistency::ReportedPercentMismatch {
            attended_before,
            conducted_before,
        }
        .into());
    }

    Ok(History {
        conducted_so_far,
        attended_so_far,
        today_remaining: sessions_today.saturating_sub(conducted_today),
    })
}

fn not_reflected_history(
    today: NaiveDate,
    calendar: &SemesterCalendar,
    timetable: &Timetable,
    query: &AttendanceQuery,
    sessions_today: u32,
) -> History {
    let conducted_so_far = match today.pred_opt() {
        Some(yesterday) => {
            calendar.sessions_between(calendar.semester_start(), yesterday, timetable)
        }
        None => 0,
    };
    History {
        conducted_so_far,
        attended_so_far: attended_from_percent(query.reported_percent, conducted_so_far),
        today_remaining: sessions_today,
    }
}

struct Target {
    must_attend: u32,
    can_skip: u32,
    feasible: bool,
}

impl Target {
    fn evaluate(conducted_so_far: u32, attended_so_far: u32, remaining: u32) -> Self {
        let required = required_sessions(conducted_so_far + remaining);
        let must_attend = required.saturating_sub(attended_so_far);
        Self {
            must_attend,
            can_skip: remaining.saturating_sub(must_attend),
            feasible: must_attend <= remaining,
        }
    }
}
