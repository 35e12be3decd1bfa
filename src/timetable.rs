use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAX_SESSIONS_PER_DAY: u8 = 8;

/// Fixed weekly class pattern, applied to every working day of the semester.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timetable {
    #[serde(default)]
    pub monday: u8,
    #[serde(default)]
    pub tuesday: u8,
    #[serde(default)]
    pub wednesday: u8,
    #[serde(default)]
    pub thursday: u8,
    #[serde(default)]
    pub friday: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimetableError {
    TooManySessions { weekday: Weekday, count: u32 },
    Weekend(Weekday),
    UnknownWeekday(String),
}

impl fmt::Display for TimetableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimetableError::TooManySessions { weekday, count } => write!(
                f,
                "{weekday} has {count} sessions (at most {MAX_SESSIONS_PER_DAY} allowed)"
            ),
            TimetableError::Weekend(weekday) => {
                write!(f, "{weekday} is not a teaching weekday")
            }
            TimetableError::UnknownWeekday(name) => write!(f, "unknown weekday '{name}'"),
        }
    }
}

impl std::error::Error for TimetableError {}

impl Timetable {
    pub const WEEKDAYS: [Weekday; 5] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
    ];

    pub fn new(monday: u8, tuesday: u8, wednesday: u8, thursday: u8, friday: u8) -> Self {
        Self {
            monday,
            tuesday,
            wednesday,
            thursday,
            friday,
        }
    }

    /// Sessions on the given weekday; Saturday and Sunday are always 0.
    pub fn sessions_on(&self, weekday: Weekday) -> u32 {
        let count = match weekday {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat | Weekday::Sun => 0,
        };
        u32::from(count)
    }

    pub fn set(&mut self, weekday: Weekday, count: u32) -> Result<(), TimetableError> {
        if count > u32::from(MAX_SESSIONS_PER_DAY) {
            return Err(TimetableError::TooManySessions { weekday, count });
        }
        let count = count as u8;
        match weekday {
            Weekday::Mon => self.monday = count,
            Weekday::Tue => self.tuesday = count,
            Weekday::Wed => self.wednesday = count,
            Weekday::Thu => self.thursday = count,
            Weekday::Fri => self.friday = count,
            Weekday::Sat | Weekday::Sun => return Err(TimetableError::Weekend(weekday)),
        }
        Ok(())
    }

    pub fn weekly_total(&self) -> u32 {
        Self::WEEKDAYS.iter().map(|wd| self.sessions_on(*wd)).sum()
    }

    /// Rejects any weekday above [`MAX_SESSIONS_PER_DAY`].
    ///
    /// Records deserialized from disk or HTTP bodies bypass [`Timetable::set`],
    /// so stores call this before saving and after loading.
    pub fn validate(&self) -> Result<(), TimetableError> {
        for weekday in Self::WEEKDAYS {
            let count = self.sessions_on(weekday);
            if count > u32::from(MAX_SESSIONS_PER_DAY) {
                return Err(TimetableError::TooManySessions { weekday, count });
            }
        }
        Ok(())
    }
}

/// Parse a weekday name such as `mon` or `Monday`.
pub fn parse_weekday(name: &str) -> Result<Weekday, TimetableError> {
    name.trim()
        .parse::<Weekday>()
        .map_err(|_| TimetableError::UnknownWeekday(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekend_days_have_no_sessions() {
        let tt = Timetable::new(1, 2, 3, 4, 5);
        assert_eq!(tt.sessions_on(Weekday::Sat), 0);
        assert_eq!(tt.sessions_on(Weekday::Sun), 0);
        assert_eq!(tt.sessions_on(Weekday::Wed), 3);
        assert_eq!(tt.weekly_total(), 15);
    }

    #[test]
    fn set_rejects_out_of_range_and_weekend() {
        let mut tt = Timetable::default();
        tt.set(Weekday::Thu, 8).unwrap();
        assert_eq!(tt.thursday, 8);
        assert_eq!(
            tt.set(Weekday::Mon, 9),
            Err(TimetableError::TooManySessions {
                weekday: Weekday::Mon,
                count: 9
            })
        );
        assert_eq!(
            tt.set(Weekday::Sat, 1),
            Err(TimetableError::Weekend(Weekday::Sat))
        );
    }

    #[test]
    fn validate_catches_deserialized_overflow() {
        let tt: Timetable = serde_json::from_str(r#"{"monday": 12}"#).unwrap();
        assert!(tt.validate().is_err());
        assert!(Timetable::new(8, 0, 0, 0, 0).validate().is_ok());
    }

    #[test]
    fn parse_weekday_accepts_short_and_long_names() {
        assert_eq!(parse_weekday("mon").unwrap(), Weekday::Mon);
        assert_eq!(parse_weekday("Friday").unwrap(), Weekday::Fri);
        assert!(parse_weekday("funday").is_err());
    }
}
