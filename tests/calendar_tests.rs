use attendance_tool::{
    CalendarConfigError, SemesterCalendar, SemesterCalendarConfig, Timetable,
};
use chrono::{Datelike, NaiveDate, Weekday};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn every_day(cal: &SemesterCalendar) -> Vec<NaiveDate> {
    cal.semester_start()
        .iter_days()
        .take_while(|day| *day <= cal.semester_end())
        .collect()
}

#[test]
fn dates_outside_semester_are_not_working_days() {
    let cal = SemesterCalendar::default();
    assert!(!cal.is_working_day(d(2025, 11, 28)));
    assert!(!cal.is_working_day(d(2025, 11, 30)));
    assert!(!cal.is_working_day(d(2026, 4, 16)));
    assert!(!cal.is_working_day(d(2026, 6, 1)));
}

#[test]
fn semester_bounds_are_inclusive() {
    let cal = SemesterCalendar::default();
    // Dec 1 2025 is a Monday, Apr 15 2026 a Wednesday; neither is a holiday
    assert!(cal.is_working_day(d(2025, 12, 1)));
    assert!(cal.is_working_day(d(2026, 4, 15)));
}

#[test]
fn weekends_are_never_working_days() {
    let cal = SemesterCalendar::default();
    for day in every_day(&cal) {
        if matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            assert!(!cal.is_working_day(day), "{day} should not be a working day");
        }
    }
}

#[test]
fn holidays_block_weekdays() {
    let cal = SemesterCalendar::default();
    assert!(!cal.is_working_day(d(2025, 12, 25))); // Thursday
    assert!(!cal.is_working_day(d(2025, 12, 22))); // Monday
    assert!(!cal.is_working_day(d(2026, 4, 14))); // Tuesday
    assert!(cal.is_working_day(d(2025, 12, 2)));
}

#[test]
fn sessions_on_follows_timetable_and_calendar() {
    let cal = SemesterCalendar::default();
    let tt = Timetable::new(1, 2, 3, 4, 5);
    assert_eq!(cal.sessions_on(d(2025, 12, 2), &tt), 2); // Tuesday
    assert_eq!(cal.sessions_on(d(2025, 12, 5), &tt), 5); // Friday
    assert_eq!(cal.sessions_on(d(2025, 12, 6), &tt), 0); // Saturday
    assert_eq!(cal.sessions_on(d(2025, 12, 25), &tt), 0); // holiday
    assert_eq!(cal.sessions_on(d(2025, 11, 28), &tt), 0); // before start
}

#[test]
fn sessions_between_skips_holidays() {
    let cal = SemesterCalendar::default();
    let mondays = Timetable::new(1, 0, 0, 0, 0);
    // Dec 1, 8, 15 and 29; Dec 22 is a holiday
    assert_eq!(cal.sessions_between(d(2025, 12, 1), d(2025, 12, 31), &mondays), 4);
}

#[test]
fn sessions_between_is_zero_for_inverted_range() {
    let cal = SemesterCalendar::default();
    let tt = Timetable::new(3, 3, 3, 3, 3);
    assert_eq!(cal.sessions_between(d(2026, 1, 20), d(2026, 1, 19), &tt), 0);
    assert_eq!(cal.sessions_between(d(2026, 4, 15), d(2025, 12, 1), &tt), 0);
}

#[test]
fn sessions_between_stops_at_semester_end() {
    let cal = SemesterCalendar::default();
    let tt = Timetable::new(1, 1, 1, 1, 1);
    // Apr 13 (Mon) and Apr 15 (Wed); Apr 14 is a holiday
    assert_eq!(cal.sessions_between(d(2026, 4, 13), d(2026, 5, 30), &tt), 2);
    assert_eq!(cal.sessions_after(d(2026, 4, 15), &tt), 0);
    assert_eq!(cal.sessions_after(d(2026, 4, 14), &tt), 1);
}

#[test]
fn full_semester_total_matches_sessions_after_day_before_start() {
    let cal = SemesterCalendar::default();
    let tt = Timetable::new(2, 3, 1, 4, 2);
    let start = cal.semester_start();
    let full = cal.sessions_between(start, cal.semester_end(), &tt);
    assert_eq!(full, cal.sessions_after(start.pred_opt().unwrap(), &tt));
    assert!(full > 0);
}

#[test]
fn sessions_after_is_monotonic() {
    let cal = SemesterCalendar::default();
    let tt = Timetable::new(2, 3, 1, 4, 2);
    let days = every_day(&cal);
    for pair in days.windows(2) {
        assert!(
            cal.sessions_after(pair[0], &tt) >= cal.sessions_after(pair[1], &tt),
            "remaining sessions grew between {} and {}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn teaching_day_count_matches_flat_timetable_total() {
    let cal = SemesterCalendar::default();
    let ones = Timetable::new(1, 1, 1, 1, 1);
    let start = cal.semester_start();
    let end = cal.semester_end();
    assert_eq!(
        cal.count_teaching_days(start, end),
        cal.sessions_between(start, end, &ones)
    );
    let days = cal.teaching_days_in_range(d(2025, 12, 1), d(2025, 12, 7));
    assert_eq!(days.first().copied(), Some(d(2025, 12, 1)));
    assert_eq!(days.len(), 5);
}

#[test]
fn config_round_trips_through_json() {
    let cal = SemesterCalendar::default();
    let config = cal.to_config();
    let json = serde_json::to_string(&config).unwrap();
    let parsed: SemesterCalendarConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, config);
    assert_eq!(SemesterCalendar::from_config(&parsed).unwrap(), cal);
    assert_eq!(config.non_teaching_dates["2026-04"], vec![3, 4, 5, 11, 12, 14]);
}

#[test]
fn invalid_configs_are_rejected() {
    let mut config = SemesterCalendarConfig::default();
    config.checkpoint_date = d(2026, 5, 1);
    assert!(matches!(
        SemesterCalendar::from_config(&config),
        Err(CalendarConfigError::CheckpointOutOfRange { .. })
    ));

    let mut config = SemesterCalendarConfig::default();
    config.semester_start = d(2026, 5, 1);
    assert!(matches!(
        SemesterCalendar::from_config(&config),
        Err(CalendarConfigError::StartAfterEnd { .. })
    ));

    let mut config = SemesterCalendarConfig::default();
    config.non_teaching_dates.insert("2026-02".into(), vec![30]);
    assert_eq!(
        SemesterCalendar::from_config(&config),
        Err(CalendarConfigError::InvalidDay {
            month: "2026-02".into(),
            day: 30
        })
    );

    let mut config = SemesterCalendarConfig::default();
    config.non_teaching_dates.insert("Feb 2026".into(), vec![2]);
    assert!(matches!(
        SemesterCalendar::from_config(&config),
        Err(CalendarConfigError::InvalidMonthKey(_))
    ));
}
