use attendance_tool::logging::init_logging;
use attendance_tool::timetable::parse_weekday;
use attendance_tool::{
    AttendanceQuery, JsonTimetableStore, MemoryTimetableStore, ProjectionResult, SemesterCalendar,
    Timetable, TimetableStore, load_calendar_config, project, save_calendar_config,
    session_ledger, should_ask_about_today,
};
use chrono::{Duration, NaiveDate};
use polars::prelude::{AnyValue, DataFrame};
use std::io::{self, Write};

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn render_cell(av: &AnyValue) -> String {
    match av {
        AnyValue::Null => String::new(),
        AnyValue::Boolean(true) => "yes".to_string(),
        AnyValue::Boolean(false) => String::new(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::String(s) => s.to_string(),
        _ => av.to_string(),
    }
}

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let mut cells: Vec<Vec<String>> = Vec::with_capacity(df.height());
    for row_idx in 0..df.height() {
        let row = columns
            .iter()
            .map(|col| col.get(row_idx).map(|av| render_cell(&av)).unwrap_or_default())
            .collect();
        cells.push(row);
    }

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.len()).collect();
    for row in &cells {
        for (ci, s) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(s.len());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let render_row = |values: &[String]| {
        let mut line = String::from("|");
        for (ci, s) in values.iter().enumerate() {
            line.push(' ');
            line.push_str(s);
            line.push_str(&" ".repeat(widths[ci].saturating_sub(s.len())));
            line.push_str(" |");
        }
        line
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&col_names));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in &cells {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  today [YYYY-MM-DD]                 Show or override today's date\n  timetable show                     Show the weekly timetable\n  timetable set <day> <count>        Set sessions for a weekday (0-8)\n  timetable week <mon> <tue> <wed> <thu> <fri>\n                                     Set the whole week at once\n  calendar show                      Display semester calendar summary\n  calendar default                   Reset to the built-in semester calendar\n  calendar set <json_path>           Load calendar config from JSON file\n  calendar save <json_path>          Save calendar config to JSON file\n  store json <path>                  Keep timetables in a JSON file\n  store sqlite <path>                Keep timetables in a SQLite database\n  store memory                       Keep timetables in memory only\n  student <id>                       Select the student for load/save\n  load                               Load the student's timetable from the store\n  save                               Save the timetable for the student\n  project <percent> [reflected <conducted> <attended>]\n                                     Project classes needed for 75%\n  ledger [start] [end]               Day-by-day sessions, clipped to the semester (default: next 7 days)\n  quit|exit                          Exit"
    );
}

fn print_timetable(timetable: &Timetable) {
    for weekday in Timetable::WEEKDAYS {
        println!("  {:<4} {}", weekday.to_string(), timetable.sessions_on(weekday));
    }
    println!("  week {}", timetable.weekly_total());
}

fn print_calendar_info(calendar: &SemesterCalendar) {
    let holidays = calendar.non_teaching_dates();
    println!("Semester start     : {}", calendar.semester_start());
    println!("Semester end       : {}", calendar.semester_end());
    println!("Checkpoint         : {}", calendar.checkpoint_date());
    println!("Non-teaching dates : {}", holidays.len());
    println!(
        "Teaching days      : {}",
        calendar.count_teaching_days(calendar.semester_start(), calendar.semester_end())
    );
}

fn print_projection(result: &ProjectionResult) {
    println!("Projection: {}", result.to_cli_summary());
    println!(
        "History: {} attended of {} conducted{}",
        result.attended_so_far,
        result.conducted_so_far,
        if result.today_reflected {
            " (including today)"
        } else {
            ""
        }
    );
    println!("Overall (until semester end)");
    println!("  Classes remaining : {}", result.classes_remaining);
    if result.final_feasible {
        println!("  Must attend       : {}", result.must_attend);
    } else {
        println!("  Must attend       : {} (not possible)", result.must_attend);
    }
    println!("  Can skip          : {}", result.can_skip);
    match &result.checkpoint {
        Some(checkpoint) => {
            println!("Checkpoint target (75% by {})", checkpoint.date);
            println!("  Classes remaining : {}", checkpoint.classes_remaining);
            if checkpoint.feasible {
                println!("  Must attend       : {}", checkpoint.must_attend);
            } else {
                println!(
                    "  Must attend       : {} (not possible)",
                    checkpoint.must_attend
                );
            }
            println!("  Can skip          : {}", checkpoint.can_skip);
        }
        None => println!("Checkpoint has passed; only the semester-end target applies."),
    }
}

fn parse_count(s: Option<&str>) -> Option<u32> {
    s.and_then(|v| v.parse::<u32>().ok())
}

fn open_store(kind: &str, path: Option<&str>) -> Result<Box<dyn TimetableStore>, String> {
    match (kind, path) {
        ("memory", _) => Ok(Box::new(MemoryTimetableStore::new())),
        ("json", Some(path)) => Ok(Box::new(JsonTimetableStore::new(path))),
        #[cfg(feature = "sqlite")]
        ("sqlite", Some(path)) => attendance_tool::SqliteTimetableStore::new(path)
            .map(|store| Box::new(store) as Box<dyn TimetableStore>)
            .map_err(|e| e.to_string()),
        _ => Err("Usage: store json <path>|sqlite <path>|memory".to_string()),
    }
}

fn main() {
    if let Err(e) = init_logging("warn") {
        eprintln!("logging disabled: {e}");
    }

    let mut calendar = SemesterCalendar::default();
    let mut timetable = Timetable::default();
    let mut today = chrono::Local::now().date_naive();
    let mut student: Option<String> = None;
    let mut store: Box<dyn TimetableStore> = Box::new(MemoryTimetableStore::new());

    println!("Attendance Tool (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "today" => match parts.next() {
                None => println!("Today is {today}."),
                Some(date_s) => match parse_date(date_s) {
                    Some(date) => {
                        today = date;
                        println!("Today set to {today}.");
                    }
                    None => println!("Invalid date (YYYY-MM-DD)"),
                },
            },
            "timetable" => match parts.next() {
                Some("show") | None => print_timetable(&timetable),
                Some("set") => {
                    let day_s = parts.next();
                    let count = parse_count(parts.next());
                    match (day_s, count) {
                        (Some(day_s), Some(count)) => {
                            let res = parse_weekday(day_s)
                                .and_then(|weekday| timetable.set(weekday, count));
                            match res {
                                Ok(_) => {
                                    println!("Timetable updated.");
                                    print_timetable(&timetable);
                                }
                                Err(e) => println!("Error: {e}"),
                            }
                        }
                        _ => println!("Usage: timetable set <day> <count>"),
                    }
                }
                Some("week") => {
                    let counts: Vec<u32> = parts.filter_map(|p| p.parse().ok()).collect();
                    if counts.len() != Timetable::WEEKDAYS.len() {
                        println!("Usage: timetable week <mon> <tue> <wed> <thu> <fri>");
                        continue;
                    }
                    let mut updated = timetable;
                    let res = Timetable::WEEKDAYS
                        .iter()
                        .zip(&counts)
                        .try_for_each(|(weekday, count)| updated.set(*weekday, *count));
                    match res {
                        Ok(_) => {
                            timetable = updated;
                            println!("Timetable updated.");
                            print_timetable(&timetable);
                        }
                        Err(e) => println!("Error: {e}"),
                    }
                }
                Some(other) => {
                    println!("Unknown timetable command '{other}'.");
                    println!("Usage: timetable show|set <day> <count>|week <counts...>");
                }
            },
            "calendar" => match parts.next() {
                Some("show") | None => print_calendar_info(&calendar),
                Some("default") => {
                    calendar = SemesterCalendar::default();
                    println!("Calendar reset to default.");
                    print_calendar_info(&calendar);
                }
                Some("set") => match parts.next() {
                    Some(path) => match load_calendar_config(path) {
                        Ok(loaded) => {
                            calendar = loaded;
                            println!("Calendar updated from {path}.");
                            print_calendar_info(&calendar);
                        }
                        Err(e) => println!("Error loading calendar: {e}"),
                    },
                    None => println!("Usage: calendar set <json_path>"),
                },
                Some("save") => match parts.next() {
                    Some(path) => match save_calendar_config(&calendar, path) {
                        Ok(_) => println!("Calendar saved to {path}."),
                        Err(e) => println!("Error saving calendar: {e}"),
                    },
                    None => println!("Usage: calendar save <json_path>"),
                },
                Some(other) => {
                    println!("Unknown calendar command '{other}'.");
                    println!("Usage: calendar show|default|set <json_path>|save <json_path>");
                }
            },
            "store" => {
                let kind = parts.next().unwrap_or("");
                match open_store(kind, parts.next()) {
                    Ok(opened) => {
                        store = opened;
                        println!("Using {kind} store.");
                    }
                    Err(e) => println!("{e}"),
                }
            }
            "student" => match parts.next() {
                Some(id) => {
                    student = Some(id.to_string());
                    println!("Student set to {id}.");
                }
                None => match &student {
                    Some(id) => println!("Student is {id}."),
                    None => println!("Usage: student <id>"),
                },
            },
            "load" => match &student {
                Some(id) => match store.load_timetable(id) {
                    Ok(Some(loaded)) => {
                        timetable = loaded;
                        println!("Timetable loaded for {id}.");
                        print_timetable(&timetable);
                    }
                    Ok(None) => println!("No timetable stored for {id}."),
                    Err(e) => println!("Error loading timetable: {e}"),
                },
                None => println!("Select a student first: student <id>"),
            },
            "save" => match &student {
                Some(id) => match store.save_timetable(id, &timetable) {
                    Ok(_) => println!("Timetable saved for {id}."),
                    Err(e) => println!("Error saving timetable: {e}"),
                },
                None => println!("Select a student first: student <id>"),
            },
            "project" => {
                let Some(percent_s) = parts.next() else {
                    println!("Usage: project <percent> [reflected <conducted> <attended>]");
                    continue;
                };
                let percent = match AttendanceQuery::parse_percent(percent_s) {
                    Ok(p) => p,
                    Err(e) => {
                        println!("Error: {e}");
                        continue;
                    }
                };
                let query = match parts.next() {
                    None => AttendanceQuery::not_reflected(percent),
                    Some("reflected") => {
                        match (parse_count(parts.next()), parse_count(parts.next())) {
                            (Some(conducted), Some(attended)) => {
                                AttendanceQuery::reflected(percent, conducted, attended)
                            }
                            _ => {
                                println!(
                                    "Usage: project <percent> reflected <conducted> <attended>"
                                );
                                continue;
                            }
                        }
                    }
                    Some(other) => {
                        println!("Unknown project option '{other}'.");
                        continue;
                    }
                };
                if query.today == attendance_tool::TodayStatus::NotReflected
                    && should_ask_about_today(today, &calendar, &timetable)
                {
                    println!(
                        "Note: {} classes today; add 'reflected <conducted> <attended>' if the portal already counts them.",
                        calendar.sessions_on(today, &timetable)
                    );
                }
                match project(today, &calendar, &timetable, &query) {
                    Ok(result) => print_projection(&result),
                    Err(e) => println!("Error: {e}"),
                }
            }
            "ledger" => {
                let start = match parts.next() {
                    Some(s) => match parse_date(s) {
                        Some(d) => d,
                        None => {
                            println!("Invalid start date (YYYY-MM-DD)");
                            continue;
                        }
                    },
                    None => today,
                };
                let end = match parts.next() {
                    Some(s) => match parse_date(s) {
                        Some(d) => d,
                        None => {
                            println!("Invalid end date (YYYY-MM-DD)");
                            continue;
                        }
                    },
                    None => match start.checked_add_signed(Duration::days(6)) {
                        Some(d) => d,
                        None => {
                            println!("Ledger range is outside the supported dates.");
                            continue;
                        }
                    },
                };
                // days outside the semester carry no sessions
                let start = start.max(calendar.semester_start());
                let end = end.min(calendar.semester_end());
                if start > end {
                    println!(
                        "Ledger range does not overlap the semester ({} to {}).",
                        calendar.semester_start(),
                        calendar.semester_end()
                    );
                    continue;
                }
                match session_ledger(&calendar, &timetable, start, end) {
                    Ok(df) => println!("{}", render_df_as_text_table(&df)),
                    Err(e) => println!("Ledger error: {e}"),
                }
            }
            _ => println!("Unknown command. Type 'help'."),
        }
    }
}
