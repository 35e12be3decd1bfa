use super::{
    PersistenceError, PersistenceResult, TimetableRecord, TimetableStore, validate_record,
    validate_student_id, validate_timetable,
};
use crate::calendar::{SemesterCalendar, SemesterCalendarConfig};
use crate::timetable::Timetable;
use log::info;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Read a calendar config from JSON and check that it describes a valid semester.
pub fn load_calendar_config<P: AsRef<Path>>(path: P) -> PersistenceResult<SemesterCalendar> {
    let file = File::open(path)?;
    let config: SemesterCalendarConfig = serde_json::from_reader(file)?;
    Ok(SemesterCalendar::from_config(&config)?)
}

pub fn save_calendar_config<P: AsRef<Path>>(
    calendar: &SemesterCalendar,
    path: P,
) -> PersistenceResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &calendar.to_config())?;
    Ok(())
}

#[derive(Default, Serialize, Deserialize)]
struct TimetableSnapshot {
    #[serde(default)]
    timetables: BTreeMap<String, TimetableRecord>,
}

/// Timetables for all students kept in a single JSON document.
///
/// Every save rewrites the whole file. A missing file reads as empty.
pub struct JsonTimetableStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonTimetableStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> PersistenceResult<Vec<TimetableRecord>> {
        Ok(self.read_snapshot()?.timetables.into_values().collect())
    }

    fn read_snapshot(&self) -> PersistenceResult<TimetableSnapshot> {
        if !self.path.exists() {
            return Ok(TimetableSnapshot::default());
        }
        let file = File::open(&self.path)?;
        let snapshot: TimetableSnapshot = serde_json::from_reader(file)?;
        for (student_id, record) in &snapshot.timetables {
            validate_record(record)?;
            if record.student_id != *student_id {
                return Err(PersistenceError::InvalidData(format!(
                    "timetable stored under '{student_id}' belongs to '{}'",
                    record.student_id
                )));
            }
        }
        Ok(snapshot)
    }

    fn write_snapshot(&self, snapshot: &TimetableSnapshot) -> PersistenceResult<()> {
        let file = File::create(&self.path)?;
        serde_json::to_writer_pretty(file, snapshot)?;
        Ok(())
    }
}

impl TimetableStore for JsonTimetableStore {
    fn load_timetable(&self, student_id: &str) -> PersistenceResult<Option<Timetable>> {
        validate_student_id(student_id)?;
        let snapshot = self.read_snapshot()?;
        Ok(snapshot
            .timetables
            .get(student_id)
            .map(|record| record.timetable))
    }

    fn save_timetable(&self, student_id: &str, timetable: &Timetable) -> PersistenceResult<()> {
        validate_student_id(student_id)?;
        validate_timetable(timetable)?;
        let _guard = self.write_lock.lock();
        let mut snapshot = self.read_snapshot()?;
        snapshot.timetables.insert(
            student_id.to_string(),
            TimetableRecord::new(student_id, *timetable),
        );
        self.write_snapshot(&snapshot)?;
        info!(
            "event=timetable_saved module=persistence backend=json weekly_total={}",
            timetable.weekly_total()
        );
        Ok(())
    }
}

#[derive(Default, Serialize, Deserialize)]
struct TimetableCsvRecord {
    student_id: String,
    monday: u8,
    tuesday: u8,
    wednesday: u8,
    thursday: u8,
    friday: u8,
    #[serde(default)]
    updated_at: String,
}

impl From<&TimetableRecord> for TimetableCsvRecord {
    fn from(record: &TimetableRecord) -> Self {
        let tt = &record.timetable;
        Self {
            student_id: record.student_id.clone(),
            monday: tt.monday,
            tuesday: tt.tuesday,
            wednesday: tt.wednesday,
            thursday: tt.thursday,
            friday: tt.friday,
            updated_at: record.updated_at.clone(),
        }
    }
}

impl TimetableCsvRecord {
    fn into_record(self) -> PersistenceResult<TimetableRecord> {
        let record = TimetableRecord {
            student_id: self.student_id.trim().to_string(),
            timetable: Timetable::new(
                self.monday,
                self.tuesday,
                self.wednesday,
                self.thursday,
                self.friday,
            ),
            updated_at: self.updated_at,
        };
        validate_record(&record)?;
        Ok(record)
    }
}

pub fn save_timetables_to_csv<P: AsRef<Path>>(
    records: &[TimetableRecord],
    path: P,
) -> PersistenceResult<()> {
    for record in records {
        validate_record(record)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(TimetableCsvRecord::from(record))?;
    }
    writer.flush()?;
    Ok(())
}

/// Load timetable records from CSV, rejecting duplicate student ids.
pub fn load_timetables_from_csv<P: AsRef<Path>>(
    path: P,
) -> PersistenceResult<Vec<TimetableRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records: Vec<TimetableRecord> = Vec::new();
    for row in reader.deserialize::<TimetableCsvRecord>() {
        let record = row?.into_record()?;
        if records.iter().any(|r| r.student_id == record.student_id) {
            return Err(PersistenceError::InvalidData(format!(
                "duplicate timetable for student '{}'",
                record.student_id
            )));
        }
        records.push(record);
    }
    Ok(records)
}
