use super::{
    PersistenceResult, TimetableRecord, TimetableStore, validate_record, validate_student_id,
    validate_timetable,
};
use crate::timetable::Timetable;
use log::info;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row, params};

pub struct SqliteTimetableStore {
    connection: Mutex<Connection>,
}

impl SqliteTimetableStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn open_in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS user_timetables (
                student_id TEXT PRIMARY KEY,
                monday INTEGER NOT NULL DEFAULT 0,
                tuesday INTEGER NOT NULL DEFAULT 0,
                wednesday INTEGER NOT NULL DEFAULT 0,
                thursday INTEGER NOT NULL DEFAULT 0,
                friday INTEGER NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn row_to_record(row: &Row<'_>) -> rusqlite::Result<TimetableRecord> {
        Ok(TimetableRecord {
            student_id: row.get(0)?,
            timetable: Timetable::new(
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
            ),
            updated_at: row.get(6)?,
        })
    }

    pub fn load_record(&self, student_id: &str) -> PersistenceResult<Option<TimetableRecord>> {
        validate_student_id(student_id)?;
        let conn = self.connection.lock();
        let mut stmt = conn.prepare(
            "SELECT student_id, monday, tuesday, wednesday, thursday, friday, updated_at
             FROM user_timetables WHERE student_id = ?1",
        )?;
        let record = stmt
            .query_row(params![student_id], Self::row_to_record)
            .optional()?;
        if let Some(record) = &record {
            validate_record(record)?;
        }
        Ok(record)
    }

    pub fn records(&self) -> PersistenceResult<Vec<TimetableRecord>> {
        let conn = self.connection.lock();
        let mut stmt = conn.prepare(
            "SELECT student_id, monday, tuesday, wednesday, thursday, friday, updated_at
             FROM user_timetables ORDER BY student_id ASC",
        )?;
        let rows = stmt.query_map([], Self::row_to_record)?;

        let mut records = Vec::new();
        for record in rows {
            let record = record?;
            validate_record(&record)?;
            records.push(record);
        }
        Ok(records)
    }
}

impl TimetableStore for SqliteTimetableStore {
    fn load_timetable(&self, student_id: &str) -> PersistenceResult<Option<Timetable>> {
        Ok(self.load_record(student_id)?.map(|record| record.timetable))
    }

    fn save_timetable(&self, student_id: &str, timetable: &Timetable) -> PersistenceResult<()> {
        validate_student_id(student_id)?;
        validate_timetable(timetable)?;
        let record = TimetableRecord::new(student_id, *timetable);
        let conn = self.connection.lock();
        conn.execute(
            "INSERT INTO user_timetables
                (student_id, monday, tuesday, wednesday, thursday, friday, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(student_id) DO UPDATE SET
                monday = excluded.monday,
                tuesday = excluded.tuesday,
                wednesday = excluded.wednesday,
                thursday = excluded.thursday,
                friday = excluded.friday,
                updated_at = excluded.updated_at",
            params![
                record.student_id,
                timetable.monday,
                timetable.tuesday,
                timetable.wednesday,
                timetable.thursday,
                timetable.friday,
                record.updated_at,
            ],
        )?;
        info!(
            "event=timetable_saved module=persistence backend=sqlite weekly_total={}",
            timetable.weekly_total()
        );
        Ok(())
    }
}
