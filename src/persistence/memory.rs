use super::{
    PersistenceResult, TimetableRecord, TimetableStore, validate_student_id, validate_timetable,
};
use crate::timetable::Timetable;
use log::info;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Process-local store, used when no database path is configured.
#[derive(Default)]
pub struct MemoryTimetableStore {
    records: RwLock<HashMap<String, TimetableRecord>>,
}

impl MemoryTimetableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, student_id: &str) -> Option<TimetableRecord> {
        self.records.read().get(student_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl TimetableStore for MemoryTimetableStore {
    fn load_timetable(&self, student_id: &str) -> PersistenceResult<Option<Timetable>> {
        validate_student_id(student_id)?;
        Ok(self
            .records
            .read()
            .get(student_id)
            .map(|record| record.timetable))
    }

    fn save_timetable(&self, student_id: &str, timetable: &Timetable) -> PersistenceResult<()> {
        validate_student_id(student_id)?;
        validate_timetable(timetable)?;
        self.records.write().insert(
            student_id.to_string(),
            TimetableRecord::new(student_id, *timetable),
        );
        info!(
            "event=timetable_saved module=persistence backend=memory weekly_total={}",
            timetable.weekly_total()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{LevelFilter, Log, Metadata, Record};
    use parking_lot::Mutex;

    static CAPTURED: Mutex<Vec<String>> = parking_lot::const_mutex(Vec::new());

    struct CaptureLogger;

    impl Log for CaptureLogger {
        fn enabled(&self, _metadata: &Metadata) -> bool {
            true
        }

        fn log(&self, record: &Record) {
            CAPTURED.lock().push(record.args().to_string());
        }

        fn flush(&self) {}
    }

    static LOGGER: CaptureLogger = CaptureLogger;

    #[test]
    fn save_logs_the_backend() {
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(LevelFilter::Info);

        let store = MemoryTimetableStore::new();
        store.save_timetable("s1", &Timetable::new(1, 2, 0, 0, 0)).unwrap();

        let captured = CAPTURED.lock();
        assert!(
            captured.iter().any(|line| line
                == "event=timetable_saved module=persistence backend=memory weekly_total=3"),
            "saved event missing: {captured:?}"
        );
    }

    #[test]
    fn save_is_an_upsert() {
        let store = MemoryTimetableStore::new();
        assert!(store.load_timetable("s1").unwrap().is_none());

        store.save_timetable("s1", &Timetable::new(1, 1, 1, 1, 1)).unwrap();
        store.save_timetable("s1", &Timetable::new(2, 0, 0, 0, 0)).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(
            store.load_timetable("s1").unwrap(),
            Some(Timetable::new(2, 0, 0, 0, 0))
        );
    }

    #[test]
    fn rejects_blank_student_and_oversized_day() {
        let store = MemoryTimetableStore::new();
        assert!(store.save_timetable("  ", &Timetable::default()).is_err());
        assert!(store.save_timetable("s1", &Timetable::new(9, 0, 0, 0, 0)).is_err());
        assert!(store.is_empty());
    }
}
