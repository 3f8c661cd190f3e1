//! Database module - append-only storage for logged sets

pub mod csv_log;

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime, Timelike};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Backend;

pub use csv_log::CsvLog;

/// Timestamp format shared by the CSV log and the SQLite `time` column
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One logged set. Written once, never changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedSet {
    #[serde(rename = "Time", with = "time_format")]
    pub time: NaiveDateTime,
    #[serde(rename = "Workout")]
    pub workout: String,
    #[serde(rename = "Exercise")]
    pub exercise: String,
    #[serde(rename = "Reps", deserialize_with = "whole_count::deserialize")]
    pub reps: u32,
    #[serde(rename = "Weight")]
    pub weight: f64,
    #[serde(rename = "RIR", default, deserialize_with = "whole_count::deserialize_opt")]
    pub rir: Option<u32>,   // Reps in reserve
    #[serde(rename = "Form", deserialize_with = "whole_count::deserialize")]
    pub form: u32,          // Subjective form 0-10
    #[serde(rename = "Max5")]
    pub max5: f64,          // Estimated 5-rep max at write time
    #[serde(rename = "Comments", default)]
    pub comments: Option<String>,
}

/// Current local time truncated to whole seconds
pub fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

mod time_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    use super::TIME_FORMAT;

    pub fn serialize<S: Serializer>(time: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&time.format(TIME_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(raw.trim(), TIME_FORMAT).map_err(D::Error::custom)
    }
}

/// Integer columns as written by tools that store them as floats (`2.0`)
mod whole_count {
    use serde::{Deserialize, Deserializer, de::Error};

    fn parse(raw: &str) -> Option<u32> {
        let raw = raw.trim();
        if let Ok(n) = raw.parse::<u32>() {
            return Some(n);
        }
        let v = raw.parse::<f64>().ok()?;
        (v.is_finite() && v.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&v)).then_some(v as u32)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("'{}' is not a whole number", raw)))
    }

    pub fn deserialize_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(raw) if !raw.trim().is_empty() => parse(&raw)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("'{}' is not a whole number", raw))),
            _ => Ok(None),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_parse_whole_values() {
            assert_eq!(parse("2"), Some(2));
            assert_eq!(parse(" 2.0 "), Some(2));
            assert_eq!(parse("1e1"), Some(10));
            assert_eq!(parse("1.5"), None);
            assert_eq!(parse("-1.0"), None);
            assert_eq!(parse("NaN"), None);
            assert_eq!(parse("1e20"), None);
        }
    }
}

/// Append-only record store. Sets are written once and only read back.
pub trait LogStore {
    fn append(&mut self, set: &LoggedSet) -> Result<()>;

    /// Sets of one exercise, newest first, at most `limit`
    fn query_recent(&self, exercise: &str, limit: usize) -> Result<Vec<LoggedSet>>;

    /// Every set of one exercise, oldest first
    fn query_all(&self, exercise: &str) -> Result<Vec<LoggedSet>>;

    /// Newest set for a workout/exercise pair
    fn query_last(&self, workout: &str, exercise: &str) -> Result<Option<LoggedSet>>;

    /// Backing flat file, if the whole log lives in one shareable file
    fn flat_file(&self) -> Option<&Path> {
        None
    }
}

/// Open the configured backend
pub fn open_store(backend: Backend, path: &Path) -> Result<Box<dyn LogStore>> {
    info!("Opening {:?} log at {}", backend, path.display());
    let store: Box<dyn LogStore> = match backend {
        Backend::Sqlite => Box::new(Database::open(path)?),
        Backend::Csv => Box::new(CsvLog::open(path)?),
    };
    Ok(store)
}

/// SQLite-backed log
pub struct Database {
    conn: Connection,
}

const COLUMNS: &str = "time, workout, exercise, reps, weight, rir, form, max5, comments";

impl Database {
    /// Open or create database
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("cannot open database {}", path.display()))?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Private database that lives as long as the value
    pub fn open_in_memory() -> Result<Self> {
        let db = Self { conn: Connection::open_in_memory()? };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS exercise_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                time TEXT NOT NULL,
                workout TEXT NOT NULL,
                exercise TEXT NOT NULL,
                reps INTEGER NOT NULL,
                weight REAL NOT NULL,
                rir INTEGER,
                form INTEGER NOT NULL,
                max5 REAL NOT NULL,
                comments TEXT
            )",
            [],
        )?;

        // Migration: logs from before RIR was tracked
        let has_rir: bool = self.conn
            .prepare("SELECT rir FROM exercise_log LIMIT 1")
            .is_ok();
        if !has_rir {
            self.conn.execute("ALTER TABLE exercise_log ADD COLUMN rir INTEGER", [])?;
        }

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_exercise_log_exercise ON exercise_log (exercise, time)",
            [],
        )?;

        Ok(())
    }

    fn query(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<LoggedSet>> {
        let mut stmt = self.conn.prepare(sql)?;
        let sets = stmt
            .query_map(params, from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sets)
    }
}

fn from_row(row: &Row) -> rusqlite::Result<LoggedSet> {
    let time_str: String = row.get(0)?;
    let time = NaiveDateTime::parse_from_str(&time_str, TIME_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(LoggedSet {
        time,
        workout: row.get(1)?,
        exercise: row.get(2)?,
        reps: row.get(3)?,
        weight: row.get(4)?,
        rir: row.get(5)?,
        form: row.get(6)?,
        max5: row.get(7)?,
        comments: row.get(8)?,
    })
}

impl LogStore for Database {
    fn append(&mut self, set: &LoggedSet) -> Result<()> {
        self.conn.execute(
            &format!("INSERT INTO exercise_log ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
            params![
                set.time.format(TIME_FORMAT).to_string(),
                set.workout,
                set.exercise,
                set.reps,
                set.weight,
                set.rir,
                set.form,
                set.max5,
                set.comments,
            ],
        )?;
        Ok(())
    }

    fn query_recent(&self, exercise: &str, limit: usize) -> Result<Vec<LoggedSet>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.query(
            &format!("SELECT {COLUMNS} FROM exercise_log WHERE exercise = ?1 ORDER BY time DESC, id DESC LIMIT ?2"),
            params![exercise, limit],
        )
    }

    fn query_all(&self, exercise: &str) -> Result<Vec<LoggedSet>> {
        self.query(
            &format!("SELECT {COLUMNS} FROM exercise_log WHERE exercise = ?1 ORDER BY time ASC, id ASC"),
            params![exercise],
        )
    }

    fn query_last(&self, workout: &str, exercise: &str) -> Result<Option<LoggedSet>> {
        let set = self.conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM exercise_log WHERE workout = ?1 AND exercise = ?2 ORDER BY time DESC, id DESC LIMIT 1"),
                params![workout, exercise],
                from_row,
            )
            .optional()?;
        Ok(set)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn create_set(workout: &str, exercise: &str, time: &str, reps: u32, weight: f64) -> LoggedSet {
        LoggedSet {
            time: NaiveDateTime::parse_from_str(time, TIME_FORMAT).unwrap(),
            workout: workout.to_string(),
            exercise: exercise.to_string(),
            reps,
            weight,
            rir: Some(1),
            form: 8,
            max5: weight,
            comments: None,
        }
    }

    #[test]
    fn test_append_and_query_all() {
        let mut db = Database::open_in_memory().unwrap();
        db.append(&create_set("Push", "Bench", "2024-05-02 10:00:00", 5, 100.0)).unwrap();
        db.append(&create_set("Push", "Bench", "2024-05-01 10:00:00", 6, 95.0)).unwrap();
        db.append(&create_set("Pull", "Row", "2024-05-01 11:00:00", 8, 60.0)).unwrap();

        let all = db.query_all("Bench").unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].weight, 95.0);
        assert_eq!(all[1].weight, 100.0);
    }

    #[test]
    fn test_round_trip_fields() {
        let mut db = Database::open_in_memory().unwrap();
        let mut set = create_set("Legs", "Squat", "2024-05-01 09:30:15", 5, 142.5);
        set.rir = None;
        set.comments = Some("belt".to_string());
        set.max5 = 142.5;
        db.append(&set).unwrap();
        assert_eq!(db.query_all("Squat").unwrap(), vec![set]);
    }

    #[test]
    fn test_query_recent_newest_first_and_limited() {
        let mut db = Database::open_in_memory().unwrap();
        for day in 1..=7 {
            let time = format!("2024-05-0{} 10:00:00", day);
            db.append(&create_set("Push", "Bench", &time, 5, 90.0 + day as f64)).unwrap();
        }
        let recent = db.query_recent("Bench", 5).unwrap();
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].weight, 97.0);
        assert_eq!(recent[4].weight, 93.0);
    }

    #[test]
    fn test_query_last_is_per_pair() {
        let mut db = Database::open_in_memory().unwrap();
        db.append(&create_set("Push A", "Bench", "2024-05-01 10:00:00", 5, 100.0)).unwrap();
        db.append(&create_set("Push B", "Bench", "2024-05-03 10:00:00", 5, 105.0)).unwrap();
        db.append(&create_set("Push A", "Bench", "2024-05-02 10:00:00", 5, 102.5)).unwrap();

        let last = db.query_last("Push A", "Bench").unwrap().unwrap();
        assert_eq!(last.weight, 102.5);
        assert!(db.query_last("Push A", "Dips").unwrap().is_none());
    }

    #[test]
    fn test_same_second_keeps_insert_order() {
        let mut db = Database::open_in_memory().unwrap();
        db.append(&create_set("Push", "Bench", "2024-05-01 10:00:00", 5, 100.0)).unwrap();
        db.append(&create_set("Push", "Bench", "2024-05-01 10:00:00", 5, 110.0)).unwrap();
        assert_eq!(db.query_last("Push", "Bench").unwrap().unwrap().weight, 110.0);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.db");
        {
            let mut db = Database::open(&path).unwrap();
            db.append(&create_set("Push", "Bench", "2024-05-01 10:00:00", 5, 100.0)).unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.query_all("Bench").unwrap().len(), 1);
        assert!(db.flat_file().is_none());
    }

    #[test]
    fn test_migration_adds_rir_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute(
                "CREATE TABLE exercise_log (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    time TEXT NOT NULL, workout TEXT NOT NULL, exercise TEXT NOT NULL,
                    reps INTEGER NOT NULL, weight REAL NOT NULL, form INTEGER NOT NULL,
                    max5 REAL NOT NULL, comments TEXT
                )",
                [],
            )
            .unwrap();
        }
        let mut db = Database::open(&path).unwrap();
        db.append(&create_set("Push", "Bench", "2024-05-01 10:00:00", 5, 100.0)).unwrap();
        assert_eq!(db.query_all("Bench").unwrap()[0].rir, Some(1));
    }
}
