//! Flat-file log - the whole history in one CSV, loaded into memory on open

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::{LogStore, LoggedSet};

/// Column layout written by this version
pub const HEADER: [&str; 9] = [
    "Time", "Workout", "Exercise", "Reps", "Weight", "RIR", "Form", "Max5", "Comments",
];

/// CSV log kept in memory and mirrored to disk on every append
pub struct CsvLog {
    path: PathBuf,
    rows: Vec<LoggedSet>,
    /// File uses an older column layout and is rewritten before the next append
    legacy_layout: bool,
}

impl CsvLog {
    /// Load an existing log, or start an empty one at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut legacy_layout = false;
        let rows = if path.exists() {
            let mut reader = csv::Reader::from_path(&path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            let headers = reader.headers()?;
            legacy_layout = !headers.is_empty() && !headers.iter().eq(HEADER);
            reader
                .deserialize()
                .collect::<Result<Vec<LoggedSet>, _>>()
                .with_context(|| format!("malformed log {}", path.display()))?
        } else {
            Vec::new()
        };
        debug!("Loaded {} rows from {}", rows.len(), path.display());
        Ok(Self { path, rows, legacy_layout })
    }

    fn write_row(&self, set: &LoggedSet) -> Result<()> {
        let needs_header = std::fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);
        let file: File = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(set)?;
        writer.flush()?;
        Ok(())
    }

    /// Write every row plus `set` under the current header, replacing the file
    fn rewrite_with(&self, set: &LoggedSet) -> Result<()> {
        let tmp = self.path.with_extension("csv.tmp");
        {
            let mut writer = csv::Writer::from_path(&tmp)?;
            for row in self.rows.iter().chain(std::iter::once(set)) {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
        std::fs::rename(&tmp, &self.path)?;
        info!("Upgraded {} to the current column layout", self.path.display());
        Ok(())
    }

    /// Rows of one exercise, newest first. Rows sharing a timestamp keep
    /// later-written first.
    fn newest_first<'a>(&'a self, exercise: &'a str) -> impl Iterator<Item = &'a LoggedSet> + 'a {
        let mut rows: Vec<&LoggedSet> = self.rows.iter().rev().filter(|s| s.exercise == exercise).collect();
        rows.sort_by(|a, b| b.time.cmp(&a.time));
        rows.into_iter()
    }
}

impl LogStore for CsvLog {
    fn append(&mut self, set: &LoggedSet) -> Result<()> {
        let written = if self.legacy_layout {
            self.rewrite_with(set)
        } else {
            self.write_row(set)
        };
        written.with_context(|| format!("cannot write {}", self.path.display()))?;
        self.legacy_layout = false;
        self.rows.push(set.clone());
        Ok(())
    }

    fn query_recent(&self, exercise: &str, limit: usize) -> Result<Vec<LoggedSet>> {
        Ok(self.newest_first(exercise).take(limit).cloned().collect())
    }

    fn query_all(&self, exercise: &str) -> Result<Vec<LoggedSet>> {
        let mut rows: Vec<LoggedSet> = self.rows.iter().filter(|s| s.exercise == exercise).cloned().collect();
        rows.sort_by(|a, b| a.time.cmp(&b.time));
        Ok(rows)
    }

    fn query_last(&self, workout: &str, exercise: &str) -> Result<Option<LoggedSet>> {
        Ok(self.newest_first(exercise).find(|s| s.workout == workout).cloned())
    }

    fn flat_file(&self) -> Option<&Path> {
        Some(&self.path)
    }
}
