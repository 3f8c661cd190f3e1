//! Exercise catalog - which exercises belong to which workout
//!
//! The split is a CSV table: every column header names a workout, the cells
//! below it list that workout's exercises. Columns may have different
//! lengths; blank cells are skipped.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workout {
    pub name: String,
    pub exercises: Vec<String>,
}

/// Static workout -> exercises mapping, loaded once at startup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    workouts: Vec<Workout>,
}

impl Catalog {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("cannot open split {}", path.display()))?;
        let catalog = Self::from_reader(file).with_context(|| format!("bad split {}", path.display()))?;
        if catalog.is_empty() {
            bail!("split {} lists no workouts", path.display());
        }
        Ok(catalog)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

        let mut workouts: Vec<Workout> = reader
            .headers()?
            .iter()
            .map(|h| Workout { name: h.trim().to_string(), exercises: Vec::new() })
            .collect();
        if workouts.iter().any(|w| w.name.is_empty()) {
            bail!("every column needs a workout name");
        }

        for record in reader.records() {
            let record = record?;
            for (workout, cell) in workouts.iter_mut().zip(record.iter()) {
                let exercise = cell.trim();
                if !exercise.is_empty() && !workout.exercises.iter().any(|e| e == exercise) {
                    workout.exercises.push(exercise.to_string());
                }
            }
        }

        Ok(Self { workouts })
    }

    pub fn workouts(&self) -> &[Workout] {
        &self.workouts
    }

    /// Exercises of a workout, empty for an unknown workout
    pub fn exercises(&self, workout: &str) -> &[String] {
        self.workouts
            .iter()
            .find(|w| w.name == workout)
            .map(|w| w.exercises.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, workout: &str, exercise: &str) -> bool {
        self.exercises(workout).iter().any(|e| e == exercise)
    }

    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }
}
