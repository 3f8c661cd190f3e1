//! Logbook - validates a set, estimates its 5-rep max and appends it

use anyhow::anyhow;
use chrono::{Duration, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::config::Rules;
use crate::db::{self, LogStore, LoggedSet};
use crate::error::SaveError;
use crate::mirror::Mirror;
use crate::stats::estimator::{self, parse_count, parse_real};
use crate::stats::{RankedHistory, rank_history};

/// Highest accepted form score
pub const MAX_FORM: u32 = 10;

/// Raw form input, as typed by the user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetInput {
    pub workout: Option<String>,
    pub exercise: Option<String>,
    pub reps: Option<String>,
    pub weight: Option<String>,
    pub form: Option<String>,
    pub rir: Option<String>,
    pub comments: Option<String>,
}

/// Store, catalog and rules for one user
pub struct Logbook {
    store: Box<dyn LogStore>,
    catalog: Catalog,
    rules: Rules,
    mirror: Option<Box<dyn Mirror>>,
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, SaveError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(SaveError::MissingField(field))
}

fn optional(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Logbook {
    pub fn new(store: Box<dyn LogStore>, catalog: Catalog, rules: Rules) -> Self {
        Self { store, catalog, rules, mirror: None }
    }

    pub fn with_mirror(mut self, mirror: Box<dyn Mirror>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Save a set stamped with the current time
    pub fn save(&mut self, input: &SetInput) -> Result<LoggedSet, SaveError> {
        self.save_at(input, db::now())
    }

    /// Save a set stamped with `now`.
    ///
    /// Nothing is written unless every check passes. A mirror failure after
    /// the local write is logged and does not fail the save.
    pub fn save_at(&mut self, input: &SetInput, now: NaiveDateTime) -> Result<LoggedSet, SaveError> {
        let set = self.validate(input, now)?;

        if let Some(last) = self.store.query_last(&set.workout, &set.exercise)? {
            let elapsed = now - last.time;
            let throttle = Duration::try_seconds(self.rules.throttle_secs).ok_or_else(|| {
                SaveError::Store(anyhow!("throttle of {} seconds is out of range", self.rules.throttle_secs))
            })?;
            if elapsed < throttle {
                debug!("Throttled {} / {}: {}s since last save", set.workout, set.exercise, elapsed.num_seconds());
                let wait = throttle.checked_sub(&elapsed).unwrap_or(throttle);
                return Err(SaveError::Throttled {
                    throttle_secs: self.rules.throttle_secs,
                    wait_secs: wait.num_seconds(),
                });
            }
        }

        self.store.append(&set)?;
        info!(
            "Logged {} / {}: {} x {} (RIR {:?}, form {}) -> 5RM {:.1}",
            set.workout, set.exercise, set.reps, set.weight, set.rir, set.form, set.max5
        );

        if let (Some(mirror), Some(file)) = (&self.mirror, self.store.flat_file()) {
            if let Err(e) = mirror.push(file) {
                warn!("Mirror push failed, local log kept: {:#}", e);
            }
        }

        Ok(set)
    }

    /// Turn raw input into a set ready to append
    pub fn validate(&self, input: &SetInput, now: NaiveDateTime) -> Result<LoggedSet, SaveError> {
        let workout = required(&input.workout, "workout")?;
        let exercise = required(&input.exercise, "exercise")?;
        let reps = required(&input.reps, "reps")?;
        let weight = required(&input.weight, "weight")?;
        let form = required(&input.form, "form")?;
        let rir = match optional(&input.rir) {
            None if self.rules.require_rir => return Err(SaveError::MissingField("rir")),
            rir => rir,
        };

        if !self.catalog.contains(workout, exercise) {
            return Err(SaveError::UnknownExercise {
                workout: workout.to_string(),
                exercise: exercise.to_string(),
            });
        }

        let reps = parse_count("reps", reps)?;
        if reps == 0 {
            return Err(SaveError::invalid("reps", "must be at least 1"));
        }
        let weight = parse_real("weight", weight)?;
        if weight <= 0.0 {
            return Err(SaveError::invalid("weight", "must be greater than 0"));
        }
        let form = parse_count("form", form)?;
        if form > MAX_FORM {
            return Err(SaveError::invalid("form", format!("must be between 0 and {}", MAX_FORM)));
        }
        let rir = match rir {
            Some(raw) => {
                let rir = parse_count("rir", raw)?;
                if rir > self.rules.max_rir {
                    return Err(SaveError::invalid(
                        "rir",
                        format!("must be between 0 and {}", self.rules.max_rir),
                    ));
                }
                Some(rir)
            }
            None => None,
        };

        let formula = self.rules.formula;
        let max5 = estimator::estimate_5rm(reps, weight, rir, formula).ok_or(SaveError::NotComputable {
            total: estimator::rep_total(reps, rir, formula),
        })?;

        Ok(LoggedSet {
            time: now,
            workout: workout.to_string(),
            exercise: exercise.to_string(),
            reps,
            weight,
            rir,
            form,
            max5,
            comments: optional(&input.comments).map(str::to_string),
        })
    }

    /// Recent window and best set of one exercise
    pub fn history(&self, exercise: &str) -> anyhow::Result<RankedHistory> {
        let all = self.store.query_all(exercise)?;
        Ok(rank_history(&all, self.rules.history_size))
    }

    /// Every set of one exercise, oldest first
    pub fn series(&self, exercise: &str) -> anyhow::Result<Vec<LoggedSet>> {
        self.store.query_all(exercise)
    }

    /// Estimate without saving, under the configured formula
    pub fn estimate(&self, reps: &str, weight: &str, rir: Option<&str>) -> Result<Option<f64>, SaveError> {
        estimator::estimate_from_input(reps, weight, rir, self.rules.formula)
    }
}
