//! Save errors - every variant is a message the user sees

use thiserror::Error;

/// Why a set was not written to the log
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("Please fill in all fields ({0} is missing).")]
    MissingField(&'static str),

    #[error("Exercise '{exercise}' is not part of workout '{workout}'.")]
    UnknownExercise { workout: String, exercise: String },

    #[error("Invalid input for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Invalid inputs for 5Max calculation (total reps {total}, expected 3 to 12).")]
    NotComputable { total: u32 },

    #[error("You can only save once every {}.", format_interval(.throttle_secs))]
    Throttled { throttle_secs: i64, wait_secs: i64 },

    #[error("An error occurred: {0}")]
    Store(#[from] anyhow::Error),
}

impl SaveError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        SaveError::InvalidField { field, reason: reason.into() }
    }
}

fn format_interval(secs: &i64) -> String {
    match *secs {
        s if s % 60 == 0 && s >= 120 => format!("{} minutes", s / 60),
        60 => "minute".to_string(),
        s => format!("{} seconds", s),
    }
}
