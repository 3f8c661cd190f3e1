//! Runtime settings - flags with environment fallbacks (`.env` is loaded first)

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};

/// How RIR takes part in the 5-rep-max estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Formula {
    /// Reps in reserve are added to the reps before the table lookup
    #[default]
    AddRir,
    /// Only the performed reps are looked up, RIR is recorded but unused
    IgnoreRir,
}

/// Where logged sets are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Sqlite,
    Csv,
}

impl Backend {
    pub fn default_path(&self) -> &'static str {
        match self {
            Backend::Sqlite => "liftlog.db",
            Backend::Csv => "exercise_log.csv",
        }
    }
}

/// Longest accepted throttle, one day
pub const MAX_THROTTLE_SECS: i64 = 86_400;

#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// Storage backend
    #[arg(long, env = "LIFTLOG_BACKEND", value_enum, default_value_t = Backend::Sqlite)]
    pub backend: Backend,

    /// Log file (defaults to liftlog.db or exercise_log.csv)
    #[arg(long, env = "LIFTLOG_PATH")]
    pub log_path: Option<PathBuf>,

    /// Training split: one column per workout, exercises below
    #[arg(long, env = "LIFTLOG_CATALOG", default_value = "split.csv")]
    pub catalog: PathBuf,

    /// 5-rep-max formula
    #[arg(long, env = "LIFTLOG_FORMULA", value_enum, default_value_t = Formula::AddRir)]
    pub formula: Formula,

    /// Upper bound for reps in reserve
    #[arg(long, env = "LIFTLOG_MAX_RIR", default_value = "3")]
    pub max_rir: u32,

    /// Reject sets logged without RIR
    #[arg(long, env = "LIFTLOG_REQUIRE_RIR")]
    pub require_rir: bool,

    /// Minimum seconds between two saves of the same workout and exercise
    #[arg(
        long,
        env = "LIFTLOG_THROTTLE_SECS",
        default_value = "120",
        value_parser = clap::value_parser!(i64).range(0..=MAX_THROTTLE_SECS)
    )]
    pub throttle_secs: i64,

    /// Rows shown in the history table
    #[arg(long, env = "LIFTLOG_HISTORY_SIZE", default_value = "5")]
    pub history_size: usize,

    #[command(flatten)]
    pub mirror: MirrorSettings,
}

impl Settings {
    pub fn log_path(&self) -> PathBuf {
        self.log_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(self.backend.default_path()))
    }

    pub fn rules(&self) -> Rules {
        Rules {
            formula: self.formula,
            max_rir: self.max_rir,
            require_rir: self.require_rir,
            throttle_secs: self.throttle_secs,
            history_size: self.history_size,
        }
    }
}

/// GitHub mirror of the CSV log. Disabled unless a repository is given.
#[derive(Debug, Clone, Args)]
pub struct MirrorSettings {
    /// Repository in `owner/name` form
    #[arg(long = "mirror-repo", env = "LIFTLOG_MIRROR_REPO")]
    pub repo: Option<String>,

    #[arg(long = "mirror-branch", env = "LIFTLOG_MIRROR_BRANCH", default_value = "main")]
    pub branch: String,

    /// Path of the log inside the repository (defaults to the local file name)
    #[arg(long = "mirror-path", env = "LIFTLOG_MIRROR_PATH")]
    pub path: Option<String>,

    /// Access token, never stored in the repo
    #[arg(long = "mirror-token", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

/// Business rules applied by the logbook
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rules {
    pub formula: Formula,
    pub max_rir: u32,
    pub require_rir: bool,
    pub throttle_secs: i64,
    pub history_size: usize,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            formula: Formula::AddRir,
            max_rir: 3,
            require_rir: false,
            throttle_secs: 120,
            history_size: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        settings: Settings,
    }

    #[test]
    fn test_defaults() {
        let cli = TestCli::parse_from(["liftlog"]);
        let rules = cli.settings.rules();
        assert_eq!(rules.formula, Formula::AddRir);
        assert_eq!(rules.throttle_secs, 120);
        assert_eq!(rules.history_size, 5);
    }

    #[test]
    fn test_log_path_follows_backend() {
        let cli = TestCli::parse_from(["liftlog", "--backend", "csv"]);
        assert_eq!(cli.settings.log_path(), PathBuf::from("exercise_log.csv"));
    }

    #[test]
    fn test_throttle_range() {
        let cli = TestCli::parse_from(["liftlog", "--throttle-secs", "0"]);
        assert_eq!(cli.settings.throttle_secs, 0);
        assert!(TestCli::try_parse_from(["liftlog", "--throttle-secs", "86401"]).is_err());
        assert!(TestCli::try_parse_from(["liftlog", "--throttle-secs", "-5"]).is_err());
        assert!(TestCli::try_parse_from(["liftlog", "--throttle-secs", "9223372036854775807"]).is_err());
    }

    #[test]
    fn test_formula_flag() {
        let cli = TestCli::parse_from(["liftlog", "--formula", "ignore-rir"]);
        assert_eq!(cli.settings.formula, Formula::IgnoreRir);
    }
}
