//! Stats module - 5-rep-max estimates and history ranking
//!
//! Features:
//! - Estimated 5-rep max from reps, weight and RIR
//! - Recent-history window with best-set selection

pub mod estimator;
pub mod ranker;

pub use estimator::{estimate_5rm, estimate_from_input};
pub use ranker::{RankedHistory, rank_history};
