//! liftlog - Personal strength training log
//!
//! Logs sets with an estimated 5-rep max and shows recent history and progress.

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod logbook;
pub mod mirror;
pub mod stats;
pub mod tui;
pub mod view;

pub use db::{Database, LogStore, LoggedSet};
pub use error::SaveError;
pub use logbook::{Logbook, SetInput};
