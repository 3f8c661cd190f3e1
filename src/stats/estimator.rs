//! 5-rep-max estimation from a single set

use crate::config::Formula;
use crate::error::SaveError;

/// Rep totals the multiplier table covers
pub const TOTAL_RANGE: std::ops::RangeInclusive<u32> = 3..=12;

/// Multiplier that converts a weight lifted for `total` reps into a 5-rep max
pub fn multiplier(total: u32) -> Option<f64> {
    let m = match total {
        3 => 0.935,
        4 => 0.963,
        5 => 1.0,
        6 => 1.02,
        7 => 1.048,
        8 => 1.077,
        9 => 1.105,
        10 => 1.133,
        11 => 1.162,
        12 => 1.19,
        _ => return None,
    };
    Some(m)
}

/// Rep total looked up in the table
pub fn rep_total(reps: u32, rir: Option<u32>, formula: Formula) -> u32 {
    match formula {
        Formula::AddRir => reps.saturating_add(rir.unwrap_or(0)),
        Formula::IgnoreRir => reps,
    }
}

/// Estimated 5-rep max, `None` when the rep total is outside the table
pub fn estimate_5rm(reps: u32, weight: f64, rir: Option<u32>, formula: Formula) -> Option<f64> {
    multiplier(rep_total(reps, rir, formula)).map(|m| weight * m)
}

/// Same as [`estimate_5rm`] but from raw text input.
///
/// Reps and RIR must parse as integers, weight as a real number. A blank RIR
/// counts as absent.
pub fn estimate_from_input(
    reps: &str,
    weight: &str,
    rir: Option<&str>,
    formula: Formula,
) -> Result<Option<f64>, SaveError> {
    let reps = parse_count("reps", reps)?;
    let weight = parse_real("weight", weight)?;
    let rir = match rir.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(parse_count("rir", raw)?),
        None => None,
    };
    Ok(estimate_5rm(reps, weight, rir, formula))
}

pub(crate) fn parse_count(field: &'static str, raw: &str) -> Result<u32, SaveError> {
    let raw = raw.trim();
    raw.parse::<u32>()
        .map_err(|_| SaveError::invalid(field, format!("'{}' is not a whole number", raw)))
}

pub(crate) fn parse_real(field: &'static str, raw: &str) -> Result<f64, SaveError> {
    let raw = raw.trim();
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(SaveError::invalid(field, format!("'{}' is not a number", raw))),
    }
}
