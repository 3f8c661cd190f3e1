//! View models - what the dashboard and the CLI render

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::db::{LoggedSet, TIME_FORMAT};
use crate::stats::RankedHistory;

pub const NO_HISTORY: &str = "No history available for this exercise.";

pub const HISTORY_COLUMNS: [&str; 7] = ["Time", "Workout", "Reps", "Weight", "RIR", "Form", "Max5"];

/// A renderable panel
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Panel {
    NoData { message: String },
    Table(HistoryTable),
    Chart(Max5Series),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryTable {
    pub exercise: String,
    pub rows: Vec<HistoryRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRow {
    pub set: LoggedSet,
    pub highlighted: bool,
}

impl HistoryRow {
    /// Cells in [`HISTORY_COLUMNS`] order
    pub fn cells(&self) -> [String; 7] {
        let s = &self.set;
        [
            s.time.format(TIME_FORMAT).to_string(),
            s.workout.clone(),
            s.reps.to_string(),
            format_number(s.weight),
            s.rir.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string()),
            s.form.to_string(),
            format!("{:.2}", s.max5),
        ]
    }
}

/// Estimated 5-rep max over time, oldest first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Max5Series {
    pub title: String,
    pub points: Vec<(NaiveDateTime, f64)>,
}

impl Max5Series {
    /// Lowest and highest max5, `None` for an empty series
    pub fn value_bounds(&self) -> Option<(f64, f64)> {
        let mut values = self.points.iter().map(|(_, v)| *v);
        let first = values.next()?;
        Some(values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

/// History table of the recent window, best set highlighted
pub fn history_panel(exercise: &str, history: &RankedHistory) -> Panel {
    if history.recent.is_empty() {
        return Panel::NoData { message: NO_HISTORY.to_string() };
    }
    let rows = history
        .recent
        .iter()
        .map(|set| HistoryRow { set: set.clone(), highlighted: history.is_highlighted(set) })
        .collect();
    Panel::Table(HistoryTable { exercise: exercise.to_string(), rows })
}

/// Max5 line chart from an exercise's sets in any order
pub fn chart_panel(exercise: &str, sets: &[LoggedSet]) -> Panel {
    if sets.is_empty() {
        return Panel::NoData { message: NO_HISTORY.to_string() };
    }
    let mut points: Vec<(NaiveDateTime, f64)> = sets.iter().map(|s| (s.time, s.max5)).collect();
    points.sort_by(|a, b| a.0.cmp(&b.0));
    Panel::Chart(Max5Series {
        title: format!("5Max Over Time for {}", exercise),
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::create_set;
    use crate::stats::rank_history;

    #[test]
    fn test_empty_history_is_no_data() {
        let panel = history_panel("Bench", &RankedHistory::default());
        assert_eq!(panel, Panel::NoData { message: NO_HISTORY.to_string() });
        assert!(matches!(chart_panel("Bench", &[]), Panel::NoData { .. }));
    }

    #[test]
    fn test_table_marks_best_row() {
        let mut best = create_set("Push", "Bench", "2024-05-02 10:00:00", 5, 100.0);
        best.rir = Some(0);
        let sets = vec![create_set("Push", "Bench", "2024-05-01 10:00:00", 5, 100.0), best.clone()];

        let Panel::Table(table) = history_panel("Bench", &rank_history(&sets, 5)) else {
            panic!("expected a table");
        };
        assert_eq!(table.rows.len(), 2);
        assert!(table.rows[0].highlighted);
        assert_eq!(table.rows[0].set, best);
        assert!(!table.rows[1].highlighted);
    }

    #[test]
    fn test_cells() {
        let mut set = create_set("Push", "Bench", "2024-05-01 10:00:00", 8, 82.5);
        set.rir = None;
        set.max5 = 90.64;
        let row = HistoryRow { set, highlighted: false };
        assert_eq!(
            row.cells(),
            ["2024-05-01 10:00:00", "Push", "8", "82.5", "-", "8", "90.64"].map(String::from)
        );
    }

    #[test]
    fn test_chart_sorted_by_time() {
        let sets = vec![
            create_set("Push", "Bench", "2024-05-03 10:00:00", 5, 103.0),
            create_set("Push", "Bench", "2024-05-01 10:00:00", 5, 101.0),
            create_set("Push", "Bench", "2024-05-02 10:00:00", 5, 99.0),
        ];
        let Panel::Chart(series) = chart_panel("Bench", &sets) else {
            panic!("expected a chart");
        };
        assert_eq!(series.title, "5Max Over Time for Bench");
        let values: Vec<f64> = series.points.iter().map(|p| p.1).collect();
        assert_eq!(values, vec![101.0, 99.0, 103.0]);
        assert_eq!(series.value_bounds(), Some((99.0, 103.0)));
    }

    #[test]
    fn test_panel_serializes_with_kind_tag() {
        let json = serde_json::to_value(Panel::NoData { message: "x".into() }).unwrap();
        assert_eq!(json["kind"], "no_data");
    }
}
