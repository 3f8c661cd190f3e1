//! History ranking - the recent window and the best set of an exercise

use std::cmp::Ordering;

use crate::db::LoggedSet;

/// Recent sets plus the best set of the whole history
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedHistory {
    /// Newest first, at most `n`
    pub recent: Vec<LoggedSet>,
    /// Best set over every set passed in, not only `recent`
    pub best: Option<LoggedSet>,
}

impl RankedHistory {
    /// Whether a displayed row is the best set (full field equality).
    ///
    /// A best set outside the recent window matches no displayed row.
    pub fn is_highlighted(&self, row: &LoggedSet) -> bool {
        self.best.as_ref() == Some(row)
    }
}

/// Best-set order: lowest RIR first (missing RIR last), then highest form,
/// then highest estimated max
pub fn best_set_order(a: &LoggedSet, b: &LoggedSet) -> Ordering {
    let rir = match (a.rir, b.rir) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    rir.then_with(|| b.form.cmp(&a.form))
        .then_with(|| b.max5.total_cmp(&a.max5))
}

/// Newest first. Sets logged in the same second fall back to comparing
/// every other field, so the order never depends on input order.
fn newest_first(a: &LoggedSet, b: &LoggedSet) -> Ordering {
    b.time
        .cmp(&a.time)
        .then_with(|| a.workout.cmp(&b.workout))
        .then_with(|| a.exercise.cmp(&b.exercise))
        .then_with(|| a.reps.cmp(&b.reps))
        .then_with(|| a.weight.total_cmp(&b.weight))
        .then_with(|| a.rir.cmp(&b.rir))
        .then_with(|| a.form.cmp(&b.form))
        .then_with(|| a.max5.total_cmp(&b.max5))
        .then_with(|| a.comments.cmp(&b.comments))
}

/// Rank an exercise's history.
///
/// The best set is the first one under [`best_set_order`]; sets equal under
/// it resolve to the newest.
pub fn rank_history(sets: &[LoggedSet], n: usize) -> RankedHistory {
    let mut by_time: Vec<&LoggedSet> = sets.iter().collect();
    by_time.sort_by(|a, b| newest_first(a, b));

    let mut ranked = by_time.clone();
    ranked.sort_by(|a, b| best_set_order(a, b));

    RankedHistory {
        recent: by_time.into_iter().take(n).cloned().collect(),
        best: ranked.first().map(|s| (*s).clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::create_set;

    fn create_ranked_set(day: u32, rir: Option<u32>, form: u32, max5: f64) -> LoggedSet {
        let mut set = create_set("Push", "Bench", &format!("2024-05-{:02} 10:00:00", day), 5, max5);
        set.rir = rir;
        set.form = form;
        set.max5 = max5;
        set
    }

    #[test]
    fn test_empty_history() {
        let ranked = rank_history(&[], 5);
        assert!(ranked.recent.is_empty());
        assert!(ranked.best.is_none());
    }

    #[test]
    fn test_recent_newest_first_truncated() {
        let sets: Vec<_> = (1..=8).map(|d| create_ranked_set(d, Some(1), 8, 100.0 + d as f64)).collect();
        let ranked = rank_history(&sets, 5);
        let days: Vec<u32> = ranked.recent.iter().map(|s| s.max5 as u32 - 100).collect();
        assert_eq!(days, vec![8, 7, 6, 5, 4]);
    }

    #[test]
    fn test_lowest_rir_wins_regardless_of_position() {
        let sets = vec![
            create_ranked_set(1, Some(2), 8, 100.0),
            create_ranked_set(2, Some(0), 9, 100.0),
            create_ranked_set(3, Some(1), 7, 100.0),
        ];
        for rotation in 0..sets.len() {
            let mut rotated = sets.clone();
            rotated.rotate_left(rotation);
            let best = rank_history(&rotated, 5).best.unwrap();
            assert_eq!(best.rir, Some(0));
        }
    }

    #[test]
    fn test_form_then_max5_break_ties() {
        let sets = vec![
            create_ranked_set(1, Some(1), 7, 120.0),
            create_ranked_set(2, Some(1), 9, 100.0),
            create_ranked_set(3, Some(1), 9, 105.0),
        ];
        let best = rank_history(&sets, 5).best.unwrap();
        assert_eq!((best.form, best.max5), (9, 105.0));
    }

    #[test]
    fn test_missing_rir_ranks_last() {
        let sets = vec![
            create_ranked_set(1, None, 10, 150.0),
            create_ranked_set(2, Some(3), 5, 90.0),
        ];
        assert_eq!(rank_history(&sets, 5).best.unwrap().rir, Some(3));
    }

    #[test]
    fn test_full_tie_resolves_to_newest() {
        let sets = vec![
            create_ranked_set(1, Some(1), 8, 100.0),
            create_ranked_set(4, Some(1), 8, 100.0),
            create_ranked_set(2, Some(1), 8, 100.0),
        ];
        let best = rank_history(&sets, 5).best.unwrap();
        assert_eq!(best.time, sets[1].time);
    }

    #[test]
    fn test_same_second_ties_ignore_input_order() {
        let mut sets = Vec::new();
        for (workout, weight) in [("Push B", 100.0), ("Push A", 100.0), ("Push A", 97.5), ("Push C", 100.0)] {
            let mut set = create_ranked_set(3, Some(1), 8, 100.0);
            set.workout = workout.to_string();
            set.weight = weight;
            sets.push(set);
        }
        sets.push(create_ranked_set(1, Some(1), 8, 100.0));

        let expected = rank_history(&sets, 3);
        assert_eq!(expected.best.as_ref().unwrap().workout, "Push A");
        assert_eq!(expected.best.as_ref().unwrap().weight, 97.5);

        for rotation in 0..sets.len() {
            let mut shuffled = sets.clone();
            shuffled.rotate_left(rotation);
            assert_eq!(rank_history(&shuffled, 3), expected, "rotation {}", rotation);
            shuffled.reverse();
            assert_eq!(rank_history(&shuffled, 3), expected, "reversed rotation {}", rotation);
        }
    }

    #[test]
    fn test_best_taken_from_whole_history() {
        let mut sets = vec![create_ranked_set(1, Some(0), 10, 130.0)];
        sets.extend((2..=7).map(|d| create_ranked_set(d, Some(2), 6, 100.0)));

        let ranked = rank_history(&sets, 5);
        assert_eq!(ranked.best.as_ref().unwrap().time, sets[0].time);
        // best is outside the window, so nothing is highlighted
        assert!(ranked.recent.iter().all(|row| !ranked.is_highlighted(row)));
    }

    #[test]
    fn test_best_inside_window_highlighted_once() {
        let sets = vec![
            create_ranked_set(1, Some(2), 8, 100.0),
            create_ranked_set(2, Some(0), 8, 100.0),
            create_ranked_set(3, Some(1), 8, 100.0),
        ];
        let ranked = rank_history(&sets, 5);
        let highlighted: Vec<_> = ranked.recent.iter().filter(|r| ranked.is_highlighted(r)).collect();
        assert_eq!(highlighted.len(), 1);
        assert_eq!(highlighted[0].rir, Some(0));
    }
}
