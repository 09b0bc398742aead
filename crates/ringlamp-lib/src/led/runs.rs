//! Run detection and application.
//!
//! A run is a contiguous span of at least two positions sharing the same
//! color and brightness. Runs are sent once instead of element by element;
//! the positions they cover are marked with the sentinel pair so the
//! payload does not repeat them.

use super::element::{ElementState, ElementTable, LED_COUNT};

/// Shortest span worth compacting.
pub const MIN_RUN_LEN: usize = 2;

/// Positions `[start, start + count)` share `color` and `brightness`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub color: String,
    pub start: usize,
    pub count: usize,
    pub brightness: String,
}

impl Run {
    pub fn new(
        color: impl Into<String>,
        start: usize,
        count: usize,
        brightness: impl Into<String>,
    ) -> Self {
        Self {
            color: color.into(),
            start,
            count,
            brightness: brightness.into(),
        }
    }

    /// One past the last covered index.
    pub fn end(&self) -> usize {
        self.start.saturating_add(self.count)
    }

    pub fn covers(&self, index: usize) -> bool {
        (self.start..self.end()).contains(&index)
    }

    /// The element state every covered position shares.
    pub fn state(&self) -> ElementState {
        ElementState::new(self.color.clone(), self.brightness.clone())
    }

    fn matches(&self, index: usize, state: &ElementState) -> bool {
        state.color == self.color && state.brightness == self.brightness && index == self.end()
    }
}

/// Scan the table left to right and return every maximal stretch of
/// [`MIN_RUN_LEN`] or more identical, explicit, adjacent elements.
///
/// An element with a sentinel color or brightness closes the open run.
/// Index 23 and index 0 are not treated as adjacent.
pub fn detect_runs(table: &ElementTable) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut open: Option<Run> = None;

    for (index, state) in table.iter_indexed() {
        if !state.is_explicit() {
            close(&mut runs, open.take());
            continue;
        }
        match open.as_mut() {
            Some(run) if run.matches(index, state) => run.count += 1,
            _ => {
                close(&mut runs, open.take());
                open = Some(Run::new(
                    state.color.clone(),
                    index,
                    1,
                    state.brightness.clone(),
                ));
            }
        }
    }
    close(&mut runs, open);

    log::debug!("detected {} run(s)", runs.len());
    runs
}

fn close(runs: &mut Vec<Run>, candidate: Option<Run>) {
    if let Some(run) = candidate
        && run.count >= MIN_RUN_LEN
    {
        runs.push(run);
    }
}

/// Return a copy of `table` with every position covered by `runs` set to
/// the sentinel pair. Positions outside any run keep their value.
pub fn apply_runs(table: &ElementTable, runs: &[Run]) -> ElementTable {
    let mut out = table.clone();
    for run in runs {
        for index in run.start..run.end().min(LED_COUNT) {
            out[index] = ElementState::sentinel();
        }
    }
    out
}

/// Write each run's state back over the positions it covers.
///
/// Inverse of [`apply_runs`] for tables whose covered positions were
/// sentinel; used to reconstruct a full table from a received envelope.
pub fn expand_runs(table: &ElementTable, runs: &[Run]) -> ElementTable {
    let mut out = table.clone();
    for run in runs {
        let state = run.state();
        for index in run.start..run.end().min(LED_COUNT) {
            out[index] = state.clone();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(color: &str, brightness: &str) -> ElementTable {
        ElementTable::filled(ElementState::new(color, brightness))
    }

    fn unique_colors() -> ElementTable {
        let states = (0..LED_COUNT)
            .map(|i| ElementState::new(format!("#0000{i:02X}"), "255"))
            .collect();
        ElementTable::from_vec(states).unwrap()
    }

    // ── detect_runs ──

    #[test]
    fn solid_table_is_one_run() {
        let runs = detect_runs(&solid("#FFFFFF", "255"));
        assert_eq!(runs, vec![Run::new("#FFFFFF", 0, 24, "255")]);
    }

    #[test]
    fn all_sentinel_has_no_runs() {
        assert!(detect_runs(&ElementTable::sentinel()).is_empty());
    }

    #[test]
    fn mount_default_has_no_runs() {
        // Brightness is the sentinel on every element.
        assert!(detect_runs(&ElementTable::default()).is_empty());
    }

    #[test]
    fn no_adjacent_matches_has_no_runs() {
        assert!(detect_runs(&unique_colors()).is_empty());
    }

    #[test]
    fn single_pair_is_compacted() {
        let mut table = unique_colors();
        table.set(11, table[10].clone()).unwrap();
        assert_eq!(
            detect_runs(&table),
            vec![Run::new(table[10].color.clone(), 10, 2, "255")]
        );
    }

    #[test]
    fn brightness_difference_breaks_run() {
        let mut table = solid("#FF0000", "255");
        table.set(12, ElementState::new("#FF0000", "254")).unwrap();
        let runs = detect_runs(&table);
        assert_eq!(
            runs,
            vec![
                Run::new("#FF0000", 0, 12, "255"),
                Run::new("#FF0000", 13, 11, "255"),
            ]
        );
    }

    #[test]
    fn sentinel_gap_breaks_run() {
        let mut table = solid("#00FF00", "100");
        table.set(5, ElementState::new("#00FF00", "-1")).unwrap();
        let runs = detect_runs(&table);
        assert_eq!(runs.len(), 2);
        assert_eq!((runs[0].start, runs[0].count), (0, 5));
        assert_eq!((runs[1].start, runs[1].count), (6, 18));
    }

    #[test]
    fn same_color_separated_by_one_element_is_two_runs() {
        let mut table = solid("#0000FF", "1");
        table.set(2, ElementState::new("#FFFFFF", "1")).unwrap();
        let runs = detect_runs(&table);
        assert_eq!(runs[0], Run::new("#0000FF", 0, 2, "1"));
        assert_eq!(runs[1], Run::new("#0000FF", 3, 21, "1"));
    }

    #[test]
    fn run_at_end_does_not_wrap_to_start() {
        let mut table = unique_colors();
        let tail = ElementState::new("#ABCDEF", "9");
        for i in [22, 23, 0, 1] {
            table.set(i, tail.clone()).unwrap();
        }
        let runs = detect_runs(&table);
        assert_eq!(
            runs,
            vec![Run::new("#ABCDEF", 0, 2, "9"), Run::new("#ABCDEF", 22, 2, "9")]
        );
    }

    #[test]
    fn runs_are_ascending_and_at_least_two() {
        let colors = ["#111111", "#111111", "#222222", "#333333", "#333333", "#333333"];
        let states = (0..LED_COUNT)
            .map(|i| ElementState::new(colors[i % colors.len()], "50"))
            .collect();
        let runs = detect_runs(&ElementTable::from_vec(states).unwrap());
        assert!(runs.iter().all(|r| r.count >= MIN_RUN_LEN));
        assert!(runs.windows(2).all(|w| w[0].end() <= w[1].start));
        assert_eq!(runs.len(), 8);
    }

    // ── apply_runs ──

    #[test]
    fn apply_marks_covered_positions_only() {
        let mut table = ElementTable::sentinel();
        for i in 0..5 {
            table.set(i, ElementState::new("#0000FF", "100")).unwrap();
        }
        table.set(5, ElementState::new("#FF0000", "100")).unwrap();

        let runs = detect_runs(&table);
        let applied = apply_runs(&table, &runs);

        for i in 0..5 {
            assert!(applied[i].is_sentinel(), "index {i} should be deferred");
        }
        assert_eq!(applied[5], ElementState::new("#FF0000", "100"));
        // The input is untouched.
        assert_eq!(table[0], ElementState::new("#0000FF", "100"));
    }

    #[test]
    fn apply_ignores_positions_past_the_ring() {
        let table = solid("#FFFFFF", "255");
        let applied = apply_runs(&table, &[Run::new("#FFFFFF", 20, 10, "255")]);
        assert!(applied[23].is_sentinel());
        assert!(applied[19].is_explicit());
    }

    #[test]
    fn expand_restores_detected_runs() {
        let mut table = unique_colors();
        for i in 3..9 {
            table.set(i, ElementState::new("#FFFF00", "255")).unwrap();
        }
        let runs = detect_runs(&table);
        let restored = expand_runs(&apply_runs(&table, &runs), &runs);
        assert_eq!(restored, table);
        assert_eq!(detect_runs(&restored), runs);
    }

    #[test]
    fn run_covers_half_open_range() {
        let run = Run::new("#000000", 4, 3, "0");
        assert!(!run.covers(3));
        assert!(run.covers(4));
        assert!(run.covers(6));
        assert!(!run.covers(7));
        assert_eq!(run.end(), 7);
    }

    #[test]
    fn overlong_run_is_clamped_to_ring() {
        let run = Run::new("#000000", 21, usize::MAX, "0");
        assert_eq!(run.end(), usize::MAX);
        let applied = apply_runs(&ElementTable::default(), std::slice::from_ref(&run));
        assert!(!applied[20].is_sentinel());
        assert!((21..LED_COUNT).all(|i| applied[i].is_sentinel()));
        let expanded = expand_runs(&applied, &[run]);
        assert!((21..LED_COUNT).all(|i| expanded[i] == ElementState::new("#000000", "0")));
    }
}
