//! Lesson completion tracking, activity history, streaks, and subtree progress.
//!
//! [`ProgressState`] is a snapshot of the two persisted pieces of progress:
//! the [`CompletionSet`] (which lessons are done) and the [`ActivityHistory`]
//! (how many completions happened on each calendar day). Both change together
//! on every toggle so "what is done" never drifts from "when it was done".
//!
//! Everything else (streak, per-track percentages, the 7-day histogram) is
//! derived from a snapshot plus an explicit `today` and is never stored.
//!
//! # Streak rule
//!
//! The streak is the length of the run of consecutive active days ending at
//! `today`. A day with no activity breaks the run, and that includes today:
//! if nothing has been completed yet today the streak is 0 even when
//! yesterday was active.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::catalog::{Catalog, LessonTree};

/// Upper bound on the backward streak walk, in days.
pub const MAX_STREAK_LOOKBACK_DAYS: u32 = 3650;

/// Number of days covered by [`last_7_days_histogram`].
pub const HISTOGRAM_DAYS: usize = 7;

/// Display scale applied to each histogram bucket before capping at 100.
const HISTOGRAM_SCALE: u32 = 10;

// ---------------------------------------------------------------------------
// Persisted types
// ---------------------------------------------------------------------------

/// Set of completed lesson ids.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletionSet(BTreeSet<String>);

impl CompletionSet {
    #[must_use]
    pub fn contains(&self, lesson_id: &str) -> bool {
        self.0.contains(lesson_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, lesson_id: &str) -> bool {
        self.0.insert(lesson_id.to_string())
    }

    fn remove(&mut self, lesson_id: &str) -> bool {
        self.0.remove(lesson_id)
    }
}

impl<S: Into<String>> FromIterator<S> for CompletionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Completion events per calendar day, serialized as `{"YYYY-MM-DD": n}`.
///
/// Days whose count drops to zero are removed, so an absent day and a zero
/// day are indistinguishable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityHistory(BTreeMap<NaiveDate, u32>);

impl ActivityHistory {
    /// Count recorded for `day` (0 when absent).
    #[must_use]
    pub fn count(&self, day: NaiveDate) -> u32 {
        self.0.get(&day).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn increment(&mut self, day: NaiveDate) {
        let count = self.0.entry(day).or_insert(0);
        *count = count.saturating_add(1);
    }

    fn decrement(&mut self, day: NaiveDate) {
        if let Some(count) = self.0.get_mut(&day) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.0.remove(&day);
            }
        }
    }
}

impl FromIterator<(NaiveDate, u32)> for ActivityHistory {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().filter(|(_, count)| *count > 0).collect())
    }
}

// ---------------------------------------------------------------------------
// Derived types
// ---------------------------------------------------------------------------

/// Done/total counts for one subtree of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeProgress {
    pub done: usize,
    pub total: usize,
}

impl NodeProgress {
    /// Completion percentage rounded half-up, 0 for an empty subtree.
    #[must_use]
    pub fn percent(&self) -> u8 {
        percent_of(self.done, self.total)
    }

    /// Returns `true` when every lesson in a non-empty subtree is done.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.total > 0 && self.done == self.total
    }
}

impl fmt::Display for NodeProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({}%)", self.done, self.total, self.percent())
    }
}

/// Per-track rollup used by track listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackProgress {
    pub id: String,
    pub title: String,
    pub done: usize,
    pub total: usize,
    pub percent: u8,
}

/// Dashboard payload: everything the progress widgets render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressSummary {
    pub today: NaiveDate,
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
    pub current_streak: u32,
    pub today_count: u32,
    pub last_7_days: [u8; HISTOGRAM_DAYS],
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Completion set and activity history, always updated together.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressState {
    completed: CompletionSet,
    history: ActivityHistory,
}

impl ProgressState {
    #[must_use]
    pub const fn new(completed: CompletionSet, history: ActivityHistory) -> Self {
        Self { completed, history }
    }

    #[must_use]
    pub const fn completed(&self) -> &CompletionSet {
        &self.completed
    }

    #[must_use]
    pub const fn history(&self) -> &ActivityHistory {
        &self.history
    }

    #[must_use]
    pub fn is_complete(&self, lesson_id: &str) -> bool {
        self.completed.contains(lesson_id)
    }

    /// Flip completion of `lesson_id`, adjusting today's activity count.
    ///
    /// Adding increments `today`; removing decrements it, floored at zero
    /// (un-completing a lesson finished on an earlier day leaves today at 0).
    /// Returns whether the lesson is complete afterwards.
    pub fn toggle(&mut self, lesson_id: &str, today: NaiveDate) -> bool {
        if self.completed.remove(lesson_id) {
            self.history.decrement(today);
            false
        } else {
            self.completed.insert(lesson_id);
            self.history.increment(today);
            true
        }
    }

    /// Like [`ProgressState::toggle`] but leaves `self` untouched and returns
    /// the next snapshot.
    #[must_use]
    pub fn toggled(&self, lesson_id: &str, today: NaiveDate) -> (Self, bool) {
        let mut next = self.clone();
        let now_complete = next.toggle(lesson_id, today);
        (next, now_complete)
    }

    /// Done/total counts over any catalog subtree.
    #[must_use]
    pub fn progress_of<T: LessonTree + ?Sized>(&self, node: &T) -> NodeProgress {
        let mut progress = NodeProgress { done: 0, total: 0 };
        for lesson in node.iter_lessons() {
            progress.total += 1;
            if self.completed.contains(&lesson.id) {
                progress.done += 1;
            }
        }
        progress
    }

    /// Completion percentage (0..=100) of a catalog subtree.
    #[must_use]
    pub fn group_progress<T: LessonTree + ?Sized>(&self, node: &T) -> u8 {
        self.progress_of(node).percent()
    }

    /// Rollup for every track in catalog order.
    #[must_use]
    pub fn track_progress(&self, catalog: &Catalog) -> Vec<TrackProgress> {
        catalog
            .tracks
            .iter()
            .map(|track| {
                let progress = self.progress_of(track);
                TrackProgress {
                    id: track.id.clone(),
                    title: track.title.clone(),
                    done: progress.done,
                    total: progress.total,
                    percent: progress.percent(),
                }
            })
            .collect()
    }

    /// Build the dashboard summary. Completed ids that are no longer in the
    /// catalog are not counted.
    #[must_use]
    pub fn summary(&self, catalog: &Catalog, today: NaiveDate, max_lookback_days: u32) -> ProgressSummary {
        let overall = self.progress_of(catalog);
        ProgressSummary {
            today,
            completed: overall.done,
            total: overall.total,
            percent: overall.percent(),
            current_streak: compute_streak_bounded(&self.history, today, max_lookback_days),
            today_count: self.history.count(today),
            last_7_days: last_7_days_histogram(&self.history, today),
        }
    }
}

// ---------------------------------------------------------------------------
// Pure functions
// ---------------------------------------------------------------------------

/// Streak ending at `today`, walking back at most
/// [`MAX_STREAK_LOOKBACK_DAYS`] days.
#[must_use]
pub fn compute_streak(history: &ActivityHistory, today: NaiveDate) -> u32 {
    compute_streak_bounded(history, today, MAX_STREAK_LOOKBACK_DAYS)
}

/// Streak ending at `today`, never exceeding `max_days` (minimum 1).
#[must_use]
pub fn compute_streak_bounded(history: &ActivityHistory, today: NaiveDate, max_days: u32) -> u32 {
    if history.count(today) == 0 {
        return 0;
    }

    let cap = max_days.max(1);
    let mut streak = 1;
    let mut day = today;
    while streak < cap {
        let Some(previous) = day.pred_opt() else {
            break;
        };
        if history.count(previous) == 0 {
            break;
        }
        streak += 1;
        day = previous;
    }
    streak
}

/// Activity for `today - 6` through `today`, oldest first, each bucket
/// scaled by 10 and capped at 100.
#[must_use]
pub fn last_7_days_histogram(history: &ActivityHistory, today: NaiveDate) -> [u8; HISTOGRAM_DAYS] {
    let mut buckets = [0u8; HISTOGRAM_DAYS];
    for (slot, bucket) in buckets.iter_mut().enumerate() {
        let offset = (HISTOGRAM_DAYS - 1 - slot) as u64;
        let Some(day) = today.checked_sub_days(Days::new(offset)) else {
            continue;
        };
        let scaled = history.count(day).saturating_mul(HISTOGRAM_SCALE).min(100);
        *bucket = u8::try_from(scaled).unwrap_or(100);
    }
    buckets
}

/// `round_half_up(100 * done / total)`, or 0 when `total` is 0.
///
/// 100 is reserved for a fully complete subtree: an unfinished subtree that
/// would round up to 100 (199 of 200, say) reports 99, so a subtree shows 100
/// exactly when every lesson in it is done.
#[must_use]
pub fn percent_of(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let done = done.min(total);
    let rounded = (200 * done as u128 + total as u128) / (2 * total as u128);
    let percent = u8::try_from(rounded).unwrap_or(100);
    if done < total { percent.min(99) } else { percent }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::sample;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
    }

    fn history(entries: &[(&str, u32)]) -> ActivityHistory {
        entries.iter().map(|(d, n)| (day(d), *n)).collect()
    }

    #[test]
    fn streak_counts_run_ending_today() {
        let h = history(&[("2024-01-10", 1), ("2024-01-11", 1), ("2024-01-12", 1)]);
        assert_eq!(compute_streak(&h, day("2024-01-12")), 3);
    }

    #[test]
    fn inactive_today_breaks_streak() {
        let h = history(&[("2024-01-10", 1), ("2024-01-11", 1)]);
        assert_eq!(compute_streak(&h, day("2024-01-12")), 0);
    }

    #[test]
    fn gap_stops_backward_walk() {
        let h = history(&[
            ("2024-01-05", 4),
            ("2024-01-07", 1),
            ("2024-01-08", 2),
        ]);
        assert_eq!(compute_streak(&h, day("2024-01-08")), 2);
    }

    #[test]
    fn streak_crosses_month_and_year_boundaries() {
        let h = history(&[("2023-12-30", 1), ("2023-12-31", 1), ("2024-01-01", 1)]);
        assert_eq!(compute_streak(&h, day("2024-01-01")), 3);
    }

    #[test]
    fn streak_walk_is_bounded() {
        let today = day("2024-06-01");
        let h: ActivityHistory = (0..50u64)
            .map(|back| (today.checked_sub_days(Days::new(back)).expect("date"), 1))
            .collect();
        assert_eq!(compute_streak(&h, today), 50);
        assert_eq!(compute_streak_bounded(&h, today, 10), 10);
        assert_eq!(compute_streak_bounded(&h, today, 0), 1);
    }

    #[test]
    fn histogram_scales_and_caps() {
        let h = history(&[("2024-03-10", 12), ("2024-03-08", 3), ("2024-03-03", 9)]);
        let buckets = last_7_days_histogram(&h, day("2024-03-10"));
        // 03-04 .. 03-10; 03-03 is outside the window.
        assert_eq!(buckets, [0, 0, 0, 0, 30, 0, 100]);
    }

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent_of(0, 0), 0);
        assert_eq!(percent_of(1, 3), 33);
        assert_eq!(percent_of(2, 3), 67);
        assert_eq!(percent_of(1, 8), 13);
        assert_eq!(percent_of(1, 200), 1);
        assert_eq!(percent_of(1, 201), 0);
        assert_eq!(percent_of(4, 4), 100);
        assert_eq!(percent_of(199, 200), 99);
    }

    #[test]
    fn toggle_updates_set_and_history_together() {
        let today = day("2024-02-01");
        let mut state = ProgressState::default();

        assert!(state.toggle("react-work-loop", today));
        assert!(state.is_complete("react-work-loop"));
        assert_eq!(state.history().count(today), 1);

        assert!(!state.toggle("react-work-loop", today));
        assert!(!state.is_complete("react-work-loop"));
        assert_eq!(state.history().count(today), 0);
        assert!(state.history().is_empty());
    }

    #[test]
    fn removing_lesson_completed_on_earlier_day_floors_today_at_zero() {
        let state = ProgressState::new(
            ["rust-borrowck"].into_iter().collect(),
            history(&[("2024-02-01", 1)]),
        );
        let (next, now_complete) = state.toggled("rust-borrowck", day("2024-02-03"));
        assert!(!now_complete);
        assert_eq!(next.history().count(day("2024-02-03")), 0);
        assert_eq!(next.history().count(day("2024-02-01")), 1);
        // original snapshot untouched
        assert!(state.is_complete("rust-borrowck"));
    }

    #[test]
    fn group_progress_over_tracks_and_modules() {
        let catalog = sample();
        let state = ProgressState::new(
            ["react-work-loop", "react-reconciler", "react-use-state"]
                .into_iter()
                .collect(),
            ActivityHistory::default(),
        );
        let react = &catalog.tracks[0];
        assert_eq!(state.group_progress(react), 75);
        assert_eq!(state.group_progress(&react.modules[0]), 100);
        assert_eq!(state.group_progress(&react.modules[1]), 50);
        assert_eq!(state.group_progress(&catalog.tracks[1]), 0);
        assert_eq!(state.group_progress(&catalog), 50);
        assert!(state.progress_of(&react.modules[0]).is_complete());
    }

    #[test]
    fn empty_subtree_is_zero_percent() {
        let module = crate::catalog::fixtures::module("empty", "Empty", vec![]);
        let state = ProgressState::default();
        assert_eq!(state.group_progress(&module), 0);
        assert!(!state.progress_of(&module).is_complete());
    }

    #[test]
    fn summary_ignores_ids_missing_from_catalog() {
        let catalog = sample();
        let today = day("2024-04-02");
        let state = ProgressState::new(
            ["rust-borrowck", "retired-lesson"].into_iter().collect(),
            history(&[("2024-04-01", 1), ("2024-04-02", 1)]),
        );
        let summary = state.summary(&catalog, today, MAX_STREAK_LOOKBACK_DAYS);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.total, 6);
        assert_eq!(summary.percent, 17);
        assert_eq!(summary.current_streak, 2);
        assert_eq!(summary.today_count, 1);
        assert_eq!(summary.last_7_days, [0, 0, 0, 0, 0, 10, 10]);
    }

    #[test]
    fn history_serializes_as_iso_date_map() {
        let h = history(&[("2024-01-11", 2), ("2024-01-10", 1)]);
        let json = serde_json::to_string(&h).expect("serialize");
        assert_eq!(json, r#"{"2024-01-10":1,"2024-01-11":2}"#);
        let back: ActivityHistory = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, h);
    }

    #[test]
    fn track_progress_display() {
        let progress = NodeProgress { done: 1, total: 3 };
        assert_eq!(progress.to_string(), "1/3 (33%)");
    }
}
