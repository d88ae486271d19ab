//! Application context tying the catalog, progress snapshot, selection, and
//! persistence together.
//!
//! A [`DevAtlas`] is built once at startup and handed by reference to whatever
//! drives it (the CLI here, a UI elsewhere). Mutations persist first and only
//! then swap the in-memory snapshot, so a failed write leaves both the store
//! and the context on the previous state.

use chrono::NaiveDate;
use serde::Serialize;

use crate::catalog::Catalog;
use crate::error::AtlasError;
use crate::filter::{FilterStats, Selection, filter_catalog};
use crate::progress::{
    MAX_STREAK_LOOKBACK_DAYS, ProgressState, ProgressSummary, TrackProgress,
    compute_streak_bounded,
};
use crate::store::{KeyValueStore, load_state, save_state};

/// Result of toggling one lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToggleOutcome {
    pub lesson_id: String,
    pub title: String,
    pub track_id: String,
    pub now_complete: bool,
    pub today: NaiveDate,
    pub today_count: u32,
    pub current_streak: u32,
}

/// Completion status of one lesson, with its location in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonStatus {
    pub lesson_id: String,
    pub title: String,
    pub track_id: String,
    pub module_id: String,
    pub complete: bool,
}

/// Filtered view plus the selection re-pointed into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchOutcome {
    pub query: String,
    pub stats: FilterStats,
    pub selection: Selection,
    pub view: Catalog,
}

pub struct DevAtlas<S: KeyValueStore> {
    catalog: Catalog,
    store: S,
    progress: ProgressState,
    selection: Selection,
    max_lookback_days: u32,
}

impl<S: KeyValueStore> DevAtlas<S> {
    /// Load persisted state from `store` and point the selection at a track
    /// that exists in `catalog`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store cannot be read; bad persisted
    /// values are recovered as empty state.
    pub fn open(catalog: Catalog, store: S) -> Result<Self, AtlasError> {
        let persisted = load_state(&store)?;
        let selection = Selection::new(persisted.active_track, None).reconcile(&catalog);

        tracing::debug!(
            completed = persisted.progress.completed().len(),
            track = ?selection.track_id,
            "opened progress state"
        );

        Ok(Self {
            catalog,
            store,
            progress: persisted.progress,
            selection,
            max_lookback_days: MAX_STREAK_LOOKBACK_DAYS,
        })
    }

    #[must_use]
    pub const fn with_max_lookback_days(mut self, days: u32) -> Self {
        self.max_lookback_days = days;
        self
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn progress(&self) -> &ProgressState {
        &self.progress
    }

    #[must_use]
    pub const fn selection(&self) -> &Selection {
        &self.selection
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Completion status of one lesson.
    ///
    /// # Errors
    ///
    /// Returns [`AtlasError::UnknownLesson`] if the id is not in the catalog.
    pub fn lesson_status(&self, lesson_id: &str) -> Result<LessonStatus, AtlasError> {
        let found = self
            .catalog
            .find_lesson(lesson_id)
            .ok_or_else(|| AtlasError::UnknownLesson(lesson_id.to_string()))?;
        Ok(LessonStatus {
            lesson_id: found.lesson.id.clone(),
            title: found.lesson.title.clone(),
            track_id: found.track.id.clone(),
            module_id: found.module.id.clone(),
            complete: self.progress.is_complete(lesson_id),
        })
    }

    /// Flip completion of a catalog lesson and persist the result.
    ///
    /// # Errors
    ///
    /// Returns [`AtlasError::UnknownLesson`] for ids outside the catalog, or a
    /// store error if the commit fails (the in-memory state is then unchanged).
    pub fn toggle(&mut self, lesson_id: &str, today: NaiveDate) -> Result<ToggleOutcome, AtlasError> {
        let found = self
            .catalog
            .find_lesson(lesson_id)
            .ok_or_else(|| AtlasError::UnknownLesson(lesson_id.to_string()))?;
        let title = found.lesson.title.clone();
        let track_id = found.track.id.clone();

        let (next, now_complete) = self.progress.toggled(lesson_id, today);
        save_state(&mut self.store, &next, &self.selection)?;
        self.progress = next;

        let outcome = ToggleOutcome {
            lesson_id: lesson_id.to_string(),
            title,
            track_id,
            now_complete,
            today,
            today_count: self.progress.history().count(today),
            current_streak: compute_streak_bounded(
                self.progress.history(),
                today,
                self.max_lookback_days,
            ),
        };
        tracing::debug!(
            lesson = %outcome.lesson_id,
            complete = outcome.now_complete,
            streak = outcome.current_streak,
            "toggled lesson"
        );
        Ok(outcome)
    }

    /// Filter the catalog and re-point the selection into the result.
    ///
    /// A re-pointed track is persisted. An empty result clears the in-memory
    /// selection but keeps the stored track, so clearing the query restores it.
    ///
    /// # Errors
    ///
    /// Returns a store error if persisting the new selection fails.
    pub fn search(&mut self, query: &str) -> Result<SearchOutcome, AtlasError> {
        let view = filter_catalog(&self.catalog, query);
        let selection = self.selection.reconcile(&view);

        if selection.track_id.is_some() && selection.track_id != self.selection.track_id {
            save_state(&mut self.store, &self.progress, &selection)?;
        }
        self.selection = selection;

        Ok(SearchOutcome {
            query: query.trim().to_string(),
            stats: FilterStats::of(&view),
            selection: self.selection.clone(),
            view,
        })
    }

    /// Make `track_id` the active track, focusing its first lesson.
    ///
    /// # Errors
    ///
    /// Returns [`AtlasError::UnknownTrack`] if the id is not in the catalog,
    /// or a store error if persisting fails.
    pub fn select_track(&mut self, track_id: &str) -> Result<&Selection, AtlasError> {
        let track = self
            .catalog
            .track(track_id)
            .ok_or_else(|| AtlasError::UnknownTrack(track_id.to_string()))?;
        let selection = Selection::new(
            Some(track.id.clone()),
            track.first_lesson().map(|lesson| lesson.id.clone()),
        );
        self.commit_selection(selection)
    }

    /// Focus `lesson_id` and make its track active.
    ///
    /// # Errors
    ///
    /// Returns [`AtlasError::UnknownLesson`] if the id is not in the catalog,
    /// or a store error if persisting fails.
    pub fn select_lesson(&mut self, lesson_id: &str) -> Result<&Selection, AtlasError> {
        let found = self
            .catalog
            .find_lesson(lesson_id)
            .ok_or_else(|| AtlasError::UnknownLesson(lesson_id.to_string()))?;
        let selection = Selection::new(Some(found.track.id.clone()), Some(found.lesson.id.clone()));
        self.commit_selection(selection)
    }

    fn commit_selection(&mut self, selection: Selection) -> Result<&Selection, AtlasError> {
        save_state(&mut self.store, &self.progress, &selection)?;
        self.selection = selection;
        Ok(&self.selection)
    }

    #[must_use]
    pub fn summary(&self, today: NaiveDate) -> ProgressSummary {
        self.progress
            .summary(&self.catalog, today, self.max_lookback_days)
    }

    #[must_use]
    pub fn track_progress(&self) -> Vec<TrackProgress> {
        self.progress.track_progress(&self.catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::sample;
    use crate::store::{KEY_ACTIVE_TRACK, MemoryStore};

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
    }

    /// Store whose commits always fail.
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, AtlasError> {
            Ok(None)
        }

        fn put_all(&mut self, _entries: &[(&str, String)]) -> Result<(), AtlasError> {
            Err(AtlasError::StateWrite(std::io::Error::other("disk full")))
        }
    }

    #[test]
    fn open_selects_first_track_by_default() {
        let atlas = DevAtlas::open(sample(), MemoryStore::new()).expect("open");
        assert_eq!(atlas.selection().track_id.as_deref(), Some("react"));
        assert_eq!(atlas.selection().lesson_id.as_deref(), Some("react-work-loop"));
    }

    #[test]
    fn open_restores_persisted_track() {
        let store = MemoryStore::new().with(KEY_ACTIVE_TRACK, "rust");
        let atlas = DevAtlas::open(sample(), store).expect("open");
        assert_eq!(atlas.selection().track_id.as_deref(), Some("rust"));
    }

    #[test]
    fn open_repoints_stale_persisted_track() {
        let store = MemoryStore::new().with(KEY_ACTIVE_TRACK, "retired");
        let atlas = DevAtlas::open(sample(), store).expect("open");
        assert_eq!(atlas.selection().track_id.as_deref(), Some("react"));
    }

    #[test]
    fn toggle_persists_and_reports_streak() {
        let mut atlas = DevAtlas::open(sample(), MemoryStore::new()).expect("open");
        atlas.toggle("react-work-loop", day("2024-01-11")).expect("toggle");
        let outcome = atlas
            .toggle("react-reconciler", day("2024-01-12"))
            .expect("toggle");

        assert!(outcome.now_complete);
        assert_eq!(outcome.track_id, "react");
        assert_eq!(outcome.today_count, 1);
        assert_eq!(outcome.current_streak, 2);

        let reopened = DevAtlas::open(sample(), atlas.store().clone()).expect("reopen");
        assert!(reopened.progress().is_complete("react-work-loop"));
        assert!(reopened.progress().is_complete("react-reconciler"));
    }

    #[test]
    fn toggle_rejects_unknown_lesson() {
        let mut atlas = DevAtlas::open(sample(), MemoryStore::new()).expect("open");
        let err = atlas.toggle("ghost", day("2024-01-12")).expect_err("unknown");
        assert!(matches!(err, AtlasError::UnknownLesson(ref id) if id == "ghost"));
        assert!(atlas.progress().completed().is_empty());
    }

    #[test]
    fn failed_commit_leaves_state_unchanged() {
        let mut atlas = DevAtlas::open(sample(), BrokenStore).expect("open");
        assert!(atlas.toggle("rust-borrowck", day("2024-01-12")).is_err());
        assert!(!atlas.progress().is_complete("rust-borrowck"));
        assert!(atlas.progress().history().is_empty());
    }

    #[test]
    fn search_repoints_and_persists_selection() {
        let mut atlas = DevAtlas::open(sample(), MemoryStore::new()).expect("open");
        let outcome = atlas.search("ownership").expect("search");
        assert_eq!(outcome.stats.tracks, 1);
        assert_eq!(outcome.selection.track_id.as_deref(), Some("rust"));
        assert_eq!(
            atlas.store().get(KEY_ACTIVE_TRACK).expect("get").as_deref(),
            Some("rust")
        );
    }

    #[test]
    fn empty_search_result_keeps_stored_track() {
        let store = MemoryStore::new().with(KEY_ACTIVE_TRACK, "rust");
        let mut atlas = DevAtlas::open(sample(), store).expect("open");
        let outcome = atlas.search("no such thing").expect("search");
        assert!(outcome.stats.is_empty());
        assert_eq!(outcome.selection, Selection::default());
        assert_eq!(
            atlas.store().get(KEY_ACTIVE_TRACK).expect("get").as_deref(),
            Some("rust")
        );
    }

    #[test]
    fn toggle_after_empty_search_keeps_stored_track() {
        let store = MemoryStore::new().with(KEY_ACTIVE_TRACK, "rust");
        let mut atlas = DevAtlas::open(sample(), store).expect("open");
        atlas.search("no such thing").expect("search");
        atlas.toggle("react-work-loop", day("2024-01-12")).expect("toggle");

        assert_eq!(
            atlas.store().get(KEY_ACTIVE_TRACK).expect("get").as_deref(),
            Some("rust")
        );
        let reopened = DevAtlas::open(sample(), atlas.store().clone()).expect("reopen");
        assert_eq!(reopened.selection().track_id.as_deref(), Some("rust"));
        assert!(reopened.progress().is_complete("react-work-loop"));
    }

    #[test]
    fn select_track_and_lesson() {
        let mut atlas = DevAtlas::open(sample(), MemoryStore::new()).expect("open");
        let selection = atlas.select_track("rust").expect("select").clone();
        assert_eq!(selection.lesson_id.as_deref(), Some("rust-borrowck"));

        let selection = atlas.select_lesson("react-use-effect").expect("select").clone();
        assert_eq!(selection.track_id.as_deref(), Some("react"));
        assert_eq!(selection.lesson_id.as_deref(), Some("react-use-effect"));

        assert!(matches!(
            atlas.select_track("nope"),
            Err(AtlasError::UnknownTrack(_))
        ));
    }

    #[test]
    fn summary_uses_configured_lookback() {
        let mut atlas = DevAtlas::open(sample(), MemoryStore::new())
            .expect("open")
            .with_max_lookback_days(1);
        atlas.toggle("react-work-loop", day("2024-01-11")).expect("toggle");
        atlas.toggle("react-reconciler", day("2024-01-12")).expect("toggle");
        assert_eq!(atlas.summary(day("2024-01-12")).current_streak, 1);
        assert_eq!(atlas.track_progress()[0].percent, 50);
    }
}
