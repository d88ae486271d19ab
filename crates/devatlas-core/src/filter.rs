//! Hierarchy-preserving search over the catalog.
//!
//! Matching is a case-insensitive substring test on titles. A track or module
//! whose own title matches is kept even when none of its children match, and
//! in that case all of its children are kept so a matched module never shows
//! up empty. Relative order of tracks, modules and lessons never changes.

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, LessonTree, Module, Track};

/// Counts of what survived a filter pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FilterStats {
    pub tracks: usize,
    pub modules: usize,
    pub lessons: usize,
}

impl FilterStats {
    #[must_use]
    pub fn of(view: &Catalog) -> Self {
        Self {
            tracks: view.tracks.len(),
            modules: view.tracks.iter().map(|track| track.modules.len()).sum(),
            lessons: view.lesson_count(),
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.tracks == 0
    }
}

/// Filter `catalog` by `query`.
///
/// An empty or whitespace-only query returns the catalog unchanged.
#[must_use]
pub fn filter_catalog(catalog: &Catalog, query: &str) -> Catalog {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return catalog.clone();
    }

    let tracks: Vec<Track> = catalog
        .tracks
        .iter()
        .filter_map(|track| filter_track(track, &needle))
        .collect();

    tracing::debug!(query = %needle, tracks = tracks.len(), "filtered catalog");
    Catalog { tracks }
}

fn title_matches(title: &str, needle: &str) -> bool {
    title.to_lowercase().contains(needle)
}

fn filter_track(track: &Track, needle: &str) -> Option<Track> {
    let modules: Vec<Module> = track
        .modules
        .iter()
        .filter_map(|module| filter_module(module, needle))
        .collect();

    if !modules.is_empty() {
        return Some(Track {
            modules,
            ..track.clone()
        });
    }

    title_matches(&track.title, needle).then(|| track.clone())
}

fn filter_module(module: &Module, needle: &str) -> Option<Module> {
    let lessons: Vec<_> = module
        .lessons
        .iter()
        .filter(|lesson| title_matches(&lesson.title, needle))
        .cloned()
        .collect();

    if !lessons.is_empty() {
        return Some(Module {
            lessons,
            ..module.clone()
        });
    }

    title_matches(&module.title, needle).then(|| module.clone())
}

/// UI focus: the active track and the active lesson within it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub track_id: Option<String>,
    pub lesson_id: Option<String>,
}

impl Selection {
    #[must_use]
    pub fn new(track_id: Option<String>, lesson_id: Option<String>) -> Self {
        Self {
            track_id,
            lesson_id,
        }
    }

    /// Re-point the selection so it only references ids present in `view`.
    ///
    /// A track missing from `view` falls back to the first track of `view`
    /// (or none when `view` is empty). The lesson is kept only if it is inside
    /// the resulting track; otherwise it falls back to that track's first
    /// lesson.
    #[must_use]
    pub fn reconcile(&self, view: &Catalog) -> Self {
        let track = self
            .track_id
            .as_deref()
            .and_then(|id| view.track(id))
            .or_else(|| view.tracks.first());

        let Some(track) = track else {
            return Self::default();
        };

        let lesson_id = self
            .lesson_id
            .as_deref()
            .filter(|id| track.contains_lesson(id))
            .map(str::to_string)
            .or_else(|| track.first_lesson().map(|lesson| lesson.id.clone()));

        Self {
            track_id: Some(track.id.clone()),
            lesson_id,
        }
    }
}
