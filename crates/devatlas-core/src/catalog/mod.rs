//! Static curriculum catalog: tracks contain modules, modules contain lessons.
//!
//! The catalog is loaded once at startup and never mutated afterwards. Both
//! the progress tracker and the search filter only read it.
//!
//! # Invariants
//!
//! - Lesson ids are unique across the entire catalog.
//! - Track ids are unique within the catalog.
//! - Module ids are unique within their track.
//!
//! [`Catalog::validate`] enforces these; every constructor in this module
//! calls it before handing a catalog out.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::error::AtlasError;

const BUILTIN_CATALOG: &str = include_str!("default.toml");

/// Ordered sequence of tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Catalog {
    #[serde(default)]
    pub tracks: Vec<Track>,
}

/// Top-level content category (a curriculum track or a docs category).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub modules: Vec<Module>,
}

/// Second-level grouping within a track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

/// Leaf content unit; the unit of completion tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub title: String,
    /// Free-form metadata (duration, difficulty, doc path, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// A lesson together with the track and module containing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LessonRef<'a> {
    pub track: &'a Track,
    pub module: &'a Module,
    pub lesson: &'a Lesson,
}

/// Any catalog node whose lessons can be flattened in catalog order.
pub trait LessonTree {
    fn iter_lessons(&self) -> impl Iterator<Item = &Lesson>;

    /// Number of lessons in this subtree.
    fn lesson_count(&self) -> usize {
        self.iter_lessons().count()
    }
}

impl LessonTree for Module {
    fn iter_lessons(&self) -> impl Iterator<Item = &Lesson> {
        self.lessons.iter()
    }
}

impl LessonTree for Track {
    fn iter_lessons(&self) -> impl Iterator<Item = &Lesson> {
        self.modules.iter().flat_map(|module| module.lessons.iter())
    }
}

impl LessonTree for Catalog {
    fn iter_lessons(&self) -> impl Iterator<Item = &Lesson> {
        self.tracks.iter().flat_map(|track| track.iter_lessons())
    }
}

impl Track {
    /// First lesson of the first non-empty module, if any.
    #[must_use]
    pub fn first_lesson(&self) -> Option<&Lesson> {
        self.iter_lessons().next()
    }

    /// Returns true if `lesson_id` appears anywhere in this track.
    #[must_use]
    pub fn contains_lesson(&self, lesson_id: &str) -> bool {
        self.iter_lessons().any(|lesson| lesson.id == lesson_id)
    }
}

impl Catalog {
    /// The catalog compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns [`AtlasError::CatalogParse`] or [`AtlasError::DuplicateId`] if
    /// the embedded catalog is malformed.
    pub fn builtin() -> Result<Self, AtlasError> {
        Self::parse_str(BUILTIN_CATALOG, Path::new("<builtin>.toml"))
    }

    /// Load a catalog from disk. The format is chosen by extension:
    /// `.json`, `.yaml`/`.yml`, anything else is read as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`AtlasError::CatalogParse`] if the file cannot be read or
    /// parsed, and [`AtlasError::DuplicateId`] if it breaks an id invariant.
    pub fn load(path: &Path) -> Result<Self, AtlasError> {
        let content = std::fs::read_to_string(path).map_err(|e| AtlasError::CatalogParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let catalog = Self::parse_str(&content, path)?;
        tracing::debug!(
            path = %path.display(),
            tracks = catalog.tracks.len(),
            lessons = catalog.lesson_count(),
            "loaded catalog"
        );
        Ok(catalog)
    }

    fn parse_str(content: &str, path: &Path) -> Result<Self, AtlasError> {
        let parse_err = |message: String| AtlasError::CatalogParse {
            path: path.to_path_buf(),
            message,
        };

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let catalog: Self = match extension.as_deref() {
            Some("json") => serde_json::from_str(content).map_err(|e| parse_err(e.to_string()))?,
            Some("yaml" | "yml") => {
                serde_yaml::from_str(content).map_err(|e| parse_err(e.to_string()))?
            }
            _ => toml::from_str(content).map_err(|e| parse_err(e.to_string()))?,
        };

        catalog.validate()?;
        Ok(catalog)
    }

    /// Check the id uniqueness invariants.
    ///
    /// # Errors
    ///
    /// Returns [`AtlasError::DuplicateId`] naming the first repeated id.
    pub fn validate(&self) -> Result<(), AtlasError> {
        let mut track_ids = HashSet::new();
        let mut lesson_ids = HashSet::new();

        for track in &self.tracks {
            if !track_ids.insert(track.id.as_str()) {
                return Err(AtlasError::DuplicateId {
                    kind: "track",
                    id: track.id.clone(),
                });
            }

            let mut module_ids = HashSet::new();
            for module in &track.modules {
                if !module_ids.insert(module.id.as_str()) {
                    return Err(AtlasError::DuplicateId {
                        kind: "module",
                        id: module.id.clone(),
                    });
                }
                for lesson in &module.lessons {
                    if !lesson_ids.insert(lesson.id.as_str()) {
                        return Err(AtlasError::DuplicateId {
                            kind: "lesson",
                            id: lesson.id.clone(),
                        });
                    }
                }
            }
        }

        Ok(())
    }

    /// Look up a track by id.
    #[must_use]
    pub fn track(&self, track_id: &str) -> Option<&Track> {
        self.tracks.iter().find(|track| track.id == track_id)
    }

    /// Look up a lesson by id, with its enclosing track and module.
    #[must_use]
    pub fn find_lesson(&self, lesson_id: &str) -> Option<LessonRef<'_>> {
        self.tracks.iter().find_map(|track| {
            track.modules.iter().find_map(|module| {
                module
                    .lessons
                    .iter()
                    .find(|lesson| lesson.id == lesson_id)
                    .map(|lesson| LessonRef {
                        track,
                        module,
                        lesson,
                    })
            })
        })
    }

    /// Returns true if the catalog has no tracks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
