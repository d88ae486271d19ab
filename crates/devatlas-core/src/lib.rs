//! devatlas-core library.
//!
//! Lesson progress tracking and curriculum search for the `DevAtlas` portal:
//!
//! - [`catalog`]: the static track -> module -> lesson tree.
//! - [`progress`]: completion set, activity history, streaks, percentages.
//! - [`filter`]: hierarchy-preserving search and selection re-pointing.
//! - [`store`]: key-value persistence with empty-default recovery.
//! - [`atlas`]: the application context wiring the above together.
//!
//! # Conventions
//!
//! - **Errors**: library functions return [`error::AtlasError`]; binaries wrap
//!   it in `anyhow`.
//! - **Logging**: use `tracing` macros (`debug!`, `warn!`, ...).
//! - **Time**: nothing in this crate reads the clock. Callers pass `today` as a
//!   [`chrono::NaiveDate`] in whatever day policy they chose.

pub mod atlas;
pub mod catalog;
pub mod config;
pub mod error;
pub mod filter;
pub mod lock;
pub mod progress;
pub mod store;

pub use atlas::DevAtlas;
pub use catalog::{Catalog, LessonTree};
pub use error::{AtlasError, ErrorCode};
