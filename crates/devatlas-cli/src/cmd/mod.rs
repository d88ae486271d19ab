pub mod completions;
pub mod progress;
pub mod search;
pub mod select;
pub mod show;
pub mod status;
pub mod streak;
pub mod toggle;
pub mod tracks;

use std::path::Path;

use devatlas_core::DevAtlas;
use devatlas_core::catalog::Catalog;
use devatlas_core::config::{AtlasConfig, resolve_catalog_path, resolve_state_dir};
use devatlas_core::store::FileStore;

/// Path overrides taken from global flags.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sources<'a> {
    pub state_dir: Option<&'a Path>,
    pub catalog: Option<&'a Path>,
}

/// Load the catalog and persisted state and build the application context.
pub fn open_atlas(sources: &Sources<'_>, config: &AtlasConfig) -> anyhow::Result<DevAtlas<FileStore>> {
    let catalog = match resolve_catalog_path(sources.catalog, config) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading catalog");
            Catalog::load(&path)?
        }
        None => Catalog::builtin()?,
    };

    let state_dir = resolve_state_dir(sources.state_dir, config);
    tracing::debug!(dir = %state_dir.display(), "using state directory");

    let atlas = DevAtlas::open(catalog, FileStore::in_dir(&state_dir))?
        .with_max_lookback_days(config.streak.max_lookback_days);
    Ok(atlas)
}
