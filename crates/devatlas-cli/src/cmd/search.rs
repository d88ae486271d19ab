//! `atlas search <query>`: hierarchy-preserving title search.

use std::io::Write;

use clap::Args;
use devatlas_core::DevAtlas;
use devatlas_core::store::KeyValueStore;

use crate::output::{OutputMode, pretty_section, render_mode};

/// Arguments for `atlas search`.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Case-insensitive substring matched against track, module, and lesson titles.
    pub query: String,
}

/// Execute `atlas search`.
pub fn run_search<S: KeyValueStore>(
    args: &SearchArgs,
    atlas: &mut DevAtlas<S>,
    output: OutputMode,
) -> anyhow::Result<()> {
    let outcome = atlas.search(&args.query)?;

    render_mode(
        output,
        &outcome,
        |out, w| {
            for track in &out.view.tracks {
                for module in &track.modules {
                    for lesson in &module.lessons {
                        writeln!(w, "{}\t{}\t{}\t{}", track.id, module.id, lesson.id, lesson.title)?;
                    }
                }
            }
            Ok(())
        },
        |out, w| {
            let stats = &out.stats;
            pretty_section(
                w,
                &format!(
                    "Search '{}': {} track(s), {} module(s), {} lesson(s)",
                    out.query, stats.tracks, stats.modules, stats.lessons
                ),
            )?;
            if stats.is_empty() {
                return writeln!(w, "No matches.");
            }
            let active = out.selection.track_id.as_deref();
            for track in &out.view.tracks {
                let marker = if active == Some(track.id.as_str()) { '*' } else { ' ' };
                writeln!(w, "{marker} {} ({})", track.title, track.id)?;
                for module in &track.modules {
                    writeln!(w, "    {}", module.title)?;
                    for lesson in &module.lessons {
                        writeln!(w, "      - {:<24} {}", lesson.id, lesson.title)?;
                    }
                }
            }
            Ok(())
        },
    )
}
