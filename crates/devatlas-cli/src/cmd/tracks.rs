//! `atlas tracks`: every track with its completion.

use std::io::Write;

use devatlas_core::DevAtlas;
use devatlas_core::store::KeyValueStore;
use serde::Serialize;

use crate::output::{OutputMode, pretty_section, progress_bar, render_mode};

#[derive(Debug, Serialize)]
struct TrackRow {
    id: String,
    title: String,
    modules: usize,
    done: usize,
    total: usize,
    percent: u8,
    active: bool,
}

#[derive(Debug, Serialize)]
struct TracksOutput {
    tracks: Vec<TrackRow>,
}

fn build_output<S: KeyValueStore>(atlas: &DevAtlas<S>) -> TracksOutput {
    let active = atlas.selection().track_id.as_deref();
    let tracks = atlas
        .track_progress()
        .into_iter()
        .zip(&atlas.catalog().tracks)
        .map(|(progress, track)| TrackRow {
            active: active == Some(progress.id.as_str()),
            modules: track.modules.len(),
            id: progress.id,
            title: progress.title,
            done: progress.done,
            total: progress.total,
            percent: progress.percent,
        })
        .collect();
    TracksOutput { tracks }
}

/// Execute `atlas tracks`.
pub fn run_tracks<S: KeyValueStore>(atlas: &DevAtlas<S>, output: OutputMode) -> anyhow::Result<()> {
    let payload = build_output(atlas);
    render_mode(
        output,
        &payload,
        |out, w| {
            for row in &out.tracks {
                writeln!(
                    w,
                    "{}\t{}\t{}/{}\t{}%",
                    row.id, row.title, row.done, row.total, row.percent
                )?;
            }
            Ok(())
        },
        |out, w| {
            pretty_section(w, &format!("Tracks ({})", out.tracks.len()))?;
            if out.tracks.is_empty() {
                writeln!(w, "The catalog is empty.")?;
            }
            for row in &out.tracks {
                let marker = if row.active { '*' } else { ' ' };
                writeln!(
                    w,
                    "{marker} {:<14} {} {:>3}%  {}",
                    row.id,
                    progress_bar(row.percent),
                    row.percent,
                    row.title
                )?;
            }
            Ok(())
        },
    )
}
