//! `atlas progress [<track>]`: completion rollups.
//!
//! Without a track this is the dashboard view: overall counts, the streak,
//! and one bar per track. With a track it breaks that track down by module.

use std::io::Write;

use chrono::NaiveDate;
use clap::Args;
use devatlas_core::progress::{ProgressSummary, TrackProgress};
use devatlas_core::store::KeyValueStore;
use devatlas_core::{AtlasError, DevAtlas};
use serde::Serialize;

use crate::output::{OutputMode, pretty_kv, pretty_rule, pretty_section, progress_bar, render_mode};

/// Arguments for `atlas progress`.
#[derive(Args, Debug)]
pub struct ProgressArgs {
    /// Break down one track by module.
    pub track: Option<String>,
}

#[derive(Debug, Serialize)]
struct DashboardOutput {
    summary: ProgressSummary,
    tracks: Vec<TrackProgress>,
}

#[derive(Debug, Serialize)]
struct ModuleProgress {
    id: String,
    title: String,
    done: usize,
    total: usize,
    percent: u8,
}

#[derive(Debug, Serialize)]
struct TrackBreakdownOutput {
    track: TrackProgress,
    modules: Vec<ModuleProgress>,
}

fn write_bar_row(w: &mut dyn Write, label: &str, done: usize, total: usize, percent: u8) -> std::io::Result<()> {
    writeln!(
        w,
        "{label:<28} {} {done:>3}/{total:<3} ({percent}%)",
        progress_bar(percent)
    )
}

fn build_breakdown<S: KeyValueStore>(
    atlas: &DevAtlas<S>,
    track_id: &str,
) -> Result<TrackBreakdownOutput, AtlasError> {
    let track = atlas
        .catalog()
        .track(track_id)
        .ok_or_else(|| AtlasError::UnknownTrack(track_id.to_string()))?;
    let progress = atlas.progress();
    let overall = progress.progress_of(track);

    Ok(TrackBreakdownOutput {
        track: TrackProgress {
            id: track.id.clone(),
            title: track.title.clone(),
            done: overall.done,
            total: overall.total,
            percent: overall.percent(),
        },
        modules: track
            .modules
            .iter()
            .map(|module| {
                let counts = progress.progress_of(module);
                ModuleProgress {
                    id: module.id.clone(),
                    title: module.title.clone(),
                    done: counts.done,
                    total: counts.total,
                    percent: progress.group_progress(module),
                }
            })
            .collect(),
    })
}

/// Execute `atlas progress`.
pub fn run_progress<S: KeyValueStore>(
    args: &ProgressArgs,
    atlas: &DevAtlas<S>,
    today: NaiveDate,
    output: OutputMode,
) -> anyhow::Result<()> {
    if let Some(track_id) = args.track.as_deref() {
        let payload = build_breakdown(atlas, track_id)?;
        return render_mode(
            output,
            &payload,
            |out, w| {
                for module in &out.modules {
                    writeln!(w, "{}\t{}/{}\t{}%", module.id, module.done, module.total, module.percent)?;
                }
                Ok(())
            },
            |out, w| {
                pretty_section(w, &format!("Progress: {}", out.track.title))?;
                write_bar_row(w, "Overall", out.track.done, out.track.total, out.track.percent)?;
                writeln!(w)?;
                for module in &out.modules {
                    write_bar_row(w, &module.title, module.done, module.total, module.percent)?;
                }
                Ok(())
            },
        );
    }

    let payload = DashboardOutput {
        summary: atlas.summary(today),
        tracks: atlas.track_progress(),
    };
    render_mode(
        output,
        &payload,
        |out, w| {
            let s = &out.summary;
            writeln!(w, "overall\t{}/{}\t{}%", s.completed, s.total, s.percent)?;
            for track in &out.tracks {
                writeln!(w, "{}\t{}/{}\t{}%", track.id, track.done, track.total, track.percent)?;
            }
            Ok(())
        },
        |out, w| {
            let s = &out.summary;
            pretty_section(w, "Progress")?;
            write_bar_row(w, "Overall", s.completed, s.total, s.percent)?;
            pretty_kv(w, "Streak", format!("{} day(s)", s.current_streak))?;
            pretty_kv(w, "Today", format!("{} lesson(s) on {}", s.today_count, s.today))?;
            writeln!(w)?;
            for track in &out.tracks {
                write_bar_row(w, &track.title, track.done, track.total, track.percent)?;
            }
            pretty_rule(w)
        },
    )
}
