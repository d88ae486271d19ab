//! `atlas show <track>`: modules and lessons of one track.

use std::io::Write;

use clap::Args;
use devatlas_core::catalog::Track;
use devatlas_core::progress::ProgressState;
use devatlas_core::store::KeyValueStore;
use devatlas_core::{AtlasError, DevAtlas};
use serde::Serialize;

use crate::output::{OutputMode, pretty_kv, pretty_rule, pretty_section, progress_bar, render_mode};

/// Arguments for `atlas show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Track id (see `atlas tracks`).
    pub track: String,
}

#[derive(Debug, Serialize)]
struct LessonRow {
    id: String,
    title: String,
    complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    minutes: Option<u64>,
}

#[derive(Debug, Serialize)]
struct ModuleRow {
    id: String,
    title: String,
    done: usize,
    total: usize,
    percent: u8,
    lessons: Vec<LessonRow>,
}

#[derive(Debug, Serialize)]
struct ShowOutput {
    id: String,
    title: String,
    done: usize,
    total: usize,
    percent: u8,
    modules: Vec<ModuleRow>,
}

fn build_output(track: &Track, progress: &ProgressState) -> ShowOutput {
    let overall = progress.progress_of(track);
    let modules = track
        .modules
        .iter()
        .map(|module| {
            let counts = progress.progress_of(module);
            ModuleRow {
                id: module.id.clone(),
                title: module.title.clone(),
                done: counts.done,
                total: counts.total,
                percent: counts.percent(),
                lessons: module
                    .lessons
                    .iter()
                    .map(|lesson| LessonRow {
                        id: lesson.id.clone(),
                        title: lesson.title.clone(),
                        complete: progress.is_complete(&lesson.id),
                        minutes: lesson
                            .metadata
                            .get("minutes")
                            .and_then(serde_json::Value::as_u64),
                    })
                    .collect(),
            }
        })
        .collect();

    ShowOutput {
        id: track.id.clone(),
        title: track.title.clone(),
        done: overall.done,
        total: overall.total,
        percent: overall.percent(),
        modules,
    }
}

/// Execute `atlas show`.
pub fn run_show<S: KeyValueStore>(
    args: &ShowArgs,
    atlas: &DevAtlas<S>,
    output: OutputMode,
) -> anyhow::Result<()> {
    let track = atlas
        .catalog()
        .track(&args.track)
        .ok_or_else(|| AtlasError::UnknownTrack(args.track.clone()))?;
    let payload = build_output(track, atlas.progress());

    render_mode(
        output,
        &payload,
        |out, w| {
            for module in &out.modules {
                for lesson in &module.lessons {
                    let state = if lesson.complete { "done" } else { "open" };
                    writeln!(w, "{}\t{}\t{state}\t{}", module.id, lesson.id, lesson.title)?;
                }
            }
            Ok(())
        },
        |out, w| {
            pretty_section(w, &format!("{} ({})", out.title, out.id))?;
            pretty_kv(
                w,
                "Progress",
                format!("{} {}/{} ({}%)", progress_bar(out.percent), out.done, out.total, out.percent),
            )?;
            for module in &out.modules {
                writeln!(w)?;
                writeln!(
                    w,
                    "{} [{}/{}, {}%]",
                    module.title, module.done, module.total, module.percent
                )?;
                for lesson in &module.lessons {
                    let check = if lesson.complete { 'x' } else { ' ' };
                    let minutes = lesson
                        .minutes
                        .map(|m| format!(" ({m} min)"))
                        .unwrap_or_default();
                    writeln!(w, "  [{check}] {:<24} {}{minutes}", lesson.id, lesson.title)?;
                }
            }
            pretty_rule(w)
        },
    )
}
