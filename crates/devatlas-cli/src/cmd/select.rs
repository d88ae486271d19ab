use std::io::Write;

use clap::Args;
use devatlas_core::DevAtlas;
use devatlas_core::store::KeyValueStore;

use crate::output::{OutputMode, pretty_kv, render_mode};

/// Arguments for `atlas select`.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct SelectArgs {
    /// Track id to activate.
    pub track: Option<String>,

    /// Focus a lesson and activate its track.
    #[arg(long)]
    pub lesson: Option<String>,
}

/// Execute `atlas select`.
pub fn run_select<S: KeyValueStore>(
    args: &SelectArgs,
    atlas: &mut DevAtlas<S>,
    output: OutputMode,
) -> anyhow::Result<()> {
    let selection = match (&args.track, &args.lesson) {
        (_, Some(lesson)) => atlas.select_lesson(lesson)?,
        (Some(track), None) => atlas.select_track(track)?,
        (None, None) => anyhow::bail!("select needs a track id or --lesson"),
    }
    .clone();

    render_mode(
        output,
        &selection,
        |out, w| {
            writeln!(
                w,
                "{}\t{}",
                out.track_id.as_deref().unwrap_or("-"),
                out.lesson_id.as_deref().unwrap_or("-")
            )
        },
        |out, w| {
            pretty_kv(w, "Track", out.track_id.as_deref().unwrap_or("(none)"))?;
            pretty_kv(w, "Lesson", out.lesson_id.as_deref().unwrap_or("(none)"))
        },
    )
}
