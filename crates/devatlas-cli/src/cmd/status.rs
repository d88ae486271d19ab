use std::io::Write;

use clap::Args;
use devatlas_core::DevAtlas;
use devatlas_core::store::KeyValueStore;

use crate::output::{OutputMode, pretty_kv, render_mode};

/// Arguments for `atlas status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Lesson id.
    pub lesson: String,
}

/// Execute `atlas status`.
pub fn run_status<S: KeyValueStore>(
    args: &StatusArgs,
    atlas: &DevAtlas<S>,
    output: OutputMode,
) -> anyhow::Result<()> {
    let status = atlas.lesson_status(&args.lesson)?;

    render_mode(
        output,
        &status,
        |out, w| {
            let state = if out.complete { "done" } else { "open" };
            writeln!(w, "{}\t{state}", out.lesson_id)
        },
        |out, w| {
            pretty_kv(w, "Lesson", format!("{} ({})", out.title, out.lesson_id))?;
            pretty_kv(w, "Location", format!("{} / {}", out.track_id, out.module_id))?;
            pretty_kv(w, "Status", if out.complete { "complete" } else { "not started" })
        },
    )
}
