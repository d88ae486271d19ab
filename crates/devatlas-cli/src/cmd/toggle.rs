//! `atlas toggle <lesson>`: flip completion of one lesson.

use std::io::Write;

use chrono::NaiveDate;
use clap::Args;
use devatlas_core::DevAtlas;
use devatlas_core::store::KeyValueStore;

use crate::output::{OutputMode, render_mode};

/// Arguments for `atlas toggle`.
#[derive(Args, Debug)]
pub struct ToggleArgs {
    /// Lesson id (see `atlas show <track>`).
    pub lesson: String,
}

/// Execute `atlas toggle`.
pub fn run_toggle<S: KeyValueStore>(
    args: &ToggleArgs,
    atlas: &mut DevAtlas<S>,
    today: NaiveDate,
    output: OutputMode,
) -> anyhow::Result<()> {
    let outcome = atlas.toggle(&args.lesson, today)?;

    render_mode(
        output,
        &outcome,
        |out, w| {
            let state = if out.now_complete { "done" } else { "open" };
            writeln!(w, "{}\t{state}\t{}", out.lesson_id, out.current_streak)
        },
        |out, w| {
            if out.now_complete {
                writeln!(w, "✓ Completed {} ({})", out.title, out.lesson_id)?;
            } else {
                writeln!(w, "○ Reopened {} ({})", out.title, out.lesson_id)?;
            }
            let days = if out.current_streak == 1 { "day" } else { "days" };
            writeln!(
                w,
                "  today: {} completed, streak: {} {days}",
                out.today_count, out.current_streak
            )
        },
    )
}
