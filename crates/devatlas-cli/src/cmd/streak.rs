//! `atlas streak`: current streak and the seven-day activity histogram.

use std::io::Write;

use chrono::{Datelike, Days, NaiveDate};
use devatlas_core::DevAtlas;
use devatlas_core::progress::HISTOGRAM_DAYS;
use devatlas_core::store::KeyValueStore;
use serde::Serialize;

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode, sparkline};

#[derive(Debug, Serialize)]
struct StreakOutput {
    today: NaiveDate,
    current_streak: u32,
    today_count: u32,
    /// Oldest first, ending today. Each value is `min(count * 10, 100)`.
    last_7_days: [u8; HISTOGRAM_DAYS],
}

/// Single-letter weekday labels for the histogram, oldest first.
fn weekday_labels(today: NaiveDate) -> String {
    (0..HISTOGRAM_DAYS)
        .rev()
        .map(|back| {
            today
                .checked_sub_days(Days::new(back as u64))
                .map_or('?', |day| {
                    day.weekday().to_string().chars().next().unwrap_or('?')
                })
        })
        .collect()
}

/// Execute `atlas streak`.
pub fn run_streak<S: KeyValueStore>(
    atlas: &DevAtlas<S>,
    today: NaiveDate,
    output: OutputMode,
) -> anyhow::Result<()> {
    let summary = atlas.summary(today);
    let payload = StreakOutput {
        today,
        current_streak: summary.current_streak,
        today_count: summary.today_count,
        last_7_days: summary.last_7_days,
    };

    render_mode(
        output,
        &payload,
        |out, w| {
            let buckets: Vec<String> = out.last_7_days.iter().map(u8::to_string).collect();
            writeln!(w, "{}\t{}\t{}", out.current_streak, out.today_count, buckets.join(","))
        },
        |out, w| {
            pretty_section(w, "Streak")?;
            let days = if out.current_streak == 1 { "day" } else { "days" };
            pretty_kv(w, "Current", format!("{} {days}", out.current_streak))?;
            pretty_kv(w, "Today", format!("{} lesson(s)", out.today_count))?;
            pretty_kv(w, "Last 7", format!("[{}]", sparkline(&out.last_7_days)))?;
            writeln!(w, "{:<12}  {}", "", weekday_labels(out.today))
        },
    )
}
