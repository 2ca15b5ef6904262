// src/schedule.rs

use chrono::{DateTime, Local, TimeZone, Timelike};

/// Next run slot strictly after `now`, from the configured hours-of-day.
/// Hours outside 0-23 are ignored; returns None if nothing valid remains.
pub fn next_run_time(now: DateTime<Local>, hours: &[u32]) -> Option<DateTime<Local>> {
    let mut sorted: Vec<u32> = hours.iter().copied().filter(|h| *h < 24).collect();
    sorted.sort_unstable();
    sorted.dedup();
    let first = *sorted.first()?;

    let (date, hour) = match sorted.iter().copied().find(|h| *h > now.hour()) {
        Some(h) => (now.date_naive(), h),
        None => (now.date_naive().succ_opt()?, first),
    };

    let naive = date.and_hms_opt(hour, 0, 0)?;
    now.timezone().from_local_datetime(&naive).earliest()
}
