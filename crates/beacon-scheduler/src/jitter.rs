//! Registration jitter (spec §4.9 "attach a uniform-random jitter in
//! `[0, 300]` seconds when a schedule is registered, so the daily/weekly/
//! monthly cron tiers don't all fire in the same instant"). The jitter is
//! drawn once per source at registration and reused on every subsequent
//! fire of that source's schedule, not redrawn per run.

use std::time::Duration;

use rand::Rng;

pub const JITTER_MAX_SECS: u64 = 300;

pub fn draw_jitter() -> Duration {
    let secs = rand::thread_rng().gen_range(0..=JITTER_MAX_SECS);
    Duration::from_secs(secs)
}
