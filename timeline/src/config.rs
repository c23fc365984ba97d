//! Engine tuning parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

pub const DEFAULT_PREFETCH_FACTOR: i64 = 5;
pub const DEFAULT_RESOLUTION_RELAX: f64 = 0.8;
pub const DEFAULT_WIDTH_PX: u32 = 1000;
pub const DEFAULT_MAX_SAMPLES: u64 = 10_000;
pub const DEFAULT_TREE_POLL_MS: u64 = 500;
pub const DEFAULT_TREE_MAX_POLLS: u32 = 20;
pub const DEFAULT_FETCH_DEBOUNCE_MS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineConfig {
    /// The fetch window spans this many view lengths, centered on the view.
    pub prefetch_factor: i64,
    /// Multiplier applied to the requested resolution before fetching.
    pub resolution_relax: f64,
    /// Pixel width assumed when no fetch window is given.
    pub default_width_px: u32,
    /// Upper bound on the number of sampled times in one fetch.
    pub max_samples: u64,
    /// Delay between two tree polls while the analysis is running.
    pub tree_poll_interval: Duration,
    /// Number of tree polls before giving up on a running analysis.
    pub tree_max_polls: u32,
    /// Minimum interval between two data fetches triggered by navigation.
    pub fetch_debounce: Duration,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            prefetch_factor: DEFAULT_PREFETCH_FACTOR,
            resolution_relax: DEFAULT_RESOLUTION_RELAX,
            default_width_px: DEFAULT_WIDTH_PX,
            max_samples: DEFAULT_MAX_SAMPLES,
            tree_poll_interval: Duration::from_millis(DEFAULT_TREE_POLL_MS),
            tree_max_polls: DEFAULT_TREE_MAX_POLLS,
            fetch_debounce: Duration::from_millis(DEFAULT_FETCH_DEBOUNCE_MS),
        }
    }
}

impl TimelineConfig {
    /// Build config from environment variables. Unset or unparsable values
    /// keep their defaults.
    ///
    /// - `TRACELENS_PREFETCH_FACTOR`: default 5
    /// - `TRACELENS_RESOLUTION_RELAX`: default 0.8
    /// - `TRACELENS_DEFAULT_WIDTH_PX`: default 1000
    /// - `TRACELENS_MAX_SAMPLES`: default 10000
    /// - `TRACELENS_TREE_POLL_MS`: default 500
    /// - `TRACELENS_TREE_MAX_POLLS`: default 20
    /// - `TRACELENS_FETCH_DEBOUNCE_MS`: default 300
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            prefetch_factor: env_parse("TRACELENS_PREFETCH_FACTOR", DEFAULT_PREFETCH_FACTOR).max(1),
            resolution_relax: env_parse("TRACELENS_RESOLUTION_RELAX", DEFAULT_RESOLUTION_RELAX),
            default_width_px: env_parse("TRACELENS_DEFAULT_WIDTH_PX", DEFAULT_WIDTH_PX).max(1),
            max_samples: env_parse("TRACELENS_MAX_SAMPLES", DEFAULT_MAX_SAMPLES).max(2),
            tree_poll_interval: Duration::from_millis(env_parse("TRACELENS_TREE_POLL_MS", DEFAULT_TREE_POLL_MS)),
            tree_max_polls: env_parse("TRACELENS_TREE_MAX_POLLS", DEFAULT_TREE_MAX_POLLS).max(1),
            fetch_debounce: Duration::from_millis(env_parse(
                "TRACELENS_FETCH_DEBOUNCE_MS",
                DEFAULT_FETCH_DEBOUNCE_MS,
            )),
        }
    }
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}
