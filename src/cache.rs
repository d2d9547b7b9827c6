//! Temporal detection cache.
//!
//! Expensive detectors do not run on every frame. Each detector owns a
//! `DetectorCache`: a frame counter and the regions from its last detection cycle.
//! On every enabled frame the counter advances; when it reaches a multiple of the
//! refresh period the detector runs and its result replaces the cache. Whatever is
//! cached afterwards is what gets redacted on that frame.

use serde::Deserialize;

use crate::detect::DetectionError;
use crate::region::Region;

/// What a failed refresh does to the cached regions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Replace the cache with nothing: redact less rather than redact the wrong area.
    #[default]
    Clear,
    /// Keep redacting the regions from the last successful refresh.
    KeepStale,
}

impl FailurePolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "clear" => Some(FailurePolicy::Clear),
            "keep_stale" | "keep-stale" | "stale" => Some(FailurePolicy::KeepStale),
            _ => None,
        }
    }
}

/// Outcome of advancing a cache by one frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Tick {
    /// No refresh was due; cached regions reused.
    Reused,
    /// The detector ran and its result was cached.
    Refreshed,
    /// The detector ran and failed; the policy was applied.
    Failed(DetectionError),
}

/// Per-detector counter and cached regions.
#[derive(Clone, Debug)]
pub struct DetectorCache {
    frame_counter: u64,
    cached_regions: Vec<Region>,
    refresh_period: u32,
    policy: FailurePolicy,
}

impl DetectorCache {
    /// `refresh_period` of zero is treated as one (refresh every frame).
    pub fn new(refresh_period: u32, policy: FailurePolicy) -> Self {
        Self {
            frame_counter: 0,
            cached_regions: Vec::new(),
            refresh_period: refresh_period.max(1),
            policy,
        }
    }

    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    pub fn refresh_period(&self) -> u32 {
        self.refresh_period
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn regions(&self) -> &[Region] {
        &self.cached_regions
    }

    /// True when the next `tick` will run the detector.
    pub fn refresh_due(&self) -> bool {
        (self.frame_counter + 1) % self.refresh_period as u64 == 0
    }

    /// Advance one frame, running `refresh` if a refresh is due.
    pub fn tick<F>(&mut self, refresh: F) -> Tick
    where
        F: FnOnce() -> Result<Vec<Region>, DetectionError>,
    {
        self.frame_counter += 1;
        if self.frame_counter % self.refresh_period as u64 != 0 {
            return Tick::Reused;
        }
        match refresh() {
            Ok(regions) => {
                self.cached_regions = regions;
                Tick::Refreshed
            }
            Err(err) => {
                if self.policy == FailurePolicy::Clear {
                    self.cached_regions.clear();
                }
                Tick::Failed(err)
            }
        }
    }

    /// Back to the initial state: counter zero, nothing cached.
    pub fn reset(&mut self) {
        self.frame_counter = 0;
        self.cached_regions.clear();
    }
}
