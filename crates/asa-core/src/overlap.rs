//! Concurrent-session detection via a boundary sweep.
//!
//! Every scope-clipped interval contributes `+1` at its start and `-1` at
//! its end (open intervals end at the scope boundary). Boundaries are
//! sorted by instant with ends ahead of starts, and the running sum is
//! evaluated once per distinct instant: a session ending exactly when
//! another begins therefore never counts as overlap, and a shared boundary
//! inside a busy period cannot split an episode in two.

use chrono::{DateTime, Duration, Utc};

use crate::reconstruct::AutonomyInterval;
use crate::scope::TimeScope;

/// Summary of session concurrency inside the scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapStats {
    /// Peak number of simultaneously autonomous sessions.
    pub max_concurrency: u32,
    /// Number of maximal time ranges with concurrency >= 2.
    pub overlap_episode_count: u32,
    /// Combined length of those ranges.
    pub total_overlap: Duration,
}

impl OverlapStats {
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_concurrency: 0,
            overlap_episode_count: 0,
            total_overlap: Duration::zero(),
        }
    }
}

/// Sweep the clipped intervals. `O(n log n)` in the number of boundaries.
#[must_use]
pub fn compute_overlap(intervals: &[AutonomyInterval], scope: &TimeScope) -> OverlapStats {
    let mut boundaries: Vec<(DateTime<Utc>, i32)> = Vec::with_capacity(intervals.len() * 2);
    for interval in intervals {
        if let Some((start, end)) = interval.clip(scope) {
            boundaries.push((start, 1));
            boundaries.push((end, -1));
        }
    }

    // -1 sorts before +1 at equal instants.
    boundaries.sort_unstable_by_key(|&(at, delta)| (at, delta));

    let mut current: i64 = 0;
    let mut peak: i64 = 0;
    let mut episodes = 0u32;
    let mut total = Duration::zero();
    let mut episode_start: Option<DateTime<Utc>> = None;

    let mut i = 0;
    while i < boundaries.len() {
        let at = boundaries[i].0;
        while i < boundaries.len() && boundaries[i].0 == at {
            current += i64::from(boundaries[i].1);
            i += 1;
        }

        peak = peak.max(current);
        match episode_start {
            None if current >= 2 => episode_start = Some(at),
            Some(started) if current < 2 => {
                episodes += 1;
                total += at - started;
                episode_start = None;
            }
            _ => {}
        }
    }

    OverlapStats {
        max_concurrency: u32::try_from(peak).unwrap_or(u32::MAX),
        overlap_episode_count: episodes,
        total_overlap: total,
    }
}
