//! Autonomy interval reconstruction.
//!
//! Each session is replayed through a two-state machine (Idle/Autonomous):
//! `prompt_submit` opens an interval, `prompt_complete` closes it. Events
//! arrive unordered, so each session is first sorted by timestamp, ties
//! broken by the writer's `seq` when both events carry one, else by
//! encounter order (stable sort), which makes reconstruction deterministic
//! for a given input.

use chrono::{DateTime, Duration, Utc};

use crate::event::{EventKind, RawEvent};
use crate::ingest::SessionEvents;
use crate::scope::TimeScope;
use crate::warning::Warning;

/// Reconstruction policy knobs.
#[derive(Debug, Clone, Copy)]
pub struct ReconstructorConfig {
    /// A second `prompt_submit` inside an open interval is treated as a
    /// restart only when it arrives more than this long after the open
    /// submit; closer duplicates are ignored as anomalies.
    pub restart_tolerance: Duration,
}

impl Default for ReconstructorConfig {
    fn default() -> Self {
        Self {
            restart_tolerance: Duration::minutes(30),
        }
    }
}

/// One submit-to-complete cycle of unsupervised agent work.
///
/// `end` is `None` for an interval whose complete event was never observed.
/// Open intervals count toward overlap (up to the scope end) but never
/// toward duration statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutonomyInterval {
    pub session_id: String,
    pub project: String,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl AutonomyInterval {
    /// Wall-clock duration for a closed interval.
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        self.end.map(|end| end - self.start)
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// The interval clipped to the scope, or `None` when they do not
    /// intersect. Open intervals run to the scope end.
    #[must_use]
    pub fn clip(&self, scope: &TimeScope) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = self.start.max(scope.start);
        let end = self.end.unwrap_or(scope.end).min(scope.end);
        (start < end).then_some((start, end))
    }

    /// Whether this interval participates in duration statistics: the
    /// submit itself must fall inside the scope and the interval must be
    /// closed.
    #[must_use]
    pub fn counts_toward_durations(&self, scope: &TimeScope) -> bool {
        !self.is_open() && scope.contains(self.start)
    }
}

fn sort_events(events: &mut [RawEvent]) {
    events.sort_by(|a, b| {
        a.timestamp.cmp(&b.timestamp).then_with(|| match (a.seq, b.seq) {
            (Some(a_seq), Some(b_seq)) => a_seq.cmp(&b_seq),
            // Stable sort keeps encounter order for the rest.
            _ => std::cmp::Ordering::Equal,
        })
    });
}

/// Replay one session's events into intervals.
fn reconstruct_session(
    session: &SessionEvents,
    config: &ReconstructorConfig,
    warnings: &mut Vec<Warning>,
) -> Vec<AutonomyInterval> {
    let mut events = session.events.clone();
    sort_events(&mut events);

    let mut intervals = Vec::new();
    let mut open: Option<DateTime<Utc>> = None;

    let mut anomaly = |detail: String, warnings: &mut Vec<Warning>| {
        tracing::debug!(session = %session.session_id, detail = %detail, "protocol anomaly");
        warnings.push(Warning::ProtocolAnomaly {
            session_id: session.session_id.clone(),
            detail,
        });
    };

    for event in &events {
        match event.kind {
            EventKind::PromptSubmit => {
                if let Some(started) = open {
                    if event.timestamp - started > config.restart_tolerance {
                        anomaly(
                            format!(
                                "submit at {} while the submit from {} was still open; treating as restart",
                                event.timestamp.to_rfc3339(),
                                started.to_rfc3339()
                            ),
                            warnings,
                        );
                        open = Some(event.timestamp);
                    } else {
                        anomaly(
                            format!(
                                "duplicate submit at {} inside an open interval; ignored",
                                event.timestamp.to_rfc3339()
                            ),
                            warnings,
                        );
                    }
                } else {
                    open = Some(event.timestamp);
                }
            }
            EventKind::PromptComplete => match open {
                Some(started) if event.timestamp >= started => {
                    intervals.push(AutonomyInterval {
                        session_id: session.session_id.clone(),
                        project: session.project.clone(),
                        start: started,
                        end: Some(event.timestamp),
                    });
                    open = None;
                }
                Some(started) => {
                    anomaly(
                        format!(
                            "complete at {} predates the open submit at {}; discarded",
                            event.timestamp.to_rfc3339(),
                            started.to_rfc3339()
                        ),
                        warnings,
                    );
                }
                None => {
                    anomaly(
                        format!(
                            "complete at {} with no preceding submit; discarded",
                            event.timestamp.to_rfc3339()
                        ),
                        warnings,
                    );
                }
            },
            EventKind::Other => {}
        }
    }

    if let Some(started) = open {
        intervals.push(AutonomyInterval {
            session_id: session.session_id.clone(),
            project: session.project.clone(),
            start: started,
            end: None,
        });
    }

    intervals
}

/// Reconstruct every session and keep the intervals that intersect the
/// scope, sorted by start time.
pub fn reconstruct_all(
    sessions: &[SessionEvents],
    scope: &TimeScope,
    config: &ReconstructorConfig,
) -> (Vec<AutonomyInterval>, Vec<Warning>) {
    let mut warnings = Vec::new();
    let mut intervals: Vec<AutonomyInterval> = sessions
        .iter()
        .flat_map(|session| reconstruct_session(session, config, &mut warnings))
        .filter(|interval| interval.clip(scope).is_some())
        .collect();

    intervals.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| a.session_id.cmp(&b.session_id))
    });

    (intervals, warnings)
}
