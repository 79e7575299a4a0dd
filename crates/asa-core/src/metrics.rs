//! Metrics aggregation.
//!
//! Pure combination of the reconstructed intervals and the overlap sweep
//! into one immutable [`MetricsResult`]. Deterministic for a given input
//! set; nothing here mutates its inputs.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::event::EventKind;
use crate::ingest::SessionEvents;
use crate::overlap::{self, OverlapStats};
use crate::reconstruct::{self, ReconstructorConfig};
use crate::scope::TimeScope;
use crate::warning::Warning;

/// Distribution bucket boundaries, in seconds.
const ONE_MINUTE: f64 = 60.0;
const FIVE_MINUTES: f64 = 300.0;
const FIFTEEN_MINUTES: f64 = 900.0;

/// Statistics over closed, in-scope autonomy durations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationStats {
    /// Number of closed intervals measured.
    pub count: usize,
    pub total_seconds: f64,
    pub mean_seconds: f64,
    pub median_seconds: f64,
    pub max_seconds: f64,
    /// Sample standard deviation; `None` below two samples.
    pub stdev_seconds: Option<f64>,

    // Distribution buckets.
    pub under_1min: usize,
    pub between_1_5min: usize,
    pub between_5_15min: usize,
    pub over_15min: usize,
}

/// The finished, immutable result of one analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsResult {
    pub scope: TimeScope,
    /// `None` when no closed interval fell inside the scope.
    pub durations: Option<DurationStats>,
    /// Submit events observed inside the scope, including ones that never
    /// produced a closed interval.
    pub total_submits: usize,
    /// Distinct sessions contributing at least one in-scope interval.
    pub unique_sessions: usize,
    /// Sessions whose last submit never saw a matching complete.
    pub incomplete_sessions: Vec<String>,
    pub overlap: OverlapStats,
    /// Every absorbed problem from ingestion and reconstruction.
    pub warnings: Vec<Warning>,
}

fn duration_stats(mut durations: Vec<f64>) -> Option<DurationStats> {
    if durations.is_empty() {
        return None;
    }

    durations.sort_by(f64::total_cmp);
    let count = durations.len();
    #[expect(clippy::cast_precision_loss, reason = "interval counts are small")]
    let n = count as f64;

    let total: f64 = durations.iter().sum();
    let mean = total / n;
    let median = if count % 2 == 1 {
        durations[count / 2]
    } else {
        (durations[count / 2 - 1] + durations[count / 2]) / 2.0
    };
    let max = durations[count - 1];

    let stdev = (count >= 2).then(|| {
        let variance = durations.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / (n - 1.0);
        variance.sqrt()
    });

    Some(DurationStats {
        count,
        total_seconds: total,
        mean_seconds: mean,
        median_seconds: median,
        max_seconds: max,
        stdev_seconds: stdev,
        under_1min: durations.iter().filter(|d| **d < ONE_MINUTE).count(),
        between_1_5min: durations
            .iter()
            .filter(|d| (ONE_MINUTE..FIVE_MINUTES).contains(*d))
            .count(),
        between_5_15min: durations
            .iter()
            .filter(|d| (FIVE_MINUTES..FIFTEEN_MINUTES).contains(*d))
            .count(),
        over_15min: durations.iter().filter(|d| **d >= FIFTEEN_MINUTES).count(),
    })
}

/// Run reconstruction, the overlap sweep, and aggregation over ingested
/// sessions. `warnings` carries what ingestion already absorbed; anomalies
/// found here are appended.
#[must_use]
pub fn analyze(
    sessions: &[SessionEvents],
    scope: &TimeScope,
    config: &ReconstructorConfig,
    mut warnings: Vec<Warning>,
) -> MetricsResult {
    let (intervals, reconstruct_warnings) = reconstruct::reconstruct_all(sessions, scope, config);
    warnings.extend(reconstruct_warnings);

    let overlap = overlap::compute_overlap(&intervals, scope);

    let durations: Vec<f64> = intervals
        .iter()
        .filter(|interval| interval.counts_toward_durations(scope))
        .filter_map(reconstruct::AutonomyInterval::duration)
        .map(|duration| {
            #[expect(clippy::cast_precision_loss, reason = "durations are human-scale")]
            let seconds = duration.num_milliseconds() as f64 / 1000.0;
            seconds
        })
        .collect();

    let unique_sessions = intervals
        .iter()
        .map(|interval| interval.session_id.as_str())
        .collect::<BTreeSet<_>>()
        .len();

    let incomplete_sessions: Vec<String> = intervals
        .iter()
        .filter(|interval| interval.is_open())
        .map(|interval| interval.session_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let total_submits = sessions
        .iter()
        .flat_map(|session| &session.events)
        .filter(|event| event.kind == EventKind::PromptSubmit && scope.contains(event.timestamp))
        .count();

    MetricsResult {
        scope: *scope,
        durations: duration_stats(durations),
        total_submits,
        unique_sessions,
        incomplete_sessions,
        overlap,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::RawEvent;
    use chrono::{DateTime, TimeZone, Utc};
    use std::path::PathBuf;

    fn session(id: &str, events: Vec<(EventKind, &str)>) -> SessionEvents {
        SessionEvents {
            session_id: id.to_string(),
            project: "proj".to_string(),
            path: PathBuf::from("/tmp/events.jsonl"),
            events: events
                .into_iter()
                .map(|(kind, ts)| RawEvent {
                    session_id: id.to_string(),
                    kind,
                    timestamp: DateTime::parse_from_rfc3339(ts).unwrap().with_timezone(&Utc),
                    seq: None,
                    prompt: None,
                })
                .collect(),
        }
    }

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap()
    }

    /// The canonical three-session scenario: two 30-minute sessions that
    /// overlap for 15 minutes, plus one session that never completes.
    #[test]
    fn three_session_scenario_in_new_york() {
        let scope =
            TimeScope::parse("2026/01/05 - 2026/01/06", "America/New_York", reference()).unwrap();

        let sessions = vec![
            session(
                "A",
                vec![
                    (EventKind::PromptSubmit, "2026-01-05T09:00:00-05:00"),
                    (EventKind::PromptComplete, "2026-01-05T09:30:00-05:00"),
                ],
            ),
            session(
                "B",
                vec![
                    (EventKind::PromptSubmit, "2026-01-05T09:15:00-05:00"),
                    (EventKind::PromptComplete, "2026-01-05T09:45:00-05:00"),
                ],
            ),
            session(
                "C",
                vec![(EventKind::PromptSubmit, "2026-01-05T10:00:00-05:00")],
            ),
        ];

        let result = analyze(
            &sessions,
            &scope,
            &ReconstructorConfig::default(),
            Vec::new(),
        );

        let durations = result.durations.unwrap();
        assert_eq!(durations.count, 2);
        assert!((durations.mean_seconds - 1800.0).abs() < f64::EPSILON);
        assert!((durations.median_seconds - 1800.0).abs() < f64::EPSILON);
        assert_eq!(durations.over_15min, 2);

        assert_eq!(result.overlap.max_concurrency, 2);
        assert_eq!(result.overlap.overlap_episode_count, 1);
        assert_eq!(
            result.overlap.total_overlap,
            chrono::Duration::minutes(15)
        );

        assert_eq!(result.incomplete_sessions, vec!["C".to_string()]);
        assert_eq!(result.unique_sessions, 3);
        assert_eq!(result.total_submits, 3);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn incomplete_sessions_do_not_skew_durations() {
        let scope = TimeScope::parse("2026/01/10", "UTC", reference()).unwrap();
        let sessions = vec![
            session(
                "closed",
                vec![
                    (EventKind::PromptSubmit, "2026-01-10T10:00:00Z"),
                    (EventKind::PromptComplete, "2026-01-10T10:02:00Z"),
                ],
            ),
            // Open since the morning: would dominate the mean if counted.
            session("dangling", vec![(EventKind::PromptSubmit, "2026-01-10T08:00:00Z")]),
        ];

        let result = analyze(
            &sessions,
            &scope,
            &ReconstructorConfig::default(),
            Vec::new(),
        );

        let durations = result.durations.unwrap();
        assert_eq!(durations.count, 1);
        assert!((durations.mean_seconds - 120.0).abs() < f64::EPSILON);
        assert_eq!(result.incomplete_sessions, vec!["dangling".to_string()]);
    }

    #[test]
    fn no_data_yields_no_duration_stats() {
        let scope = TimeScope::parse("2026/01/10", "UTC", reference()).unwrap();
        let result = analyze(&[], &scope, &ReconstructorConfig::default(), Vec::new());

        assert!(result.durations.is_none());
        assert_eq!(result.unique_sessions, 0);
        assert_eq!(result.overlap, OverlapStats::none());
    }

    #[test]
    fn analysis_is_idempotent() {
        let scope = TimeScope::parse("2026/01/10", "UTC", reference()).unwrap();
        let sessions = vec![
            session(
                "s1",
                vec![
                    (EventKind::PromptSubmit, "2026-01-10T10:00:00Z"),
                    (EventKind::PromptComplete, "2026-01-10T10:07:00Z"),
                ],
            ),
            session("s2", vec![(EventKind::PromptSubmit, "2026-01-10T10:03:00Z")]),
        ];

        let config = ReconstructorConfig::default();
        let first = analyze(&sessions, &scope, &config, Vec::new());
        let second = analyze(&sessions, &scope, &config, Vec::new());
        assert_eq!(first, second);
    }

    #[test]
    fn duration_stats_match_reference_values() {
        // 30s, 90s, 400s, 1000s: one sample per bucket.
        let stats = duration_stats(vec![400.0, 30.0, 1000.0, 90.0]).unwrap();

        assert_eq!(stats.count, 4);
        assert!((stats.total_seconds - 1520.0).abs() < f64::EPSILON);
        assert!((stats.mean_seconds - 380.0).abs() < f64::EPSILON);
        assert!((stats.median_seconds - 245.0).abs() < f64::EPSILON);
        assert!((stats.max_seconds - 1000.0).abs() < f64::EPSILON);
        assert_eq!(stats.under_1min, 1);
        assert_eq!(stats.between_1_5min, 1);
        assert_eq!(stats.between_5_15min, 1);
        assert_eq!(stats.over_15min, 1);

        // Sample stdev of [30, 90, 400, 1000] with mean 380:
        // sqrt(591400 / 3) ~= 443.997.
        let stdev = stats.stdev_seconds.unwrap();
        assert!((stdev - 443.997).abs() < 1e-3);
    }

    #[test]
    fn stdev_requires_two_samples() {
        let stats = duration_stats(vec![120.0]).unwrap();
        assert!(stats.stdev_seconds.is_none());
    }

    #[test]
    fn ingest_warnings_carry_through() {
        let scope = TimeScope::parse("2026/01/10", "UTC", reference()).unwrap();
        let carried = vec![Warning::MalformedRecord {
            path: PathBuf::from("/tmp/events.jsonl"),
            line: 3,
            reason: "invalid JSON".to_string(),
        }];

        let result = analyze(&[], &scope, &ReconstructorConfig::default(), carried.clone());
        assert_eq!(result.warnings, carried);
    }
}
