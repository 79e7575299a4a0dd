//! Machine-readable JSON report generation.

use anyhow::Result;
use asa_core::metrics::{DurationStats, MetricsResult};
use asa_core::semantic::SemanticMetrics;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// JSON report structure.
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    timezone: String,
    period: JsonPeriod,
    totals: JsonTotals<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    durations: Option<&'a DurationStats>,
    overlap: JsonOverlap,
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    semantic: Option<&'a SemanticMetrics>,
}

#[derive(Debug, Serialize)]
struct JsonPeriod {
    start: String,
    end: String,
}

#[derive(Debug, Serialize)]
struct JsonTotals<'a> {
    total_prompts: usize,
    unique_sessions: usize,
    incomplete_sessions: &'a [String],
}

#[derive(Debug, Serialize)]
struct JsonOverlap {
    max_concurrency: u32,
    overlap_episode_count: u32,
    total_overlap_seconds: f64,
}

/// Serialize the result as pretty-printed JSON.
pub fn render(
    result: &MetricsResult,
    semantic: Option<&SemanticMetrics>,
    generated_at: DateTime<Utc>,
) -> Result<String> {
    #[expect(clippy::cast_precision_loss, reason = "human-scale durations")]
    let total_overlap_seconds = result.overlap.total_overlap.num_milliseconds() as f64 / 1000.0;

    let report = JsonReport {
        generated_at: generated_at.to_rfc3339(),
        timezone: result.scope.timezone.to_string(),
        period: JsonPeriod {
            start: result.scope.start.to_rfc3339(),
            end: result.scope.end.to_rfc3339(),
        },
        totals: JsonTotals {
            total_prompts: result.total_submits,
            unique_sessions: result.unique_sessions,
            incomplete_sessions: &result.incomplete_sessions,
        },
        durations: result.durations.as_ref(),
        overlap: JsonOverlap {
            max_concurrency: result.overlap.max_concurrency,
            overlap_episode_count: result.overlap.overlap_episode_count,
            total_overlap_seconds,
        },
        warnings: result.warnings.iter().map(ToString::to_string).collect(),
        semantic,
    };

    Ok(serde_json::to_string_pretty(&report)?)
}
