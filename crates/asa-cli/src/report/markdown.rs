//! Markdown report generation.

use std::fmt::Write;

use asa_core::metrics::MetricsResult;
use asa_core::semantic::SemanticMetrics;
use chrono::{DateTime, Utc};

use super::{ReportStrings, format_duration, percentage};

/// Render the full Markdown report.
pub fn render(
    result: &MetricsResult,
    semantic: Option<&SemanticMetrics>,
    strings: &ReportStrings,
    generated_at: DateTime<Utc>,
) -> String {
    let mut out = String::new();

    writeln!(out, "# {}", strings.title).unwrap();
    writeln!(out).unwrap();
    writeln!(
        out,
        "**{}** {}",
        strings.label_generated,
        generated_at
            .with_timezone(&result.scope.timezone)
            .format("%Y-%m-%d %H:%M:%S %Z")
    )
    .unwrap();
    writeln!(out).unwrap();
    writeln!(
        out,
        "**{}** {}",
        strings.label_time_period,
        result.scope.display_range()
    )
    .unwrap();
    writeln!(out).unwrap();
    writeln!(out, "> **Note:** {}", strings.disclaimer).unwrap();
    writeln!(out).unwrap();

    match &result.durations {
        None => {
            writeln!(out, "{}", strings.no_data).unwrap();
            writeln!(out).unwrap();
        }
        Some(durations) => {
            // Headline metric.
            writeln!(out, "## {}", strings.heading_average_autonomy).unwrap();
            writeln!(out).unwrap();
            writeln!(out, "{}", strings.desc_average_autonomy).unwrap();
            writeln!(out).unwrap();
            writeln!(out, "### {:.1} minutes", durations.mean_seconds / 60.0).unwrap();
            writeln!(out).unwrap();

            // Summary table.
            writeln!(out, "## {}", strings.heading_summary_stats).unwrap();
            writeln!(out).unwrap();
            writeln!(out, "{}", strings.desc_summary_stats).unwrap();
            writeln!(out).unwrap();
            writeln!(out, "| {} | {} |", strings.label_metric, strings.label_value).unwrap();
            writeln!(out, "|---|---|").unwrap();
            writeln!(
                out,
                "| {} | {} |",
                strings.label_total_prompts, result.total_submits
            )
            .unwrap();
            writeln!(
                out,
                "| {} | {} |",
                strings.label_completed_periods, durations.count
            )
            .unwrap();
            writeln!(
                out,
                "| {} | {} |",
                strings.label_unique_sessions, result.unique_sessions
            )
            .unwrap();
            writeln!(
                out,
                "| {} | {} |",
                strings.label_incomplete_sessions,
                result.incomplete_sessions.len()
            )
            .unwrap();
            writeln!(
                out,
                "| {} | {} |",
                strings.label_mean_duration,
                format_duration(durations.mean_seconds)
            )
            .unwrap();
            writeln!(
                out,
                "| {} | {} |",
                strings.label_median_duration,
                format_duration(durations.median_seconds)
            )
            .unwrap();
            writeln!(
                out,
                "| {} | {} |",
                strings.label_max_duration,
                format_duration(durations.max_seconds)
            )
            .unwrap();
            writeln!(
                out,
                "| {} | {} |",
                strings.label_total_time,
                format_duration(durations.total_seconds)
            )
            .unwrap();
            let stdev = durations
                .stdev_seconds
                .map_or_else(|| "n/a".to_string(), format_duration);
            writeln!(out, "| {} | {stdev} |", strings.label_std_deviation).unwrap();
            writeln!(out).unwrap();

            // Distribution table.
            writeln!(out, "## {}", strings.heading_distribution).unwrap();
            writeln!(out).unwrap();
            writeln!(out, "{}", strings.desc_distribution).unwrap();
            writeln!(out).unwrap();
            writeln!(
                out,
                "| {} | {} | {} |",
                strings.label_duration_range, strings.label_count, strings.label_percentage
            )
            .unwrap();
            writeln!(out, "|---|---|---|").unwrap();
            for (label, bucket) in [
                (&strings.label_under_1min, durations.under_1min),
                (&strings.label_1_5min, durations.between_1_5min),
                (&strings.label_5_15min, durations.between_5_15min),
                (&strings.label_over_15min, durations.over_15min),
            ] {
                writeln!(
                    out,
                    "| {label} | {bucket} | {:.1}% |",
                    percentage(bucket, durations.count)
                )
                .unwrap();
            }
            writeln!(out).unwrap();
        }
    }

    // Overlap section is meaningful even when every interval is open.
    writeln!(out, "## {}", strings.heading_overlap).unwrap();
    writeln!(out).unwrap();
    writeln!(out, "{}", strings.desc_overlap).unwrap();
    writeln!(out).unwrap();
    writeln!(out, "| {} | {} |", strings.label_metric, strings.label_value).unwrap();
    writeln!(out, "|---|---|").unwrap();
    writeln!(
        out,
        "| {} | {} |",
        strings.label_max_parallel, result.overlap.max_concurrency
    )
    .unwrap();
    writeln!(
        out,
        "| {} | {} |",
        strings.label_overlap_episodes, result.overlap.overlap_episode_count
    )
    .unwrap();
    #[expect(clippy::cast_precision_loss, reason = "human-scale durations")]
    let overlap_seconds = result.overlap.total_overlap.num_milliseconds() as f64 / 1000.0;
    writeln!(
        out,
        "| {} | {} |",
        strings.label_total_overlap,
        format_duration(overlap_seconds)
    )
    .unwrap();
    writeln!(out).unwrap();

    if !result.incomplete_sessions.is_empty() {
        writeln!(
            out,
            "{}: {}",
            strings.label_incomplete_sessions,
            result.incomplete_sessions.join(", ")
        )
        .unwrap();
        writeln!(out).unwrap();
    }

    if let Some(semantic) = semantic {
        render_semantic(&mut out, semantic, strings);
    }

    if !result.warnings.is_empty() {
        writeln!(out, "## {}", strings.heading_warnings).unwrap();
        writeln!(out).unwrap();
        for warning in &result.warnings {
            writeln!(out, "- {warning}").unwrap();
        }
        writeln!(out).unwrap();
    }

    writeln!(out, "## {}", strings.heading_methodology).unwrap();
    writeln!(out).unwrap();
    writeln!(out, "{}", strings.methodology).unwrap();

    out
}

fn render_semantic(out: &mut String, semantic: &SemanticMetrics, strings: &ReportStrings) {
    writeln!(out, "## {}", strings.heading_semantic).unwrap();
    writeln!(out).unwrap();
    writeln!(out, "{}", strings.desc_semantic).unwrap();
    writeln!(out).unwrap();
    writeln!(
        out,
        "| {} | {} |",
        strings.label_metric, strings.label_value
    )
    .unwrap();
    writeln!(out, "|---|---|").unwrap();
    writeln!(
        out,
        "| {} | {} |",
        strings.label_total_classified, semantic.total_prompts
    )
    .unwrap();
    writeln!(
        out,
        "| {} | {} ({:.1}%) |",
        strings.label_multi_category,
        semantic.multi_category_count,
        semantic.multi_category_percentage
    )
    .unwrap();
    writeln!(
        out,
        "| {} | {} |",
        strings.label_unclassified, semantic.unclassified_count
    )
    .unwrap();
    writeln!(out).unwrap();

    if !semantic.category_counts.is_empty() {
        writeln!(
            out,
            "| {} | {} | {} |",
            strings.label_category, strings.label_count, strings.label_percentage
        )
        .unwrap();
        writeln!(out, "|---|---|---|").unwrap();
        for entry in &semantic.category_counts {
            writeln!(
                out,
                "| {} | {} | {:.1}% |",
                entry.label, entry.count, entry.percentage
            )
            .unwrap();
        }
        writeln!(out).unwrap();
    }

    if !semantic.custom_categories.is_empty() {
        writeln!(out, "### {}", strings.heading_custom_categories).unwrap();
        writeln!(out).unwrap();
        for entry in &semantic.custom_categories {
            writeln!(out, "- {}: {}", entry.label, entry.count).unwrap();
        }
        writeln!(out).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use asa_core::metrics::analyze;
    use asa_core::reconstruct::ReconstructorConfig;
    use asa_core::scope::TimeScope;
    use asa_core::semantic::{CategoryCount, SemanticMetrics};
    use asa_core::{EventKind, RawEvent, SessionEvents};
    use chrono::TimeZone;
    use std::path::PathBuf;

    fn sample_result() -> MetricsResult {
        let scope = TimeScope::parse(
            "2026/01/10",
            "UTC",
            Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
        )
        .unwrap();

        let events = vec![
            ("s1", EventKind::PromptSubmit, "2026-01-10T10:00:00Z"),
            ("s1", EventKind::PromptComplete, "2026-01-10T10:05:00Z"),
            ("s2", EventKind::PromptSubmit, "2026-01-10T10:02:00Z"),
            ("s2", EventKind::PromptComplete, "2026-01-10T10:04:00Z"),
            ("s3", EventKind::PromptSubmit, "2026-01-10T11:00:00Z"),
        ];

        let sessions: Vec<SessionEvents> = ["s1", "s2", "s3"]
            .iter()
            .map(|id| SessionEvents {
                session_id: (*id).to_string(),
                project: "proj".to_string(),
                path: PathBuf::from("/tmp/events.jsonl"),
                events: events
                    .iter()
                    .filter(|(session, _, _)| session == id)
                    .map(|(session, kind, ts)| RawEvent {
                        session_id: (*session).to_string(),
                        kind: *kind,
                        timestamp: DateTime::parse_from_rfc3339(ts)
                            .unwrap()
                            .with_timezone(&Utc),
                        seq: None,
                        prompt: None,
                    })
                    .collect(),
            })
            .collect();

        analyze(
            &sessions,
            &scope,
            &ReconstructorConfig::default(),
            Vec::new(),
        )
    }

    fn generated_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 12, 9, 0, 0).unwrap()
    }

    #[test]
    fn report_contains_all_sections() {
        let result = sample_result();
        let rendered = render(&result, None, &ReportStrings::default(), generated_at());

        assert!(rendered.starts_with("# Amplifier Session Analysis Report"));
        assert!(rendered.contains("**Time Period:** 2026/01/10 00:00 - 2026/01/11 00:00 (UTC)"));
        assert!(rendered.contains("## Average Autonomy Duration"));
        // Two closed periods of 5m and 2m.
        assert!(rendered.contains("### 3.5 minutes"));
        assert!(rendered.contains("| Total Prompts Sent | 3 |"));
        assert!(rendered.contains("| Completed Periods | 2 |"));
        assert!(rendered.contains("| Unique Sessions | 3 |"));
        assert!(rendered.contains("| Max Parallel Sessions | 2 |"));
        assert!(rendered.contains("| Overlap Episodes | 1 |"));
        assert!(rendered.contains("Incomplete Sessions: s3"));
        assert!(rendered.contains("## Methodology"));
        // No warnings section for a clean run.
        assert!(!rendered.contains("## Warnings"));
    }

    #[test]
    fn empty_result_renders_no_data_message() {
        let scope = TimeScope::parse(
            "2026/01/10",
            "UTC",
            Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
        )
        .unwrap();
        let result = analyze(&[], &scope, &ReconstructorConfig::default(), Vec::new());

        let rendered = render(&result, None, &ReportStrings::default(), generated_at());
        assert!(rendered.contains("No session data found for the specified time period."));
        assert!(!rendered.contains("## Average Autonomy Duration"));
    }

    #[test]
    fn warnings_appear_once_each() {
        let mut result = sample_result();
        result.warnings.push(asa_core::Warning::MalformedRecord {
            path: PathBuf::from("/tmp/events.jsonl"),
            line: 7,
            reason: "invalid JSON".to_string(),
        });

        let rendered = render(&result, None, &ReportStrings::default(), generated_at());
        assert!(rendered.contains("## Warnings"));
        assert_eq!(rendered.matches("invalid JSON").count(), 1);
    }

    #[test]
    fn semantic_section_lists_categories() {
        let semantic = SemanticMetrics {
            total_prompts: 4,
            category_counts: vec![CategoryCount {
                label: "debugging".to_string(),
                count: 3,
                percentage: 75.0,
            }],
            custom_categories: vec![CategoryCount {
                label: "planning".to_string(),
                count: 1,
                percentage: 25.0,
            }],
            multi_category_count: 1,
            multi_category_percentage: 25.0,
            unclassified_count: 0,
            unique_sessions: 2,
        };

        let result = sample_result();
        let rendered = render(
            &result,
            Some(&semantic),
            &ReportStrings::default(),
            generated_at(),
        );

        assert!(rendered.contains("## Semantic Analysis"));
        assert!(rendered.contains("| debugging | 3 | 75.0% |"));
        assert!(rendered.contains("### Custom Categories Discovered"));
        assert!(rendered.contains("- planning: 1"));
    }
}
