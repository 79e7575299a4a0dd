//! Self-contained HTML report generation.

use std::fmt::Write;

use asa_core::metrics::MetricsResult;
use asa_core::semantic::SemanticMetrics;
use chrono::{DateTime, Utc};

use super::{ReportStrings, format_duration, percentage};

const STYLE: &str = "\
body { font-family: -apple-system, 'Segoe UI', Helvetica, Arial, sans-serif; \
max-width: 860px; margin: 2rem auto; padding: 0 1rem; color: #1f2328; }\n\
h1 { border-bottom: 2px solid #d0d7de; padding-bottom: 0.3rem; }\n\
h2 { margin-top: 2rem; }\n\
table { border-collapse: collapse; margin: 1rem 0; min-width: 50%; }\n\
th, td { border: 1px solid #d0d7de; padding: 0.4rem 0.8rem; text-align: left; }\n\
th { background: #f6f8fa; }\n\
blockquote { border-left: 4px solid #d0d7de; margin: 1rem 0; padding: 0.2rem 1rem; color: #57606a; }\n\
.highlight { font-size: 2rem; font-weight: 600; margin: 0.5rem 0; }\n\
.meta { color: #57606a; }\n\
ul.warnings li { color: #9a6700; }";

/// Escape text for HTML element content and attribute values.
fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn two_column_table(out: &mut String, header: (&str, &str), rows: &[(String, String)]) {
    writeln!(out, "<table>").unwrap();
    writeln!(
        out,
        "<tr><th>{}</th><th>{}</th></tr>",
        escape(header.0),
        escape(header.1)
    )
    .unwrap();
    for (metric, value) in rows {
        writeln!(
            out,
            "<tr><td>{}</td><td>{}</td></tr>",
            escape(metric),
            escape(value)
        )
        .unwrap();
    }
    writeln!(out, "</table>").unwrap();
}

/// Render the full HTML report.
pub fn render(
    result: &MetricsResult,
    semantic: Option<&SemanticMetrics>,
    strings: &ReportStrings,
    generated_at: DateTime<Utc>,
) -> String {
    let mut out = String::new();

    writeln!(out, "<!DOCTYPE html>").unwrap();
    writeln!(out, "<html lang=\"en\">").unwrap();
    writeln!(out, "<head>").unwrap();
    writeln!(out, "<meta charset=\"utf-8\">").unwrap();
    writeln!(out, "<title>{}</title>", escape(&strings.title)).unwrap();
    writeln!(out, "<style>{STYLE}</style>").unwrap();
    writeln!(out, "</head>").unwrap();
    writeln!(out, "<body>").unwrap();

    writeln!(out, "<h1>{}</h1>", escape(&strings.title)).unwrap();
    writeln!(
        out,
        "<p class=\"meta\"><strong>{}</strong> {}</p>",
        escape(&strings.label_generated),
        generated_at
            .with_timezone(&result.scope.timezone)
            .format("%Y-%m-%d %H:%M:%S %Z")
    )
    .unwrap();
    writeln!(
        out,
        "<p class=\"meta\"><strong>{}</strong> {}</p>",
        escape(&strings.label_time_period),
        escape(&result.scope.display_range())
    )
    .unwrap();
    writeln!(out, "<blockquote>{}</blockquote>", escape(&strings.disclaimer)).unwrap();

    match &result.durations {
        None => {
            writeln!(out, "<p>{}</p>", escape(&strings.no_data)).unwrap();
        }
        Some(durations) => {
            writeln!(out, "<h2>{}</h2>", escape(&strings.heading_average_autonomy)).unwrap();
            writeln!(out, "<p>{}</p>", escape(&strings.desc_average_autonomy)).unwrap();
            writeln!(
                out,
                "<p class=\"highlight\">{:.1} minutes</p>",
                durations.mean_seconds / 60.0
            )
            .unwrap();

            writeln!(out, "<h2>{}</h2>", escape(&strings.heading_summary_stats)).unwrap();
            writeln!(out, "<p>{}</p>", escape(&strings.desc_summary_stats)).unwrap();
            let stdev = durations
                .stdev_seconds
                .map_or_else(|| "n/a".to_string(), format_duration);
            two_column_table(
                &mut out,
                (strings.label_metric.as_str(), strings.label_value.as_str()),
                &[
                    (strings.label_total_prompts.clone(), result.total_submits.to_string()),
                    (strings.label_completed_periods.clone(), durations.count.to_string()),
                    (strings.label_unique_sessions.clone(), result.unique_sessions.to_string()),
                    (
                        strings.label_incomplete_sessions.clone(),
                        result.incomplete_sessions.len().to_string(),
                    ),
                    (strings.label_mean_duration.clone(), format_duration(durations.mean_seconds)),
                    (
                        strings.label_median_duration.clone(),
                        format_duration(durations.median_seconds),
                    ),
                    (strings.label_max_duration.clone(), format_duration(durations.max_seconds)),
                    (strings.label_total_time.clone(), format_duration(durations.total_seconds)),
                    (strings.label_std_deviation.clone(), stdev),
                ],
            );

            writeln!(out, "<h2>{}</h2>", escape(&strings.heading_distribution)).unwrap();
            writeln!(out, "<p>{}</p>", escape(&strings.desc_distribution)).unwrap();
            writeln!(out, "<table>").unwrap();
            writeln!(
                out,
                "<tr><th>{}</th><th>{}</th><th>{}</th></tr>",
                escape(&strings.label_duration_range),
                escape(&strings.label_count),
                escape(&strings.label_percentage)
            )
            .unwrap();
            for (label, bucket) in [
                (&strings.label_under_1min, durations.under_1min),
                (&strings.label_1_5min, durations.between_1_5min),
                (&strings.label_5_15min, durations.between_5_15min),
                (&strings.label_over_15min, durations.over_15min),
            ] {
                writeln!(
                    out,
                    "<tr><td>{}</td><td>{bucket}</td><td>{:.1}%</td></tr>",
                    escape(label),
                    percentage(bucket, durations.count)
                )
                .unwrap();
            }
            writeln!(out, "</table>").unwrap();
        }
    }

    writeln!(out, "<h2>{}</h2>", escape(&strings.heading_overlap)).unwrap();
    writeln!(out, "<p>{}</p>", escape(&strings.desc_overlap)).unwrap();
    #[expect(clippy::cast_precision_loss, reason = "human-scale durations")]
    let overlap_seconds = result.overlap.total_overlap.num_milliseconds() as f64 / 1000.0;
    two_column_table(
        &mut out,
        (strings.label_metric.as_str(), strings.label_value.as_str()),
        &[
            (
                strings.label_max_parallel.clone(),
                result.overlap.max_concurrency.to_string(),
            ),
            (
                strings.label_overlap_episodes.clone(),
                result.overlap.overlap_episode_count.to_string(),
            ),
            (strings.label_total_overlap.clone(), format_duration(overlap_seconds)),
        ],
    );

    if !result.incomplete_sessions.is_empty() {
        writeln!(
            out,
            "<p><strong>{}:</strong> {}</p>",
            escape(&strings.label_incomplete_sessions),
            escape(&result.incomplete_sessions.join(", "))
        )
        .unwrap();
    }

    if let Some(semantic) = semantic {
        render_semantic(&mut out, semantic, strings);
    }

    if !result.warnings.is_empty() {
        writeln!(out, "<h2>{}</h2>", escape(&strings.heading_warnings)).unwrap();
        writeln!(out, "<ul class=\"warnings\">").unwrap();
        for warning in &result.warnings {
            writeln!(out, "<li>{}</li>", escape(&warning.to_string())).unwrap();
        }
        writeln!(out, "</ul>").unwrap();
    }

    writeln!(out, "<h2>{}</h2>", escape(&strings.heading_methodology)).unwrap();
    writeln!(out, "<p>{}</p>", escape(&strings.methodology)).unwrap();

    writeln!(out, "</body>").unwrap();
    writeln!(out, "</html>").unwrap();
    out
}

fn render_semantic(out: &mut String, semantic: &SemanticMetrics, strings: &ReportStrings) {
    writeln!(out, "<h2>{}</h2>", escape(&strings.heading_semantic)).unwrap();
    writeln!(out, "<p>{}</p>", escape(&strings.desc_semantic)).unwrap();
    two_column_table(
        out,
        (strings.label_metric.as_str(), strings.label_value.as_str()),
        &[
            (
                strings.label_total_classified.clone(),
                semantic.total_prompts.to_string(),
            ),
            (
                strings.label_multi_category.clone(),
                format!(
                    "{} ({:.1}%)",
                    semantic.multi_category_count, semantic.multi_category_percentage
                ),
            ),
            (
                strings.label_unclassified.clone(),
                semantic.unclassified_count.to_string(),
            ),
        ],
    );

    if !semantic.category_counts.is_empty() {
        writeln!(out, "<table>").unwrap();
        writeln!(
            out,
            "<tr><th>{}</th><th>{}</th><th>{}</th></tr>",
            escape(&strings.label_category),
            escape(&strings.label_count),
            escape(&strings.label_percentage)
        )
        .unwrap();
        for entry in &semantic.category_counts {
            writeln!(
                out,
                "<tr><td>{}</td><td>{}</td><td>{:.1}%</td></tr>",
                escape(&entry.label),
                entry.count,
                entry.percentage
            )
            .unwrap();
        }
        writeln!(out, "</table>").unwrap();
    }

    if !semantic.custom_categories.is_empty() {
        writeln!(out, "<h3>{}</h3>", escape(&strings.heading_custom_categories)).unwrap();
        writeln!(out, "<ul>").unwrap();
        for entry in &semantic.custom_categories {
            writeln!(out, "<li>{}: {}</li>", escape(&entry.label), entry.count).unwrap();
        }
        writeln!(out, "</ul>").unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use asa_core::metrics::analyze;
    use asa_core::reconstruct::ReconstructorConfig;
    use asa_core::scope::TimeScope;
    use asa_core::{EventKind, RawEvent, SessionEvents, Warning};
    use chrono::TimeZone;
    use std::path::PathBuf;

    fn result_with_one_session() -> MetricsResult {
        let scope = TimeScope::parse(
            "2026/01/10",
            "UTC",
            Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
        )
        .unwrap();
        let session = SessionEvents {
            session_id: "s<1>".to_string(),
            project: "proj".to_string(),
            path: PathBuf::from("/tmp/events.jsonl"),
            events: vec![
                RawEvent {
                    session_id: "s<1>".to_string(),
                    kind: EventKind::PromptSubmit,
                    timestamp: Utc.with_ymd_and_hms(2026, 1, 10, 10, 0, 0).unwrap(),
                    seq: None,
                    prompt: None,
                },
                RawEvent {
                    session_id: "s<1>".to_string(),
                    kind: EventKind::PromptComplete,
                    timestamp: Utc.with_ymd_and_hms(2026, 1, 10, 10, 5, 0).unwrap(),
                    seq: None,
                    prompt: None,
                },
            ],
        };
        analyze(
            &[session],
            &scope,
            &ReconstructorConfig::default(),
            Vec::new(),
        )
    }

    #[test]
    fn renders_a_complete_document() {
        let rendered = render(
            &result_with_one_session(),
            None,
            &ReportStrings::default(),
            Utc.with_ymd_and_hms(2026, 1, 12, 9, 0, 0).unwrap(),
        );

        assert!(rendered.starts_with("<!DOCTYPE html>"));
        assert!(rendered.contains("<h1>Amplifier Session Analysis Report</h1>"));
        assert!(rendered.contains("5.0 minutes"));
        assert!(rendered.ends_with("</html>\n"));
    }

    #[test]
    fn escapes_untrusted_text() {
        let mut result = result_with_one_session();
        result.warnings.push(Warning::ProtocolAnomaly {
            session_id: "s<1>".to_string(),
            detail: "complete & <submit> out of order".to_string(),
        });

        let rendered = render(
            &result,
            None,
            &ReportStrings::default(),
            Utc.with_ymd_and_hms(2026, 1, 12, 9, 0, 0).unwrap(),
        );

        assert!(rendered.contains("complete &amp; &lt;submit&gt; out of order"));
        assert!(!rendered.contains("<submit>"));
    }
}
