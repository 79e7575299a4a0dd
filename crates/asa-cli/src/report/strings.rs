//! Report copy.
//!
//! Every user-facing string in the rendered reports lives here as
//! configuration data with defaults, injected into the renderers and
//! overridable from the config file's `[report]` table.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportStrings {
    pub title: String,
    pub label_generated: String,
    pub label_time_period: String,
    pub disclaimer: String,
    pub no_data: String,

    pub heading_average_autonomy: String,
    pub desc_average_autonomy: String,

    pub heading_summary_stats: String,
    pub desc_summary_stats: String,
    pub label_metric: String,
    pub label_value: String,
    pub label_total_prompts: String,
    pub label_completed_periods: String,
    pub label_unique_sessions: String,
    pub label_incomplete_sessions: String,
    pub label_mean_duration: String,
    pub label_median_duration: String,
    pub label_max_duration: String,
    pub label_total_time: String,
    pub label_std_deviation: String,

    pub heading_distribution: String,
    pub desc_distribution: String,
    pub label_duration_range: String,
    pub label_count: String,
    pub label_percentage: String,
    pub label_under_1min: String,
    pub label_1_5min: String,
    pub label_5_15min: String,
    pub label_over_15min: String,

    pub heading_overlap: String,
    pub desc_overlap: String,
    pub label_max_parallel: String,
    pub label_overlap_episodes: String,
    pub label_total_overlap: String,

    pub heading_semantic: String,
    pub desc_semantic: String,
    pub label_category: String,
    pub label_total_classified: String,
    pub label_multi_category: String,
    pub label_unclassified: String,
    pub heading_custom_categories: String,

    pub heading_warnings: String,

    pub heading_methodology: String,
    pub methodology: String,
}

impl Default for ReportStrings {
    fn default() -> Self {
        Self {
            title: "Amplifier Session Analysis Report".into(),
            label_generated: "Generated:".into(),
            label_time_period: "Time Period:".into(),
            disclaimer: "Important: This report provides descriptive statistics only. \
                The data being analyzed may not reflect all usage of Amplifier over the time period."
                .into(),
            no_data: "No session data found for the specified time period.".into(),

            heading_average_autonomy: "Average Autonomy Duration".into(),
            desc_average_autonomy: "The average time the AI agent worked autonomously after \
                receiving a user message before returning control. Measured from prompt \
                submission (prompt_submit event) to when the agent completes its response \
                (prompt_complete event)."
                .into(),

            heading_summary_stats: "Summary Statistics".into(),
            desc_summary_stats: "Key statistics about autonomous work periods.".into(),
            label_metric: "Metric".into(),
            label_value: "Value".into(),
            label_total_prompts: "Total Prompts Sent".into(),
            label_completed_periods: "Completed Periods".into(),
            label_unique_sessions: "Unique Sessions".into(),
            label_incomplete_sessions: "Incomplete Sessions".into(),
            label_mean_duration: "Mean Duration".into(),
            label_median_duration: "Median Duration".into(),
            label_max_duration: "Max Duration".into(),
            label_total_time: "Total Autonomous Time".into(),
            label_std_deviation: "Std Deviation".into(),

            heading_distribution: "Duration Distribution".into(),
            desc_distribution: "Breakdown of autonomy periods by duration. Shows how work is \
                distributed between quick interactions and longer autonomous runs."
                .into(),
            label_duration_range: "Duration Range".into(),
            label_count: "Count".into(),
            label_percentage: "Percentage".into(),
            label_under_1min: "Under 1 minute".into(),
            label_1_5min: "1-5 minutes".into(),
            label_5_15min: "5-15 minutes".into(),
            label_over_15min: "Over 15 minutes".into(),

            heading_overlap: "Session Overlap Analysis".into(),
            desc_overlap: "Measures concurrent session usage. An overlap episode is a maximal \
                time range during which two or more sessions were working at the same moment; \
                \"Max Parallel Sessions\" is the highest number of sessions active at once."
                .into(),
            label_max_parallel: "Max Parallel Sessions".into(),
            label_overlap_episodes: "Overlap Episodes".into(),
            label_total_overlap: "Total Overlapping Time".into(),

            heading_semantic: "Semantic Analysis".into(),
            desc_semantic: "Prompts classified into semantic categories describing what was \
                asked of the agent."
                .into(),
            label_category: "Category".into(),
            label_total_classified: "Total Prompts Classified".into(),
            label_multi_category: "Multi-Category Prompts".into(),
            label_unclassified: "Unclassified".into(),
            heading_custom_categories: "Custom Categories Discovered".into(),

            heading_warnings: "Warnings".into(),

            heading_methodology: "Methodology".into(),
            methodology: "Metrics are computed by parsing session event logs (events.jsonl) \
                from the projects directory. Only user-initiated sessions are included; agent \
                delegation sub-sessions are excluded from the analysis."
                .into(),
        }
    }
}
