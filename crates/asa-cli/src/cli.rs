//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Amplifier session analyzer.
///
/// Measures how long the AI agent works autonomously after receiving a
/// user message, until it returns control, and how often sessions run in
/// parallel.
#[derive(Debug, Parser)]
#[command(name = "asa", version, about, long_about = None)]
pub struct Cli {
    /// Time period to analyze: "default" (last full week), a single day
    /// ("2026/01/12"), or a range ("2026/01/10 - 2026/01/12").
    #[arg(short = 't', long, default_value = "default")]
    pub time_scope: String,

    /// IANA timezone for interpreting dates (default: the system zone).
    #[arg(short = 'z', long)]
    pub timezone: Option<String>,

    /// Report output format.
    #[arg(short = 'f', long, value_enum, default_value = "md")]
    pub format: OutputFormat,

    /// Output file path (default: autonomy-report.<format>).
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Path to the projects directory (default: ~/.amplifier/projects).
    #[arg(short = 'p', long)]
    pub sessions_path: Option<PathBuf>,

    /// Exclude sessions from projects whose name contains this pattern.
    /// Can be specified multiple times.
    #[arg(short = 'x', long = "exclude-project", value_name = "PATTERN")]
    pub exclude_projects: Vec<String>,

    /// Classify prompts into semantic categories using the Claude API.
    /// Requires ANTHROPIC_API_KEY.
    #[arg(long)]
    pub classify: bool,

    /// Include agent-delegation sub-sessions in the analysis.
    #[arg(long)]
    pub include_sub_sessions: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Report output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Markdown document.
    Md,
    /// Self-contained HTML document.
    Html,
    /// Machine-readable JSON.
    Json,
}

impl OutputFormat {
    /// File extension for the default output path.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Md => "md",
            Self::Html => "html",
            Self::Json => "json",
        }
    }
}
