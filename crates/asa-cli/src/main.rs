use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use asa_cli::report::{self, ReportStrings};
use asa_cli::{Cli, Config, OutputFormat};
use asa_core::metrics::MetricsResult;
use asa_core::semantic::{self, ClassifiedPrompt, SemanticMetrics};
use asa_core::{IngestOptions, ReconstructorConfig, TimeScope, analyze, load_sessions};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let timezone = cli
        .timezone
        .clone()
        .or_else(|| config.timezone.clone())
        .or_else(|| iana_time_zone::get_timezone().ok())
        .unwrap_or_else(|| "UTC".to_string());

    // Scope and timezone problems are fatal before any computation starts.
    let scope = TimeScope::parse(&cli.time_scope, &timezone, Utc::now())?;

    let sessions_path = cli
        .sessions_path
        .clone()
        .unwrap_or_else(|| config.sessions_path.clone());

    let mut exclude_projects = config.exclude_projects.clone();
    exclude_projects.extend(cli.exclude_projects.iter().cloned());

    println!(
        "Amplifier Session Analyzer v{}",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("Time period: {}", scope.display_range());
    println!("Sessions path: {}", sessions_path.display());
    if !exclude_projects.is_empty() {
        println!("Excluding projects: {}", exclude_projects.join(", "));
    }
    println!();

    let options = IngestOptions {
        exclude_projects,
        include_sub_sessions: cli.include_sub_sessions || config.include_sub_sessions,
    };
    let (sessions, warnings) =
        load_sessions(&sessions_path, &options).context("failed to scan session logs")?;

    let reconstructor = ReconstructorConfig {
        restart_tolerance: Duration::minutes(config.restart_tolerance_minutes),
    };
    let result = analyze(&sessions, &scope, &reconstructor, warnings);

    let semantic = if cli.classify {
        classify(&sessions, &scope, &config.model)?
    } else {
        None
    };

    print_summary(&result, semantic.as_ref());

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("autonomy-report.{}", cli.format.extension())));
    write_report(&result, semantic.as_ref(), &config.report, cli.format, &output)?;

    println!();
    println!("Report saved to: {}", output.display());
    Ok(())
}

/// Run LLM classification over the in-scope prompts.
///
/// Missing credentials are a configuration error; individual
/// classification failures degrade to unclassified inside the client.
fn classify(
    sessions: &[asa_core::SessionEvents],
    scope: &TimeScope,
    model: &str,
) -> Result<Option<SemanticMetrics>> {
    let api_key = std::env::var("ANTHROPIC_API_KEY")
        .context("ANTHROPIC_API_KEY is required for --classify")?;

    let prompts = semantic::extract_prompts(sessions, scope, semantic::CONTEXT_WINDOW);
    if prompts.is_empty() {
        println!("No prompts found for semantic analysis.");
        return Ok(None);
    }
    println!("Classifying {} prompts...", prompts.len());

    let client = asa_llm::Client::new(api_key)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let classifications = runtime.block_on(client.classify_prompts(model, &prompts));

    let classified: Vec<ClassifiedPrompt> = prompts
        .into_iter()
        .zip(classifications)
        .map(|(prompt, classification)| ClassifiedPrompt {
            prompt,
            classification,
        })
        .collect();

    Ok(semantic::calculate_semantic_metrics(&classified))
}

fn print_summary(result: &MetricsResult, semantic: Option<&SemanticMetrics>) {
    let completed = result.durations.as_ref().map_or(0, |d| d.count);
    println!(
        "Found {} prompts, {} completed periods",
        result.total_submits, completed
    );

    match &result.durations {
        None => {
            println!();
            println!("No session data found for the specified time period.");
        }
        Some(durations) => {
            println!();
            println!("Summary:");
            println!("  Average autonomy: {:.1} minutes", durations.mean_seconds / 60.0);
            println!("  Median autonomy:  {:.1} minutes", durations.median_seconds / 60.0);
            println!("  Unique sessions:  {}", result.unique_sessions);
            println!("  Incomplete sessions: {}", result.incomplete_sessions.len());
            println!();
            println!("Session Overlaps:");
            println!("  Max parallel sessions: {}", result.overlap.max_concurrency);
            println!("  Overlap episodes:      {}", result.overlap.overlap_episode_count);
        }
    }

    if let Some(semantic) = semantic {
        println!();
        println!("Semantic Analysis:");
        println!("  Prompts classified: {}", semantic.total_prompts);
        for entry in semantic.category_counts.iter().take(5) {
            println!("  {}: {} ({:.1}%)", entry.label, entry.count, entry.percentage);
        }
    }

    if !result.warnings.is_empty() {
        println!();
        println!("{} warnings recorded (see report)", result.warnings.len());
    }
}

fn write_report(
    result: &MetricsResult,
    semantic: Option<&SemanticMetrics>,
    strings: &ReportStrings,
    format: OutputFormat,
    output: &std::path::Path,
) -> Result<()> {
    let generated_at = Utc::now();
    let rendered = match format {
        OutputFormat::Md => report::markdown::render(result, semantic, strings, generated_at),
        OutputFormat::Html => report::html::render(result, semantic, strings, generated_at),
        OutputFormat::Json => report::json::render(result, semantic, generated_at)?,
    };

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory {}", parent.display()))?;
    }
    std::fs::write(output, rendered)
        .with_context(|| format!("failed to write report to {}", output.display()))
}
