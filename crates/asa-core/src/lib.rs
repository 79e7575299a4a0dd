//! Core analysis engine for the Amplifier session analyzer.
//!
//! This crate contains the deterministic pipeline:
//! - Ingestion: discovering session logs and parsing lifecycle events
//! - Scope resolution: timezone-aware analysis windows
//! - Reconstruction: pairing submits and completes into autonomy intervals
//! - Overlap: sweep-line concurrency statistics
//! - Aggregation: the immutable metrics result handed to report rendering
//!
//! Everything here is pure computation over already-written logs; network
//! access (LLM classification) lives in `asa-llm`, rendering in the CLI.

pub mod event;
pub mod ingest;
pub mod metrics;
pub mod overlap;
pub mod reconstruct;
pub mod scope;
pub mod semantic;
pub mod warning;

pub use event::{EventKind, RawEvent};
pub use ingest::{IngestError, IngestOptions, SessionEvents, load_sessions};
pub use metrics::{DurationStats, MetricsResult, analyze};
pub use overlap::OverlapStats;
pub use reconstruct::{AutonomyInterval, ReconstructorConfig};
pub use scope::{ScopeError, TimeScope};
pub use semantic::{
    Classification, ClassifiedPrompt, ExtractedPrompt, PromptCategory, SemanticMetrics,
    calculate_semantic_metrics, extract_prompts,
};
pub use warning::Warning;
