//! Session discovery and event log ingestion.
//!
//! Walks the projects root (`<root>/<project>/sessions/<session>/events.jsonl`),
//! applies project exclusion and sub-session filtering at discovery time,
//! and parses the surviving logs in parallel. Ingestion never aborts on a
//! single bad record: malformed lines and unreadable files are absorbed
//! into [`Warning`]s.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use thiserror::Error;

use crate::event::{self, RawEvent};
use crate::warning::Warning;

/// Buffer size for `BufReader` (64KB for optimal performance on large files)
const BUFFER_SIZE: usize = 64 * 1024;

/// Event log filename inside each session directory.
pub const EVENTS_FILE: &str = "events.jsonl";

/// Fatal ingestion errors. Everything below the root walk is absorbed.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("sessions root {0:?} does not exist")]
    RootNotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Discovery-time filtering knobs.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Substring patterns matched against project directory names.
    /// Exclusion is total: a matching project reaches no statistic.
    pub exclude_projects: Vec<String>,
    /// Include agent-delegation sub-sessions. Off by default.
    pub include_sub_sessions: bool,
}

/// One session's unordered event sequence.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    pub session_id: String,
    /// Project directory name the log was found under.
    pub project: String,
    pub path: PathBuf,
    pub events: Vec<RawEvent>,
}

/// Sub-sessions (agent delegation) carry an underscore-joined agent name,
/// e.g. `0000-f091bedbecda4679_modular-builder`; root sessions are plain
/// UUIDs.
#[must_use]
pub fn is_sub_session(session_id: &str) -> bool {
    session_id.contains('_')
}

fn project_excluded(project: &str, patterns: &[String]) -> bool {
    patterns
        .iter()
        .any(|p| !p.is_empty() && project.contains(p.as_str()))
}

#[derive(Debug)]
struct SessionFileRef {
    project: String,
    path: PathBuf,
}

fn discover_session_files(
    root: &Path,
    options: &IngestOptions,
) -> Result<Vec<SessionFileRef>, IngestError> {
    if !root.is_dir() {
        return Err(IngestError::RootNotFound(root.to_path_buf()));
    }

    let mut files = Vec::new();

    for project_entry in fs::read_dir(root)? {
        let project_path = project_entry?.path();
        if !project_path.is_dir() {
            continue;
        }

        let project = project_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        if project_excluded(&project, &options.exclude_projects) {
            tracing::debug!(project = %project, "project excluded by pattern");
            continue;
        }

        let sessions_dir = project_path.join("sessions");
        if !sessions_dir.is_dir() {
            continue;
        }

        for session_entry in fs::read_dir(&sessions_dir)? {
            let session_path = session_entry?.path();
            if !session_path.is_dir() {
                continue;
            }

            let session_name = session_path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("")
                .to_string();

            if !options.include_sub_sessions && is_sub_session(&session_name) {
                tracing::trace!(session = %session_name, "skipping sub-session");
                continue;
            }

            let events_path = session_path.join(EVENTS_FILE);
            if events_path.is_file() {
                files.push(SessionFileRef {
                    project: project.clone(),
                    path: events_path,
                });
            }
        }
    }

    // fs::read_dir order is platform-dependent; sort for determinism.
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

/// Parse one events file, grouping records by their `session_id` field.
fn load_session_file(file: &SessionFileRef) -> (Vec<SessionEvents>, Vec<Warning>) {
    let mut warnings = Vec::new();

    let handle = match File::open(&file.path) {
        Ok(handle) => handle,
        Err(err) => {
            tracing::warn!(path = ?file.path, error = %err, "skipping unreadable session log");
            warnings.push(Warning::SourceUnavailable {
                path: file.path.clone(),
                reason: err.to_string(),
            });
            return (Vec::new(), warnings);
        }
    };

    let reader = BufReader::with_capacity(BUFFER_SIZE, handle);
    let mut by_session: BTreeMap<String, Vec<RawEvent>> = BTreeMap::new();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!(path = ?file.path, line = line_no, error = %err, "read failed mid-file");
                warnings.push(Warning::SourceUnavailable {
                    path: file.path.clone(),
                    reason: err.to_string(),
                });
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        match event::parse_line(&line) {
            Ok(event) => by_session.entry(event.session_id.clone()).or_default().push(event),
            Err(err) => {
                tracing::warn!(path = ?file.path, line = line_no, error = %err, "skipping malformed record");
                warnings.push(Warning::MalformedRecord {
                    path: file.path.clone(),
                    line: line_no,
                    reason: err.to_string(),
                });
            }
        }
    }

    let sessions = by_session
        .into_iter()
        .map(|(session_id, events)| SessionEvents {
            session_id,
            project: file.project.clone(),
            path: file.path.clone(),
            events,
        })
        .collect();

    (sessions, warnings)
}

/// Discover and load every in-scope session under `root`.
///
/// File parsing runs in parallel; each session's events stay independent,
/// so no ordering depends on I/O concurrency.
pub fn load_sessions(
    root: &Path,
    options: &IngestOptions,
) -> Result<(Vec<SessionEvents>, Vec<Warning>), IngestError> {
    let files = discover_session_files(root, options)?;

    let results: Vec<(Vec<SessionEvents>, Vec<Warning>)> =
        files.par_iter().map(load_session_file).collect();

    let mut sessions = Vec::new();
    let mut warnings = Vec::new();
    for (file_sessions, file_warnings) in results {
        sessions.extend(file_sessions);
        warnings.extend(file_warnings);
    }

    sessions.sort_by(|a, b| {
        a.session_id
            .cmp(&b.session_id)
            .then_with(|| a.path.cmp(&b.path))
    });

    tracing::debug!(
        sessions = sessions.len(),
        warnings = warnings.len(),
        "ingestion complete"
    );
    Ok((sessions, warnings))
}
