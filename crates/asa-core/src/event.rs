//! Raw lifecycle events parsed from session logs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The lifecycle event kinds the analyzer understands.
///
/// Unrecognized kind strings fold into `Other` so that new event types in
/// future log versions pass through without being rejected. The state
/// machine matches exhaustively on this enum, so adding a variant forces
/// every consumer to decide what to do with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PromptSubmit,
    PromptComplete,
    #[serde(other)]
    Other,
}

impl EventKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PromptSubmit => "prompt_submit",
            Self::PromptComplete => "prompt_complete",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed log record.
///
/// Timestamps are normalized to UTC at parse time; the original offset is
/// not kept because all downstream comparisons happen in UTC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub session_id: String,
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
    /// Writer-assigned sequence number, used as a sort tie-break when two
    /// events in one session share a timestamp.
    pub seq: Option<u64>,
    /// Submitted prompt text, present on `prompt_submit` records that carry
    /// it. Only consumed by semantic classification.
    pub prompt: Option<String>,
}

/// Why a single log line failed to parse.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid timestamp {value:?}: {source}")]
    Timestamp {
        value: String,
        source: chrono::ParseError,
    },
    #[error("empty session_id")]
    EmptySessionId,
}

/// Wire shape of one line: a single JSON object.
///
/// Unknown fields are ignored, not rejected; `seq` and `prompt` are
/// optional extensions of the minimal contract.
#[derive(Debug, Deserialize)]
struct WireRecord {
    session_id: String,
    kind: EventKind,
    timestamp: String,
    #[serde(default)]
    seq: Option<u64>,
    #[serde(default)]
    prompt: Option<String>,
}

/// Parse one log line into a [`RawEvent`].
pub fn parse_line(line: &str) -> Result<RawEvent, ParseError> {
    let record: WireRecord = serde_json::from_str(line)?;

    if record.session_id.is_empty() {
        return Err(ParseError::EmptySessionId);
    }

    let timestamp = DateTime::parse_from_rfc3339(&record.timestamp)
        .map_err(|source| ParseError::Timestamp {
            value: record.timestamp.clone(),
            source,
        })?
        .with_timezone(&Utc);

    Ok(RawEvent {
        session_id: record.session_id,
        kind: record.kind,
        timestamp,
        seq: record.seq,
        prompt: record.prompt,
    })
}
