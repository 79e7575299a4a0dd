//! Non-fatal problems absorbed during a run.
//!
//! Per-record and per-session failures never abort the pipeline; they are
//! collected here and attached to the final result so no error is silently
//! dropped.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// A problem that was absorbed rather than propagated.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// A log line that could not be parsed into an event. Skipped.
    #[error("{path}:{line}: malformed record: {reason}")]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// Submit/complete sequencing that violates the session state machine.
    #[error("session {session_id}: {detail}")]
    ProtocolAnomaly { session_id: String, detail: String },

    /// A session log that could not be read at all. The session is excluded.
    #[error("{path}: unreadable session log: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_render_with_context() {
        let warning = Warning::MalformedRecord {
            path: PathBuf::from("/tmp/events.jsonl"),
            line: 12,
            reason: "invalid JSON".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "/tmp/events.jsonl:12: malformed record: invalid JSON"
        );

        let warning = Warning::ProtocolAnomaly {
            session_id: "abc".to_string(),
            detail: "complete without submit".to_string(),
        };
        assert_eq!(warning.to_string(), "session abc: complete without submit");
    }

    #[test]
    fn warnings_serialize_tagged() {
        let warning = Warning::SourceUnavailable {
            path: PathBuf::from("/tmp/events.jsonl"),
            reason: "permission denied".to_string(),
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "source_unavailable");
        assert_eq!(json["reason"], "permission denied");
    }
}
