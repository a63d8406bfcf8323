//! Task identifiers and lifecycle status.
//!
//! Every asynchronous backend job is tracked by an opaque [`TaskId`]
//! returned at submission time. Its [`TaskStatus`] is created `Pending`
//! and transitions exactly once to a terminal value; the status endpoint
//! is sampled repeatedly until that happens.

use serde::{Deserialize, Serialize};

use crate::error::TaskError;

/// Opaque handle for one unit of asynchronous backend work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Wrap a backend-issued identifier. Fails on an empty string —
    /// a submission acknowledgment without an id is a malformed response.
    pub fn new(raw: impl Into<String>) -> Result<Self, TaskError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(TaskError::MalformedResponse {
                what: "empty task_id".to_string(),
            });
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a task.
///
/// `Pending` at submission, then exactly one transition to `Success` or
/// `Failure`. No partial/progress states exist on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Success,
    Failure,
}

impl TaskStatus {
    /// Parse a wire status string. Unknown values are a protocol error,
    /// never coerced to one of the known states.
    pub fn parse(raw: &str) -> Result<Self, TaskError> {
        match raw.trim() {
            "PENDING" => Ok(Self::Pending),
            "SUCCESS" => Ok(Self::Success),
            "FAILURE" => Ok(Self::Failure),
            other => Err(TaskError::UnrecognizedStatus {
                value: other.to_string(),
            }),
        }
    }

    /// Whether the task is still awaiting completion.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Whether the task has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_id_rejects_empty() {
        assert!(TaskId::new("").is_err());
        assert!(TaskId::new("   ").is_err());
        assert!(TaskId::new("T1").is_ok());
    }

    #[test]
    fn status_parses_known_values() {
        assert_eq!(TaskStatus::parse("PENDING").unwrap(), TaskStatus::Pending);
        assert_eq!(TaskStatus::parse("SUCCESS").unwrap(), TaskStatus::Success);
        assert_eq!(TaskStatus::parse("FAILURE").unwrap(), TaskStatus::Failure);
        // Surrounding whitespace is tolerated
        assert_eq!(
            TaskStatus::parse(" SUCCESS ").unwrap(),
            TaskStatus::Success
        );
    }

    #[test]
    fn status_rejects_unknown_values() {
        for raw in ["DONE", "success", "ERROR", ""] {
            let err = TaskStatus::parse(raw).unwrap_err();
            assert!(
                matches!(err, TaskError::UnrecognizedStatus { .. }),
                "expected UnrecognizedStatus for {raw:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn terminal_states() {
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(TaskStatus::Success.is_terminal());
        assert!(TaskStatus::Failure.is_terminal());
    }

    #[test]
    fn display_matches_wire_format() {
        for status in [TaskStatus::Pending, TaskStatus::Success, TaskStatus::Failure] {
            let display = status.to_string();
            assert_eq!(TaskStatus::parse(&display).unwrap(), status);
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{display}\""));
        }
    }
}
