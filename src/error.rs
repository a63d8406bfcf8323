//! Error types for the resume wizard.
//!
//! Every failure a stage can hit is classified here, and
//! [`Error::user_message`] is the single place that turns a classified
//! failure into the one string shown at a stage boundary. Nothing below
//! the workflow engine formats its own user-facing text.

use thiserror::Error;

use crate::task::TaskId;
use crate::workflow::stage::Flow;

/// Top-level error type for the wizard.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    #[error("Poll error: {0}")]
    Poll(#[from] PollError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Backend task-client errors, classified per operation.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The backend rejected a submission or was unreachable.
    #[error("submission failed: {reason}")]
    Submission { reason: String },

    /// A status query failed at the transport level.
    #[error("status query failed: {reason}")]
    StatusQuery { reason: String },

    /// The backend returned no usable payload for a completed task.
    #[error("result fetch failed: {reason}")]
    ResultFetch { reason: String },

    /// The backend rejected the *data* itself with a 4xx. This is the
    /// one failure reported to the user as an actionable data problem,
    /// and it is never retried.
    #[error("backend rejected the document data (status {status}): {detail}")]
    ClientData { status: u16, detail: String },

    /// The backend acknowledged but the response is missing a required
    /// field (e.g. no task id, no download URL).
    #[error("malformed backend response: {what}")]
    MalformedResponse { what: String },

    /// The status endpoint returned a value outside the known lifecycle.
    #[error("unrecognized task status {value:?}")]
    UnrecognizedStatus { value: String },
}

/// Poller outcomes that are not a clean `Success` result.
#[derive(Debug, Error)]
pub enum PollError {
    #[error(transparent)]
    Task(#[from] TaskError),

    /// The task never left `PENDING` within the attempt budget.
    #[error("task polling timed out after {attempts} attempts")]
    Timeout { attempts: u32 },

    /// The task reached the `FAILURE` terminal state.
    #[error("task {id} failed to complete")]
    TaskFailed { id: TaskId },

    /// A terminal status that is neither success nor failure. The task
    /// client rejects malformed wire values before they get here, so
    /// this only fires if the lifecycle ever grows a new terminal state.
    #[error("unexpected task status {value:?}")]
    UnexpectedStatus { value: String },
}

/// Local validation failures — nothing was sent to the backend.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("at least one keyword must be selected")]
    NoKeywordsSelected,

    #[error("a resume file or the stored resume is required")]
    MissingResumeSource,

    #[error("the flow variant is locked after the first stage")]
    FlowLocked,

    #[error("this step belongs to the {expected} flow")]
    WrongFlow { expected: Flow },

    #[error("stage {stage} is not active in the {flow} flow")]
    StageNotActive { stage: String, flow: Flow },

    #[error("missing {what} from an earlier stage")]
    MissingStageData { what: &'static str },

    #[error("at least one education entry is required")]
    MissingEducation,

    #[error("a resume file is required")]
    MissingResumeFile,
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
}

impl Error {
    /// The single user-visible message for this failure.
    ///
    /// Applied once, at the stage boundary. Only [`TaskError::ClientData`]
    /// gets a distinct, actionable phrasing; every other kind — transient
    /// network trouble or a definitive backend rejection alike — is
    /// formatted the same way, and retrying is always a deliberate user
    /// action.
    pub fn user_message(&self) -> String {
        match self {
            Error::Task(TaskError::ClientData { detail, .. })
            | Error::Poll(PollError::Task(TaskError::ClientData { detail, .. })) => {
                format!(
                    "Your resume data could not be processed: {detail}. \
                     Please review your input and try again."
                )
            }
            Error::Poll(PollError::Timeout { .. }) => {
                "Processing is taking too long. Please try again.".to_string()
            }
            Error::Validation(e) => format!("{e}."),
            other => format!("An error occurred: {other}"),
        }
    }
}

/// Result type alias for the wizard.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_data_gets_distinct_message() {
        let err = Error::Task(TaskError::ClientData {
            status: 406,
            detail: "unreadable work history".to_string(),
        });
        let msg = err.user_message();
        assert!(msg.contains("unreadable work history"));
        assert!(msg.contains("review your input"));
    }

    #[test]
    fn client_data_inside_poll_error_keeps_distinct_message() {
        let err = Error::Poll(PollError::Task(TaskError::ClientData {
            status: 422,
            detail: "empty resume".to_string(),
        }));
        assert!(err.user_message().contains("empty resume"));
    }

    #[test]
    fn timeout_message() {
        let err = Error::Poll(PollError::Timeout { attempts: 15 });
        assert_eq!(
            err.user_message(),
            "Processing is taking too long. Please try again."
        );
    }

    #[test]
    fn transport_and_rejection_read_the_same() {
        let transient = Error::Task(TaskError::Submission {
            reason: "connection refused".to_string(),
        });
        let definitive = Error::Task(TaskError::Submission {
            reason: "500 - internal error".to_string(),
        });
        assert!(transient.user_message().starts_with("An error occurred:"));
        assert!(definitive.user_message().starts_with("An error occurred:"));
    }

    #[test]
    fn validation_message_is_the_rule_itself() {
        let err = Error::Validation(ValidationError::NoKeywordsSelected);
        assert_eq!(err.user_message(), "at least one keyword must be selected.");
    }
}
