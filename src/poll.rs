//! Bounded task polling.
//!
//! Turns the three-call task-client contract (submit → status → result)
//! into one awaitable outcome per task. Fixed interval, no backoff —
//! backend jobs are expected to finish in seconds.
//!
//! Each call owns its own attempt counter and task id, so concurrent
//! polls never share mutable state, and dropping the returned future
//! abandons the wait without leaking timers (the in-flight sleep is
//! simply dropped).

use std::sync::Arc;

use tracing::{debug, warn};

use crate::backend::ResumeBackend;
use crate::config::PollConfig;
use crate::error::PollError;
use crate::task::{TaskId, TaskStatus};

/// Polls tasks until they leave `PENDING`, within a bounded budget.
#[derive(Clone)]
pub struct Poller {
    backend: Arc<dyn ResumeBackend>,
    config: PollConfig,
}

impl Poller {
    pub fn new(backend: Arc<dyn ResumeBackend>, config: PollConfig) -> Self {
        Self { backend, config }
    }

    /// Sample the task's status until it is no longer `PENDING`.
    ///
    /// Any other value terminates the loop and is returned as-is; the
    /// task client has already rejected malformed wire values, so a
    /// surprising terminal status propagates upward instead of looping
    /// forever. After `max_attempts` samples the wait fails with
    /// [`PollError::Timeout`].
    pub async fn poll_status(&self, id: &TaskId) -> Result<TaskStatus, PollError> {
        for attempt in 1..=self.config.max_attempts {
            let status = self.backend.check_status(id).await?;

            if !status.is_pending() {
                debug!(task_id = %id, %status, attempt, "Task left pending state");
                return Ok(status);
            }

            debug!(
                task_id = %id,
                attempt,
                max_attempts = self.config.max_attempts,
                "Task still pending"
            );
            tokio::time::sleep(self.config.interval).await;
        }

        warn!(task_id = %id, attempts = self.config.max_attempts, "Task polling timed out");
        Err(PollError::Timeout {
            attempts: self.config.max_attempts,
        })
    }

    /// Wait for the task to complete, then fetch its result payload.
    ///
    /// The result is only ever fetched after `SUCCESS` has been
    /// observed; `FAILURE` becomes [`PollError::TaskFailed`] and any
    /// other terminal value [`PollError::UnexpectedStatus`]. A
    /// `ClientData` rejection from the fetch stays distinguishable for
    /// the caller via the error taxonomy.
    pub async fn poll_result(&self, id: &TaskId) -> Result<serde_json::Value, PollError> {
        let status = self.poll_status(id).await?;

        match status {
            TaskStatus::Success => Ok(self.backend.fetch_result(id).await?),
            TaskStatus::Failure => {
                warn!(task_id = %id, "Task failed to complete");
                Err(PollError::TaskFailed { id: id.clone() })
            }
            other => Err(PollError::UnexpectedStatus {
                value: other.to_string(),
            }),
        }
    }
}
