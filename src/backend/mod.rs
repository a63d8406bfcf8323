//! Task client — the single point of entry for all backend calls.
//!
//! The wizard never talks HTTP directly; everything goes through the
//! [`ResumeBackend`] trait so the engine, poller, and bootstrap depend
//! only on the seam. [`HttpBackend`] is the production implementation.

mod http;
pub mod types;

pub use http::HttpBackend;
pub use types::*;

use async_trait::async_trait;

use crate::error::TaskError;
use crate::task::{TaskId, TaskStatus};

/// Backend-agnostic contract over the resume-builder RPC surface.
///
/// The first three methods are the generic task lifecycle (submit,
/// status, result) shared by every job type; the rest are the
/// job-specific submissions and lookups built on top of it.
#[async_trait]
pub trait ResumeBackend: Send + Sync {
    // ── Task lifecycle ──────────────────────────────────────────────

    /// Upload a resume file, returning the parse-task id.
    async fn upload_resume(&self, file: &ResumeFile) -> Result<TaskId, TaskError>;

    /// Sample a task's lifecycle status.
    async fn check_status(&self, id: &TaskId) -> Result<TaskStatus, TaskError>;

    /// Fetch a completed task's payload. Callers must have observed
    /// `Success` for this id first; the poller is the only path the
    /// wizard uses, and it enforces that ordering.
    async fn fetch_result(&self, id: &TaskId) -> Result<serde_json::Value, TaskError>;

    // ── Job submissions ─────────────────────────────────────────────

    /// Start match scoring for a job description.
    async fn submit_job_description(
        &self,
        request: &JobDescriptionRequest,
    ) -> Result<JobDescriptionResponse, TaskError>;

    /// Start the final resume rebuild around the chosen keywords.
    async fn submit_final_build(&self, request: &FinalBuildRequest) -> Result<TaskId, TaskError>;

    /// Assemble the downloadable document. Synchronous — not a task.
    async fn generate_document(
        &self,
        request: &GenerateDocumentRequest,
    ) -> Result<GeneratedDocument, TaskError>;

    // ── Profile ─────────────────────────────────────────────────────

    /// Look up the user's basic profile fields.
    async fn basic_details(&self, email: &str) -> Result<UserDetails, TaskError>;

    /// Fetch the user's aggregate profile data; `None` means no profile
    /// has been stored yet.
    async fn fetch_master_data(&self, email: &str)
        -> Result<Option<serde_json::Value>, TaskError>;

    /// Persist education and certification entries.
    async fn update_master_education(
        &self,
        email: &str,
        data: &EducationUpload,
    ) -> Result<(), TaskError>;

    /// Persist the aggregate profile data produced by a parse task.
    async fn update_master_data(
        &self,
        email: &str,
        data: &serde_json::Value,
    ) -> Result<(), TaskError>;
}
