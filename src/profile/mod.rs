//! Profile bootstrap — one-time check before the wizard starts.
//!
//! Looks up whether the authenticated user has stored aggregate profile
//! data; if not, the host shows a blocking collection form whose
//! submission runs a three-step pipeline: persist education and
//! certifications, upload and parse the resume, then store the parsed
//! aggregate. Any failing step surfaces one message and leaves the form
//! open for a retry; the pipeline itself keeps no state, so retrying is
//! just submitting again. Form state is entirely disjoint from the
//! wizard's `WizardState`.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::backend::types::{BasicDetails, Certification, Education, EducationUpload, ResumeFile};
use crate::backend::ResumeBackend;
use crate::config::WizardConfig;
use crate::error::{Result, TaskError, ValidationError};
use crate::poll::Poller;

/// What the pre-wizard check found.
#[derive(Debug)]
pub enum BootstrapOutcome {
    /// Aggregate profile data exists; the wizard can start.
    Ready,
    /// No profile yet — the collection form must run first, pre-filled
    /// with whatever basic details could be fetched.
    NeedsSetup { prefill: Option<BasicDetails> },
}

/// The blocking collection form's contents.
#[derive(Debug, Default)]
pub struct ProfileForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub linkedin_url: Option<String>,
    pub education: Vec<Education>,
    pub certifications: Vec<Certification>,
    pub resume: Option<ResumeFile>,
}

impl ProfileForm {
    /// Local form rules: at least one education entry, and a resume
    /// file. Certifications are optional.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.education.is_empty() {
            return Err(ValidationError::MissingEducation);
        }
        if self.resume.is_none() {
            return Err(ValidationError::MissingResumeFile);
        }
        Ok(())
    }
}

/// Runs the pre-wizard profile check and the form-submission pipeline.
pub struct ProfileBootstrap {
    backend: Arc<dyn ResumeBackend>,
    poller: Poller,
}

impl ProfileBootstrap {
    pub fn new(backend: Arc<dyn ResumeBackend>, config: &WizardConfig) -> Self {
        let poller = Poller::new(Arc::clone(&backend), config.poll);
        Self { backend, poller }
    }

    /// Determine whether the user still needs to go through profile
    /// collection. A failed prefill lookup degrades to an empty form
    /// rather than blocking the bootstrap.
    pub async fn check(&self, email: &str) -> Result<BootstrapOutcome> {
        if self.backend.fetch_master_data(email).await?.is_some() {
            debug!(%email, "Profile data present");
            return Ok(BootstrapOutcome::Ready);
        }

        let prefill = match self.backend.basic_details(email).await {
            Ok(details) => Some(BasicDetails::from(details)),
            Err(e) => {
                warn!(%email, "Prefill lookup failed, continuing with empty form: {e}");
                None
            }
        };
        Ok(BootstrapOutcome::NeedsSetup { prefill })
    }

    /// Submit the collection form: persist education, upload and parse
    /// the resume, store the parsed aggregate. Steps run strictly in
    /// order; the first failure aborts the pipeline.
    pub async fn submit(&self, email: &str, form: &ProfileForm) -> Result<()> {
        form.validate()?;

        let upload = EducationUpload {
            education: form.education.clone(),
            certifications: form.certifications.clone(),
        };
        self.backend.update_master_education(email, &upload).await?;

        let resume = form.resume.as_ref().ok_or(ValidationError::MissingResumeFile)?;
        let task = self.backend.upload_resume(resume).await?;
        let parsed = self.poller.poll_result(&task).await?;

        // The parse job must have produced the aggregate shape.
        if parsed.get("work_experiences").is_none() {
            return Err(TaskError::MalformedResponse {
                what: "work_experiences".to_string(),
            }
            .into());
        }

        self.backend.update_master_data(email, &parsed).await?;
        info!(%email, "Profile setup complete");
        Ok(())
    }
}
