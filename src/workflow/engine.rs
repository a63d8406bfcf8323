//! The wizard engine — sequences stage execution, decides which task to
//! submit next, branches on the tier flag, and merges results.
//!
//! One parametrized state machine drives both flow variants; the flow
//! tag picks the path through [`Stage`]. The engine owns the only
//! writable reference to [`WizardState`], and every stage operation
//! holds `&mut self` across its suspension points, so no two stages can
//! execute concurrently and an abandoned (dropped) operation can never
//! merge into a newer run's state.
//!
//! Failure policy: any submission, poll, or validation failure leaves
//! the stage position unchanged, records the single formatted message
//! as the stage's failure surface, and waits for the user to either
//! retry the same operation or navigate backward. Nothing retries
//! automatically.

use std::sync::Arc;

use tracing::{info, warn};

use crate::backend::types::*;
use crate::backend::ResumeBackend;
use crate::config::WizardConfig;
use crate::error::{PollError, Result, TaskError, ValidationError};
use crate::poll::Poller;
use crate::session::SessionContext;
use crate::task::TaskStatus;
use crate::workflow::stage::{Flow, Stage};
use crate::workflow::state::{GateChoice, StateUpdate, WizardState};

/// What the user picked as their resume at intake.
#[derive(Debug)]
pub enum ResumeInput {
    /// A freshly chosen file, to be uploaded and parsed.
    Upload(ResumeFile),
    /// Reuse the resume previously stored under the session identity.
    Stored,
}

/// The failure surface of the stage that most recently went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    pub stage: Stage,
    /// The single user-visible message, already normalized.
    pub message: String,
}

/// Drives one wizard run from intake to delivery.
pub struct WizardEngine {
    backend: Arc<dyn ResumeBackend>,
    poller: Poller,
    session: SessionContext,
    flow: Flow,
    stage: Stage,
    state: WizardState,
    failure: Option<StageFailure>,
}

impl WizardEngine {
    pub fn new(
        backend: Arc<dyn ResumeBackend>,
        session: SessionContext,
        config: &WizardConfig,
    ) -> Self {
        let poller = Poller::new(Arc::clone(&backend), config.poll);
        let state = WizardState::new(session.premium);
        Self {
            backend,
            poller,
            session,
            flow: Flow::default(),
            stage: Stage::ResumeIntake,
            state,
            failure: None,
        }
    }

    // ── Surfaces read by the host ───────────────────────────────────

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn flow(&self) -> Flow {
        self.flow
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn failure(&self) -> Option<&StageFailure> {
        self.failure.as_ref()
    }

    // ── Navigation ──────────────────────────────────────────────────

    /// Switch flow variants. Accepted only while still at the first
    /// stage; afterwards the variant is locked for the run.
    pub fn select_flow(&mut self, flow: Flow) -> Result<()> {
        if flow == self.flow {
            return Ok(());
        }
        if self.stage != Stage::ResumeIntake {
            return Err(ValidationError::FlowLocked.into());
        }
        info!(%flow, "Flow variant selected");
        self.flow = flow;
        Ok(())
    }

    /// Navigate one stage backward. A no-op at the first stage. Clears
    /// the failure surface — the stage will be retried deliberately.
    pub fn retreat(&mut self) {
        if let Some(prev) = self.stage.prev(self.flow) {
            info!(from = %self.stage, to = %prev, "Navigating back");
            self.stage = prev;
            self.failure = None;
        }
    }

    /// Discard the run and return to intake: fresh state, fresh run id,
    /// tier re-seeded from the session, default flow variant.
    pub fn reset(&mut self) {
        info!(run_id = %self.state.run_id, "Resetting wizard");
        self.state = WizardState::new(self.session.premium);
        self.flow = Flow::default();
        self.stage = Stage::ResumeIntake;
        self.failure = None;
    }

    // ── Stage 1: resume intake ──────────────────────────────────────

    /// Job-description flow, stage 1: resolve the resume source, then
    /// submit the job description for match scoring. Advances to the
    /// review stage once the match-score task id is in hand.
    pub async fn submit_job_description(
        &mut self,
        input: ResumeInput,
        job_description: impl Into<String>,
    ) -> Result<()> {
        let job_description = job_description.into();
        let result = self.job_description_inner(input, job_description).await;
        self.stage_result(result)
    }

    async fn job_description_inner(
        &mut self,
        input: ResumeInput,
        job_description: String,
    ) -> Result<()> {
        self.guard(Stage::ResumeIntake, Flow::JobDescription)?;

        let source = self.resolve_source(input).await?;
        let request = JobDescriptionRequest::new(&source, job_description.clone());
        let response = self.backend.submit_job_description(&request).await?;

        self.state.merge(StateUpdate {
            source: Some(source),
            job_description: Some(job_description),
            match_task: Some(response.match_score_task_id),
            ..Default::default()
        });
        self.advance();
        Ok(())
    }

    /// Direct-keyword flow, stage 1: resolve the resume source and go
    /// straight to the final build with the supplied keyword list.
    /// Advances to the gate (unpaid) or delivery (paid).
    pub async fn submit_direct_keywords(
        &mut self,
        input: ResumeInput,
        keywords: impl Into<String>,
    ) -> Result<()> {
        let keywords = keywords.into();
        let result = self.direct_keywords_inner(input, keywords).await;
        self.stage_result(result)
    }

    async fn direct_keywords_inner(&mut self, input: ResumeInput, keywords: String) -> Result<()> {
        self.guard(Stage::ResumeIntake, Flow::DirectKeywords)?;

        let list = parse_keyword_list(&keywords);
        if list.is_empty() {
            return Err(ValidationError::NoKeywordsSelected.into());
        }

        let source = self.resolve_source(input).await?;
        let request = FinalBuildRequest::new(&source, list.clone());
        let build_task = self.backend.submit_final_build(&request).await?;

        self.state.merge(StateUpdate {
            source: Some(source),
            direct_keywords: Some(keywords),
            selected_keywords: Some(list),
            build_task: Some(build_task),
            ..Default::default()
        });
        self.advance();
        Ok(())
    }

    // ── Stage 2: keyword review (job-description flow) ──────────────

    /// Poll the match-score task and merge its report, with all missing
    /// keywords pre-selected. Idempotent: once the report is in state,
    /// re-entering the stage never re-polls.
    pub async fn load_match_report(&mut self) -> Result<()> {
        let result = self.load_match_report_inner().await;
        self.stage_result(result)
    }

    async fn load_match_report_inner(&mut self) -> Result<()> {
        self.guard(Stage::KeywordReview, Flow::JobDescription)?;

        if self.state.match_report.is_some() {
            return Ok(());
        }

        let match_task = self
            .state
            .match_task
            .clone()
            .ok_or(ValidationError::MissingStageData {
                what: "match-score task",
            })?;

        let payload = self.poller.poll_result(&match_task).await?;
        let report: MatchScoreReport =
            serde_json::from_value(payload).map_err(|_| TaskError::MalformedResponse {
                what: "match score payload".to_string(),
            })?;

        info!(
            match_rate = report.match_rate,
            expected_rate = report.expected_rate,
            missing = report.missing_keywords.len(),
            "Match report ready"
        );
        self.state.merge(StateUpdate {
            selected_keywords: Some(report.missing_keywords.clone()),
            match_report: Some(report),
            ..Default::default()
        });
        Ok(())
    }

    /// Flip one keyword in or out of the selection.
    pub fn toggle_keyword(&mut self, keyword: &str) -> Result<()> {
        self.guard(Stage::KeywordReview, Flow::JobDescription)?;

        let mut selected = self.state.selected_keywords.clone();
        if let Some(pos) = selected.iter().position(|k| k == keyword) {
            selected.remove(pos);
        } else {
            selected.push(keyword.to_string());
        }
        self.state.merge(StateUpdate {
            selected_keywords: Some(selected),
            ..Default::default()
        });
        Ok(())
    }

    /// Add a free-form keyword; it starts out selected. Blank input is
    /// ignored.
    pub fn add_custom_keyword(&mut self, keyword: &str) -> Result<()> {
        self.guard(Stage::KeywordReview, Flow::JobDescription)?;

        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Ok(());
        }

        let mut custom = self.state.custom_keywords.clone();
        let mut selected = self.state.selected_keywords.clone();
        custom.push(keyword.to_string());
        selected.push(keyword.to_string());
        self.state.merge(StateUpdate {
            custom_keywords: Some(custom),
            selected_keywords: Some(selected),
            ..Default::default()
        });
        Ok(())
    }

    /// Submit the final build with the chosen keyword union. Advances
    /// to the gate (unpaid) or delivery (paid) once the build task id
    /// is in hand.
    pub async fn submit_build(&mut self) -> Result<()> {
        let result = self.submit_build_inner().await;
        self.stage_result(result)
    }

    async fn submit_build_inner(&mut self) -> Result<()> {
        self.guard(Stage::KeywordReview, Flow::JobDescription)?;

        let keywords = self.state.keyword_union();
        if keywords.is_empty() {
            return Err(ValidationError::NoKeywordsSelected.into());
        }
        let source = self
            .state
            .source
            .clone()
            .ok_or(ValidationError::MissingResumeSource)?;

        let request = FinalBuildRequest::new(&source, keywords);
        let build_task = self.backend.submit_final_build(&request).await?;

        self.state.merge(StateUpdate {
            build_task: Some(build_task),
            ..Default::default()
        });
        self.advance();
        Ok(())
    }

    // ── Stage 2.5: upgrade gate ─────────────────────────────────────

    /// Record the gate choice and advance. Both choices lead to
    /// delivery; choosing premium performs no payment verification here
    /// (the upstream flow hands that off externally).
    pub fn resolve_gate(&mut self, choice: GateChoice) -> Result<()> {
        let result = self.resolve_gate_inner(choice);
        self.stage_result(result)
    }

    fn resolve_gate_inner(&mut self, choice: GateChoice) -> Result<()> {
        if self.stage != Stage::UpgradeGate {
            return Err(ValidationError::StageNotActive {
                stage: Stage::UpgradeGate.to_string(),
                flow: self.flow,
            }
            .into());
        }

        info!(?choice, "Gate resolved");
        self.state.merge(StateUpdate {
            gate_choice: Some(choice),
            ..Default::default()
        });
        self.advance();
        Ok(())
    }

    // ── Stage 3: delivery ───────────────────────────────────────────

    /// Poll the build task, look up the stored profile fields, and
    /// assemble the final document. Returns the download URL.
    ///
    /// Partial progress survives failure: once the build result has
    /// been merged, a retry after a failed lookup or generation does
    /// not re-poll the build task; once the document exists, the URL is
    /// simply returned again.
    pub async fn finalize(&mut self) -> Result<String> {
        let result = self.finalize_inner().await;
        self.stage_result(result)
    }

    async fn finalize_inner(&mut self) -> Result<String> {
        if self.stage != Stage::Delivery {
            return Err(ValidationError::StageNotActive {
                stage: Stage::Delivery.to_string(),
                flow: self.flow,
            }
            .into());
        }

        if let Some(url) = &self.state.download_url {
            return Ok(url.clone());
        }

        let resume_data = match &self.state.resume_data {
            Some(data) => data.clone(),
            None => {
                let build_task =
                    self.state
                        .build_task
                        .clone()
                        .ok_or(ValidationError::MissingStageData {
                            what: "build task",
                        })?;
                let data = self.poller.poll_result(&build_task).await?;
                self.state.merge(StateUpdate {
                    resume_data: Some(data.clone()),
                    ..Default::default()
                });
                data
            }
        };

        let details = self.backend.basic_details(&self.session.email).await?;
        let request = GenerateDocumentRequest {
            basic_details: BasicDetails::from(details),
            resume_data,
        };
        let document = self.backend.generate_document(&request).await?;

        info!(download_url = %document.download_url, "Document ready");
        self.state.merge(StateUpdate {
            download_url: Some(document.download_url.clone()),
            ..Default::default()
        });
        Ok(document.download_url)
    }

    // ── Internals ───────────────────────────────────────────────────

    /// Resolve the intake choice into the source reference used by all
    /// downstream requests. A fresh upload yields its task id; reusing
    /// the stored resume yields the identity reference. Never both.
    async fn resolve_source(&self, input: ResumeInput) -> Result<ResumeSource> {
        match input {
            ResumeInput::Stored => Ok(ResumeSource::Stored {
                email: self.session.email.clone(),
            }),
            ResumeInput::Upload(file) => {
                let id = self.backend.upload_resume(&file).await?;
                match self.poller.poll_status(&id).await? {
                    TaskStatus::Success => Ok(ResumeSource::Upload(id)),
                    _ => Err(PollError::TaskFailed { id }.into()),
                }
            }
        }
    }

    fn guard(&self, stage: Stage, flow: Flow) -> Result<()> {
        if self.flow != flow {
            return Err(ValidationError::WrongFlow { expected: flow }.into());
        }
        if self.stage != stage {
            return Err(ValidationError::StageNotActive {
                stage: stage.to_string(),
                flow: self.flow,
            }
            .into());
        }
        Ok(())
    }

    fn advance(&mut self) {
        if let Some(next) = self.stage.next(self.flow, self.state.paid_user) {
            info!(from = %self.stage, to = %next, "Advancing stage");
            self.stage = next;
        }
    }

    /// Stage boundary: convert a failure into the single user-visible
    /// message on the stage's failure surface, leaving the position
    /// unchanged. Success clears the surface.
    fn stage_result<T>(&mut self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.failure = None,
            Err(e) => {
                let message = e.user_message();
                warn!(stage = %self.stage, "Stage failed: {message}");
                self.failure = Some(StageFailure {
                    stage: self.stage,
                    message,
                });
            }
        }
        result
    }
}

/// Split comma-separated keyword input, trimming entries and dropping
/// blanks.
pub fn parse_keyword_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::error::{Error, TaskError};
    use crate::task::{TaskId, TaskStatus};
    // The stub's trait methods name their error explicitly.
    use std::result::Result;

    /// Backend stub for purely local engine behavior; every remote call
    /// is a test bug.
    struct StubBackend;

    #[async_trait]
    impl ResumeBackend for StubBackend {
        async fn upload_resume(&self, _file: &ResumeFile) -> Result<TaskId, TaskError> {
            unreachable!("no backend calls expected")
        }
        async fn check_status(&self, _id: &TaskId) -> Result<TaskStatus, TaskError> {
            unreachable!("no backend calls expected")
        }
        async fn fetch_result(&self, _id: &TaskId) -> Result<serde_json::Value, TaskError> {
            unreachable!("no backend calls expected")
        }
        async fn submit_job_description(
            &self,
            _request: &JobDescriptionRequest,
        ) -> Result<JobDescriptionResponse, TaskError> {
            unreachable!("no backend calls expected")
        }
        async fn submit_final_build(
            &self,
            _request: &FinalBuildRequest,
        ) -> Result<TaskId, TaskError> {
            unreachable!("no backend calls expected")
        }
        async fn generate_document(
            &self,
            _request: &GenerateDocumentRequest,
        ) -> Result<GeneratedDocument, TaskError> {
            unreachable!("no backend calls expected")
        }
        async fn basic_details(&self, _email: &str) -> Result<UserDetails, TaskError> {
            unreachable!("no backend calls expected")
        }
        async fn fetch_master_data(
            &self,
            _email: &str,
        ) -> Result<Option<serde_json::Value>, TaskError> {
            unreachable!("no backend calls expected")
        }
        async fn update_master_education(
            &self,
            _email: &str,
            _data: &EducationUpload,
        ) -> Result<(), TaskError> {
            unreachable!("no backend calls expected")
        }
        async fn update_master_data(
            &self,
            _email: &str,
            _data: &serde_json::Value,
        ) -> Result<(), TaskError> {
            unreachable!("no backend calls expected")
        }
    }

    fn engine(premium: bool) -> WizardEngine {
        WizardEngine::new(
            Arc::new(StubBackend),
            SessionContext::new("user@example.com", "tok", premium),
            &WizardConfig::default(),
        )
    }

    #[test]
    fn parse_keyword_list_trims_and_drops_blanks() {
        assert_eq!(
            parse_keyword_list(" Project Management, JavaScript ,, Leadership ,"),
            vec!["Project Management", "JavaScript", "Leadership"]
        );
        assert!(parse_keyword_list("").is_empty());
        assert!(parse_keyword_list(" , ,").is_empty());
    }

    #[test]
    fn flow_switch_allowed_only_at_first_stage() {
        let mut engine = engine(false);
        engine.select_flow(Flow::DirectKeywords).unwrap();
        assert_eq!(engine.flow(), Flow::DirectKeywords);
        engine.select_flow(Flow::JobDescription).unwrap();

        // Force the engine past stage 1 and try again.
        engine.stage = Stage::KeywordReview;
        let err = engine.select_flow(Flow::DirectKeywords).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::FlowLocked)
        ));
        // Re-selecting the current flow stays a no-op even when locked.
        engine.select_flow(Flow::JobDescription).unwrap();
    }

    #[test]
    fn retreat_is_noop_at_first_stage() {
        let mut engine = engine(false);
        engine.retreat();
        assert_eq!(engine.stage(), Stage::ResumeIntake);
    }

    #[test]
    fn retreat_clears_the_failure_surface() {
        let mut engine = engine(false);
        engine.stage = Stage::KeywordReview;
        engine.failure = Some(StageFailure {
            stage: Stage::KeywordReview,
            message: "boom".to_string(),
        });

        engine.retreat();
        assert_eq!(engine.stage(), Stage::ResumeIntake);
        assert!(engine.failure().is_none());
    }

    #[test]
    fn reset_discards_state_and_restores_defaults() {
        let mut engine = engine(true);
        engine.select_flow(Flow::DirectKeywords).unwrap();
        let old_run = engine.state().run_id;
        engine.stage = Stage::Delivery;
        engine.state.merge(StateUpdate {
            download_url: Some("https://example.com/out.pdf".to_string()),
            ..Default::default()
        });

        engine.reset();

        assert_eq!(engine.stage(), Stage::ResumeIntake);
        assert_eq!(engine.flow(), Flow::JobDescription);
        assert!(engine.state().download_url.is_none());
        assert!(engine.state().paid_user, "tier re-seeded from session");
        assert_ne!(engine.state().run_id, old_run);
    }

    #[tokio::test]
    async fn review_operations_rejected_in_direct_keywords_flow() {
        let mut engine = engine(false);
        engine.select_flow(Flow::DirectKeywords).unwrap();
        engine.stage = Stage::KeywordReview;

        let err = engine.load_match_report().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::WrongFlow {
                expected: Flow::JobDescription
            })
        ));
        assert!(engine.failure().is_some(), "guard failures surface too");
    }

    #[tokio::test]
    async fn direct_keywords_requires_at_least_one_keyword() {
        let mut engine = engine(false);
        engine.select_flow(Flow::DirectKeywords).unwrap();

        let err = engine
            .submit_direct_keywords(ResumeInput::Stored, " , ")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::NoKeywordsSelected)
        ));
        assert_eq!(engine.stage(), Stage::ResumeIntake, "no advance on failure");
        assert_eq!(
            engine.failure().unwrap().message,
            "at least one keyword must be selected."
        );
    }

    #[test]
    fn keyword_toggling_and_custom_additions() {
        let mut engine = engine(false);
        engine.stage = Stage::KeywordReview;
        engine.state.merge(StateUpdate {
            selected_keywords: Some(vec!["Python".to_string(), "Docker".to_string()]),
            ..Default::default()
        });

        engine.toggle_keyword("Python").unwrap();
        assert_eq!(engine.state().selected_keywords, vec!["Docker"]);

        engine.toggle_keyword("Python").unwrap();
        assert_eq!(engine.state().selected_keywords, vec!["Docker", "Python"]);

        engine.add_custom_keyword(" Kubernetes ").unwrap();
        assert_eq!(engine.state().custom_keywords, vec!["Kubernetes"]);
        assert_eq!(
            engine.state().selected_keywords,
            vec!["Docker", "Python", "Kubernetes"]
        );

        engine.add_custom_keyword("   ").unwrap();
        assert_eq!(engine.state().custom_keywords, vec!["Kubernetes"]);
    }

    #[tokio::test]
    async fn build_submission_requires_a_selection() {
        let mut engine = engine(false);
        engine.stage = Stage::KeywordReview;
        engine.state.merge(StateUpdate {
            source: Some(ResumeSource::Stored {
                email: "user@example.com".to_string(),
            }),
            ..Default::default()
        });

        let err = engine.submit_build().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::NoKeywordsSelected)
        ));
        assert_eq!(engine.stage(), Stage::KeywordReview);
    }

    #[test]
    fn gate_requires_gate_stage() {
        let mut engine = engine(false);
        let err = engine
            .resolve_gate(GateChoice::ContinueWithWatermark)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::StageNotActive { .. })
        ));
    }

    #[test]
    fn gate_choice_advances_to_delivery() {
        let mut engine = engine(false);
        engine.stage = Stage::UpgradeGate;

        engine.resolve_gate(GateChoice::GoPremium).unwrap();
        assert_eq!(engine.stage(), Stage::Delivery);
        assert_eq!(engine.state().gate_choice, Some(GateChoice::GoPremium));
    }
}
