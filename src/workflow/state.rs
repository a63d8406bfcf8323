//! Accumulated wizard state and its merge operation.
//!
//! `WizardState` is owned exclusively by the engine and mutated only
//! through [`WizardState::merge`]: a partial update where every field a
//! stage leaves untouched survives, and a field set twice takes the
//! later value. Nothing ever replaces the state wholesale short of a
//! full reset.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::backend::types::{MatchScoreReport, ResumeSource};
use crate::task::TaskId;

/// What the user picked at the upgrade gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateChoice {
    /// Upgrade to the paid tier. No payment verification happens here;
    /// the upstream flow treats this as an external redirect.
    GoPremium,
    /// Keep the free tier and accept a watermarked document.
    ContinueWithWatermark,
}

/// The data carried forward across stages for one wizard run.
#[derive(Debug, Clone)]
pub struct WizardState {
    /// Identifies this run; a reset issues a fresh one, so anything
    /// resolved late from an abandoned run can be told apart.
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,

    /// Tier flag. Seeded from the session; gates stage 2.5.
    pub paid_user: bool,

    /// Resolved resume source: upload task id XOR stored identity.
    pub source: Option<ResumeSource>,
    pub job_description: Option<String>,
    /// Raw comma-separated input from the direct-keyword flow.
    pub direct_keywords: Option<String>,

    /// Match-scoring task produced by the job-description submission.
    pub match_task: Option<TaskId>,
    /// Final-build task; polled at delivery.
    pub build_task: Option<TaskId>,

    pub match_report: Option<MatchScoreReport>,
    pub selected_keywords: Vec<String>,
    pub custom_keywords: Vec<String>,

    pub gate_choice: Option<GateChoice>,
    /// Structured resume content produced by the build task.
    pub resume_data: Option<serde_json::Value>,
    pub download_url: Option<String>,
}

impl WizardState {
    /// Fresh state for a new run.
    pub fn new(paid_user: bool) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            paid_user,
            source: None,
            job_description: None,
            direct_keywords: None,
            match_task: None,
            build_task: None,
            match_report: None,
            selected_keywords: Vec::new(),
            custom_keywords: Vec::new(),
            gate_choice: None,
            resume_data: None,
            download_url: None,
        }
    }

    /// Apply a partial update. Later merges win per-field; fields the
    /// update does not mention keep their current value.
    pub fn merge(&mut self, update: StateUpdate) {
        if let Some(v) = update.paid_user {
            self.paid_user = v;
        }
        if let Some(v) = update.source {
            self.source = Some(v);
        }
        if let Some(v) = update.job_description {
            self.job_description = Some(v);
        }
        if let Some(v) = update.direct_keywords {
            self.direct_keywords = Some(v);
        }
        if let Some(v) = update.match_task {
            self.match_task = Some(v);
        }
        if let Some(v) = update.build_task {
            self.build_task = Some(v);
        }
        if let Some(v) = update.match_report {
            self.match_report = Some(v);
        }
        if let Some(v) = update.selected_keywords {
            self.selected_keywords = v;
        }
        if let Some(v) = update.custom_keywords {
            self.custom_keywords = v;
        }
        if let Some(v) = update.gate_choice {
            self.gate_choice = Some(v);
        }
        if let Some(v) = update.resume_data {
            self.resume_data = Some(v);
        }
        if let Some(v) = update.download_url {
            self.download_url = Some(v);
        }
    }

    /// Union of selected and custom keywords for the build request,
    /// deduplicated while preserving selection order.
    pub fn keyword_union(&self) -> Vec<String> {
        let mut union: Vec<String> = Vec::new();
        for kw in self.selected_keywords.iter().chain(&self.custom_keywords) {
            if !union.iter().any(|existing| existing == kw) {
                union.push(kw.clone());
            }
        }
        union
    }
}

/// A partial update to [`WizardState`]. `None` means "leave untouched".
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    pub paid_user: Option<bool>,
    pub source: Option<ResumeSource>,
    pub job_description: Option<String>,
    pub direct_keywords: Option<String>,
    pub match_task: Option<TaskId>,
    pub build_task: Option<TaskId>,
    pub match_report: Option<MatchScoreReport>,
    pub selected_keywords: Option<Vec<String>>,
    pub custom_keywords: Option<Vec<String>>,
    pub gate_choice: Option<GateChoice>,
    pub resume_data: Option<serde_json::Value>,
    pub download_url: Option<String>,
}
