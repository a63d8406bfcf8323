//! Wizard stage machine — which step is active and where it can go.
//!
//! Two flow variants share the terminal stages: the job-description
//! flow visits `ResumeIntake → KeywordReview → (UpgradeGate) →
//! Delivery`, the direct-keyword flow skips the review and goes
//! `ResumeIntake → (UpgradeGate) → Delivery`. The gate is inserted only
//! for unpaid users, and is never re-entered when navigating backward.

use serde::{Deserialize, Serialize};

/// The two flow variants. Selectable only at the first stage, locked
/// thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    /// Paste a job description, review the match report, pick keywords.
    #[default]
    JobDescription,
    /// Supply the keyword list directly, skipping match scoring.
    DirectKeywords,
}

impl std::fmt::Display for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::JobDescription => "job_description",
            Self::DirectKeywords => "direct_keywords",
        };
        write!(f, "{s}")
    }
}

/// One discrete step of the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Gather the resume source, and the job description or keyword list.
    ResumeIntake,
    /// Match report + keyword selection (job-description flow only).
    KeywordReview,
    /// Paid-tier gate, entered iff the tier flag is false.
    UpgradeGate,
    /// Poll the build, assemble the document, expose the download.
    Delivery,
}

impl Stage {
    /// The next stage when the current one completes, given the flow
    /// and the tier flag at the moment of completion.
    pub fn next(self, flow: Flow, paid: bool) -> Option<Stage> {
        use Stage::*;
        match (flow, self) {
            (Flow::JobDescription, ResumeIntake) => Some(KeywordReview),
            (Flow::JobDescription, KeywordReview) => {
                Some(if paid { Delivery } else { UpgradeGate })
            }
            (Flow::DirectKeywords, ResumeIntake) => Some(if paid { Delivery } else { UpgradeGate }),
            (Flow::DirectKeywords, KeywordReview) => None,
            (_, UpgradeGate) => Some(Delivery),
            (_, Delivery) => None,
        }
    }

    /// The stage backward navigation lands on. Mirrors `next`, except
    /// the gate is skipped on the way back.
    pub fn prev(self, flow: Flow) -> Option<Stage> {
        use Stage::*;
        match (flow, self) {
            (_, ResumeIntake) => None,
            (Flow::JobDescription, KeywordReview) => Some(ResumeIntake),
            (Flow::JobDescription, UpgradeGate) => Some(KeywordReview),
            (Flow::JobDescription, Delivery) => Some(KeywordReview),
            (Flow::DirectKeywords, UpgradeGate) => Some(ResumeIntake),
            (Flow::DirectKeywords, Delivery) => Some(ResumeIntake),
            (Flow::DirectKeywords, KeywordReview) => None,
        }
    }

    /// Whether this stage exists at all in the given flow.
    pub fn active_in(self, flow: Flow) -> bool {
        !(flow == Flow::DirectKeywords && self == Stage::KeywordReview)
    }

    /// Whether this is the terminal stage.
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Delivery)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ResumeIntake => "resume_intake",
            Self::KeywordReview => "keyword_review",
            Self::UpgradeGate => "upgrade_gate",
            Self::Delivery => "delivery",
        };
        write!(f, "{s}")
    }
}
