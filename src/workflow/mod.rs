//! The step-sequenced wizard: stage machine, accumulated state, engine.

pub mod engine;
pub mod stage;
pub mod state;

pub use engine::{ResumeInput, StageFailure, WizardEngine};
pub use stage::{Flow, Stage};
pub use state::{GateChoice, StateUpdate, WizardState};
