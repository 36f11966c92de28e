#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Guided incident intake.
//!
//! A reporter answers one question at a time; each answer is fed to
//! [`transition`], a pure function from the current [`ConversationState`]
//! to the next state plus a single [`Effect`]. [`ConversationEngine`] owns
//! the state for one session and hands the finalized report to a
//! [`SubmissionSink`] exactly once.
//!
//! The script branches only on the anonymity answer:
//!
//! ```text
//! Anonymity ─┬─ yes ─> Identity(age) ─────────────┐
//!            └─ no ──> Identity(name) ─> Age ─────┴─> Location ─> BullyingType
//!                 ─> Platform ─> Username ─> Evidence ─> Complete
//! ```

mod engine;
mod prompt;
mod severity;
mod state;

pub use engine::{ConversationEngine, SubmissionSink, Turn};
pub use prompt::{Expectation, Prompt, prompt_for};
pub use severity::{initial_severity, severity_for};
pub use state::{ConversationState, DraftReport, Effect, Input, Transition, transition};

use serde::Serialize;

/// Position in the intake script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IntakeStep {
    /// Asks whether the reporter wants to stay anonymous.
    Anonymity,
    /// Asks for the age (anonymous) or the name (named).
    Identity,
    /// Asks for the age on the named path.
    Age,
    /// Waits for the out-of-band location picker.
    Location,
    /// Asks for the bullying category.
    BullyingType,
    /// Asks for the platform.
    Platform,
    /// Asks for the perpetrator's username (optional).
    Username,
    /// Asks for evidence links (optional), then submits.
    Evidence,
    /// Report submitted; further input is ignored.
    Complete,
}

impl IntakeStep {
    /// Numeric step as shown to operators: `0..=6`, with both the age and
    /// location waits on step 2 and `-1` once complete.
    #[must_use]
    pub const fn index(self) -> i8 {
        match self {
            Self::Anonymity => 0,
            Self::Identity => 1,
            Self::Age | Self::Location => 2,
            Self::BullyingType => 3,
            Self::Platform => 4,
            Self::Username => 5,
            Self::Evidence => 6,
            Self::Complete => -1,
        }
    }

    /// Whether a blank answer is accepted at this step.
    #[must_use]
    pub const fn allows_blank(self) -> bool {
        matches!(self, Self::Username | Self::Evidence)
    }

    /// Whether this is the terminal step.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl std::fmt::Display for IntakeStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Anonymity => "anonymity",
            Self::Identity => "identity",
            Self::Age => "age",
            Self::Location => "location",
            Self::BullyingType => "bullying type",
            Self::Platform => "platform",
            Self::Username => "username",
            Self::Evidence => "evidence",
            Self::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// Why an answer was declined. The conversation stays on the same step
/// and re-issues the same prompt.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// A required answer was empty or whitespace.
    #[error("an answer is required for the {step} step")]
    Blank {
        /// The step that needed an answer.
        step: IntakeStep,
    },

    /// The age was not a whole number of years in range.
    #[error("'{0}' is not a valid age (expected a whole number from 1 to 120)")]
    InvalidAge(String),

    /// The bullying category is not one of the offered options.
    #[error("'{0}' is not a known type of cyberbullying")]
    UnknownBullyingType(String),

    /// Text arrived while the location picker was open.
    #[error("please pick a location on the map")]
    AwaitingLocation,

    /// A location arrived at a step that does not ask for one.
    #[error("a location was not requested at the {step} step")]
    UnexpectedLocation {
        /// The step that received the location.
        step: IntakeStep,
    },

    /// The picked location has unusable coordinates.
    #[error(transparent)]
    InvalidLocation(#[from] cyberguard_report_models::InvalidCoordinates),

    /// The draft was missing a field it should already have collected.
    #[error("the report draft is missing its {0}")]
    Incomplete(&'static str),
}
