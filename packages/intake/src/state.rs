//! Conversation state and the pure transition function.

use cyberguard_report_models::{
    BullyingType, Location, NewReport, PerpetratorInfo, ReportStatus, Reporter,
};

use crate::prompt::prompt_for;
use crate::severity::severity_for;
use crate::{IntakeStep, Prompt, ValidationError};

/// Oldest age accepted at intake.
const MAX_AGE: u8 = 120;

/// One answer fed into the conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// A typed or button answer.
    Text(String),
    /// A location chosen in the map picker.
    Location(Location),
}

/// Report fields collected so far. Fields fill in as steps complete and
/// are never cleared within a session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftReport {
    /// Reporter's name (named path only).
    pub name: Option<String>,
    /// Reporter's age.
    pub age: Option<u8>,
    /// Picked location.
    pub location: Option<Location>,
    /// Bullying category.
    pub bullying_type: Option<BullyingType>,
    /// Platform where it happened.
    pub platform: Option<String>,
    /// Perpetrator username; `None` when unknown.
    pub username: Option<String>,
    /// Evidence links, in the order given.
    pub evidence_links: Vec<String>,
}

impl DraftReport {
    fn finalize(
        &self,
        is_anonymous: bool,
        user_id: Option<String>,
    ) -> Result<NewReport, ValidationError> {
        let age = self.age.ok_or(ValidationError::Incomplete("age"))?;

        let reporter = if is_anonymous {
            Reporter::Anonymous { age }
        } else {
            Reporter::Named {
                name: self.name.clone().ok_or(ValidationError::Incomplete("name"))?,
                age,
            }
        };

        let perpetrator_info = PerpetratorInfo {
            platform: self
                .platform
                .clone()
                .ok_or(ValidationError::Incomplete("platform"))?,
            username: self.username.clone(),
            ..PerpetratorInfo::default()
        };

        let severity = severity_for(&perpetrator_info, &self.evidence_links);

        Ok(NewReport {
            user_id,
            reporter,
            location: self
                .location
                .clone()
                .ok_or(ValidationError::Incomplete("location"))?,
            bullying_type: self
                .bullying_type
                .ok_or(ValidationError::Incomplete("bullying type"))?,
            perpetrator_info,
            evidence_links: self.evidence_links.clone(),
            severity,
            status: ReportStatus::Pending,
        })
    }
}

/// Per-session intake state.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationState {
    step: IntakeStep,
    is_anonymous: bool,
    user_id: Option<String>,
    draft: DraftReport,
}

impl ConversationState {
    /// Fresh state at the anonymity question. `user_id` is attached to the
    /// finalized report.
    #[must_use]
    pub fn new(user_id: Option<String>) -> Self {
        Self {
            step: IntakeStep::Anonymity,
            is_anonymous: false,
            user_id,
            draft: DraftReport::default(),
        }
    }

    /// Current step.
    #[must_use]
    pub const fn step(&self) -> IntakeStep {
        self.step
    }

    /// Whether the reporter chose anonymity. Fixed after the first answer.
    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        self.is_anonymous
    }

    /// Fields collected so far.
    #[must_use]
    pub const fn draft(&self) -> &DraftReport {
        &self.draft
    }

    /// User the report will be attributed to.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// The question currently awaiting an answer.
    #[must_use]
    pub fn prompt(&self) -> Prompt {
        prompt_for(self.step, self.is_anonymous)
    }

    fn advance_to(mut self, step: IntakeStep) -> Transition {
        self.step = step;
        let prompt = self.prompt();
        Transition {
            state: self,
            effect: Effect::Prompt(prompt),
        }
    }

    fn reject(self, reason: ValidationError) -> Transition {
        log::debug!("Rejected answer at {} step: {reason}", self.step);
        let prompt = self.prompt();
        Transition {
            state: self,
            effect: Effect::Rejected { reason, prompt },
        }
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Show the next question.
    Prompt(Prompt),
    /// The answer was declined; show the same question again.
    Rejected {
        /// Why the answer was declined.
        reason: ValidationError,
        /// The unchanged prompt to re-issue.
        prompt: Prompt,
    },
    /// The draft is complete; persist this report.
    Submit(NewReport),
    /// The conversation is already over; nothing happens.
    Ignored,
}

/// Result of applying one [`Input`] to a [`ConversationState`].
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// State after the input.
    pub state: ConversationState,
    /// What the caller should do next.
    pub effect: Effect,
}

/// Applies one answer to the conversation.
///
/// Text is trimmed before use. On a declined answer the returned state is
/// the input state, unchanged. On the final answer the state moves to
/// [`IntakeStep::Complete`] and the effect carries the finalized report.
#[must_use]
pub fn transition(state: ConversationState, input: Input) -> Transition {
    match input {
        Input::Text(text) => answer(state, text.trim()),
        Input::Location(location) => pick_location(state, location),
    }
}

fn answer(mut state: ConversationState, text: &str) -> Transition {
    let step = state.step;

    match step {
        IntakeStep::Complete => Transition {
            state,
            effect: Effect::Ignored,
        },
        IntakeStep::Location => state.reject(ValidationError::AwaitingLocation),
        _ if text.is_empty() && !step.allows_blank() => {
            state.reject(ValidationError::Blank { step })
        }
        IntakeStep::Anonymity => {
            state.is_anonymous = text.to_lowercase().contains("yes");
            state.advance_to(IntakeStep::Identity)
        }
        IntakeStep::Identity if state.is_anonymous => match parse_age(text) {
            Ok(age) => {
                state.draft.age = Some(age);
                state.advance_to(IntakeStep::Location)
            }
            Err(e) => state.reject(e),
        },
        IntakeStep::Identity => {
            state.draft.name = Some(text.to_string());
            state.advance_to(IntakeStep::Age)
        }
        IntakeStep::Age => match parse_age(text) {
            Ok(age) => {
                state.draft.age = Some(age);
                state.advance_to(IntakeStep::Location)
            }
            Err(e) => state.reject(e),
        },
        IntakeStep::BullyingType => match text.parse::<BullyingType>() {
            Ok(ty) => {
                state.draft.bullying_type = Some(ty);
                state.advance_to(IntakeStep::Platform)
            }
            Err(_) => state.reject(ValidationError::UnknownBullyingType(text.to_string())),
        },
        IntakeStep::Platform => {
            state.draft.platform = Some(text.to_string());
            state.advance_to(IntakeStep::Username)
        }
        IntakeStep::Username => {
            state.draft.username = (!text.is_empty()).then(|| text.to_string());
            state.advance_to(IntakeStep::Evidence)
        }
        IntakeStep::Evidence => {
            let previous = state.clone();
            state.draft.evidence_links = split_evidence(text);

            match state.draft.finalize(state.is_anonymous, state.user_id.clone()) {
                Ok(report) => {
                    state.step = IntakeStep::Complete;
                    Transition {
                        state,
                        effect: Effect::Submit(report),
                    }
                }
                Err(e) => previous.reject(e),
            }
        }
    }
}

fn pick_location(mut state: ConversationState, location: Location) -> Transition {
    let step = state.step;

    if step.is_terminal() {
        return Transition {
            state,
            effect: Effect::Ignored,
        };
    }

    if step != IntakeStep::Location {
        return state.reject(ValidationError::UnexpectedLocation { step });
    }

    if let Err(e) = location.validate() {
        return state.reject(e.into());
    }

    state.draft.location = Some(location);
    state.advance_to(IntakeStep::BullyingType)
}

fn parse_age(text: &str) -> Result<u8, ValidationError> {
    text.parse::<u8>()
        .ok()
        .filter(|age| (1..=MAX_AGE).contains(age))
        .ok_or_else(|| ValidationError::InvalidAge(text.to_string()))
}

/// Splits an evidence answer into links on commas and newlines, dropping
/// blanks.
fn split_evidence(text: &str) -> Vec<String> {
    text.split([',', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
