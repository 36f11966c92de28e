//! Session driver around the pure transition function.

use async_trait::async_trait;
use cyberguard_report_models::{Location, NewReport};

use crate::{ConversationState, Effect, Input, IntakeStep, Prompt, ValidationError, transition};

/// Receives the finalized report at the end of an intake session.
///
/// The sink assigns the report's id and timestamp. Its `Receipt` is handed
/// back to the caller unchanged, so a sink can report whatever follow-up
/// it performed (for example an escalation check).
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    /// What a successful submission returns.
    type Receipt: Send;

    /// Why a submission failed.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persists one finalized report.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] only if the report was not stored. The
    /// engine keeps the session open after an error, so anything that
    /// fails once the report is persisted belongs in the receipt.
    async fn submit(&self, report: NewReport) -> Result<Self::Receipt, Self::Error>;
}

/// Outcome of feeding one answer to a [`ConversationEngine`].
#[derive(Debug)]
pub enum Turn<R> {
    /// The answer was accepted; ask this next.
    Prompt(Prompt),
    /// The answer was declined; ask the same question again.
    Rejected {
        /// Why the answer was declined.
        reason: ValidationError,
        /// The re-issued prompt.
        prompt: Prompt,
    },
    /// The report was stored. Only ever returned once per session.
    Submitted {
        /// What the sink returned.
        receipt: R,
        /// Closing message.
        prompt: Prompt,
    },
    /// The conversation is over; the answer was dropped.
    Ignored,
}

/// Drives one reporter's intake session.
///
/// Owns the [`ConversationState`] exclusively. When the last answer
/// arrives the finalized report goes to the sink; if the sink fails the
/// session stays on the evidence step so the caller can tell the failure
/// apart from success and retry.
pub struct ConversationEngine<S> {
    sink: S,
    state: ConversationState,
}

impl<S: SubmissionSink> ConversationEngine<S> {
    /// Starts an anonymous-by-default session with no signed-in user.
    #[must_use]
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            state: ConversationState::default(),
        }
    }

    /// Starts a session attributed to `user_id`.
    #[must_use]
    pub fn for_user(sink: S, user_id: impl Into<String>) -> Self {
        Self {
            sink,
            state: ConversationState::new(Some(user_id.into())),
        }
    }

    /// The question currently awaiting an answer.
    #[must_use]
    pub fn prompt(&self) -> Prompt {
        self.state.prompt()
    }

    /// Current step.
    #[must_use]
    pub const fn step(&self) -> IntakeStep {
        self.state.step()
    }

    /// Read-only view of the session state.
    #[must_use]
    pub const fn state(&self) -> &ConversationState {
        &self.state
    }

    /// Whether the report has been submitted.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.state.step().is_terminal()
    }

    /// Discards the current session and starts over for the same user.
    /// Returns the opening prompt.
    pub fn restart(&mut self) -> Prompt {
        let user_id = self.state.user_id().map(str::to_string);
        self.state = ConversationState::new(user_id);
        self.state.prompt()
    }

    /// Feeds a text answer.
    ///
    /// # Errors
    ///
    /// Returns the sink's error if this answer completed the report and
    /// storing it failed. Declined answers are not errors; they come back
    /// as [`Turn::Rejected`].
    pub async fn answer(&mut self, text: &str) -> Result<Turn<S::Receipt>, S::Error> {
        self.advance(Input::Text(text.to_string())).await
    }

    /// Feeds the location chosen in the map picker.
    ///
    /// # Errors
    ///
    /// Never fails in practice, since picking a location cannot finish the
    /// report; the signature matches [`Self::answer`].
    pub async fn select_location(
        &mut self,
        location: Location,
    ) -> Result<Turn<S::Receipt>, S::Error> {
        self.advance(Input::Location(location)).await
    }

    async fn advance(&mut self, input: Input) -> Result<Turn<S::Receipt>, S::Error> {
        let from = self.state.step();
        let next = transition(self.state.clone(), input);

        match next.effect {
            Effect::Prompt(prompt) => {
                log::debug!("Intake advanced from {from} to {}", next.state.step());
                self.state = next.state;
                Ok(Turn::Prompt(prompt))
            }
            Effect::Rejected { reason, prompt } => Ok(Turn::Rejected { reason, prompt }),
            Effect::Ignored => Ok(Turn::Ignored),
            Effect::Submit(report) => match self.sink.submit(report).await {
                Ok(receipt) => {
                    log::info!("Intake session submitted its report");
                    self.state = next.state;
                    Ok(Turn::Submitted {
                        receipt,
                        prompt: self.state.prompt(),
                    })
                }
                Err(e) => {
                    log::error!("Failed to submit intake report: {e}");
                    Err(e)
                }
            },
        }
    }
}
