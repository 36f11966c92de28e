//! Prompt texts for each step of the intake script.

use cyberguard_report_models::BullyingType;
use serde::Serialize;

use crate::IntakeStep;

/// What kind of answer a prompt is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Expectation {
    /// Free text; `optional` answers may be blank.
    Text {
        /// Whether a blank answer is accepted.
        optional: bool,
    },
    /// A location from the map picker, not text.
    Location,
    /// Nothing; the conversation is over.
    Nothing,
}

/// A question to show the reporter. Pure data; rendering is up to the
/// caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    /// Step this prompt belongs to.
    pub step: IntakeStep,
    /// Message text.
    pub text: &'static str,
    /// Suggested answers to offer as buttons, if any.
    pub options: Vec<&'static str>,
    /// Shape of the expected answer.
    pub expects: Expectation,
}

pub(crate) const ANONYMOUS_CHOICE: &str = "Yes, keep me anonymous";
pub(crate) const NAMED_CHOICE: &str = "No, I'll provide my name";

const GREETING: &str = "Hi! I'm Billy, your friendly anti-bullying assistant. I'm here to help \
     you report cyberbullying incidents safely and anonymously. Would you like to remain \
     anonymous?";

/// Returns the prompt for `step`. `is_anonymous` only matters at
/// [`IntakeStep::Identity`].
#[must_use]
pub fn prompt_for(step: IntakeStep, is_anonymous: bool) -> Prompt {
    let text_prompt = |text, optional| Prompt {
        step,
        text,
        options: Vec::new(),
        expects: Expectation::Text { optional },
    };

    match step {
        IntakeStep::Anonymity => Prompt {
            options: vec![ANONYMOUS_CHOICE, NAMED_CHOICE],
            ..text_prompt(GREETING, false)
        },
        IntakeStep::Identity if is_anonymous => text_prompt(
            "I understand. Your identity will be kept anonymous. What's your age?",
            false,
        ),
        IntakeStep::Identity => text_prompt("Thank you for your trust. What's your name?", false),
        IntakeStep::Age => text_prompt("Thank you. What's your age?", false),
        IntakeStep::Location => Prompt {
            step,
            text: "Please select your location on the map:",
            options: Vec::new(),
            expects: Expectation::Location,
        },
        IntakeStep::BullyingType => Prompt {
            options: BullyingType::all().iter().map(|ty| bullying_label(*ty)).collect(),
            ..text_prompt("What type of cyberbullying are you experiencing?", false)
        },
        IntakeStep::Platform => text_prompt(
            "On which platform did this occur? (e.g., Instagram, Facebook, WhatsApp)",
            false,
        ),
        IntakeStep::Username => text_prompt(
            "Do you know the username or profile of the person? If yes, please share it \
             (it's okay if you don't)",
            true,
        ),
        IntakeStep::Evidence => text_prompt(
            "Do you have any evidence like screenshots or links? Please share them:",
            true,
        ),
        IntakeStep::Complete => Prompt {
            step,
            text: "Thank you for your report. It has been submitted and will be reviewed by our \
                   team. Would you like to learn about some safety measures you can take?",
            options: vec!["Yes, show me safety tips", "No, thank you"],
            expects: Expectation::Nothing,
        },
    }
}

const fn bullying_label(ty: BullyingType) -> &'static str {
    match ty {
        BullyingType::Harassment => "Harassment",
        BullyingType::Cyberstalking => "Cyberstalking",
        BullyingType::Impersonation => "Impersonation",
        BullyingType::HateSpeech => "Hate Speech",
        BullyingType::Threats => "Threats",
        BullyingType::Other => "Other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_prompt_depends_on_anonymity() {
        assert!(prompt_for(IntakeStep::Identity, true).text.contains("age"));
        assert!(prompt_for(IntakeStep::Identity, false).text.contains("name"));
    }

    #[test]
    fn bullying_options_parse_back() {
        let prompt = prompt_for(IntakeStep::BullyingType, false);
        assert_eq!(prompt.options.len(), BullyingType::all().len());
        for option in prompt.options {
            assert!(option.parse::<BullyingType>().is_ok(), "{option} does not parse");
        }
    }

    #[test]
    fn location_prompt_expects_picker() {
        assert_eq!(
            prompt_for(IntakeStep::Location, true).expects,
            Expectation::Location
        );
    }
}
