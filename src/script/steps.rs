//! The ordered step table driving the conversation.
//!
//! Steps are read-only template data. The one runtime mutation from the
//! original design — splicing a lead-capture step in after a decline — is
//! modeled by the engine as a pending-step slot rather than editing this
//! table in place.

use super::validators::{EmailCapture, TextField, Validator, YesNoField};

/// One entry in the conversation script.
#[derive(Debug, Clone)]
pub struct Step {
    /// Static prompt shown when this step becomes current (responder may
    /// override it).
    pub prompt: &'static str,
    pub validator: Option<Validator>,
    /// Static error shown on validation failure.
    pub error: Option<&'static str>,
    /// Immediate follow-up prompt; shown right after `prompt` when the
    /// conversation opens on this step.
    pub follow_up: Option<&'static str>,
    /// Marks the terminal step whose completion hook fires on first arrival.
    pub completes_flow: bool,
}

impl Step {
    fn ask(prompt: &'static str) -> Self {
        Self {
            prompt,
            validator: None,
            error: None,
            follow_up: None,
            completes_flow: false,
        }
    }

    fn with_validator(mut self, validator: Validator, error: &'static str) -> Self {
        self.validator = Some(validator);
        self.error = Some(error);
        self
    }
}

/// The ordered conversation script.
#[derive(Debug, Clone)]
pub struct Script {
    steps: Vec<Step>,
}

impl Script {
    /// The standard mortgage readiness check flow.
    pub fn standard() -> Self {
        let mut greeting = Step::ask(
            "Hi there! 👋 I'm your friendly mortgage assistant. How can I help you today?",
        );
        greeting.follow_up =
            Some("Would you like to do a quick Home Readiness Check? It only takes a few minutes!");

        let mut closing = Step::ask(
            "Thank you for chatting with me! I've saved your information and someone \
             from our team will be in touch soon. Have a great day! 😊",
        );
        closing.completes_flow = true;

        Self {
            steps: vec![
                greeting,
                Step::ask(
                    "Great! Let's get started with a few quick questions. \
                     Are you a first-time home buyer?",
                )
                .with_validator(
                    Validator::YesNo(YesNoField::FirstTimeBuyer),
                    "Please answer with 'yes' or 'no'.",
                ),
                Step::ask("Have you already been pre-approved for a mortgage?").with_validator(
                    Validator::YesNo(YesNoField::PreApproval),
                    "Please answer with 'yes' or 'no'.",
                ),
                Step::ask(
                    "What's your timeline for buying a home? \
                     (e.g., within 6 months, 1 year, etc.)",
                )
                .with_validator(
                    Validator::NonEmpty(TextField::Timeline),
                    "Please provide your timeline.",
                ),
                Step::ask("Could you please share your full name?").with_validator(
                    Validator::NonEmpty(TextField::FullName),
                    "Please provide your full name.",
                ),
                Step::ask("What's the best email address to reach you?").with_validator(
                    Validator::Email(EmailCapture::Contact),
                    "Please provide a valid email address.",
                ),
                Step::ask("Would you like to share your phone number? (optional)")
                    .with_validator(
                        Validator::Phone,
                        "Please provide a valid phone number or leave it blank.",
                    ),
                {
                    // Always passes; no error text needed.
                    let mut offer = Step::ask(
                        "Thank you for sharing your information! Would you like to schedule \
                         a free 15-minute consultation with one of our mortgage experts?",
                    );
                    offer.validator = Some(Validator::ConsultationOffer);
                    offer
                },
                closing,
            ],
        }
    }

    /// The step armed after an up-front decline: asks for an email and
    /// converts the session to a lead on success.
    pub fn lead_capture_step() -> Step {
        Step::ask(
            "If you'd like, I can send you some helpful resources about mortgages and \
             home buying. Just share your email address, and I'll make sure you get \
             the most relevant information.",
        )
        .with_validator(
            Validator::Email(EmailCapture::Lead),
            "Please provide a valid email address.",
        )
    }

    pub fn get(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }
}
