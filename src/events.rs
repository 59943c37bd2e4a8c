//! Analytics event contract.
//!
//! The engine emits a bounded set of named events with flat payloads after
//! each state transition. Mapping them onto third-party pixel events, and
//! any transport, belongs to the sink implementation; the engine only makes
//! a fire-and-forget call and never observes success or failure.

use std::sync::Mutex;

use serde_json::{Map, Value};

/// Social channel a share action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareChannel {
    Facebook,
    Instagram,
    Tiktok,
}

impl ShareChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Facebook => "facebook",
            Self::Instagram => "instagram",
            Self::Tiktok => "tiktok",
        }
    }
}

/// Events the engine emits over the course of a conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// Conversation opened (the initial greeting was shown).
    Start,
    /// A validated step wrote a field.
    StepAnswered {
        field: &'static str,
        value: String,
    },
    /// An optional step was explicitly skipped.
    StepSkipped { field: &'static str },
    /// The visitor declined the readiness check at the first step.
    Declined,
    /// The inserted decline step captured an email.
    LeadConverted { email: String },
    ConsultationScheduled,
    ConsultationDeclined,
    /// The full check was completed (terminal step reached).
    CompleteCheck {
        is_first_time_buyer: Option<bool>,
        has_pre_approval: Option<bool>,
        timeline: Option<String>,
    },
    /// Contact details were captured by the end of the flow.
    ProvideContact { has_email: bool, has_phone: bool },
    /// A share action was taken.
    Shared { channel: ShareChannel },
}

impl ChatEvent {
    /// Stable event name for downstream mapping.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start_chat",
            Self::StepAnswered { .. } => "step_answered",
            Self::StepSkipped { .. } => "step_skipped",
            Self::Declined => "declined",
            Self::LeadConverted { .. } => "lead_converted",
            Self::ConsultationScheduled => "consultation_scheduled",
            Self::ConsultationDeclined => "consultation_declined",
            Self::CompleteCheck { .. } => "complete_check",
            Self::ProvideContact { .. } => "provide_contact",
            Self::Shared { .. } => "share_social",
        }
    }

    /// Flat key/value payload for downstream mapping.
    pub fn payload(&self) -> Map<String, Value> {
        let mut map = Map::new();
        match self {
            Self::Start
            | Self::Declined
            | Self::ConsultationScheduled
            | Self::ConsultationDeclined => {}
            Self::StepAnswered { field, value } => {
                map.insert("field".into(), Value::from(*field));
                map.insert("value".into(), Value::from(value.clone()));
            }
            Self::StepSkipped { field } => {
                map.insert("field".into(), Value::from(*field));
            }
            Self::LeadConverted { email } => {
                map.insert("email".into(), Value::from(email.clone()));
            }
            Self::CompleteCheck {
                is_first_time_buyer,
                has_pre_approval,
                timeline,
            } => {
                map.insert("is_first_time_buyer".into(), Value::from(*is_first_time_buyer));
                map.insert("has_pre_approval".into(), Value::from(*has_pre_approval));
                map.insert("timeline".into(), Value::from(timeline.clone()));
            }
            Self::ProvideContact {
                has_email,
                has_phone,
            } => {
                map.insert("has_email".into(), Value::from(*has_email));
                map.insert("has_phone".into(), Value::from(*has_phone));
            }
            Self::Shared { channel } => {
                map.insert("method".into(), Value::from(channel.as_str()));
            }
        }
        map
    }
}

/// Fire-and-forget event listener the engine calls after transitions.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &ChatEvent);
}

/// Sink that drops everything. Used when no listener is configured, so the
/// engine never has to check for one.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &ChatEvent) {}
}

/// Sink that logs each event through `tracing`.
#[derive(Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &ChatEvent) {
        // Bind outside the macro: bare `Value` inside `tracing::info!` would
        // resolve against the macro's own `Value` trait.
        let payload = Value::Object(event.payload());
        tracing::info!(event = event.name(), payload = %payload, "chat event");
    }
}

/// Test sink that records every emitted event.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ChatEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ChatEvent> {
        self.events.lock().expect("sink lock").clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(|e| e.name()).collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &ChatEvent) {
        self.events.lock().expect("sink lock").push(event.clone());
    }
}
