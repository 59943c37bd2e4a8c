//! Conversation engine — walks the cursor through the step table.
//!
//! The engine owns the [`SessionRecord`] outright: one mutator, no sharing.
//! Collaborators (responder, tagger, event sink, snapshot store) sit behind
//! traits so the flow logic stays testable without I/O.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;

use crate::analysis::{InputAnalysis, InputTagger, Intent, KeywordTagger, Sentiment};
use crate::config::AssistantConfig;
use crate::events::{ChatEvent, EventSink, NullSink, ShareChannel};
use crate::phrases;
use crate::responder::Responder;
use crate::script::{Answer, Rejected, Script, Step};
use crate::session::SessionRecord;
use crate::store::{MemoryStore, SnapshotStore};

/// Phrases that count as declining the readiness check. Only checked at the
/// first step; later on these are ordinary input.
const DECLINE_PHRASES: &[&str] = &["no", "not interested", "maybe later", "not now", "not ready"];

const DEFAULT_ERROR: &str = "Sorry, I didn't catch that. Could you try again?";

/// What the engine produced for one user input.
#[derive(Debug, Clone)]
pub struct EngineReply {
    /// Bot turns to show, in order. Empty when the flow has stalled at the
    /// terminal step.
    pub messages: Vec<String>,
    /// Simulated typing delay the channel should apply before showing the
    /// reply. Purely a UX affordance; applying it is the channel's job so
    /// that tearing the channel down cancels the timer.
    pub typing_delay: Duration,
    /// Scheduling link to surface, when the consultation offer was accepted.
    pub open_url: Option<String>,
    /// Whether the terminal step has been reached.
    pub done: bool,
}

/// Sequence walker over the conversation script.
pub struct ConversationEngine {
    record: SessionRecord,
    script: Script,
    cursor: usize,
    /// Step armed by the decline interception, logically sitting right after
    /// the first step. Consumed once on the way through.
    pending: Option<Step>,
    at_pending: bool,
    completion_fired: bool,
    responder: Option<Arc<dyn Responder>>,
    tagger: Arc<dyn InputTagger>,
    events: Arc<dyn EventSink>,
    store: Arc<dyn SnapshotStore>,
    config: AssistantConfig,
}

impl ConversationEngine {
    pub fn new(script: Script, config: AssistantConfig) -> Self {
        let record = SessionRecord::new(&config.lead_source);
        Self {
            record,
            script,
            cursor: 0,
            pending: None,
            at_pending: false,
            completion_fired: false,
            responder: None,
            tagger: Arc::new(KeywordTagger),
            events: Arc::new(NullSink),
            store: Arc::new(MemoryStore::new()),
            config,
        }
    }

    pub fn with_responder(mut self, responder: Arc<dyn Responder>) -> Self {
        self.responder = Some(responder);
        self
    }

    pub fn with_tagger(mut self, tagger: Arc<dyn InputTagger>) -> Self {
        self.tagger = tagger;
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.store = store;
        self
    }

    pub fn record(&self) -> &SessionRecord {
        &self.record
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether the decline step is armed but not yet reached.
    pub fn has_pending_step(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_done(&self) -> bool {
        self.completion_fired
    }

    /// Open the conversation: show the greeting and the readiness-check
    /// offer, and emit the start event.
    pub fn start(&mut self) -> EngineReply {
        let mut reply = self.empty_reply();
        if let Some(step) = self.script.get(0) {
            let mut messages = vec![step.prompt.to_string()];
            if let Some(follow_up) = step.follow_up {
                messages.push(follow_up.to_string());
            }
            for message in &messages {
                self.record.record_bot_turn(message);
            }
            reply.messages = messages;
        }
        self.events.emit(&ChatEvent::Start);
        reply
    }

    /// Process one user input and produce the bot's side of the exchange.
    pub async fn handle_input(&mut self, input: &str) -> EngineReply {
        let mut reply = self.empty_reply();

        let prev_intent = self.record.last_intent();
        let gap = self.record.touch(Utc::now());
        let analysis = self.tagger.analyze(input);
        let prefix = self.compose_prefix(&analysis, prev_intent, gap);

        self.record.record_user_turn(input);
        self.record.record_response(input, analysis);

        // Decline interception, first step only. The cursor does not move;
        // instead the lead-capture step is armed for the next advance.
        if self.cursor == 0 && !self.at_pending && is_decline(input) {
            self.events.emit(&ChatEvent::Declined);
            let fallback = phrases::pick(phrases::LEAD_CONVERSION);
            let text = self
                .ask_responder(DECLINE_INSTRUCTION, &fallback)
                .await;
            self.push_bot(&mut reply, format!("{prefix}{text}"));
            if self.pending.is_none() {
                self.pending = Some(Script::lead_capture_step());
            }
            return reply;
        }

        let Some(step) = self.current_step() else {
            return reply;
        };

        if let Some(validator) = step.validator {
            match validator.apply(input, &mut self.record) {
                Err(Rejected) => {
                    let fallback = step.error.unwrap_or(DEFAULT_ERROR);
                    let instruction = error_instruction(input);
                    let text = self.ask_responder(&instruction, fallback).await;
                    self.push_bot(&mut reply, format!("{prefix}{text}"));
                    return reply;
                }
                Ok(answer) => self.apply_answer(answer, &mut reply),
            }
        }

        if step.follow_up.is_some() {
            self.advance();
            let fallback = self.current_prompt();
            let instruction = next_question_instruction(&self.record);
            let text = self.ask_responder(&instruction, &fallback).await;
            self.push_bot(&mut reply, format!("{prefix}{text}"));
        } else if self.can_advance() {
            self.advance();
            let fallback = self.current_prompt();
            let instruction = step_response_instruction(&self.record);
            let text = self.ask_responder(&instruction, &fallback).await;
            self.push_bot(&mut reply, format!("{prefix}{text}"));

            // Completion hook fires exactly once, on first arrival at the
            // terminal step.
            if !self.completion_fired {
                if let Some(current) = self.current_step() {
                    if current.completes_flow {
                        self.fire_completion();
                    }
                }
            }
        }
        // Already at the terminal step with nothing to add: no bot turn.

        reply.done = self.completion_fired;
        reply
    }

    /// Record a social-share action. Link construction and opening belong to
    /// the channel; the engine only emits the event.
    pub fn share(&self, channel: ShareChannel) {
        self.events.emit(&ChatEvent::Shared { channel });
    }

    fn empty_reply(&self) -> EngineReply {
        EngineReply {
            messages: Vec::new(),
            typing_delay: self.typing_delay(),
            open_url: None,
            done: self.completion_fired,
        }
    }

    fn push_bot(&mut self, reply: &mut EngineReply, message: String) {
        self.record.record_bot_turn(&message);
        reply.messages.push(message);
    }

    fn current_step(&self) -> Option<Step> {
        if self.at_pending {
            self.pending.clone()
        } else {
            self.script.get(self.cursor).cloned()
        }
    }

    fn current_prompt(&self) -> String {
        self.current_step()
            .map(|s| s.prompt.to_string())
            .unwrap_or_default()
    }

    fn can_advance(&self) -> bool {
        if self.at_pending {
            return true;
        }
        if self.cursor == 0 && self.pending.is_some() {
            return true;
        }
        self.cursor < self.script.last_index()
    }

    fn advance(&mut self) {
        if self.at_pending {
            // Leaving the inserted step: consume it and rejoin the table.
            self.at_pending = false;
            self.pending = None;
            self.cursor += 1;
        } else if self.cursor == 0 && self.pending.is_some() {
            self.at_pending = true;
        } else if self.cursor < self.script.last_index() {
            self.cursor += 1;
        }
    }

    fn compose_prefix(
        &self,
        analysis: &InputAnalysis,
        prev_intent: Option<Intent>,
        gap: chrono::Duration,
    ) -> String {
        let mut prefix = String::new();
        let away = gap.to_std().map(|g| g > self.config.away_gap).unwrap_or(false);
        if away {
            prefix.push_str(phrases::WELCOME_BACK);
        }
        if analysis.sentiment == Sentiment::Positive {
            prefix.push_str(&phrases::pick(phrases::ENCOURAGEMENTS));
            prefix.push(' ');
        }
        if prev_intent == Some(Intent::Help) && analysis.intent == Intent::Buy {
            prefix.push_str(phrases::HELP_TO_BUY);
        }
        prefix
    }

    fn apply_answer(&mut self, answer: Answer, reply: &mut EngineReply) {
        match answer {
            Answer::Recorded { field, value } => {
                self.events.emit(&ChatEvent::StepAnswered { field, value });
            }
            Answer::Skipped { field } => {
                self.events.emit(&ChatEvent::StepSkipped { field });
            }
            Answer::LeadCaptured { email } => {
                self.persist_snapshot();
                self.events.emit(&ChatEvent::LeadConverted { email });
            }
            Answer::Scheduled => {
                reply.open_url = Some(self.config.scheduling_url.clone());
                self.events.emit(&ChatEvent::ConsultationScheduled);
            }
            Answer::Passed => {
                self.events.emit(&ChatEvent::ConsultationDeclined);
            }
        }
    }

    fn fire_completion(&mut self) {
        self.completion_fired = true;
        self.persist_snapshot();
        self.events.emit(&ChatEvent::CompleteCheck {
            is_first_time_buyer: self.record.is_first_time_buyer,
            has_pre_approval: self.record.has_pre_approval,
            timeline: self.record.timeline.clone(),
        });
        self.events.emit(&ChatEvent::ProvideContact {
            has_email: self.record.email.is_some(),
            has_phone: self.record.phone.is_some(),
        });
    }

    fn persist_snapshot(&self) {
        if let Err(e) = self.store.save(&self.record) {
            tracing::warn!(error = %e, "failed to persist session snapshot");
        }
    }

    /// Ask the responder, falling back to static text on any failure. The
    /// call is awaited before the engine does anything else, so there is at
    /// most one in flight per session.
    async fn ask_responder(&self, instruction: &str, fallback: &str) -> String {
        let Some(responder) = self.responder.as_ref() else {
            return fallback.to_string();
        };
        let call = responder.respond(instruction, &self.record.conversation_context);
        match tokio::time::timeout(self.config.responder_timeout, call).await {
            Ok(Ok(text)) if !text.trim().is_empty() => text,
            Ok(Ok(_)) => fallback.to_string(),
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "responder unavailable, using static text");
                fallback.to_string()
            }
            Err(_) => {
                tracing::debug!("responder timed out, using static text");
                fallback.to_string()
            }
        }
    }

    fn typing_delay(&self) -> Duration {
        let jitter_ms = self.config.typing_delay_jitter.as_millis() as u64;
        let extra = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..jitter_ms)
        };
        self.config.typing_delay_floor + Duration::from_millis(extra)
    }
}

fn is_decline(input: &str) -> bool {
    let lowered = input.to_lowercase();
    DECLINE_PHRASES.iter().any(|phrase| lowered.contains(phrase))
}

const DECLINE_INSTRUCTION: &str = "User said they're not interested in the assessment right \
    now. Generate a friendly, non-pushy response that offers helpful resources.";

fn error_instruction(input: &str) -> String {
    format!("User provided invalid input: \"{input}\". Generate a friendly, helpful error message.")
}

fn next_question_instruction(record: &SessionRecord) -> String {
    format!(
        "Generate the next question in the mortgage assessment flow, considering the \
         user's previous responses: {}",
        serde_json::to_string(record).unwrap_or_default()
    )
}

fn step_response_instruction(record: &SessionRecord) -> String {
    format!(
        "Generate a response for the next step in the conversation, considering the \
         user's previous responses: {}",
        serde_json::to_string(record).unwrap_or_default()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::events::RecordingSink;
    use crate::session::Turn;
    use async_trait::async_trait;

    struct CannedResponder(&'static str);

    #[async_trait]
    impl Responder for CannedResponder {
        async fn respond(&self, _: &str, _: &[Turn]) -> Result<String, LlmError> {
            Ok(self.0.to_string())
        }
    }

    struct UnavailableResponder;

    #[async_trait]
    impl Responder for UnavailableResponder {
        async fn respond(&self, _: &str, _: &[Turn]) -> Result<String, LlmError> {
            Err(LlmError::Timeout)
        }
    }

    fn engine() -> ConversationEngine {
        ConversationEngine::new(Script::standard(), AssistantConfig::default())
    }

    #[test]
    fn start_shows_greeting_and_offer() {
        let mut e = engine();
        let reply = e.start();
        assert_eq!(reply.messages.len(), 2);
        assert!(reply.messages[0].contains("mortgage assistant"));
        assert!(reply.messages[1].contains("Home Readiness Check"));
        assert_eq!(e.record().conversation_context.len(), 2);
    }

    #[tokio::test]
    async fn valid_input_advances_and_shows_next_prompt() {
        let mut e = engine();
        e.start();
        let reply = e.handle_input("sure, let's do it").await;
        assert_eq!(e.cursor(), 1);
        assert_eq!(reply.messages.len(), 1);
        assert!(reply.messages[0].contains("first-time home buyer"));
    }

    #[tokio::test]
    async fn invalid_input_keeps_cursor_and_field() {
        let mut e = engine();
        e.start();
        e.handle_input("ok").await; // now at the first-time-buyer step
        let reply = e.handle_input("maybe").await;
        assert_eq!(e.cursor(), 1);
        assert!(e.record().is_first_time_buyer.is_none());
        assert_eq!(reply.messages[0], "Please answer with 'yes' or 'no'.");
    }

    #[tokio::test]
    async fn decline_at_first_step_arms_pending_step() {
        let sink = Arc::new(RecordingSink::new());
        let mut e = engine().with_events(sink.clone());
        e.start();

        let reply = e.handle_input("not interested").await;
        assert_eq!(e.cursor(), 0, "cursor must not move on decline");
        assert!(e.has_pending_step());
        assert_eq!(reply.messages.len(), 1);
        assert!(sink.names().contains(&"declined"));

        // A second decline does not stack another step.
        e.handle_input("not now").await;
        assert!(e.has_pending_step());
        assert_eq!(e.cursor(), 0);
    }

    #[tokio::test]
    async fn pending_step_captures_lead_email() {
        let store = Arc::new(MemoryStore::new());
        let sink = Arc::new(RecordingSink::new());
        let mut e = engine().with_store(store.clone()).with_events(sink.clone());
        e.start();

        e.handle_input("not interested").await;
        // Any non-decline input moves into the inserted step.
        let reply = e.handle_input("ok sure").await;
        assert!(reply.messages[0].contains("email address"));
        assert_eq!(e.cursor(), 0, "cursor holds while on the inserted step");

        let reply = e.handle_input("lead@example.com").await;
        assert!(e.record().is_lead);
        assert_eq!(
            e.record().lead_status,
            crate::session::LeadStatus::Converted
        );
        assert!(store.snapshot().unwrap().is_lead);
        assert!(sink.names().contains(&"lead_converted"));
        // Flow rejoins the table at the first question step.
        assert_eq!(e.cursor(), 1);
        assert!(!e.has_pending_step());
        assert!(reply.messages[0].contains("first-time home buyer"));
    }

    #[tokio::test]
    async fn decline_past_first_step_is_ordinary_input() {
        let mut e = engine();
        e.start();
        e.handle_input("ok").await;
        e.handle_input("yes").await;
        e.handle_input("no").await;
        e.handle_input("not ready, maybe next year").await; // timeline free text
        assert!(!e.has_pending_step());
        assert_eq!(
            e.record().timeline.as_deref(),
            Some("not ready, maybe next year")
        );
    }

    #[tokio::test]
    async fn responder_overrides_static_text() {
        let mut e = engine().with_responder(Arc::new(CannedResponder("Custom question?")));
        e.start();
        let reply = e.handle_input("ok").await;
        assert_eq!(reply.messages[0], "Custom question?");
    }

    #[tokio::test]
    async fn unavailable_responder_degrades_silently() {
        let mut e = engine().with_responder(Arc::new(UnavailableResponder));
        e.start();
        let reply = e.handle_input("ok").await;
        assert!(reply.messages[0].contains("first-time home buyer"));
    }

    #[tokio::test]
    async fn empty_responder_reply_falls_back() {
        let mut e = engine().with_responder(Arc::new(CannedResponder("   ")));
        e.start();
        let reply = e.handle_input("ok").await;
        assert!(reply.messages[0].contains("first-time home buyer"));
    }

    #[tokio::test]
    async fn transcript_grows_one_entry_per_turn() {
        let mut e = engine();
        e.start(); // 2 bot turns
        e.handle_input("ok").await; // +1 user, +1 bot
        e.handle_input("maybe").await; // +1 user, +1 bot (error)
        assert_eq!(e.record().conversation_context.len(), 6);
        assert_eq!(e.record().previous_responses.len(), 2);
    }

    #[tokio::test]
    async fn yes_wins_over_no_in_same_message() {
        let mut e = engine();
        e.start();
        e.handle_input("ok").await;
        e.handle_input("well, yes and no").await;
        assert_eq!(e.record().is_first_time_buyer, Some(true));
    }

    #[tokio::test]
    async fn positive_sentiment_prepends_encouragement() {
        let mut e = engine();
        e.start();
        let reply = e.handle_input("that sounds great").await;
        let message = &reply.messages[0];
        assert!(
            phrases::ENCOURAGEMENTS.iter().any(|p| message.contains(p)),
            "expected an encouragement line in {message:?}"
        );
        assert!(message.contains("first-time home buyer"));
    }

    #[tokio::test]
    async fn help_then_buy_adds_contextual_line() {
        let mut e = engine();
        e.start();
        e.handle_input("can you help me figure this out").await;
        // Invalid yes/no answer, so the static error text follows the prefix.
        let reply = e.handle_input("I want to buy a house").await;
        assert!(reply.messages[0].starts_with(phrases::HELP_TO_BUY));
        assert!(reply.messages[0].ends_with("Please answer with 'yes' or 'no'."));
    }

    #[tokio::test]
    async fn idle_gap_prepends_welcome_back() {
        // A zero gap threshold makes every pause count as being away.
        let config = AssistantConfig {
            away_gap: Duration::ZERO,
            ..AssistantConfig::default()
        };
        let mut e = ConversationEngine::new(Script::standard(), config);
        e.start();
        let reply = e.handle_input("hello there").await;
        assert!(reply.messages[0].starts_with(phrases::WELCOME_BACK));
    }

    #[tokio::test]
    async fn no_prefix_on_neutral_input() {
        let mut e = engine();
        e.start();
        let reply = e.handle_input("ok then").await;
        assert!(reply.messages[0].starts_with("Great! Let's get started"));
    }

    #[test]
    fn share_emits_channel_event() {
        let sink = Arc::new(RecordingSink::new());
        let e = engine().with_events(sink.clone());
        e.share(ShareChannel::Instagram);
        let events = sink.events();
        assert_eq!(
            events[0],
            ChatEvent::Shared {
                channel: ShareChannel::Instagram
            }
        );
    }

    #[tokio::test]
    async fn typing_delay_stays_within_configured_bounds() {
        let mut e = engine();
        e.start();
        for _ in 0..10 {
            let reply = e.handle_input("hello").await;
            assert!(reply.typing_delay >= Duration::from_secs(1));
            assert!(reply.typing_delay < Duration::from_secs(2));
        }
    }
}
