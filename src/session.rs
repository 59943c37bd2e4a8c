//! Session record — everything collected from one visitor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::{Intent, InputAnalysis};

/// Lead follow-up status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Converted,
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Converted => write!(f, "converted"),
        }
    }
}

/// One user message plus its derived analysis. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEntry {
    pub input: String,
    pub analysis: InputAnalysis,
    pub timestamp: DateTime<Utc>,
}

/// One transcript entry, fed verbatim to the external responder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub content: String,
    pub is_user: bool,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(content: &str) -> Self {
        Self {
            content: content.to_string(),
            is_user: true,
            timestamp: Utc::now(),
        }
    }

    pub fn bot(content: &str) -> Self {
        Self {
            content: content.to_string(),
            is_user: false,
            timestamp: Utc::now(),
        }
    }
}

/// Everything collected during one conversation. Single mutator (the engine),
/// no cross-session sharing. Serialized as-is for the snapshot store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: Uuid,
    /// Tri-state: `None` = not asked yet.
    pub is_first_time_buyer: Option<bool>,
    /// Tri-state: `None` = not asked yet.
    pub has_pre_approval: Option<bool>,
    pub timeline: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_lead: bool,
    pub lead_status: LeadStatus,
    pub lead_source: String,
    /// Append-only; grows for the session's lifetime, never pruned.
    pub previous_responses: Vec<ResponseEntry>,
    /// Append-only transcript of user and bot turns.
    pub conversation_context: Vec<Turn>,
    pub last_interaction_time: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(lead_source: &str) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            is_first_time_buyer: None,
            has_pre_approval: None,
            timeline: None,
            full_name: None,
            email: None,
            phone: None,
            is_lead: false,
            lead_status: LeadStatus::New,
            lead_source: lead_source.to_string(),
            previous_responses: Vec::new(),
            conversation_context: Vec::new(),
            last_interaction_time: Utc::now(),
        }
    }

    /// Append a user turn to the transcript.
    pub fn record_user_turn(&mut self, content: &str) {
        self.conversation_context.push(Turn::user(content));
    }

    /// Append a bot turn to the transcript.
    pub fn record_bot_turn(&mut self, content: &str) {
        self.conversation_context.push(Turn::bot(content));
    }

    /// Append a user message plus its analysis to the response log.
    pub fn record_response(&mut self, input: &str, analysis: InputAnalysis) {
        self.previous_responses.push(ResponseEntry {
            input: input.to_string(),
            analysis,
            timestamp: Utc::now(),
        });
    }

    /// Update `last_interaction_time` to `now` and return the gap since the
    /// previous interaction.
    pub fn touch(&mut self, now: DateTime<Utc>) -> chrono::Duration {
        let gap = now - self.last_interaction_time;
        self.last_interaction_time = now;
        gap
    }

    /// Intent of the most recently logged response, if any.
    pub fn last_intent(&self) -> Option<Intent> {
        self.previous_responses.last().map(|r| r.analysis.intent)
    }

    /// Mark the session as a captured lead.
    pub fn convert_to_lead(&mut self) {
        self.is_lead = true;
        self.lead_status = LeadStatus::Converted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{InputTagger, KeywordTagger};

    #[test]
    fn new_record_has_everything_unset() {
        let r = SessionRecord::new("chat");
        assert!(r.is_first_time_buyer.is_none());
        assert!(r.has_pre_approval.is_none());
        assert!(r.timeline.is_none());
        assert!(r.full_name.is_none());
        assert!(r.email.is_none());
        assert!(r.phone.is_none());
        assert!(!r.is_lead);
        assert_eq!(r.lead_status, LeadStatus::New);
        assert_eq!(r.lead_source, "chat");
        assert!(r.previous_responses.is_empty());
        assert!(r.conversation_context.is_empty());
    }

    #[test]
    fn turns_append_in_order() {
        let mut r = SessionRecord::new("chat");
        r.record_bot_turn("hello");
        r.record_user_turn("hi");
        r.record_bot_turn("how can I help?");
        assert_eq!(r.conversation_context.len(), 3);
        assert!(!r.conversation_context[0].is_user);
        assert!(r.conversation_context[1].is_user);
        assert_eq!(r.conversation_context[1].content, "hi");
    }

    #[test]
    fn touch_reports_gap_and_updates() {
        let mut r = SessionRecord::new("chat");
        let later = r.last_interaction_time + chrono::Duration::seconds(400);
        let gap = r.touch(later);
        assert_eq!(gap.num_seconds(), 400);
        assert_eq!(r.last_interaction_time, later);
    }

    #[test]
    fn last_intent_tracks_response_log() {
        let mut r = SessionRecord::new("chat");
        assert!(r.last_intent().is_none());
        r.record_response("can you help me", KeywordTagger.analyze("can you help me"));
        assert_eq!(r.last_intent(), Some(Intent::Help));
        r.record_response("I want to buy", KeywordTagger.analyze("I want to buy"));
        assert_eq!(r.last_intent(), Some(Intent::Buy));
        assert_eq!(r.previous_responses.len(), 2);
    }

    #[test]
    fn convert_to_lead_flips_status() {
        let mut r = SessionRecord::new("chat");
        r.convert_to_lead();
        assert!(r.is_lead);
        assert_eq!(r.lead_status, LeadStatus::Converted);
    }

    #[test]
    fn record_serde_roundtrip() {
        let mut r = SessionRecord::new("chat");
        r.is_first_time_buyer = Some(true);
        r.timeline = Some("6 months".to_string());
        r.record_user_turn("yes");
        r.record_response("yes", KeywordTagger.analyze("yes"));
        r.convert_to_lead();

        let json = serde_json::to_string(&r).unwrap();
        let parsed: SessionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.session_id, r.session_id);
        assert_eq!(parsed.is_first_time_buyer, Some(true));
        assert_eq!(parsed.timeline.as_deref(), Some("6 months"));
        assert_eq!(parsed.lead_status, LeadStatus::Converted);
        assert_eq!(parsed.conversation_context.len(), 1);
        assert_eq!(parsed.previous_responses.len(), 1);
    }

    #[test]
    fn lead_status_display_matches_serde() {
        for status in [LeadStatus::New, LeadStatus::Converted] {
            let display = format!("{status}");
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(format!("\"{display}\""), json);
        }
    }
}
