//! Mortgage Assist — scripted mortgage-readiness chat flow.
//!
//! A linear conversational form: a fixed step table of qualification
//! questions, per-step validators writing into a session record, an optional
//! LLM responder that may override static prompts, and fire-and-forget
//! analytics events.

pub mod analysis;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod phrases;
pub mod responder;
pub mod script;
pub mod session;
pub mod store;

pub use config::AssistantConfig;
pub use engine::{ConversationEngine, EngineReply};
pub use script::Script;
pub use session::SessionRecord;
