//! External responder — the chat-completion collaborator.
//!
//! One request per turn: a fixed system instruction, the speaker-tagged
//! transcript so far, and the new instruction. A single string comes back.
//! No streaming, no function calling, no retry — any failure is reported as
//! an error and the engine degrades to static step text.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::LlmError;
use crate::session::Turn;

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 150;

const SYSTEM_PROMPT: &str = "\
You are a friendly and knowledgeable mortgage assistant. Your goal is to help users \
understand their mortgage options and guide them through the home buying process.
Keep responses conversational and empathetic. Avoid hard selling or pushing products. \
Focus on understanding the user's needs and providing valuable information.
If the user seems unsure or not ready, offer helpful resources without being pushy.";

/// The language-model collaborator that may override static step text.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Produce a reply for `instruction` given the conversation so far.
    async fn respond(&self, instruction: &str, transcript: &[Turn]) -> Result<String, LlmError>;
}

/// Responder backed by the OpenAI chat-completions endpoint.
pub struct OpenAiResponder {
    client: reqwest::Client,
    api_key: SecretString,
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiResponder {
    pub fn new(api_key: SecretString, timeout: Duration) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        })
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}

fn build_messages<'a>(instruction: &'a str, transcript: &'a [Turn]) -> Vec<WireMessage<'a>> {
    let mut messages = vec![WireMessage {
        role: "system",
        content: SYSTEM_PROMPT,
    }];
    messages.extend(transcript.iter().map(|turn| WireMessage {
        role: if turn.is_user { "user" } else { "assistant" },
        content: &turn.content,
    }));
    messages.push(WireMessage {
        role: "user",
        content: instruction,
    });
    messages
}

#[async_trait]
impl Responder for OpenAiResponder {
    async fn respond(&self, instruction: &str, transcript: &[Turn]) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            messages: build_messages(instruction, transcript),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let body: ChatResponse = response.json().await?;
        let choice = body.choices.into_iter().next().ok_or_else(|| {
            LlmError::InvalidResponse {
                reason: "empty choices array".to_string(),
            }
        })?;
        Ok(choice.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_system_transcript_and_instruction() {
        let transcript = vec![Turn::bot("Hi there!"), Turn::user("hello")];
        let messages = build_messages("Generate the next question.", &transcript);

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "assistant");
        assert_eq!(messages[1].content, "Hi there!");
        assert_eq!(messages[2].role, "user");
        assert_eq!(messages[3].role, "user");
        assert_eq!(messages[3].content, "Generate the next question.");
    }

    #[test]
    fn request_serializes_expected_shape() {
        let transcript = vec![Turn::user("hi")];
        let request = ChatRequest {
            model: DEFAULT_MODEL,
            messages: build_messages("reply", &transcript),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-3.5-turbo");
        assert_eq!(json["max_tokens"], 150);
        assert_eq!(json["messages"][0]["role"], "system");
    }

    #[test]
    fn response_parses_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Sure!"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content, "Sure!");
    }
}
