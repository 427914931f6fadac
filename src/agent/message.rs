//! Provider-agnostic message types for LLM communication.
//!
//! These types decouple the orchestrators from the wire format of any
//! particular chat-completion vendor.

use serde::{Deserialize, Serialize};

/// Role of a chat message participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions.
    System,
    /// User input.
    User,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: Role,
    /// Message content.
    pub content: String,
}

/// A chat completion request (provider-agnostic).
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Model identifier (e.g., "llama-3.3-70b-versatile").
    pub model: String,
    /// Ordered conversation messages.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature (0.0–2.0).
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
}

/// Token usage statistics from a completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt.
    pub prompt_tokens: u32,
    /// Tokens generated in the completion.
    pub completion_tokens: u32,
    /// Total tokens used.
    pub total_tokens: u32,
}

/// A chat completion response (provider-agnostic).
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Content of the first completion choice.
    pub content: String,
    /// Token usage statistics.
    pub usage: TokenUsage,
    /// Finish reason from the model (e.g., `"stop"`, `"length"`).
    pub finish_reason: Option<String>,
}

/// Creates a system message.
#[must_use]
pub fn system_message(content: &str) -> ChatMessage {
    ChatMessage {
        role: Role::System,
        content: content.to_string(),
    }
}

/// Creates a user message.
#[must_use]
pub fn user_message(content: &str) -> ChatMessage {
    ChatMessage {
        role: Role::User,
        content: content.to_string(),
    }
}

/// Builds the user turn: the context (when present) followed by the
/// instruction. With no context the instruction is sent alone.
#[must_use]
pub fn compose_user_content(instruction: &str, context: Option<&str>) -> String {
    match context.map(str::trim).filter(|c| !c.is_empty()) {
        Some(ctx) => format!("{ctx}\n\n{instruction}"),
        None => instruction.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_message() {
        let msg = system_message("You are an analyst.");
        assert_eq!(msg.role, Role::System);
        assert_eq!(msg.content, "You are an analyst.");
    }

    #[test]
    fn test_user_message() {
        let msg = user_message("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");
    }

    #[test]
    fn test_compose_with_context() {
        let content = compose_user_content("What is the EMD?", Some("EMD: Rs 10,000"));
        assert_eq!(content, "EMD: Rs 10,000\n\nWhat is the EMD?");
    }

    #[test]
    fn test_compose_prompt_only() {
        assert_eq!(compose_user_content("Translate", None), "Translate");
        assert_eq!(compose_user_content("Translate", Some("   ")), "Translate");
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Role::System).unwrap_or_default();
        assert_eq!(json, "\"system\"");
        let json = serde_json::to_string(&Role::User).unwrap_or_default();
        assert_eq!(json, "\"user\"");
    }

    #[test]
    fn test_chat_message_serialization() {
        let json = serde_json::to_string(&user_message("test")).unwrap_or_default();
        assert_eq!(json, r#"{"role":"user","content":"test"}"#);
    }
}
