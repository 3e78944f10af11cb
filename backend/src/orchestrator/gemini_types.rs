//! Gemini API wire types
//!
//! Structs that mirror the Gemini `generateContent` JSON format.

use serde::{Deserialize, Serialize};

/// Top-level Gemini API response
#[derive(Deserialize, Debug)]
pub struct GeminiApiResponse {
    /// Candidate responses from the model
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Feedback about the prompt (e.g., if it was blocked)
    #[serde(default, alias = "promptFeedback")]
    pub prompt_feedback: Option<PromptFeedback>,
}

/// A single candidate response
#[derive(Deserialize, Debug)]
pub struct Candidate {
    /// Candidate content
    pub content: Content,
    /// Why the model stopped generating
    #[serde(default, alias = "finishReason")]
    pub finish_reason: Option<String>,
}

/// Content made of one or more parts
#[derive(Deserialize, Debug)]
pub struct Content {
    /// Content parts (typically one text part)
    #[serde(default)]
    pub parts: Vec<Part>,
    /// Role of the content (e.g., "model")
    #[serde(default)]
    pub role: Option<String>,
}

/// A text part
#[derive(Deserialize, Debug)]
pub struct Part {
    /// Text content
    #[serde(default)]
    pub text: String,
}

/// Feedback about the prompt
#[derive(Deserialize, Debug)]
pub struct PromptFeedback {
    /// Reason the prompt was blocked
    #[serde(default, alias = "blockReason")]
    pub block_reason: Option<String>,
}

/// Request body for `generateContent`
#[derive(Serialize, Debug)]
pub struct GeminiApiRequest {
    /// System instruction, sent separately from the user turn
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<RequestContent>,
    /// Conversation turns
    pub contents: Vec<RequestContent>,
    /// Generation configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// Content for requests
#[derive(Serialize, Debug)]
pub struct RequestContent {
    /// Role of the turn; omitted for system instructions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Content parts
    pub parts: Vec<RequestPart>,
}

impl RequestContent {
    /// Single-part content
    pub fn text(role: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![RequestPart { text: text.into() }],
        }
    }
}

/// A request text part
#[derive(Serialize, Debug)]
pub struct RequestPart {
    /// Text content
    pub text: String,
}

/// Generation configuration
#[derive(Serialize, Debug)]
pub struct GenerationConfig {
    /// MIME type to force for the response (e.g., "application/json")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
}
