pub mod error;
pub mod gemini;
pub mod json;

use crate::domain::conversation::Role;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Gemini,
}

/// One role-tagged unit of a multi-turn request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentUnit {
    pub role: Role,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Prompt {
    Turns(Vec<ContentUnit>),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationConfig {
    pub system_instruction: String,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    /// Ask the service for machine-parseable JSON instead of prose.
    pub structured_output: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateRequest {
    pub contents: Prompt,
    pub config: GenerationConfig,
}

/// `text` is `None` when the service answered without usable text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateResponse {
    pub text: Option<String>,
}

impl GenerateResponse {
    /// The text, unless it is missing or blank.
    pub fn usable_text(self) -> Option<String> {
        self.text.filter(|t| !t.trim().is_empty())
    }
}

#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> Provider;

    async fn generate(&self, request: GenerateRequest) -> anyhow::Result<GenerateResponse>;
}
