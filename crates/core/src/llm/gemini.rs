use crate::config::Settings;
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::{GenerateRequest, GenerateResponse, LlmClient, Prompt, Provider};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

const JSON_MIME_TYPE: &str = "application/json";

#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

// Keeps the credential out of Debug output.
impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_gemini_api_key()?.to_string();
        let base_url =
            std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let timeout_secs = std::env::var("GEMINI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key,
            base_url,
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    async fn generate_content(
        &self,
        req: &GenerateContentRequest,
    ) -> anyhow::Result<GenerateContentResponse> {
        let mut headers = HeaderMap::new();
        headers.insert("x-goog-api-key", HeaderValue::from_str(&self.api_key)?);

        let res = self
            .http
            .post(self.url())
            .headers(headers)
            .json(req)
            .send()
            .await
            .context("Gemini request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Gemini response body")?;
        if !status.is_success() {
            let raw_response_json = serde_json::from_str::<serde_json::Value>(&text).ok();
            return Err(LlmDiagnosticsError {
                provider: Provider::Gemini,
                stage: "http",
                detail: format!("status={status}"),
                raw_output: Some(text),
                raw_response_json,
            }
            .into());
        }

        serde_json::from_str::<GenerateContentResponse>(&text).map_err(|e| {
            anyhow::Error::new(LlmDiagnosticsError {
                provider: Provider::Gemini,
                stage: "decode_response",
                detail: e.to_string(),
                raw_output: Some(text.clone()),
                raw_response_json: None,
            })
        })
    }

    fn build_request(request: &GenerateRequest) -> GenerateContentRequest {
        let contents = match &request.contents {
            Prompt::Turns(units) => units
                .iter()
                .map(|unit| Content {
                    role: unit.role.as_str().to_string(),
                    parts: vec![Part {
                        text: Some(unit.text.clone()),
                    }],
                })
                .collect(),
            Prompt::Text(text) => vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: Some(text.clone()),
                }],
            }],
        };

        let config = &request.config;
        GenerateContentRequest {
            contents,
            system_instruction: Some(SystemInstruction {
                parts: vec![Part {
                    text: Some(config.system_instruction.clone()),
                }],
            }),
            generation_config: GenerationConfigPayload {
                temperature: config.temperature,
                max_output_tokens: config.max_output_tokens,
                response_mime_type: config.structured_output.then_some(JSON_MIME_TYPE),
            },
        }
    }

    /// Text parts of the first candidate, joined. `None` when there are none.
    fn response_text(res: &GenerateContentResponse) -> Option<String> {
        let candidate = res.candidates.first()?;
        let content = candidate.content.as_ref()?;
        let mut out = String::new();
        let mut any = false;
        for part in &content.parts {
            if let Some(text) = &part.text {
                out.push_str(text);
                any = true;
            }
        }
        any.then_some(out)
    }
}

#[async_trait::async_trait]
impl LlmClient for GeminiClient {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn generate(&self, request: GenerateRequest) -> anyhow::Result<GenerateResponse> {
        let body = Self::build_request(&request);
        let res = self.generate_content(&body).await?;

        if let Some(feedback) = &res.prompt_feedback {
            if let Some(reason) = &feedback.block_reason {
                tracing::warn!(model = %self.model, block_reason = %reason, "Gemini blocked the prompt");
            }
        }

        Ok(GenerateResponse {
            text: Self::response_text(&res),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    generation_config: GenerationConfigPayload,
}

#[derive(Debug, Clone, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfigPayload {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::Role;
    use crate::llm::{ContentUnit, GenerationConfig};
    use serde_json::json;

    fn config(structured_output: bool, max_output_tokens: Option<u32>) -> GenerationConfig {
        GenerationConfig {
            system_instruction: "persona".to_string(),
            temperature: 0.5,
            max_output_tokens,
            structured_output,
        }
    }

    #[test]
    fn builds_multi_turn_payload() {
        let request = GenerateRequest {
            contents: Prompt::Turns(vec![
                ContentUnit {
                    role: Role::Model,
                    text: "hello".to_string(),
                },
                ContentUnit {
                    role: Role::User,
                    text: "question".to_string(),
                },
            ]),
            config: config(false, Some(1000)),
        };

        let body = serde_json::to_value(GeminiClient::build_request(&request)).unwrap();
        assert_eq!(
            body,
            json!({
                "contents": [
                    {"role": "model", "parts": [{"text": "hello"}]},
                    {"role": "user", "parts": [{"text": "question"}]},
                ],
                "systemInstruction": {"parts": [{"text": "persona"}]},
                "generationConfig": {"temperature": 0.5, "maxOutputTokens": 1000},
            })
        );
    }

    #[test]
    fn structured_mode_sets_json_mime_type() {
        let request = GenerateRequest {
            contents: Prompt::Text("Context: x".to_string()),
            config: config(true, None),
        };

        let body = serde_json::to_value(GeminiClient::build_request(&request)).unwrap();
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["generationConfig"]["responseMimeType"], JSON_MIME_TYPE);
        assert!(body["generationConfig"].get("maxOutputTokens").is_none());
    }

    #[test]
    fn joins_text_parts_of_first_candidate() {
        let res: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "Hello, "}, {"text": "board."}]}},
                {"content": {"role": "model", "parts": [{"text": "ignored"}]}}
            ]
        }))
        .unwrap();
        assert_eq!(GeminiClient::response_text(&res).as_deref(), Some("Hello, board."));
    }

    #[test]
    fn blocked_prompt_has_no_text() {
        let res: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        assert_eq!(GeminiClient::response_text(&res), None);

        let res: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"finishReason": "MAX_TOKENS"}]
        }))
        .unwrap();
        assert_eq!(GeminiClient::response_text(&res), None);
    }
}
