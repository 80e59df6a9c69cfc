//! Exchange between dashboard state and the generative text service.
//!
//! Every operation serializes the company snapshot, makes exactly one call to
//! the service, and always returns a displayable value. Failures are logged for
//! operators and replaced with a fixed fallback.

pub mod prompts;

use crate::domain::action::ActionRecommendation;
use crate::domain::company::CompanySnapshot;
use crate::domain::conversation::{ConversationTurn, NonBlankText, Role};
use crate::llm::json;
use crate::llm::{ContentUnit, GenerateRequest, GenerationConfig, LlmClient, Prompt};
use std::sync::Arc;

pub const ADVICE_FALLBACK: &str =
    "My strategic analysis is currently unavailable due to a connection issue. Please try again shortly.";
pub const SIMULATION_FALLBACK: &str = "Unable to run simulation protocols.";

const ADVICE_TEMPERATURE: f32 = 0.7;
const ADVICE_MAX_OUTPUT_TOKENS: u32 = 1000;
const SIMULATION_TEMPERATURE: f32 = 0.4;
const ACTIONS_TEMPERATURE: f32 = 0.5;

#[derive(Clone)]
pub struct Advisor {
    llm: Arc<dyn LlmClient>,
}

impl Advisor {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Answers `query` in the context of `history` (turns before the query).
    pub async fn advise(
        &self,
        history: &[ConversationTurn],
        company: &CompanySnapshot,
        query: &NonBlankText,
    ) -> String {
        let request = Self::advice_request(history, company, query);
        match self.llm.generate(request).await {
            Ok(res) => match res.usable_text() {
                Some(text) => text,
                None => {
                    tracing::error!(provider = ?self.llm.provider(), "advice response had no text");
                    ADVICE_FALLBACK.to_string()
                }
            },
            Err(err) => {
                tracing::error!(provider = ?self.llm.provider(), error = %err, "advice request failed");
                ADVICE_FALLBACK.to_string()
            }
        }
    }

    pub async fn simulate(&self, company: &CompanySnapshot, scenario: &NonBlankText) -> String {
        let request = Self::simulation_request(company, scenario);
        match self.llm.generate(request).await {
            Ok(res) => match res.usable_text() {
                Some(text) => text,
                None => {
                    tracing::error!(provider = ?self.llm.provider(), "simulation response had no text");
                    SIMULATION_FALLBACK.to_string()
                }
            },
            Err(err) => {
                tracing::error!(provider = ?self.llm.provider(), error = %err, "simulation request failed");
                SIMULATION_FALLBACK.to_string()
            }
        }
    }

    /// Fresh recommendations; never empty. Falls back to the error sentinel.
    pub async fn recommend_actions(&self, company: &CompanySnapshot) -> Vec<ActionRecommendation> {
        let request = match Self::actions_request(company) {
            Ok(request) => request,
            Err(err) => {
                tracing::error!(error = %err, "failed to encode actions context");
                return vec![ActionRecommendation::error_sentinel()];
            }
        };

        let text = match self.llm.generate(request).await {
            Ok(res) => match res.usable_text() {
                Some(text) => text,
                None => {
                    tracing::error!(provider = ?self.llm.provider(), "actions response had no text");
                    return vec![ActionRecommendation::error_sentinel()];
                }
            },
            Err(err) => {
                tracing::error!(provider = ?self.llm.provider(), error = %err, "actions request failed");
                return vec![ActionRecommendation::error_sentinel()];
            }
        };

        match json::parse_actions(&text) {
            Ok(actions) => {
                tracing::debug!(count = actions.len(), "decoded action recommendations");
                actions
            }
            Err(err) => {
                tracing::error!(
                    provider = ?self.llm.provider(),
                    error = %err,
                    raw_output = %err.raw_output,
                    "actions response not decodable"
                );
                vec![ActionRecommendation::error_sentinel()]
            }
        }
    }

    pub fn advice_request(
        history: &[ConversationTurn],
        company: &CompanySnapshot,
        query: &NonBlankText,
    ) -> GenerateRequest {
        let context = prompts::advice_context(company);
        let mut units: Vec<ContentUnit> = history
            .iter()
            .map(|turn| ContentUnit {
                role: turn.role,
                text: turn.text.clone(),
            })
            .collect();
        units.push(ContentUnit {
            role: Role::User,
            text: prompts::advice_query(&context, query.as_str()),
        });

        GenerateRequest {
            contents: Prompt::Turns(units),
            config: GenerationConfig {
                system_instruction: prompts::STRATEGIST_SYSTEM_PROMPT.to_string(),
                temperature: ADVICE_TEMPERATURE,
                max_output_tokens: Some(ADVICE_MAX_OUTPUT_TOKENS),
                structured_output: false,
            },
        }
    }

    pub fn simulation_request(company: &CompanySnapshot, scenario: &NonBlankText) -> GenerateRequest {
        GenerateRequest {
            contents: Prompt::Text(prompts::simulation_prompt(company, scenario.as_str())),
            config: GenerationConfig {
                system_instruction: prompts::SIMULATION_SYSTEM_PROMPT.to_string(),
                temperature: SIMULATION_TEMPERATURE,
                max_output_tokens: None,
                structured_output: false,
            },
        }
    }

    pub fn actions_request(company: &CompanySnapshot) -> anyhow::Result<GenerateRequest> {
        Ok(GenerateRequest {
            contents: Prompt::Text(prompts::actions_context(company)?),
            config: GenerationConfig {
                system_instruction: prompts::MARKETING_ANALYSIS_PROMPT.to_string(),
                temperature: ACTIONS_TEMPERATURE,
                max_output_tokens: None,
                structured_output: true,
            },
        })
    }
}
