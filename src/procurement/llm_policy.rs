//! Chat-completion backed recommendation policy
//!
//! Sends the RFP context and candidate snapshot to an OpenAI-compatible
//! endpoint and falls back to the rules policy whenever the call or its
//! answer is unusable.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::models::{CandidateProposal, ComparisonResult, RfpContext};
use super::recommend::{clamp_confidence, no_recommendation, RecommendationPolicy, RulesPolicy};
use crate::config::LlmConfig;
use crate::error::{Result, RfpError};
use crate::metrics::METRICS;

const SYSTEM_PROMPT: &str =
    "You are a procurement analyst. Compare proposals and recommend the best vendor with reasoning. Always return valid JSON.";

/// Retries double the wait from 200ms and stop growing at 6.4s
const MAX_BACKOFF_SHIFT: usize = 6;

/// LLM policy with rules fallback
pub struct LlmPolicy {
    client: Client,
    config: LlmConfig,
    api_key: Option<SecretString>,
    fallback: RulesPolicy,
}

impl LlmPolicy {
    /// Create a policy; the API key is read from `config.api_key_env` if set
    pub fn new(config: LlmConfig, fallback: RulesPolicy) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).ok().map(SecretString::new);
        Self::with_api_key(config, api_key, fallback)
    }

    pub fn with_api_key(config: LlmConfig, api_key: Option<SecretString>, fallback: RulesPolicy) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            config,
            api_key,
            fallback,
        })
    }

    fn build_prompt(&self, rfp: &RfpContext, candidates: &[CandidateProposal]) -> Result<String> {
        let proposals = serde_json::to_string_pretty(candidates)?;
        let requirements = serde_json::to_string(&rfp.requirements)?;

        Ok(format!(
            "Compare these vendor proposals for RFP: {title}\n\n\
             RFP Requirements:\n\
             - Budget: ${budget}\n\
             - Delivery: {days} days\n\
             - Requirements: {requirements}\n\n\
             Proposals:\n{proposals}\n\n\
             Analyze and provide a recommendation. The vendor_id must be one of the vendor_id values above. Return JSON:\n\
             {{\n\
               \"summary\": \"string\",\n\
               \"recommendation\": {{\"vendor_id\": \"uuid\", \"vendor_name\": \"string\", \"reasoning\": \"string\", \"confidence_score\": number}},\n\
               \"analysis\": {{\"price_analysis\": \"string\", \"compliance_analysis\": \"string\", \"delivery_analysis\": \"string\", \"risk_assessment\": \"string\"}}\n\
             }}",
            title = rfp.title,
            budget = rfp.total_budget,
            days = rfp.delivery_days,
            requirements = requirements,
            proposals = proposals,
        ))
    }

    async fn request_completion(&self, prompt: String) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt,
                },
            ],
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
        };

        let attempts = self.config.max_retries.max(1);
        let mut last_error = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                debug!("Retry attempt {} for recommendation", attempt);
                tokio::time::sleep(retry_backoff(attempt)).await;
            }

            let mut req = self.client.post(&self.config.endpoint).json(&request);
            if let Some(ref api_key) = self.api_key {
                req = req.header("Authorization", format!("Bearer {}", api_key.expose_secret()));
            }

            let response = match req.send().await {
                Ok(response) => response,
                Err(e) => {
                    last_error = Some(RfpError::Http(e));
                    continue;
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                last_error = Some(RfpError::Policy(format!("HTTP {}: {}", status, body)));
                continue;
            }

            match response.json::<ChatCompletionResponse>().await {
                Ok(resp) => match resp.choices.into_iter().next() {
                    Some(choice) => return Ok(choice.message.content),
                    None => last_error = Some(RfpError::Policy("No choices in response".to_string())),
                },
                Err(e) => last_error = Some(RfpError::Policy(format!("Failed to parse response: {}", e))),
            }
        }

        Err(last_error.unwrap_or_else(|| RfpError::Policy("No attempts made".to_string())))
    }

    async fn try_recommend(&self, rfp: &RfpContext, candidates: &[CandidateProposal]) -> Result<ComparisonResult> {
        if self.api_key.is_none() {
            return Err(RfpError::Policy(format!(
                "API key variable {} is not set",
                self.config.api_key_env
            )));
        }

        let prompt = self.build_prompt(rfp, candidates)?;
        let content = self.request_completion(prompt).await?;
        let mut result: ComparisonResult = serde_json::from_str(strip_code_fence(&content))?;

        let winner = result
            .recommendation
            .vendor_id
            .and_then(|id| candidates.iter().find(|c| c.vendor_id == id))
            .ok_or_else(|| RfpError::Policy("Model recommended a vendor outside the compared set".to_string()))?;

        result.recommendation.vendor_name = winner.vendor_name.clone();
        result.recommendation.confidence_score = clamp_confidence(result.recommendation.confidence_score);

        Ok(result)
    }
}

#[async_trait]
impl RecommendationPolicy for LlmPolicy {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn recommend(&self, rfp: &RfpContext, candidates: &[CandidateProposal]) -> ComparisonResult {
        if candidates.is_empty() {
            return no_recommendation();
        }

        match self.try_recommend(rfp, candidates).await {
            Ok(result) => result,
            Err(e) => {
                warn!("LLM recommendation failed, using rules policy: {}", e);
                METRICS.policy_fallbacks.inc();
                self.fallback.evaluate(rfp, candidates)
            }
        }
    }
}

/// Strip a leading ```json (or bare ```) fence the model may wrap its answer in
fn retry_backoff(attempt: usize) -> Duration {
    Duration::from_millis(100u64 << attempt.min(MAX_BACKOFF_SHIFT))
}

pub(crate) fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let inner = if let Some((_, rest)) = trimmed.split_once("```json") {
        rest
    } else if let Some((_, rest)) = trimmed.split_once("```") {
        rest
    } else {
        return trimmed;
    };

    inner.split("```").next().unwrap_or(inner).trim()
}

// OpenAI-compatible API types
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}
