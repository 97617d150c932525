//! Company research tool
//!
//! Wraps an online research API (chat-completions shaped) that produces a
//! business brief for a named company. Failures are reported inside the
//! returned text rather than as errors: research is a nice-to-have and
//! must never fail the surrounding generation request.

use super::Tool;
use crate::config::ResearchConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::warn;

pub const COMPANY_RESEARCH_TOOL: &str = "company_deep_dive";

const SYSTEM_PROMPT: &str = "You are an expert business analyst. Provide a concise but \
comprehensive brief on the requested company.";

pub struct CompanyResearch {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
}

#[derive(Deserialize)]
struct ResearchInput {
    company_name: String,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

impl CompanyResearch {
    pub fn new(config: &ResearchConfig, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
        })
    }

    async fn deep_dive(&self, company_name: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: format!(
                        "Provide a business brief for the company: '{}'. Focus on their mission, \
                         stated values, company culture, and any major recent news or projects \
                         relevant to someone applying for a job there.",
                        company_name
                    ),
                },
            ],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Upstream {
                service: "research-api".to_string(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(AppError::Upstream {
                service: "research-api".to_string(),
                message: format!("HTTP {}", response.status()),
            });
        }

        let chat: ChatResponse = response.json().await.map_err(|e| AppError::Upstream {
            service: "research-api".to_string(),
            message: format!("Malformed response: {}", e),
        })?;

        chat.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AppError::Upstream {
                service: "research-api".to_string(),
                message: "Empty response".to_string(),
            })
    }
}

#[async_trait]
impl Tool for CompanyResearch {
    fn name(&self) -> &str {
        COMPANY_RESEARCH_TOOL
    }

    fn description(&self) -> &str {
        "Research a company's mission, values, culture and recent news for a job applicant"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "company_name": {
                    "type": "string",
                    "description": "Name of the company to research"
                }
            },
            "required": ["company_name"]
        })
    }

    async fn invoke(&self, input: &str) -> Result<String> {
        let args: ResearchInput = serde_json::from_str(input)?;

        match self.deep_dive(&args.company_name).await {
            Ok(brief) => Ok(brief),
            Err(e) => {
                // Degraded, not fatal: generation proceeds without research
                warn!(company = %args.company_name, error = %e, "Company research failed");
                Ok(format!(
                    "Error: Could not retrieve company research for '{}'.",
                    args.company_name
                ))
            }
        }
    }
}
