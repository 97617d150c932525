//! Generative model clients
//!
//! `GenerativeModel` abstracts the text-in, text-out call; the orchestrator
//! owns prompt assembly and output parsing. The Gemini client requests a
//! JSON response mime type so the model is steered toward parseable output,
//! but parsing still treats the reply as untrusted text.

use crate::config::GenerationConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;

    fn model_name(&self) -> &str;
}

pub struct GeminiModel {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: InnerGenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InnerGenerationConfig {
    response_mime_type: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

impl GeminiModel {
    pub fn new(config: &GenerationConfig, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl GenerativeModel for GeminiModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            self.api_base, self.model, self.api_key
        );

        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: InnerGenerationConfig {
                response_mime_type: "application/json".to_string(),
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Upstream {
                service: "gemini".to_string(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(AppError::Upstream {
                service: "gemini".to_string(),
                message: format!("HTTP {}", response.status()),
            });
        }

        let parsed: GenerateContentResponse =
            response.json().await.map_err(|e| AppError::Upstream {
                service: "gemini".to_string(),
                message: format!("Malformed response: {}", e),
            })?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| AppError::Upstream {
                service: "gemini".to_string(),
                message: "Response contained no candidates".to_string(),
            })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Returns a fixed reply to every prompt; tests and local development
pub struct ScriptedModel {
    reply: String,
}

impl ScriptedModel {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Ok(self.reply.clone())
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[tokio::test]
    async fn test_scripted_model_returns_its_reply() {
        let model = ScriptedModel::new("{\"ok\": true}");
        assert_eq!(model.generate("anything").await.unwrap(), "{\"ok\": true}");
    }

    #[tokio::test]
    async fn test_unreachable_gemini_is_upstream_error() {
        let mut config = AppConfig::default().generation;
        config.api_base = "http://127.0.0.1:1".to_string();
        config.timeout_secs = 1;
        let model = GeminiModel::new(&config, "key".to_string()).unwrap();

        let err = model.generate("prompt").await.unwrap_err();
        assert!(matches!(err, AppError::Upstream { .. }));
    }
}
