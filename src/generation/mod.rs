//! Generation orchestrator
//!
//! Owns the two generation flows: tailored application documents and the
//! interview preparation guide. Each flow runs its tools once, assembles a
//! single prompt from the system prompt plus labelled context sections, and
//! parses the model reply into the typed output schema. Model text that
//! does not parse is a `MalformedModelOutput` error; the raw reply is
//! logged, never returned to the client.

pub mod client;
pub mod prompts;

use crate::auth::UserIdentity;
use crate::errors::{AppError, Result};
use crate::schemas::{GeneratedContent, InterviewPrepOutput, InterviewPrepRequest};
use crate::tools::research::COMPANY_RESEARCH_TOOL;
use crate::tools::retrieval::DOCUMENT_RETRIEVAL_TOOL;
use crate::tools::ToolSet;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

pub use client::{GeminiModel, GenerativeModel, ScriptedModel};

pub struct Orchestrator {
    model: Arc<dyn GenerativeModel>,
    tools: ToolSet,
}

impl Orchestrator {
    pub fn new(model: Arc<dyn GenerativeModel>, tools: ToolSet) -> Self {
        Self { model, tools }
    }

    /// Generate a tailored cover letter, resume and job analysis.
    ///
    /// Retrieval runs against the caller's own namespace; its failure fails
    /// the request. Company research is best-effort and self-degrading.
    #[instrument(skip_all, fields(user_id = %user.user_id, model = self.model.model_name()))]
    pub async fn generate_documents(
        &self,
        user: &UserIdentity,
        job_description: &str,
    ) -> Result<GeneratedContent> {
        let experience = self.retrieve_experience(user, job_description).await?;
        let research = self.research_company(job_description).await;

        let mut prompt = format!(
            "{}\n\n**JOB DESCRIPTION:**\n{}\n\n**RELEVANT USER EXPERIENCE:**\n{}",
            prompts::GENERATION_SYSTEM_PROMPT,
            job_description,
            experience
        );
        if let Some(brief) = research {
            prompt.push_str("\n\n**COMPANY RESEARCH:**\n");
            prompt.push_str(&brief);
        }

        let reply = self.model.generate(&prompt).await?;
        let content: GeneratedContent = parse_structured(&reply)?;

        info!(
            keywords = content.extracted_keywords.len(),
            "Generated application documents"
        );
        metrics::counter!("careerpilot_generations_total", "flow" => "documents").increment(1);

        Ok(content)
    }

    /// Generate the interview preparation guide from the job description
    /// and the candidate's (possibly empty) tailored documents.
    #[instrument(skip_all, fields(user_id = %user.user_id, model = self.model.model_name()))]
    pub async fn prepare_interview(
        &self,
        user: &UserIdentity,
        request: &InterviewPrepRequest,
    ) -> Result<InterviewPrepOutput> {
        let research = self.research_company(&request.job_description).await;

        let mut prompt = format!(
            "{}\n\n**JOB DESCRIPTION:**\n{}\n\n**CANDIDATE RESUME:**\n{}\n\n**CANDIDATE COVER LETTER:**\n{}",
            prompts::INTERVIEW_PREP_SYSTEM_PROMPT,
            request.job_description,
            request.resume_text,
            request.cover_letter_text
        );
        if let Some(brief) = research {
            prompt.push_str("\n\n**COMPANY RESEARCH:**\n");
            prompt.push_str(&brief);
        }

        let reply = self.model.generate(&prompt).await?;
        let output: InterviewPrepOutput = parse_structured(&reply)?;

        info!(
            questions = output.potential_questions.len(),
            "Generated interview preparation guide"
        );
        metrics::counter!("careerpilot_generations_total", "flow" => "interview_prep").increment(1);

        Ok(output)
    }

    async fn retrieve_experience(
        &self,
        user: &UserIdentity,
        job_description: &str,
    ) -> Result<String> {
        let tool = self
            .tools
            .find(DOCUMENT_RETRIEVAL_TOOL)
            .ok_or_else(|| AppError::Internal {
                message: "Document retrieval tool is not registered".to_string(),
            })?;

        let input = json!({
            "query": job_description,
            "user_id": user.user_id,
        });
        tool.invoke(&input.to_string()).await
    }

    /// Run company research when a company name is present in the job
    /// description and the tool is registered. Returns None otherwise.
    async fn research_company(&self, job_description: &str) -> Option<String> {
        let tool = self.tools.find(COMPANY_RESEARCH_TOOL)?;
        let company = company_name_from(job_description)?;

        let input = json!({ "company_name": company });
        match tool.invoke(&input.to_string()).await {
            Ok(brief) => Some(brief),
            Err(e) => {
                warn!(company = %company, error = %e, "Company research tool failed");
                None
            }
        }
    }
}

/// Find an explicit `Company:` line in the job description.
fn company_name_from(job_description: &str) -> Option<String> {
    job_description.lines().find_map(|line| {
        line.trim()
            .strip_prefix("Company:")
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    })
}

/// Strip a leading/trailing markdown code fence from model output.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // skip a language tag on the opening fence line
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse model output into a typed, validated schema.
fn parse_structured<T: DeserializeOwned + Validate>(reply: &str) -> Result<T> {
    let body = strip_code_fences(reply);

    let parsed: T = serde_json::from_str(body).map_err(|e| {
        warn!(error = %e, raw = %reply, "Model output failed schema parse");
        AppError::MalformedModelOutput {
            message: format!("Output did not match the expected schema: {}", e),
        }
    })?;

    parsed.validate().map_err(|e| {
        warn!(error = %e, "Model output failed validation");
        AppError::MalformedModelOutput {
            message: format!("Output failed validation: {}", e),
        }
    })?;

    Ok(parsed)
}
