//! Request and response schemas
//!
//! The output types mirror the JSON contract the generative model is
//! instructed to emit. Parsing model text into these types is the schema
//! validation step: a missing or mistyped field fails deserialization, and
//! the post-parse `Validate` pass rejects structurally valid but empty
//! output.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body of POST /generate
#[derive(Debug, Deserialize, Validate)]
pub struct GenerationRequest {
    #[validate(length(min = 1, max = 20000))]
    pub job_description: String,
}

/// Body of POST /interview-prep
#[derive(Debug, Deserialize, Validate)]
pub struct InterviewPrepRequest {
    #[validate(length(min = 1, max = 20000))]
    pub job_description: String,

    #[serde(default)]
    pub resume_text: String,

    #[serde(default)]
    pub cover_letter_text: String,
}

/// Job analysis embedded in generated content
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct JobAnalysis {
    #[validate(length(min = 1))]
    pub experience_level: String,

    #[validate(length(min = 1))]
    pub top_3_must_haves: Vec<String>,

    pub potential_red_flags: String,
}

/// Structured output of the document-generation flow
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GeneratedContent {
    #[validate(nested)]
    pub analysis: JobAnalysis,

    #[validate(length(min = 1))]
    pub cover_letter_text: String,

    #[validate(length(min = 1))]
    pub resume_text: String,

    #[validate(length(min = 1))]
    pub extracted_keywords: Vec<String>,

    #[validate(length(min = 1))]
    pub suggested_tone: String,
}

/// Company research summary in the interview-prep output
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CompanyInsights {
    #[validate(length(min = 1))]
    pub culture_and_values: String,

    pub recent_news_or_projects: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CompetencyHighlight {
    #[validate(length(min = 1))]
    pub competency: String,

    #[validate(length(min = 1))]
    pub framing_suggestion: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InterviewQuestion {
    #[validate(length(min = 1))]
    pub question: String,

    /// behavioral, technical or situational
    pub category: String,

    #[validate(length(min = 1))]
    pub suggested_answer_points: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WeaknessApproach {
    #[validate(length(min = 1))]
    pub strategy: String,

    #[validate(length(min = 1))]
    pub example_answer: String,
}

/// Structured output of the interview-prep flow
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InterviewPrepOutput {
    #[validate(nested)]
    pub company_insights: CompanyInsights,

    #[validate(length(min = 1), nested)]
    pub key_competencies_to_highlight: Vec<CompetencyHighlight>,

    #[validate(length(min = 1), nested)]
    pub potential_questions: Vec<InterviewQuestion>,

    #[validate(nested)]
    pub weakness_question_approach: WeaknessApproach,

    #[validate(length(min = 1))]
    pub questions_to_ask_interviewer: Vec<String>,

    #[validate(length(min = 1))]
    pub thank_you_note_draft: String,
}
