//! Generation endpoints
//!
//! Both endpoints require a verified bearer token; the extracted identity
//! scopes retrieval to the caller's own documents.

use crate::auth::UserIdentity;
use crate::errors::{AppError, Result};
use crate::schemas::{
    GeneratedContent, GenerationRequest, InterviewPrepOutput, InterviewPrepRequest,
};
use crate::services::AppState;
use axum::{extract::State, Json};
use tracing::instrument;
use validator::Validate;

#[instrument(skip_all, fields(user_id = %user.user_id))]
pub async fn generate(
    State(state): State<AppState>,
    user: UserIdentity,
    Json(request): Json<GenerationRequest>,
) -> Result<Json<GeneratedContent>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
    })?;

    metrics::counter!("careerpilot_requests_total", "endpoint" => "generate").increment(1);

    let content = state
        .orchestrator
        .generate_documents(&user, &request.job_description)
        .await?;

    Ok(Json(content))
}

#[instrument(skip_all, fields(user_id = %user.user_id))]
pub async fn interview_prep(
    State(state): State<AppState>,
    user: UserIdentity,
    Json(request): Json<InterviewPrepRequest>,
) -> Result<Json<InterviewPrepOutput>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
    })?;

    metrics::counter!("careerpilot_requests_total", "endpoint" => "interview_prep").increment(1);

    let output = state.orchestrator.prepare_interview(&user, &request).await?;

    Ok(Json(output))
}
