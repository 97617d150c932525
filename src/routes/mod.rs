pub mod generate;
pub mod health;
pub mod ingest;

use crate::services::AppState;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use std::time::Duration;
use tower::ServiceBuilder;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Maximum concurrent requests (backpressure control)
const MAX_CONCURRENT_REQUESTS: usize = 100;

pub fn create_router(
    state: AppState,
    allowed_origins: &[String],
    request_timeout: Duration,
) -> Router {
    let cors = cors_layer(allowed_origins);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/generate", post(generate::generate))
        .route("/interview-prep", post(generate::interview_prep))
        .route("/events/storage", post(ingest::storage_event))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(request_timeout))
                .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS))
                .layer(cors)
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}

/// Empty origin list allows any origin (development); otherwise only the
/// listed origins are accepted.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticVerifier;
    use crate::chunker::ChunkingConfig;
    use crate::embeddings::MockEmbedder;
    use crate::generation::{Orchestrator, ScriptedModel};
    use crate::services::ingestion::IngestionService;
    use crate::services::storage::fake::FakeObjectStore;
    use crate::tools::{DocumentRetrieval, ToolSet};
    use crate::vector_store::InMemoryIndex;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::util::ServiceExt;

    const TOKEN: &str = "test-token";

    fn generated_content_reply() -> String {
        json!({
            "analysis": {
                "experience_level": "Mid-level",
                "top_3_must_haves": ["NDIS experience"],
                "potential_red_flags": ""
            },
            "cover_letter_text": "Dear Hiring Manager",
            "resume_text": "Professional Summary",
            "extracted_keywords": ["NDIS"],
            "suggested_tone": "Warm"
        })
        .to_string()
    }

    fn interview_prep_reply() -> String {
        json!({
            "company_insights": {
                "culture_and_values": "Client-first, community focused",
                "recent_news_or_projects": "New Perth office"
            },
            "key_competencies_to_highlight": [
                {"competency": "Care planning", "framing_suggestion": "Lead with outcomes"}
            ],
            "potential_questions": [
                {
                    "question": "Tell me about a difficult client situation",
                    "category": "behavioral",
                    "suggested_answer_points": ["De-escalation", "Care plan adherence"]
                }
            ],
            "weakness_question_approach": {
                "strategy": "Pick a real, improving weakness",
                "example_answer": "I used to over-document..."
            },
            "questions_to_ask_interviewer": ["How is on-call rostered?"],
            "thank_you_note_draft": "Thank you for your time today."
        })
        .to_string()
    }

    struct TestApp {
        router: Router,
        store: Arc<FakeObjectStore>,
    }

    fn test_app(model_reply: String) -> TestApp {
        let embedder = Arc::new(MockEmbedder::new(64));
        let index = Arc::new(InMemoryIndex::new(embedder));
        let store = Arc::new(FakeObjectStore::default());

        let ingestion = Arc::new(IngestionService::new(
            store.clone(),
            index.clone(),
            ChunkingConfig {
                chunk_size: 20,
                chunk_overlap: 4,
            },
        ));
        let orchestrator = Arc::new(Orchestrator::new(
            Arc::new(ScriptedModel::new(model_reply)),
            ToolSet(vec![Box::new(DocumentRetrieval::new(index, 3))]),
        ));
        let verifier =
            Arc::new(StaticVerifier::from_spec(&format!("{}:u1:u1@example.com", TOKEN)).unwrap());

        let state = AppState::new(ingestion, orchestrator, verifier);
        TestApp {
            router: create_router(state, &[], Duration::from_secs(5)),
            store,
        }
    }

    fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_is_open() {
        let app = test_app(generated_content_reply());
        let response = app
            .router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_generate_requires_auth() {
        let app = test_app(generated_content_reply());
        let request = post_json("/generate", None, json!({"job_description": "Support Worker"}));
        let response = app.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "UNAUTHENTICATED");
    }

    #[tokio::test]
    async fn test_generate_rejects_unknown_token() {
        let app = test_app(generated_content_reply());
        let request = post_json(
            "/generate",
            Some("wrong-token"),
            json!({"job_description": "Support Worker"}),
        );
        let response = app.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_generate_returns_structured_content() {
        let app = test_app(generated_content_reply());
        let request = post_json(
            "/generate",
            Some(TOKEN),
            json!({"job_description": "Support Worker role with an NDIS provider in Perth"}),
        );
        let response = app.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["analysis"]["experience_level"], "Mid-level");
        assert_eq!(body["suggested_tone"], "Warm");
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_job_description() {
        let app = test_app(generated_content_reply());
        let request = post_json("/generate", Some(TOKEN), json!({"job_description": ""}));
        let response = app.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_non_json_model_reply_is_opaque_500() {
        let app = test_app("I refuse to answer in JSON.".to_string());
        let request = post_json(
            "/generate",
            Some(TOKEN),
            json!({"job_description": "Support Worker"}),
        );
        let response = app.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "MALFORMED_MODEL_OUTPUT");
        // raw model text stays server-side
        assert!(!body["error"]["message"].as_str().unwrap().contains("refuse"));
    }

    #[tokio::test]
    async fn test_interview_prep_returns_guide() {
        let app = test_app(interview_prep_reply());
        let request = post_json(
            "/interview-prep",
            Some(TOKEN),
            json!({
                "job_description": "Support Worker role",
                "resume_text": "Experienced support worker",
                "cover_letter_text": "Dear Hiring Manager"
            }),
        );
        let response = app.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["potential_questions"][0]["category"], "behavioral");
        assert!(body["thank_you_note_draft"].as_str().unwrap().starts_with("Thank you"));
    }

    #[tokio::test]
    async fn test_storage_event_ingests_upload() {
        let app = test_app(generated_content_reply());
        app.store
            .put(
                "uploads",
                "u1/resume.txt",
                b"Coordinated NDIS support plans for clients across Perth".to_vec(),
            )
            .await;

        let request = post_json(
            "/events/storage",
            None,
            json!({"bucket": "uploads", "name": "u1/resume.txt"}),
        );
        let response = app.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "ingested");
        assert!(body["chunks"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_storage_event_skips_unsupported_type() {
        let app = test_app(generated_content_reply());
        app.store
            .put("uploads", "u1/resume.docx", b"binary".to_vec())
            .await;

        let request = post_json(
            "/events/storage",
            None,
            json!({"bucket": "uploads", "name": "u1/resume.docx"}),
        );
        let response = app.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "skipped");
    }

    #[tokio::test]
    async fn test_storage_event_missing_object_fails_for_retry() {
        let app = test_app(generated_content_reply());
        let request = post_json(
            "/events/storage",
            None,
            json!({"bucket": "uploads", "name": "u1/missing.txt"}),
        );
        let response = app.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
