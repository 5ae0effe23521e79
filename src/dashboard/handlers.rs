use axum::body::Bytes;
use axum::extract::State;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::routes::DashState;
use crate::docs::{generate_documentation, ChatMessage, GenerationResult};
use crate::error::{DocSynthError, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDocsRequest {
    #[serde(default)]
    pub open_api_spec: String,
    #[serde(default)]
    pub meeting_notes: Option<String>,
    #[serde(default)]
    pub chat_context: Option<Vec<ChatMessage>>,
}

impl GenerateDocsRequest {
    fn parse(body: &[u8]) -> Result<Self> {
        let req: Self = serde_json::from_slice(body)?;
        if req.open_api_spec.trim().is_empty() {
            return Err(DocSynthError::Validation(
                "OpenAPI specification is required".into(),
            ));
        }
        Ok(req)
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatReplyRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateDocsResponse {
    #[serde(flatten)]
    pub result: GenerationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub backend: String,
    pub backend_name: String,
    pub available_backends: Vec<String>,
    pub model: String,
    pub version: &'static str,
}

// -- Documentation --------------------------------------------------------

/// Generate documentation for one request.
///
/// Always answers 200: rejected input and generation failures are reported
/// inside the body, never through the status code.
pub async fn generate_docs(State(state): State<DashState>, body: Bytes) -> Json<GenerateDocsResponse> {
    let request_id = Uuid::new_v4();
    let span = info_span!("generate_docs", %request_id);

    async move {
        let req = match GenerateDocsRequest::parse(&body) {
            Ok(req) => req,
            Err(e) => {
                warn!(kind = e.kind(), "rejected generate request: {e}");
                return Json(GenerateDocsResponse {
                    result: GenerationResult::rejected(),
                    error: Some(ErrorInfo {
                        message: e.to_string(),
                        kind: e.kind().to_string(),
                    }),
                });
            }
        };

        info!(
            spec_len = req.open_api_spec.len(),
            chat_messages = req.chat_context.as_ref().map_or(0, Vec::len),
            "generate request accepted"
        );

        let result = generate_documentation(
            &state.engine,
            &req.open_api_spec,
            req.meeting_notes.as_deref().unwrap_or_default(),
            req.chat_context.as_deref(),
        )
        .await;

        Json(GenerateDocsResponse {
            result,
            error: None,
        })
    }
    .instrument(span)
    .await
}

// -- Chat -----------------------------------------------------------------

pub async fn chat_opening() -> Json<ChatMessage> {
    Json(ChatMessage::opening())
}

/// Scripted assistant answer to the conversation so far.
pub async fn chat_reply(Json(req): Json<ChatReplyRequest>) -> Json<ChatMessage> {
    debug!(messages = req.messages.len(), "chat reply requested");
    Json(ChatMessage::reply(&req.messages))
}

// -- Status ---------------------------------------------------------------

pub async fn get_status(State(state): State<DashState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        backend: state.engine.active_backend().to_string(),
        backend_name: state.engine.backend_info().to_string(),
        available_backends: state.engine.available_backends(),
        model: crate::config::env_or("LLM_MODEL", &state.config.llm.model)
            .unwrap_or_default(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn healthz() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::Config;
    use crate::docs::{ChatRole, RETRY_QUESTION};
    use crate::llm::testing::{engine, FailingBackend, StubBackend};
    use crate::llm::LlmBackend;

    fn state(backend: Arc<dyn LlmBackend>) -> DashState {
        DashState {
            engine: Arc::new(engine(backend)),
            config: Config::default(),
        }
    }

    async fn post(state: DashState, body: &str) -> GenerateDocsResponse {
        generate_docs(State(state), Bytes::from(body.to_string())).await.0
    }

    #[tokio::test]
    async fn empty_spec_is_rejected_without_generation() {
        let stub = Arc::new(StubBackend::new("# Section\nbody"));
        for body in [r#"{"openApiSpec": ""}"#, r#"{"openApiSpec": "  \n"}"#, r#"{}"#] {
            let resp = post(state(stub.clone()), body).await;
            assert_eq!(
                resp.result.documentation,
                "# Error\nFailed to generate documentation. Please try again."
            );
            assert_eq!(resp.result.follow_up_questions, vec![RETRY_QUESTION]);
            assert_eq!(resp.error.as_ref().unwrap().kind, "ValidationError");
        }
        assert!(stub.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_json_is_rejected() {
        let stub = Arc::new(StubBackend::new(""));
        let resp = post(state(stub.clone()), "{not json").await;
        assert_eq!(resp.error.unwrap().kind, "JsonError");
        assert!(stub.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn success_has_no_error_field() {
        let stub = Arc::new(
            StubBackend::new("# Section\nbody").reply("follow-up questions", "1. Anything else?"),
        );
        let body = r#"{
            "openApiSpec": "{\"openapi\": \"3.0.0\", \"info\": {\"title\": \"Pets\"}}",
            "meetingNotes": "Focus on onboarding",
            "chatContext": [
                {"role": "assistant", "content": "Who is the audience?"},
                {"role": "user", "content": "Partners"}
            ]
        }"#;
        let resp = post(state(stub.clone()), body).await;
        assert!(resp.error.is_none());
        assert_eq!(resp.result.follow_up_questions, vec!["Anything else?"]);
        assert!(resp.result.documentation.contains("# Getting Started"));

        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("error").is_none());
        assert!(json["followUpQuestions"].is_array());
        assert!(stub.prompts().iter().any(|p| p.contains("Partners")));
    }

    #[tokio::test]
    async fn generation_failure_still_answers_without_error_field() {
        let backend = Arc::new(FailingBackend {
            needle: "Overview",
            message: "401 Unauthorized",
        });
        let resp = post(state(backend), r#"{"openApiSpec": "openapi: 3.0.0"}"#).await;
        assert!(resp.result.documentation.starts_with("# Error\n"));
        assert!(resp.result.documentation.contains("401 Unauthorized"));
        assert_eq!(resp.result.follow_up_questions, vec![RETRY_QUESTION]);
    }

    #[tokio::test]
    async fn error_descriptor_serializes_type_key() {
        let resp = post(state(Arc::new(StubBackend::new(""))), "").await;
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["error"]["type"], "JsonError");
        assert!(json["error"]["message"].as_str().unwrap().starts_with("JSON error"));
        assert_eq!(json["followUpQuestions"][0], RETRY_QUESTION);
    }

    #[tokio::test]
    async fn opening_message_is_from_assistant() {
        let msg = chat_opening().await.0;
        assert_eq!(msg.role, ChatRole::Assistant);
        assert!(msg.content.contains("primary audience"));
    }

    #[tokio::test]
    async fn chat_reply_follows_the_script() {
        let req: ChatReplyRequest = serde_json::from_value(serde_json::json!({
            "messages": [
                {"role": "assistant", "content": ChatMessage::opening().content},
                {"role": "user", "content": "Mobile developers"}
            ]
        }))
        .unwrap();
        let msg = chat_reply(Json(req)).await.0;
        assert_eq!(msg.role, ChatRole::Assistant);
        assert!(msg.content.contains("Should we include authentication examples?"));

        let req: ChatReplyRequest = serde_json::from_str("{}").unwrap();
        let msg = chat_reply(Json(req)).await.0;
        assert!(msg.content.contains("click 'Generate Documentation'"));
    }

    #[tokio::test]
    async fn status_reports_active_backend() {
        let status = get_status(State(state(Arc::new(StubBackend::new(""))))).await.0;
        assert_eq!(status.backend, "stub");
        assert_eq!(status.available_backends, vec!["stub"]);
        assert_eq!(healthz().await, "ok");
    }
}
