//! Completion 모듈 - Groq chat completion API 호출
//!
//! 프롬프트를 정규화하여 OpenAI 호환 chat completion 엔드포인트로 보내고,
//! 정해진 모델 순서대로 시도하여 첫 번째 성공 응답의 답변을 반환합니다.
//!
//! ## 사용법
//! ```rust,ignore
//! let client = CompletionClient::new(CompletionConfig::from_env()?)?;
//! let answer = client.complete("질문 프롬프트").await;
//! ```

mod normalize;
mod policy;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{CompletionConfig, API_KEY_PREFIX};

pub use normalize::{encode_json, encode_json_ascii, normalize_prompt};
pub use policy::{
    AttemptAction, FallbackPolicy, StatusRule, StopReason, DEFAULT_MODELS, DEFAULT_STATUS_RULES,
};

// ============================================================================
// Errors
// ============================================================================

/// 답변 생성 실패 원인
///
/// `Display` 출력이 그대로 사용자에게 보여지는 메시지입니다.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    #[error("GROQ API 키가 설정되지 않았습니다. .env 파일에 GROQ_API_KEY를 설정해주세요.")]
    MissingApiKey,

    #[error("GROQ API 키 형식이 올바르지 않습니다. 'gsk_'로 시작해야 합니다.")]
    InvalidKeyFormat,

    #[error("API 키가 유효하지 않습니다. GROQ_API_KEY를 확인해주세요.")]
    Unauthorized,

    #[error("API 호출 한도를 초과했습니다. 잠시 후 다시 시도해주세요.")]
    RateLimited,

    #[error("모든 모델에서 API 호출에 실패했습니다. 네트워크 연결과 API 키를 확인해주세요.")]
    AllModelsFailed,
}

impl From<StopReason> for CompletionError {
    fn from(reason: StopReason) -> Self {
        match reason {
            StopReason::Unauthorized => CompletionError::Unauthorized,
            StopReason::RateLimited => CompletionError::RateLimited,
        }
    }
}

/// 전송 계층 오류 (연결 실패, 타임아웃, 본문 읽기 실패)
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),
}

// ============================================================================
// Transport
// ============================================================================

/// HTTP 응답 (상태 코드 + 본문)
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// completion 엔드포인트로 JSON 본문을 보내는 전송 계층
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    /// 직렬화된 요청 본문을 bearer 인증으로 POST
    async fn post(&self, api_key: &str, body: String) -> Result<TransportResponse, TransportError>;
}

/// reqwest 기반 전송 계층
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// 설정의 엔드포인트와 타임아웃으로 생성
    pub fn new(config: &CompletionConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("life-guide-chatbot/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl CompletionTransport for HttpTransport {
    async fn post(&self, api_key: &str, body: String) -> Result<TransportResponse, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::AUTHORIZATION, format!("Bearer {}", api_key))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Ok(TransportResponse { status, body })
    }
}

// ============================================================================
// Wire Types
// ============================================================================

/// chat completion 요청 본문
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// chat completion 응답
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// 응답 본문에서 첫 번째 답변 추출
fn parse_answer(body: &str) -> Option<String> {
    let response: ChatResponse = serde_json::from_str(body).ok()?;
    let content = response.choices.into_iter().next()?.message.content?;
    Some(content.trim().to_string())
}

// ============================================================================
// Completion Client
// ============================================================================

/// 모델 폴백을 수행하는 completion 클라이언트
pub struct CompletionClient<T = HttpTransport> {
    config: CompletionConfig,
    policy: FallbackPolicy,
    transport: T,
}

impl CompletionClient<HttpTransport> {
    /// HTTP 전송 계층과 기본 폴백 정책으로 생성
    pub fn new(config: CompletionConfig) -> anyhow::Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, FallbackPolicy::default(), transport))
    }
}

impl<T: CompletionTransport> CompletionClient<T> {
    pub fn with_transport(config: CompletionConfig, policy: FallbackPolicy, transport: T) -> Self {
        Self {
            config,
            policy,
            transport,
        }
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    pub fn policy(&self) -> &FallbackPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// 답변 생성 (실패 시 사용자용 메시지 반환)
    pub async fn complete(&self, prompt: &str) -> String {
        match self.try_complete(prompt).await {
            Ok(answer) => answer,
            Err(e) => e.to_string(),
        }
    }

    /// 답변 생성
    ///
    /// 401/429는 즉시 중단하고, 그 외 실패는 다음 모델로 넘어갑니다.
    pub async fn try_complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let api_key = self.validated_key()?;
        let content = normalize_prompt(prompt);

        for model in self.policy.models() {
            let request = ChatRequest {
                model,
                temperature: self.config.temperature,
                messages: vec![ChatMessage {
                    role: "user",
                    content: &content,
                }],
                max_tokens: self.config.max_tokens,
            };

            let body = match encode_json(&request) {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!("Model {} request encoding failed: {}", model, e);
                    continue;
                }
            };

            tracing::debug!("Trying model {} ({} bytes)", model, body.len());

            let response = match self.transport.post(api_key, body).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!("Model {} network error: {}", model, e);
                    match self.policy.on_network_error() {
                        AttemptAction::Stop(reason) => return Err(reason.into()),
                        _ => continue,
                    }
                }
            };

            match self.policy.on_status(response.status) {
                AttemptAction::Accept => match parse_answer(&response.body) {
                    Some(answer) => {
                        tracing::info!("Answer generated by model {}", model);
                        return Ok(answer);
                    }
                    None => {
                        tracing::warn!("Model {} returned no choices", model);
                        if let AttemptAction::Stop(reason) = self.policy.on_empty_response() {
                            return Err(reason.into());
                        }
                    }
                },
                AttemptAction::Stop(reason) => {
                    tracing::warn!("Model {} stopped fallback ({:?})", model, reason);
                    return Err(reason.into());
                }
                AttemptAction::NextModel => {
                    tracing::warn!(
                        "Model {} API error {}: {}",
                        model,
                        response.status,
                        response.body
                    );
                }
            }
        }

        Err(CompletionError::AllModelsFailed)
    }

    /// 로컬 키 검사 (존재 여부 + 접두사)
    fn validated_key(&self) -> Result<&str, CompletionError> {
        let key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(CompletionError::MissingApiKey)?;

        if !key.starts_with(API_KEY_PREFIX) {
            return Err(CompletionError::InvalidKeyFormat);
        }

        Ok(key)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// 미리 정해진 응답을 순서대로 돌려주는 전송 계층
    struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
        requests: Mutex<Vec<(String, serde_json::Value)>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Result<TransportResponse, TransportError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn models_called(&self) -> Vec<String> {
            self.requests
                .lock()
                .expect("lock")
                .iter()
                .map(|(_, body)| body["model"].as_str().unwrap_or_default().to_string())
                .collect()
        }
    }

    #[async_trait]
    impl CompletionTransport for ScriptedTransport {
        async fn post(
            &self,
            api_key: &str,
            body: String,
        ) -> Result<TransportResponse, TransportError> {
            let json: serde_json::Value = serde_json::from_str(&body).expect("valid request json");
            self.requests
                .lock()
                .expect("lock")
                .push((api_key.to_string(), json));
            self.responses
                .lock()
                .expect("lock")
                .pop_front()
                .unwrap_or_else(|| Ok(status(400)))
        }
    }

    fn status(code: u16) -> TransportResponse {
        TransportResponse {
            status: code,
            body: r#"{"error":{"message":"scripted"}}"#.to_string(),
        }
    }

    fn answer(text: &str) -> TransportResponse {
        TransportResponse {
            status: 200,
            body: serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": text } }]
            })
            .to_string(),
        }
    }

    fn client(
        api_key: Option<&str>,
        responses: Vec<Result<TransportResponse, TransportError>>,
    ) -> CompletionClient<ScriptedTransport> {
        let config = CompletionConfig {
            api_key: api_key.map(str::to_string),
            ..Default::default()
        };
        CompletionClient::with_transport(
            config,
            FallbackPolicy::default(),
            ScriptedTransport::new(responses),
        )
    }

    #[tokio::test]
    async fn test_missing_key() {
        let client = client(None, vec![]);
        assert_eq!(
            client.try_complete("질문").await,
            Err(CompletionError::MissingApiKey)
        );
        assert!(client.transport().models_called().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_key_format() {
        let client = client(Some("sk-not-groq"), vec![]);
        let message = client.complete("질문").await;
        assert_eq!(message, CompletionError::InvalidKeyFormat.to_string());
        assert!(client.transport().models_called().is_empty());
    }

    #[tokio::test]
    async fn test_unauthorized_stops_immediately() {
        let client = client(Some("gsk_test"), vec![Ok(status(401)), Ok(answer("unused"))]);
        assert_eq!(
            client.try_complete("질문").await,
            Err(CompletionError::Unauthorized)
        );
        assert_eq!(client.transport().models_called(), vec!["mistral-saba-24b"]);
    }

    #[tokio::test]
    async fn test_rate_limit_stops_immediately() {
        let client = client(Some("gsk_test"), vec![Ok(status(429)), Ok(answer("unused"))]);
        assert_eq!(
            client.complete("질문").await,
            "API 호출 한도를 초과했습니다. 잠시 후 다시 시도해주세요."
        );
        assert_eq!(client.transport().models_called().len(), 1);
    }

    #[tokio::test]
    async fn test_all_models_fail() {
        let responses = (0..4).map(|_| Ok(status(400))).collect();
        let client = client(Some("gsk_test"), responses);
        assert_eq!(
            client.try_complete("질문").await,
            Err(CompletionError::AllModelsFailed)
        );
        let expected: Vec<String> = DEFAULT_MODELS.iter().map(|m| m.to_string()).collect();
        assert_eq!(client.transport().models_called(), expected);
    }

    #[tokio::test]
    async fn test_falls_back_after_server_error_and_network_error() {
        let client = client(
            Some("gsk_test"),
            vec![
                Ok(status(500)),
                Err(TransportError::Request("connection reset".to_string())),
                Ok(answer("  지하철은 05:30에 운행을 시작합니다.  ")),
            ],
        );
        assert_eq!(
            client.try_complete("질문").await,
            Ok("지하철은 05:30에 운행을 시작합니다.".to_string())
        );
        assert_eq!(
            client.transport().models_called(),
            vec!["mistral-saba-24b", "llama-3.1-70b-versatile", "mixtral-8x7b-32768"]
        );
    }

    #[tokio::test]
    async fn test_empty_choices_tries_next_model() {
        let empty = TransportResponse {
            status: 200,
            body: r#"{"choices":[]}"#.to_string(),
        };
        let client = client(
            Some("gsk_test"),
            vec![Ok(empty), Ok(status(200)), Ok(answer("ok"))],
        );
        assert_eq!(client.try_complete("질문").await, Ok("ok".to_string()));
        assert_eq!(client.transport().models_called().len(), 3);
    }

    #[tokio::test]
    async fn test_request_body_fields() {
        let client = client(Some("gsk_secret"), vec![Ok(answer("ok"))]);
        client
            .try_complete("  \u{201c}지하철\u{201d}\n\n운영시간\u{200b}  ")
            .await
            .expect("answer");

        let requests = client.transport().requests.lock().expect("lock");
        let (key, body) = &requests[0];
        assert_eq!(key, "gsk_secret");
        assert_eq!(body["max_tokens"], 8192);
        assert!((body["temperature"].as_f64().unwrap_or_default() - 0.4).abs() < 1e-6);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(
            body["messages"][0]["content"],
            normalize_prompt("\"지하철\" 운영시간")
        );
    }

    #[test]
    fn test_parse_answer() {
        assert_eq!(
            parse_answer(r#"{"choices":[{"message":{"content":" hi "}}]}"#),
            Some("hi".to_string())
        );
        assert_eq!(parse_answer(r#"{"choices":[]}"#), None);
        assert_eq!(parse_answer(r#"{"choices":[{"message":{"content":null}}]}"#), None);
        assert_eq!(parse_answer("not json"), None);
    }

    #[test]
    fn test_http_transport_creation() {
        assert!(HttpTransport::new(&CompletionConfig::default()).is_ok());
    }

    #[test]
    fn test_new_client_uses_config_and_default_policy() {
        let config = CompletionConfig::default().with_api_key("gsk_test");
        let client = CompletionClient::new(config).expect("client");

        assert_eq!(client.config().key_status(), "설정됨");
        assert_eq!(client.config().endpoint, crate::config::DEFAULT_API_URL);
        assert_eq!(client.policy().models(), FallbackPolicy::default().models());
        assert_eq!(client.policy().models()[0], "mistral-saba-24b");
    }
}
