use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use life_guide_chatbot::completion::normalize_prompt;
use life_guide_chatbot::{
    extract_keywords, CompletionClient, CompletionConfig, CompletionError, CompletionTransport,
    Document, FallbackPolicy, PageRetriever, PromptBuilder, QueryEngine, TransportError,
    TransportResponse,
};

const SUBWAY: &str = "서울 지하철 운영시간은 매일 05:30부터 24:00까지입니다.";
const VISA: &str = "비자 연장은 출입국관리사무소를 방문해야 합니다.";

// ============================================================================
// Scripted transport
// ============================================================================

#[derive(Default)]
struct CapturingTransport {
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl CompletionTransport for CapturingTransport {
    async fn post(&self, _api_key: &str, body: String) -> Result<TransportResponse, TransportError> {
        let request: Value = serde_json::from_str(&body).expect("request json");
        let content = request["messages"][0]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        self.prompts.lock().expect("lock").push(content);

        Ok(TransportResponse {
            status: 200,
            body: json!({ "choices": [{ "message": { "content": "매일 05:30부터 24:00까지입니다." } }] })
                .to_string(),
        })
    }
}

#[tokio::test]
async fn subway_question_end_to_end() {
    let query = "지하철 운영시간은?";

    let keywords = extract_keywords(query);
    assert!(keywords.contains("지하철"));
    assert!(keywords.contains("운영시간은"));
    assert!(keywords.contains("운영시간"));

    let pages = vec![SUBWAY.to_string(), VISA.to_string()];
    let selected = PageRetriever::default().find_relevant_pages(query, &pages);
    assert_eq!(selected, vec![SUBWAY.to_string()]);

    let prompt = PromptBuilder::default().build(&selected, query);
    let page_at = prompt.find(SUBWAY).expect("page in prompt");
    let query_at = prompt.rfind(query).expect("query in prompt");
    let anchor_at = prompt.rfind("=== 답변 ===").expect("answer anchor");
    assert!(page_at < query_at && query_at < anchor_at);
    assert!(!prompt.contains(VISA));

    let client = CompletionClient::with_transport(
        CompletionConfig::default().with_api_key("gsk_test"),
        FallbackPolicy::default(),
        CapturingTransport::default(),
    );
    let engine = QueryEngine::new(
        Document::from_pages(pages),
        PageRetriever::default(),
        PromptBuilder::default(),
        client,
    );

    let answer = engine.answer(query).await;
    assert_eq!(answer, "매일 05:30부터 24:00까지입니다.");

    let prompts = engine.client().transport().prompts.lock().expect("lock").clone();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0], normalize_prompt(&prompt));
}

// ============================================================================
// Mock completion server (real HTTP transport)
// ============================================================================

#[derive(Clone, Default)]
struct MockServer {
    /// 모델별 응답 상태 (없으면 200)
    statuses: Arc<HashMap<String, u16>>,
    calls: Arc<Mutex<Vec<String>>>,
    auth: Arc<Mutex<Vec<String>>>,
}

async fn completions(
    State(server): State<MockServer>,
    headers: HeaderMap,
    Json(request): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let model = request["model"].as_str().unwrap_or_default().to_string();
    server.calls.lock().expect("lock").push(model.clone());
    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        server.auth.lock().expect("lock").push(auth.to_string());
    }

    let status = server.statuses.get(&model).copied().unwrap_or(200);
    let body = if status == 200 {
        json!({ "choices": [{ "message": { "content": format!("answer from {}", model) } }] })
    } else {
        json!({ "error": { "message": "mock failure" } })
    };

    (
        StatusCode::from_u16(status).expect("status"),
        Json(body),
    )
}

async fn spawn_mock(statuses: &[(&str, u16)]) -> (String, MockServer) {
    let server = MockServer {
        statuses: Arc::new(
            statuses
                .iter()
                .map(|(model, status)| (model.to_string(), *status))
                .collect(),
        ),
        ..Default::default()
    };

    let app = Router::new()
        .route("/v1/chat/completions", post(completions))
        .with_state(server.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });

    (format!("http://{}/v1/chat/completions", addr), server)
}

fn http_client(endpoint: &str) -> CompletionClient {
    let config = CompletionConfig::default()
        .with_api_key("gsk_mock")
        .with_endpoint(endpoint)
        .expect("endpoint");
    CompletionClient::new(config).expect("client")
}

#[tokio::test]
async fn http_transport_falls_back_over_bad_requests() {
    let (endpoint, server) =
        spawn_mock(&[("mistral-saba-24b", 400), ("llama-3.1-70b-versatile", 503)]).await;

    let answer = http_client(&endpoint).try_complete("질문").await;
    assert_eq!(answer, Ok("answer from mixtral-8x7b-32768".to_string()));

    let calls = server.calls.lock().expect("lock").clone();
    assert_eq!(
        calls,
        vec!["mistral-saba-24b", "llama-3.1-70b-versatile", "mixtral-8x7b-32768"]
    );
    assert!(server
        .auth
        .lock()
        .expect("lock")
        .iter()
        .all(|a| a == "Bearer gsk_mock"));
}

#[tokio::test]
async fn http_transport_stops_on_unauthorized() {
    let (endpoint, server) = spawn_mock(&[("mistral-saba-24b", 401)]).await;

    let answer = http_client(&endpoint).try_complete("질문").await;
    assert_eq!(answer, Err(CompletionError::Unauthorized));
    assert_eq!(server.calls.lock().expect("lock").len(), 1);
}

#[tokio::test]
async fn http_transport_unreachable_exhausts_models() {
    // 바인드 후 바로 닫아서 연결이 거부되는 주소
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let answer = http_client(&format!("http://{}/v1/chat/completions", addr))
        .complete("질문")
        .await;
    assert_eq!(answer, CompletionError::AllModelsFailed.to_string());
}
