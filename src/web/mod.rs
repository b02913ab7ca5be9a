//! 폼 UI 서버
//!
//! 질문 입력창 하나와 답변 출력창 하나로 된 단일 페이지 폼입니다.
//! - `GET /` 빈 폼
//! - `POST /` 폼 제출 → 답변이 채워진 폼
//! - `POST /api/ask` JSON 질의 (`{"question": ...}` → `{"answer": ...}`)
//! - `GET /health`

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::engine::AnswerService;

/// 빈 질문에 대한 안내
pub const EMPTY_QUESTION: &str = "질문을 입력해주세요.";

const PAGE_TITLE: &str = "한국생활가이드 챗봇";

// ============================================================================
// Types
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    service: Arc<dyn AnswerService>,
}

#[derive(Debug, Deserialize)]
pub struct AskForm {
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
}

// ============================================================================
// Router
// ============================================================================

/// 라우터 생성
pub fn build_app(service: Arc<dyn AnswerService>) -> Router {
    let state = AppState { service };

    Router::new()
        .route("/", get(index).post(ask_form))
        .route("/api/ask", post(ask_json))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// 서버 실행
pub async fn serve(app: Router, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await.context("Server error")
}

/// 질문 처리 (빈 질문은 파이프라인 호출 없이 거절)
pub async fn ask_question(service: &dyn AnswerService, question: &str) -> String {
    if question.trim().is_empty() {
        return EMPTY_QUESTION.to_string();
    }
    service.ask(question).await
}

// ============================================================================
// Handlers
// ============================================================================

async fn index() -> Html<String> {
    Html(render_page("", ""))
}

async fn ask_form(State(state): State<AppState>, Form(form): Form<AskForm>) -> Html<String> {
    let answer = ask_question(state.service.as_ref(), &form.question).await;
    Html(render_page(&form.question, &answer))
}

async fn ask_json(State(state): State<AppState>, Json(form): Json<AskForm>) -> Json<AskResponse> {
    let answer = ask_question(state.service.as_ref(), &form.question).await;
    Json(AskResponse { answer })
}

// ============================================================================
// HTML
// ============================================================================

fn render_page(question: &str, answer: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="ko">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; max-width: 720px; margin: 2rem auto; }}
input, textarea {{ width: 100%; box-sizing: border-box; }}
button {{ margin: 0.5rem 0; }}
</style>
</head>
<body>
<h2>{title}</h2>
<form method="post" action="/">
<label for="question">질문</label>
<input id="question" name="question" type="text" placeholder="여기에 질문을 입력하세요." value="{question}">
<button type="submit">질문하기</button>
</form>
<label for="answer">답변</label>
<textarea id="answer" rows="10" readonly>{answer}</textarea>
</body>
</html>
"#,
        title = PAGE_TITLE,
        question = escape_html(question),
        answer = escape_html(answer),
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

// ============================================================================
// Tests
// ============================================================================
