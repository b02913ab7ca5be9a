//! life-guide-chatbot - 한국 생활 가이드 PDF 챗봇
//!
//! 가이드 PDF에서 질문 키워드와 일치하는 페이지를 찾아
//! Groq chat completion API로 답변을 생성하는 키워드 RAG 챗봇입니다.

pub mod cli;
pub mod completion;
pub mod config;
pub mod document;
pub mod engine;
pub mod prompt;
pub mod retrieval;
pub mod web;

// Re-exports
pub use completion::{
    CompletionClient, CompletionError, CompletionTransport, FallbackPolicy, HttpTransport,
    TransportError, TransportResponse,
};
pub use config::{ChatbotConfig, CompletionConfig, ServerConfig};
pub use document::{Document, LoadError, PdfLoader};
pub use engine::{AnswerError, AnswerService, QueryEngine};
pub use prompt::{build_prompt, PromptBuilder, DEFAULT_PROMPT};
pub use retrieval::{extract_keywords, PageRetriever, ScoredPage};
