//! 질의 엔진 - 검색 → 프롬프트 → LLM 호출 파이프라인
//!
//! 문서는 시작 시 한 번 로드되어 읽기 전용으로 공유됩니다.
//! 모든 실패는 사용자에게 보여줄 고정 메시지로 끝납니다.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use thiserror::Error;

use crate::completion::{CompletionClient, CompletionError, CompletionTransport, HttpTransport};
use crate::config::ChatbotConfig;
use crate::document::{Document, PdfLoader};
use crate::prompt::PromptBuilder;
use crate::retrieval::{PageRetriever, ScoredPage};

/// 질문 답변 실패 원인
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnswerError {
    #[error("PDF 파일을 로드할 수 없습니다. 파일 경로를 확인해주세요.")]
    DocumentUnavailable,

    #[error("질문과 관련된 정보를 PDF에서 찾을 수 없습니다.")]
    NoRelevantPages,

    #[error(transparent)]
    Completion(#[from] CompletionError),
}

// ============================================================================
// QueryEngine
// ============================================================================

/// 챗봇 질의 엔진
pub struct QueryEngine<T = HttpTransport> {
    document: Document,
    retriever: PageRetriever,
    prompt: PromptBuilder,
    client: CompletionClient<T>,
}

impl QueryEngine<HttpTransport> {
    /// 설정으로 엔진 생성 (PDF 로드 포함)
    ///
    /// PDF 로드 실패는 빈 문서로 기록되며, 이후 질문마다 "문서 없음" 메시지가 반환됩니다.
    pub async fn from_config(config: &ChatbotConfig) -> Result<Self> {
        let document = load_document(&config.pdf_path).await?;
        let client = CompletionClient::new(config.completion.clone())
            .context("CompletionClient 생성 실패")?;

        Ok(Self::new(
            document,
            PageRetriever::default(),
            PromptBuilder::new(config.system_prompt.clone()),
            client,
        ))
    }
}

impl<T: CompletionTransport> QueryEngine<T> {
    pub fn new(
        document: Document,
        retriever: PageRetriever,
        prompt: PromptBuilder,
        client: CompletionClient<T>,
    ) -> Self {
        Self {
            document,
            retriever,
            prompt,
            client,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn client(&self) -> &CompletionClient<T> {
        &self.client
    }

    pub fn prompt(&self) -> &PromptBuilder {
        &self.prompt
    }

    /// 질문에 대한 후보 페이지 (LLM 호출 없음)
    pub fn search(&self, query: &str) -> Vec<ScoredPage> {
        self.retriever.rank_pages(query, self.document.pages())
    }

    /// 질문에 답변 (실패 시 사용자용 메시지)
    pub async fn answer(&self, query: &str) -> String {
        match self.try_answer(query).await {
            Ok(answer) => answer,
            Err(e) => e.to_string(),
        }
    }

    /// 질문에 답변
    pub async fn try_answer(&self, query: &str) -> Result<String, AnswerError> {
        if self.document.is_empty() {
            return Err(AnswerError::DocumentUnavailable);
        }

        tracing::info!("총 {}개 페이지, 질문: {}", self.document.len(), query);

        let relevant_pages = self
            .retriever
            .find_relevant_pages(query, self.document.pages());

        if relevant_pages.is_empty() {
            return Err(AnswerError::NoRelevantPages);
        }

        tracing::info!("관련 페이지 {}개 발견", relevant_pages.len());

        let prompt = self.prompt.build(&relevant_pages, query);
        tracing::debug!("생성된 프롬프트 길이: {} 문자", prompt.chars().count());

        Ok(self.client.try_complete(&prompt).await?)
    }
}

/// PDF를 블로킹 스레드에서 로드 (실패 시 빈 문서)
pub async fn load_document(path: &Path) -> Result<Document> {
    // PDF 추출은 CPU 바운드이므로 spawn_blocking 사용
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || PdfLoader::default().load_or_empty(&path))
        .await
        .context("PDF loading task failed")
}

// ============================================================================
// AnswerService
// ============================================================================

/// 폼 UI가 호출하는 답변 서비스
#[async_trait]
pub trait AnswerService: Send + Sync {
    async fn ask(&self, question: &str) -> String;
}

#[async_trait]
impl<T: CompletionTransport> AnswerService for QueryEngine<T> {
    async fn ask(&self, question: &str) -> String {
        self.answer(question).await
    }
}

// ============================================================================
// Tests
// ============================================================================
