//! CLI 모듈
//!
//! 챗봇 CLI 명령어 정의 및 구현

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::completion::CompletionClient;
use crate::config::ChatbotConfig;
use crate::document::{Document, PdfLoader};
use crate::engine::{load_document, QueryEngine};
use crate::retrieval::PageRetriever;
use crate::web;

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "life-guide-chatbot")]
#[command(version, about = "한국 생활 가이드 PDF 챗봇", long_about = None)]
pub struct Cli {
    /// 가이드 PDF 경로 (기본: CHATBOT_PDF_PATH 또는 data/guide.pdf)
    #[arg(long, global = true)]
    pub pdf: Option<PathBuf>,

    /// 안내문(system instruction) 파일 (기본: CHATBOT_SYSTEM_PROMPT_FILE 또는 내장 안내문)
    #[arg(long, global = true)]
    pub system_prompt: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 질문 폼 웹 서버 실행
    Serve {
        /// 바인드 호스트
        #[arg(long)]
        host: Option<String>,

        /// 바인드 포트
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// 질문 하나에 답변하고 종료
    Ask {
        /// 질문
        question: String,
    },

    /// 로드된 페이지 목록
    Pages {
        /// 결과 개수 제한
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// 질문과 관련된 페이지 검색 (LLM 호출 없음)
    Search {
        /// 검색 질문
        query: String,
    },

    /// 상태 확인
    Status,
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    let mut config = ChatbotConfig::from_env().context("설정 로드 실패")?;
    if let Some(pdf) = cli.pdf {
        config.pdf_path = pdf;
    }
    if let Some(path) = cli.system_prompt {
        config = config.with_system_prompt_file(&path)?;
    }

    match cli.command {
        Commands::Serve { host, port } => cmd_serve(config, host, port).await,
        Commands::Ask { question } => cmd_ask(&config, &question).await,
        Commands::Pages { limit } => cmd_pages(&config, limit).await,
        Commands::Search { query } => cmd_search(&config, &query).await,
        Commands::Status => cmd_status(&config).await,
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 서버 명령어 (serve)
///
/// PDF를 한 번 로드하고 폼 서버를 실행합니다. PDF 로드에 실패해도 서버는 뜹니다.
async fn cmd_serve(mut config: ChatbotConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let engine = QueryEngine::from_config(&config)
        .await
        .context("QueryEngine 초기화 실패")?;

    if engine.document().is_empty() {
        tracing::warn!(
            "문서를 사용할 수 없습니다: {}. 모든 질문에 오류 메시지가 반환됩니다.",
            config.pdf_path.display()
        );
    }

    let app = web::build_app(Arc::new(engine));
    web::serve(app, &config.server.addr()).await
}

/// 질문 명령어 (ask)
async fn cmd_ask(config: &ChatbotConfig, question: &str) -> Result<()> {
    let engine = QueryEngine::from_config(config)
        .await
        .context("QueryEngine 초기화 실패")?;

    let answer = web::ask_question(&engine, question).await;
    println!("{}", answer);

    Ok(())
}

/// 페이지 목록 명령어 (pages)
///
/// 로드 실패 원인을 그대로 보여줍니다.
async fn cmd_pages(config: &ChatbotConfig, limit: usize) -> Result<()> {
    let document = load_strict(&config.pdf_path).await?;

    println!("[OK] {} 페이지 로드됨:\n", document.len());

    for (i, page) in document.pages().iter().take(limit).enumerate() {
        println!("  #{:<4} {} chars", i, page.chars().count());
        println!("        {}", truncate_text(page, 80));
        println!();
    }

    if document.len() > limit {
        println!("  ... {} 페이지 더 있음", document.len() - limit);
    }

    Ok(())
}

/// 검색 명령어 (search)
async fn cmd_search(config: &ChatbotConfig, query: &str) -> Result<()> {
    let document = load_document(&config.pdf_path).await?;
    if document.is_empty() {
        println!("[!] 문서를 사용할 수 없습니다: {}", config.pdf_path.display());
        return Ok(());
    }

    let retriever = PageRetriever::default();
    println!("[*] 검색 중: \"{}\" (상위 {}개)", query, retriever.top_k());

    let ranked = retriever.rank_pages(query, document.pages());

    if ranked.is_empty() {
        println!("\n[!] 관련 페이지가 없습니다.");
        return Ok(());
    }

    println!("\n[OK] 관련 페이지 ({} 건):\n", ranked.len());

    for (i, page) in ranked.iter().enumerate() {
        println!("{}. [점수: {}] Page #{}", i + 1, page.score, page.index);
        println!("   키워드: {}", page.matched_keywords.join(", "));
        println!("   내용: {}", truncate_text(&page.text, 200));
        println!();
    }

    Ok(())
}

/// 상태 명령어 (status)
async fn cmd_status(config: &ChatbotConfig) -> Result<()> {
    println!("life-guide-chatbot v{}", env!("CARGO_PKG_VERSION"));
    println!();

    // PDF
    let path = &config.pdf_path;
    match std::fs::metadata(path) {
        Ok(meta) => println!(
            "[OK] PDF: {} ({})",
            path.display(),
            format_bytes(meta.len() as usize)
        ),
        Err(_) => println!("[!] PDF: {} (없음)", path.display()),
    }

    match load_strict(path).await {
        Ok(doc) => println!(
            "[OK] 페이지: {} 개 ({} chars)",
            doc.len(),
            doc.total_chars()
        ),
        Err(e) => println!("[!] 페이지 로드 실패: {}", e),
    }

    // 실제 질의에 쓰이는 클라이언트 기준으로 출력
    let client = CompletionClient::new(config.completion.clone())
        .context("CompletionClient 생성 실패")?;
    println!("[*] API 키: {}", client.config().key_status());
    println!("[*] 엔드포인트: {}", client.config().endpoint);
    println!("[*] 모델 순서: {}", client.policy().models().join(" > "));
    println!("[*] 안내문: {} chars", config.system_prompt.chars().count());
    println!("[*] 서버 주소: {}", config.server.addr());

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 로드 실패를 에러로 반환하는 PDF 로드
async fn load_strict(path: &Path) -> Result<Document> {
    let path = path.to_path_buf();
    let document = tokio::task::spawn_blocking(move || PdfLoader::default().load(&path))
        .await
        .context("PDF loading task failed")??;
    Ok(document)
}

/// 텍스트 자르기 (UTF-8 안전)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

/// 바이트 크기 포맷팅
fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

// ============================================================================
// Tests
// ============================================================================
