//! 설정 모듈
//!
//! 환경변수(.env 포함)에서 챗봇 설정을 읽습니다. CLI 플래그가 있으면 그 값이 우선합니다.
//!
//! | 환경변수 | 기본값 |
//! |---|---|
//! | `GROQ_API_KEY` | (없음) |
//! | `GROQ_API_URL` | `https://api.groq.com/openai/v1/chat/completions` |
//! | `CHATBOT_PDF_PATH` | `data/guide.pdf` |
//! | `CHATBOT_HOST` | `0.0.0.0` |
//! | `CHATBOT_PORT` | `30987` |
//! | `CHATBOT_SYSTEM_PROMPT_FILE` | (내장 안내문) |

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::prompt::DEFAULT_PROMPT;

/// Groq chat completion 엔드포인트 (OpenAI 호환)
pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Groq API 키 접두사
pub const API_KEY_PREFIX: &str = "gsk_";

/// 내장 PDF 경로
pub const DEFAULT_PDF_PATH: &str = "data/guide.pdf";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 30987;

/// 모델 시도당 HTTP 타임아웃
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_TEMPERATURE: f32 = 0.4;
pub const DEFAULT_MAX_TOKENS: u32 = 8192;

// ============================================================================
// Completion Config
// ============================================================================

/// LLM 호출 설정
///
/// 클라이언트 생성 시 명시적으로 전달됩니다.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub timeout: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl CompletionConfig {
    /// API 키 지정
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// 엔드포인트 지정 (http/https URL만 허용)
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self> {
        let parsed = url::Url::parse(endpoint)
            .with_context(|| format!("Invalid completion endpoint: {}", endpoint))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("Unsupported endpoint scheme: {}", parsed.scheme());
        }

        self.endpoint = parsed.to_string();
        Ok(self)
    }

    /// 환경변수에서 생성
    pub fn from_env() -> Result<Self> {
        let mut config = Self {
            api_key: get_api_key(),
            ..Default::default()
        };

        if let Ok(endpoint) = std::env::var("GROQ_API_URL") {
            if !endpoint.is_empty() {
                config = config.with_endpoint(&endpoint)?;
            }
        }

        Ok(config)
    }

    /// 키 상태 요약 (키 자체는 노출하지 않음)
    pub fn key_status(&self) -> &'static str {
        match self.api_key.as_deref() {
            None => "미설정",
            Some(key) if key.starts_with(API_KEY_PREFIX) => "설정됨",
            Some(_) => "형식 오류",
        }
    }
}

// ============================================================================
// Server / Chatbot Config
// ============================================================================

/// 폼 서버 바인드 주소
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 환경변수 값 적용 (비어 있는 값은 무시)
    pub fn apply_env(&mut self, host: Option<String>, port: Option<String>) -> Result<()> {
        if let Some(host) = host.filter(|h| !h.is_empty()) {
            self.host = host;
        }
        if let Some(port) = port.filter(|p| !p.is_empty()) {
            self.port = port
                .parse()
                .with_context(|| format!("Invalid CHATBOT_PORT: {}", port))?;
        }
        Ok(())
    }
}

/// 전체 챗봇 설정
#[derive(Debug, Clone)]
pub struct ChatbotConfig {
    pub pdf_path: PathBuf,
    pub completion: CompletionConfig,
    pub server: ServerConfig,
    /// 프롬프트 맨 앞에 들어가는 안내문
    pub system_prompt: String,
}

impl Default for ChatbotConfig {
    fn default() -> Self {
        Self {
            pdf_path: PathBuf::from(DEFAULT_PDF_PATH),
            completion: CompletionConfig::default(),
            server: ServerConfig::default(),
            system_prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}

impl ChatbotConfig {
    /// 환경변수에서 생성
    pub fn from_env() -> Result<Self> {
        let mut config = Self {
            completion: CompletionConfig::from_env()?,
            ..Default::default()
        };

        if let Some(path) = non_empty_var("CHATBOT_PDF_PATH") {
            config.pdf_path = PathBuf::from(path);
        }

        config
            .server
            .apply_env(non_empty_var("CHATBOT_HOST"), non_empty_var("CHATBOT_PORT"))?;

        if let Some(path) = non_empty_var("CHATBOT_SYSTEM_PROMPT_FILE") {
            config = config.with_system_prompt_file(Path::new(&path))?;
        }

        Ok(config)
    }

    /// 파일에서 안내문 로드 (앞뒤 공백 제거, 빈 파일은 거부)
    pub fn with_system_prompt_file(mut self, path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read system prompt: {}", path.display()))?;

        let text = text.trim();
        if text.is_empty() {
            bail!("System prompt file is empty: {}", path.display());
        }

        tracing::debug!("Using system prompt from {}", path.display());
        self.system_prompt = text.to_string();
        Ok(self)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

// ============================================================================
// API Key Management
// ============================================================================

/// API 키 로드 (`GROQ_API_KEY` 환경변수)
pub fn get_api_key() -> Option<String> {
    match std::env::var("GROQ_API_KEY") {
        Ok(key) if !key.is_empty() => {
            tracing::debug!("Using API key from GROQ_API_KEY");
            Some(key)
        }
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================
