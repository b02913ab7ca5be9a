//! 문서 로딩 모듈
//!
//! 고정된 PDF 가이드 문서를 읽어 페이지 단위 텍스트로 정리합니다.
//! - 너무 짧은 페이지(스캔된 빈 페이지 등)는 버립니다
//! - 따옴표/대시/NBSP를 단순 문자로 바꾸고 공백을 정리합니다

pub mod pdf;

use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

/// 페이지로 인정할 최소 문자 수 (공백 제거 후)
pub const MIN_PAGE_CHARS: usize = 20;

lazy_static! {
    static ref REPEATED_SPACES: Regex = Regex::new(r"[ \t]{2,}").expect("valid regex");
    static ref REPEATED_NEWLINES: Regex = Regex::new(r"\n{3,}").expect("valid regex");
}

// ============================================================================
// Document
// ============================================================================

/// 로드된 문서 - 정리된 페이지 텍스트의 순서 있는 목록
///
/// 시작 시 한 번 만들어지고 이후에는 변경되지 않습니다.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pages: Vec<String>,
    source: Option<PathBuf>,
}

impl Document {
    /// 페이지 목록으로 생성 (테스트, 텍스트 입력용)
    pub fn from_pages(pages: Vec<String>) -> Self {
        Self {
            pages,
            source: None,
        }
    }

    /// 빈 문서 (로드 실패 상태)
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// 원본 PDF 경로
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// 전체 문자 수
    pub fn total_chars(&self) -> usize {
        self.pages.iter().map(|p| p.chars().count()).sum()
    }
}

// ============================================================================
// Load Error
// ============================================================================

/// 문서 로드 실패 원인
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("PDF 파일을 찾을 수 없습니다: {0}")]
    NotFound(PathBuf),

    #[error("PDF 파일을 읽을 수 없습니다: {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("PDF 텍스트 추출 실패 ({path}): {message}")]
    Parse { path: PathBuf, message: String },

    #[error("PDF에 유효한 페이지가 없습니다: {0}")]
    NoValidPages(PathBuf),
}

// ============================================================================
// PDF Loader
// ============================================================================

/// PDF 로더
#[derive(Debug, Clone)]
pub struct PdfLoader {
    /// 이보다 짧은 페이지는 버림
    min_page_chars: usize,
}

impl Default for PdfLoader {
    fn default() -> Self {
        Self {
            min_page_chars: MIN_PAGE_CHARS,
        }
    }
}

impl PdfLoader {
    pub fn new(min_page_chars: usize) -> Self {
        Self { min_page_chars }
    }

    /// PDF 파일을 로드하여 정리된 페이지 목록 반환
    pub fn load(&self, path: &Path) -> Result<Document, LoadError> {
        if !path.exists() {
            return Err(LoadError::NotFound(path.to_path_buf()));
        }

        let bytes = std::fs::read(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let raw_pages = pdf::extract_pages(&bytes).map_err(|message| LoadError::Parse {
            path: path.to_path_buf(),
            message,
        })?;

        let total = raw_pages.len();
        let pages = self.clean_pages(raw_pages);

        if pages.is_empty() {
            return Err(LoadError::NoValidPages(path.to_path_buf()));
        }

        tracing::info!(
            "Loaded {} pages from {:?} ({} skipped)",
            pages.len(),
            path,
            total - pages.len()
        );

        Ok(Document {
            pages,
            source: Some(path.to_path_buf()),
        })
    }

    /// 로드 실패를 로그로 남기고 빈 문서를 반환
    ///
    /// 빈 문서는 "문서를 사용할 수 없음" 메시지로 사용자에게 보고됩니다.
    pub fn load_or_empty(&self, path: &Path) -> Document {
        match self.load(path) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::error!("PDF 로드 오류: {}", e);
                Document::empty()
            }
        }
    }

    /// 짧은 페이지 제거 후 텍스트 정리
    pub fn clean_pages(&self, raw_pages: Vec<String>) -> Vec<String> {
        raw_pages
            .into_iter()
            .enumerate()
            .filter_map(|(i, raw)| {
                if raw.trim().chars().count() < self.min_page_chars {
                    tracing::debug!("Skipping short page {}", i + 1);
                    return None;
                }
                Some(clean_page_text(&raw))
            })
            .collect()
    }
}

/// 페이지 텍스트 정리
///
/// 스마트 따옴표와 대시를 ASCII로 접고, NUL/BOM을 제거하고,
/// 반복 공백과 3줄 이상의 빈 줄을 줄입니다.
pub fn clean_page_text(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());

    for ch in text.chars() {
        match ch {
            '\u{201c}' | '\u{201d}' => cleaned.push('"'),
            '\u{2018}' | '\u{2019}' => cleaned.push('\''),
            '\u{2013}' | '\u{2014}' => cleaned.push('-'),
            '\u{00a0}' => cleaned.push(' '),
            '\0' | '\u{feff}' => {}
            '\r' => {}
            _ => cleaned.push(ch),
        }
    }

    let cleaned = REPEATED_SPACES.replace_all(&cleaned, " ");
    let cleaned = REPEATED_NEWLINES.replace_all(&cleaned, "\n\n");
    cleaned.trim().to_string()
}

// ============================================================================
// Tests
// ============================================================================
