//! PDF 텍스트 추출 모듈
//!
//! pdf-extract 크레이트를 사용하여 PDF에서 페이지별 텍스트를 추출합니다.

use std::panic::{catch_unwind, AssertUnwindSafe};

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// "--- Page 1 ---" 형태의 페이지 구분자
    static ref PAGE_MARKER: Regex =
        Regex::new(r"(?m)^[\s]*[-=]+[\s]*(?:Page[\s]*)?(\d+)[\s]*[-=]+[\s]*$")
            .expect("valid page marker regex");
}

/// PDF 바이트에서 페이지별 원본 텍스트 추출
///
/// 빈 페이지도 그대로 반환합니다. 필터링은 호출자(`PdfLoader`)의 몫입니다.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<String>, String> {
    // pdf-extract는 손상된 파일에서 panic 할 수 있음
    let pages = catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }))
    .map_err(|_| "PDF parser panicked".to_string())?
    .map_err(|e| e.to_string())?;

    if pages.iter().all(|p| p.trim().is_empty()) {
        tracing::warn!("No text extracted from PDF. It might be a scanned document.");
        return Ok(Vec::new());
    }

    // 페이지 정보가 없는 PDF는 텍스트 안의 구분자로 다시 나눔
    if pages.len() == 1 {
        return Ok(split_pdf_pages(&pages[0]));
    }

    Ok(pages)
}

/// PDF 텍스트를 페이지별로 분리
fn split_pdf_pages(text: &str) -> Vec<String> {
    // 폼피드 문자 (\x0c)로 페이지 분리 시도
    let pages: Vec<String> = text.split('\x0c').map(str::to_string).collect();

    if pages.len() > 1 {
        return pages;
    }

    // 페이지 구분자 패턴으로 시도 (일부 PDF에서 사용)
    if PAGE_MARKER.is_match(text) {
        let pages: Vec<String> = PAGE_MARKER.split(text).map(str::to_string).collect();

        if pages.len() > 1 {
            return pages;
        }
    }

    // 분리 실패 - 전체를 하나의 페이지로
    vec![text.to_string()]
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_pdf_pages_with_formfeed() {
        let text = "Page 1 content\x0cPage 2 content\x0cPage 3 content";
        let pages = split_pdf_pages(text);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0], "Page 1 content");
        assert_eq!(pages[2], "Page 3 content");
    }

    #[test]
    fn test_split_pdf_pages_keeps_blank_pages() {
        // 빈 페이지를 남겨야 호출자가 건너뛴 페이지 수를 기록할 수 있음
        let pages = split_pdf_pages("첫 페이지\x0c   \x0c셋째 페이지");
        assert_eq!(pages.len(), 3);
        assert!(pages[1].trim().is_empty());
    }

    #[test]
    fn test_split_pdf_pages_with_marker() {
        let text = "intro text\n--- Page 2 ---\nsecond page text";
        let pages = split_pdf_pages(text);
        assert_eq!(pages.len(), 2);
        assert!(pages[1].contains("second page"));
    }

    #[test]
    fn test_split_pdf_pages_no_separator() {
        let pages = split_pdf_pages("Just some text without page breaks");
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn test_extract_pages_rejects_garbage() {
        assert!(extract_pages(b"definitely not a pdf").is_err());
    }
}
