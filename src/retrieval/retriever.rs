//! 키워드 기반 페이지 검색
//!
//! 각 페이지에서 키워드 출현 횟수를 세어 점수를 매기고,
//! 점수가 높은 상위 페이지를 고릅니다. 인덱스 없이 매 질문마다 전체 페이지를 훑습니다.

use std::collections::BTreeSet;

use super::keywords::extract_keywords;

/// 기본 반환 페이지 수 (많으면 토큰 한도 초과)
pub const DEFAULT_TOP_K: usize = 3;

/// 점수 계산에 쓰는 키워드 최소 길이 (문자 수)
pub const MIN_KEYWORD_CHARS: usize = 2;

// ============================================================================
// Types
// ============================================================================

/// 점수가 매겨진 후보 페이지
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPage {
    /// 키워드 출현 횟수 합계
    pub score: usize,
    /// 문서 내 페이지 위치 (0부터)
    pub index: usize,
    /// 페이지 본문
    pub text: String,
    /// 페이지에서 발견된 키워드
    pub matched_keywords: Vec<String>,
}

// ============================================================================
// PageRetriever
// ============================================================================

/// 페이지 검색기
#[derive(Debug, Clone)]
pub struct PageRetriever {
    top_k: usize,
    min_keyword_chars: usize,
}

impl Default for PageRetriever {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            min_keyword_chars: MIN_KEYWORD_CHARS,
        }
    }
}

impl PageRetriever {
    pub fn new(top_k: usize) -> Self {
        Self {
            top_k,
            ..Default::default()
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// 관련 페이지 본문을 점수 순으로 반환 (최대 top_k개)
    pub fn find_relevant_pages(&self, query: &str, pages: &[String]) -> Vec<String> {
        self.rank_pages(query, pages)
            .into_iter()
            .map(|page| page.text)
            .collect()
    }

    /// 점수가 매겨진 상위 페이지 반환
    ///
    /// 점수 내림차순, 동점이면 원래 페이지 순서를 유지합니다.
    /// 질문이나 문서가 비었거나 일치하는 페이지가 없으면 빈 벡터를 반환합니다.
    pub fn rank_pages(&self, query: &str, pages: &[String]) -> Vec<ScoredPage> {
        if pages.is_empty() || query.trim().is_empty() {
            return Vec::new();
        }

        let keywords = extract_keywords(query);
        let mut ranked: Vec<ScoredPage> = pages
            .iter()
            .enumerate()
            .filter_map(|(index, page)| self.score_page(index, page, &keywords))
            .collect();

        // sort_by는 안정 정렬
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked.truncate(self.top_k);

        for page in &ranked {
            tracing::debug!(
                "Selected page {}: score={}, keywords={:?}",
                page.index,
                page.score,
                page.matched_keywords
            );
        }

        ranked
    }

    /// 단일 페이지 점수 계산 (일치 없으면 None)
    fn score_page(
        &self,
        index: usize,
        page: &str,
        keywords: &BTreeSet<String>,
    ) -> Option<ScoredPage> {
        let page_lower = page.to_lowercase();
        let mut score = 0;
        let mut matched_keywords = Vec::new();

        for keyword in keywords {
            if keyword.chars().count() < self.min_keyword_chars {
                continue;
            }
            let keyword_lower = keyword.to_lowercase();
            let count = page_lower.matches(keyword_lower.as_str()).count();
            if count > 0 {
                score += count;
                matched_keywords.push(keyword.clone());
            }
        }

        if score == 0 {
            return None;
        }

        Some(ScoredPage {
            score,
            index,
            text: page.to_string(),
            matched_keywords,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
