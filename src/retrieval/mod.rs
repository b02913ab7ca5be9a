//! Retrieval 모듈 - 키워드 기반 페이지 검색
//!
//! - Keywords: 질문 토큰화 + 한국어 조사 제거
//! - Retriever: 부분 문자열 출현 횟수로 페이지 점수 계산, 상위 페이지 선택

mod keywords;
mod retriever;

// Re-exports
pub use keywords::{extract_keywords, JOSA_SUFFIXES};
pub use retriever::{PageRetriever, ScoredPage, DEFAULT_TOP_K, MIN_KEYWORD_CHARS};
