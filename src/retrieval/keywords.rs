//! 질문 키워드 추출
//!
//! 질문을 단어 단위로 자르고, 흔한 조사(josa)를 떼어낸 어근도 후보로 추가합니다.
//! 형태소 분석이 아닌 휴리스틱이므로 덜 떼거나 더 떼는 경우가 있습니다.

use std::collections::BTreeSet;

use lazy_static::lazy_static;
use regex::Regex;

/// 떼어낼 조사 목록 (순서대로 검사, 일치하는 모든 조사가 후보를 만듦)
pub const JOSA_SUFFIXES: &[&str] = &[
    "이라는", "라는", "란", "은", "는", "이", "가", "을", "를", "에", "에서", "으로", "로", "와",
    "과", "의", "도", "만",
];

lazy_static! {
    /// 단어 문자 + 한글 음절 블록 (U+AC00..U+D7AF)
    static ref WORD: Regex = Regex::new(r"[\w\x{AC00}-\x{D7AF}]+").expect("valid word regex");
}

/// 질문에서 키워드 후보 집합 추출
///
/// 원래 토큰과 조사를 뗀 어근이 모두 포함됩니다. 중복은 합쳐집니다.
pub fn extract_keywords(query: &str) -> BTreeSet<String> {
    let mut keywords = BTreeSet::new();

    for token in WORD.find_iter(query).map(|m| m.as_str()) {
        keywords.insert(token.to_string());

        let token_len = token.chars().count();
        for suffix in JOSA_SUFFIXES {
            if token_len <= suffix.chars().count() {
                continue;
            }
            if let Some(root) = token.strip_suffix(suffix) {
                keywords.insert(root.to_string());
            }
        }
    }

    keywords
}
