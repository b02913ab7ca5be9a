//! 프롬프트 구성 모듈
//!
//! 시스템 지시문 + 선택된 페이지 + 사용자 질문을 하나의 텍스트로 합칩니다.

/// 한국 생활 가이드 기본 지시문
pub const DEFAULT_PROMPT: &str = "당신은 한국 생활 가이드 전문가입니다.
제공된 문서 내용을 바탕으로 사용자의 질문에 정확하고 도움이 되는 답변을 해주세요.

**답변 규칙:**
1. 문서에 있는 정보만을 사용하여 답변하세요
2. 정확한 정보를 자연스럽고 이해하기 쉽게 설명하세요
3. 단편적인 키워드 나열이 아닌 완전한 문장으로 답변하세요
4. 관련 정보가 부족하면 \"제공된 문서에서 해당 정보를 찾을 수 없습니다\"라고 답하세요

**중요:** 답변은 반드시 완전한 문장으로 구성하고, 키워드만 나열하지 마세요.";

/// 컨텍스트로 인정할 최소 페이지 길이 (문자 수, 공백 제거 후)
pub const MIN_CONTEXT_CHARS: usize = 10;

/// 유효한 페이지가 없을 때의 컨텍스트
pub const EMPTY_CONTEXT: &str = "관련 정보가 부족합니다.";

/// 답변 시작 표시
pub const ANSWER_MARKER: &str = "=== 답변 ===";

/// 프롬프트 빌더
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    system_prompt: String,
    min_context_chars: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_PROMPT)
    }
}

impl PromptBuilder {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            min_context_chars: MIN_CONTEXT_CHARS,
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// 페이지와 질문으로 프롬프트 생성
    ///
    /// 페이지 번호는 입력 순서 기준 1부터이며, 짧아서 건너뛴 페이지도 번호를 소모합니다.
    pub fn build(&self, context_pages: &[String], user_query: &str) -> String {
        let sections: Vec<String> = context_pages
            .iter()
            .enumerate()
            .filter_map(|(i, page)| {
                let body = page.trim();
                if body.chars().count() < self.min_context_chars {
                    return None;
                }
                Some(format!("=== 문서 {} ===\n{}", i + 1, body))
            })
            .collect();

        let context = if sections.is_empty() {
            EMPTY_CONTEXT.to_string()
        } else {
            sections.join("\n\n")
        };

        format!(
            "{}\n\n=== 제공된 문서 내용 ===\n{}\n\n=== 사용자 질문 ===\n{}\n\n{}\n",
            self.system_prompt, context, user_query, ANSWER_MARKER
        )
    }
}

/// 기본 지시문으로 프롬프트 생성
pub fn build_prompt(context_pages: &[String], user_query: &str) -> String {
    PromptBuilder::default().build(context_pages, user_query)
}

// ============================================================================
// Tests
// ============================================================================
