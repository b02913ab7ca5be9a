//! 모델 폴백 정책
//!
//! 시도할 모델 순서와 응답 상태별 처리 규칙을 표로 정의합니다.
//! HTTP 전송과 분리되어 있어 단독으로 검증할 수 있습니다.

/// Groq 모델 우선순위
pub const DEFAULT_MODELS: &[&str] = &[
    "mistral-saba-24b",
    "llama-3.1-70b-versatile",
    "mixtral-8x7b-32768",
    "gemma2-9b-it",
];

/// 시도를 멈추게 하는 원인
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// 401 - 키가 유효하지 않음
    Unauthorized,
    /// 429 - 호출 한도 초과
    RateLimited,
}

/// 한 번의 모델 시도 후 할 일
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptAction {
    /// 응답 본문에서 답변을 읽음
    Accept,
    /// 더 이상 시도하지 않고 실패 반환
    Stop(StopReason),
    /// 다음 모델로 진행
    NextModel,
}

/// 상태 코드 규칙
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusRule {
    Exact(u16),
    Any,
}

impl StatusRule {
    fn matches(&self, status: u16) -> bool {
        match self {
            StatusRule::Exact(code) => *code == status,
            StatusRule::Any => true,
        }
    }
}

/// 기본 상태 규칙 (위에서부터 처음 일치하는 규칙 적용)
pub const DEFAULT_STATUS_RULES: &[(StatusRule, AttemptAction)] = &[
    (StatusRule::Exact(200), AttemptAction::Accept),
    (StatusRule::Exact(401), AttemptAction::Stop(StopReason::Unauthorized)),
    (StatusRule::Exact(429), AttemptAction::Stop(StopReason::RateLimited)),
    (StatusRule::Exact(400), AttemptAction::NextModel),
    (StatusRule::Any, AttemptAction::NextModel),
];

/// 모델 폴백 정책
#[derive(Debug, Clone)]
pub struct FallbackPolicy {
    models: Vec<String>,
    rules: Vec<(StatusRule, AttemptAction)>,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MODELS.iter().map(|m| m.to_string()).collect())
    }
}

impl FallbackPolicy {
    /// 모델 목록 지정 (기본 상태 규칙 사용)
    pub fn new(models: Vec<String>) -> Self {
        Self {
            models,
            rules: DEFAULT_STATUS_RULES.to_vec(),
        }
    }

    /// 시도 순서대로의 모델 목록
    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// HTTP 상태에 대한 처리
    pub fn on_status(&self, status: u16) -> AttemptAction {
        self.rules
            .iter()
            .find(|(rule, _)| rule.matches(status))
            .map(|(_, action)| *action)
            .unwrap_or(AttemptAction::NextModel)
    }

    /// 네트워크 오류(연결 실패, 타임아웃 등)에 대한 처리
    pub fn on_network_error(&self) -> AttemptAction {
        AttemptAction::NextModel
    }

    /// 200 응답이지만 답변을 읽을 수 없을 때의 처리
    pub fn on_empty_response(&self) -> AttemptAction {
        AttemptAction::NextModel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_model_order() {
        let policy = FallbackPolicy::default();
        assert_eq!(policy.models().len(), 4);
        assert_eq!(policy.models()[0], "mistral-saba-24b");
        assert_eq!(policy.models()[3], "gemma2-9b-it");
    }

    #[test]
    fn test_status_actions() {
        let policy = FallbackPolicy::default();
        assert_eq!(policy.on_status(200), AttemptAction::Accept);
        assert_eq!(
            policy.on_status(401),
            AttemptAction::Stop(StopReason::Unauthorized)
        );
        assert_eq!(
            policy.on_status(429),
            AttemptAction::Stop(StopReason::RateLimited)
        );
        assert_eq!(policy.on_status(400), AttemptAction::NextModel);
        assert_eq!(policy.on_status(404), AttemptAction::NextModel);
        assert_eq!(policy.on_status(500), AttemptAction::NextModel);
        assert_eq!(policy.on_status(503), AttemptAction::NextModel);
    }

    #[test]
    fn test_non_status_failures_continue() {
        let policy = FallbackPolicy::default();
        assert_eq!(policy.on_network_error(), AttemptAction::NextModel);
        assert_eq!(policy.on_empty_response(), AttemptAction::NextModel);
    }
}
