//! 응답 생성 - 검색 문서 이어붙이기 + 키워드 규칙
//!
//! 언어 모델은 사용하지 않습니다. 검색된 문서를 한 줄로 잇고,
//! 질문에 포함된 키워드에 따라 고정 문장 하나를 덧붙입니다.

use serde::Serialize;

use crate::retriever::is_sentinel;
use crate::variant::Variant;

/// 키워드 규칙
///
/// `keywords` 중 하나라도 (소문자화한) 질문에 부분 문자열로 포함되면 `suffix`를 덧붙입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResponseRule {
    pub keywords: &'static [&'static str],
    pub suffix: &'static str,
}

impl ResponseRule {
    /// `lowered_query`는 이미 소문자화된 질문이어야 함
    pub fn matches(&self, lowered_query: &str) -> bool {
        self.keywords.iter().any(|k| lowered_query.contains(k))
    }
}

/// 규칙 기반 응답기
#[derive(Debug, Clone)]
pub struct Responder {
    prefix: &'static str,
    not_found_message: &'static str,
    rules: &'static [ResponseRule],
}

impl Responder {
    pub fn new(
        prefix: &'static str,
        not_found_message: &'static str,
        rules: &'static [ResponseRule],
    ) -> Self {
        Self {
            prefix,
            not_found_message,
            rules,
        }
    }

    pub fn for_variant(variant: Variant) -> Self {
        Self::new(
            variant.response_prefix(),
            variant.not_found_message(),
            variant.rules(),
        )
    }

    /// 질문과 검색 문맥으로 응답 생성
    ///
    /// 문맥이 비었거나 sentinel이면 not-found 문구를 그대로 반환합니다.
    /// 규칙은 선언 순서대로 검사하며 첫 번째로 일치한 규칙만 적용됩니다.
    pub fn respond(&self, query: &str, context: &[String]) -> String {
        if context.is_empty() || is_sentinel(context) {
            return self.not_found_message.to_string();
        }

        let mut response = format!("{}: {}", self.prefix, context.join(" "));

        if let Some(rule) = self.matching_rule(query) {
            response.push_str("\n\n");
            response.push_str(rule.suffix);
        }

        response
    }

    /// 질문에 처음으로 일치하는 규칙
    pub fn matching_rule(&self, query: &str) -> Option<&ResponseRule> {
        let lowered = query.to_lowercase();
        self.rules.iter().find(|rule| rule.matches(&lowered))
    }
}
