//! Retriever - 질의와 가장 가까운 문서 텍스트 검색

use crate::knowledge::{Collection, StoreResult};

/// 검색 결과가 없을 때 반환하는 단일 요소
pub const NOT_FOUND_SENTINEL: &str = "관련 데이터를 찾을 수 없습니다.";

/// 문맥이 sentinel 결과인지 확인
pub fn is_sentinel(context: &[String]) -> bool {
    context.first().map(String::as_str) == Some(NOT_FOUND_SENTINEL)
}

/// 벡터 검색기
#[derive(Debug, Clone)]
pub struct Retriever {
    collection: Collection,
}

impl Retriever {
    pub fn new(collection: Collection) -> Self {
        Self { collection }
    }

    /// 상위 `k`개 문서 텍스트 (유사도 내림차순)
    ///
    /// 결과 길이는 항상 `1..=max(k, 1)` 입니다. 컬렉션이 비어 있으면
    /// [`NOT_FOUND_SENTINEL`] 하나만 담아 반환합니다. `k == 0`은 1로 취급합니다.
    pub async fn search(&self, query: &str, k: usize) -> StoreResult<Vec<String>> {
        let k = k.max(1);
        let matches = self.collection.query(query, k).await?;

        if matches.is_empty() {
            tracing::debug!("No documents matched query: {}", query);
            return Ok(vec![NOT_FOUND_SENTINEL.to_string()]);
        }

        Ok(matches.into_iter().map(|m| m.text).collect())
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }
}
