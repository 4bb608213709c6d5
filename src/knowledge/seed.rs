//! Seed Loader - 컬렉션 준비 및 시드 데이터 적재

use std::sync::Arc;

use crate::embedding::EmbeddingProvider;

use super::collection::Collection;
use super::store::{DocumentMetadata, DocumentStore, NewDocument, StoreResult};

/// 시드 문서 목록 생성
///
/// id는 `doc_<i>`, `source`는 `<source_prefix>_<i>` 입니다.
pub fn seed_documents(texts: &[&str], source_prefix: &str) -> Vec<NewDocument> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| NewDocument {
            id: format!("doc_{}", i),
            text: text.to_string(),
            metadata: DocumentMetadata::source(format!("{}_{}", source_prefix, i)),
        })
        .collect()
}

/// 컬렉션이 있으면 그대로 반환하고, 없으면 생성 후 시드를 적재
///
/// 컬렉션 부재만 생성 사유로 취급하며, 그 외 저장소 에러는 그대로 전파합니다.
/// 시드 적재에 실패하면 빈 컬렉션이 남지 않도록 생성한 컬렉션을 지웁니다.
pub async fn ensure_collection(
    store: &DocumentStore,
    name: &str,
    seeds: &[&str],
    source_prefix: &str,
    embedder: Arc<dyn EmbeddingProvider>,
) -> StoreResult<Collection> {
    let (collection, created) = store.get_or_create_collection(name, embedder)?;

    if !created {
        tracing::debug!("Collection {} already exists, skipping seed", name);
        return Ok(collection);
    }

    let documents = seed_documents(seeds, source_prefix);
    if let Err(e) = collection.add(&documents).await {
        tracing::warn!("Seeding {} failed, dropping collection: {}", name, e);
        store.delete_collection(name)?;
        return Err(e);
    }

    tracing::info!("Seeded collection {} with {} documents", name, documents.len());
    Ok(collection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;

    use crate::embedding::HashingEmbedding;
    use crate::knowledge::StoreError;

    const SEEDS: [&str; 3] = ["첫 문서", "둘째 문서", "셋째 문서"];

    fn embedder() -> Arc<dyn EmbeddingProvider> {
        Arc::new(HashingEmbedding::new(64).unwrap())
    }

    /// 항상 실패하는 임베딩
    struct FailingEmbedding;

    #[async_trait]
    impl EmbeddingProvider for FailingEmbedding {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            anyhow::bail!("model unavailable")
        }

        fn dimension(&self) -> usize {
            8
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_seed_documents_ids_and_sources() {
        let docs = seed_documents(&SEEDS, "blog");
        assert_eq!(docs.len(), 3);
        assert_eq!(docs[0].id, "doc_0");
        assert_eq!(docs[2].id, "doc_2");
        assert_eq!(docs[1].metadata.source, "blog_1");
        assert!(docs[1].metadata.date_added.is_none());
    }

    #[tokio::test]
    async fn test_ensure_collection_seeds_once() {
        let store = DocumentStore::in_memory().unwrap();

        let collection = ensure_collection(&store, "property_data", &SEEDS, "blog", embedder())
            .await
            .unwrap();
        assert_eq!(collection.count().unwrap(), 3);

        let again = ensure_collection(&store, "property_data", &SEEDS, "blog", embedder())
            .await
            .unwrap();
        assert_eq!(again.count().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_existing_collection_is_not_reseeded() {
        let store = DocumentStore::in_memory().unwrap();
        store.create_collection("property_data", embedder()).unwrap();

        let collection = ensure_collection(&store, "property_data", &SEEDS, "blog", embedder())
            .await
            .unwrap();
        assert_eq!(collection.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_seed_failure_propagates_and_drops_collection() {
        let store = DocumentStore::in_memory().unwrap();

        let err = ensure_collection(
            &store,
            "property_data",
            &SEEDS,
            "blog",
            Arc::new(FailingEmbedding),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, StoreError::Embedding(_)));
        assert!(!store.has_collection("property_data").unwrap());
    }
}
