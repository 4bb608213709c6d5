//! Collection - 이름 붙은 문서 집합과 최근접 질의

use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::embedding::EmbeddingProvider;

use super::store::{lock, Document, DocumentMetadata, NewDocument, StoreError, StoreResult};
use super::vector::{cosine_similarity, decode_embedding, encode_embedding};

/// 질의 결과 한 건
#[derive(Debug, Clone, Serialize)]
pub struct QueryMatch {
    pub id: String,
    pub text: String,
    pub metadata: DocumentMetadata,
    /// 코사인 유사도 (-1.0 ~ 1.0)
    pub similarity: f32,
}

/// 컬렉션 핸들
///
/// 저장소 연결과 임베딩 함수를 공유하는 가벼운 핸들입니다.
/// 문서 추가와 질의 모두 같은 임베딩 함수를 사용합니다.
#[derive(Clone)]
pub struct Collection {
    name: String,
    conn: Arc<Mutex<Connection>>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("embedder", &self.embedder.name())
            .finish()
    }
}

impl Collection {
    pub(super) fn new(
        name: String,
        conn: Arc<Mutex<Connection>>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            name,
            conn,
            embedder,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn embedder(&self) -> &dyn EmbeddingProvider {
        self.embedder.as_ref()
    }

    /// 문서 배치 추가
    ///
    /// 모든 문서를 먼저 임베딩한 뒤 한 트랜잭션으로 삽입합니다.
    /// 이미 있는 id가 하나라도 있으면 아무것도 저장하지 않고 `DuplicateId`를 반환합니다.
    pub async fn add(&self, documents: &[NewDocument]) -> StoreResult<usize> {
        if documents.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
        let embeddings = self
            .embedder
            .embed_batch(&texts)
            .await
            .map_err(StoreError::Embedding)?;

        let expected = self.embedder.dimension();
        if let Some(bad) = embeddings.iter().find(|e| e.len() != expected) {
            return Err(StoreError::DimensionMismatch {
                expected,
                actual: bad.len(),
            });
        }

        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;

        for (doc, embedding) in documents.iter().zip(embeddings.iter()) {
            let exists = tx
                .query_row(
                    "SELECT 1 FROM documents WHERE collection = ?1 AND id = ?2",
                    params![self.name, doc.id],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();

            if exists {
                return Err(StoreError::DuplicateId {
                    collection: self.name.clone(),
                    id: doc.id.clone(),
                });
            }

            tx.execute(
                "INSERT INTO documents (collection, id, text, source, date_added, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    self.name,
                    doc.id,
                    doc.text,
                    doc.metadata.source,
                    doc.metadata.date_added.map(|d| d.to_rfc3339()),
                    encode_embedding(embedding),
                ],
            )?;
        }

        tx.commit()?;
        tracing::debug!("Added {} documents to {}", documents.len(), self.name);

        Ok(documents.len())
    }

    /// 최근접 질의
    ///
    /// 질의를 임베딩하고 전체 문서를 코사인 유사도로 정렬해 상위 `n_results`개를 반환합니다.
    /// 유사도가 같으면 먼저 추가된 문서가 앞섭니다.
    pub async fn query(&self, text: &str, n_results: usize) -> StoreResult<Vec<QueryMatch>> {
        let query_embedding = self
            .embedder
            .embed(text)
            .await
            .map_err(StoreError::Embedding)?;

        let mut matches: Vec<QueryMatch> = self
            .get_all()?
            .into_iter()
            .map(|doc| QueryMatch {
                similarity: cosine_similarity(&query_embedding, &doc.embedding),
                id: doc.id,
                text: doc.text,
                metadata: doc.metadata,
            })
            .collect();

        matches.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(n_results);

        tracing::debug!(
            "Query on {} returned {} matches (top similarity: {:?})",
            self.name,
            matches.len(),
            matches.first().map(|m| m.similarity)
        );

        Ok(matches)
    }

    /// 전체 문서 (추가 순)
    pub fn get_all(&self) -> StoreResult<Vec<Document>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(
            "SELECT id, text, source, date_added, embedding FROM documents
             WHERE collection = ?1
             ORDER BY rowid",
        )?;

        let docs = stmt
            .query_map(params![self.name], |row| {
                let date_added: Option<String> = row.get(3)?;
                let embedding: Vec<u8> = row.get(4)?;
                Ok(Document {
                    id: row.get(0)?,
                    text: row.get(1)?,
                    metadata: DocumentMetadata {
                        source: row.get(2)?,
                        date_added: date_added.as_deref().and_then(parse_datetime),
                    },
                    embedding: decode_embedding(&embedding),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(docs)
    }

    /// id로 문서 조회
    pub fn get(&self, id: &str) -> StoreResult<Option<Document>> {
        Ok(self.get_all()?.into_iter().find(|d| d.id == id))
    }

    /// id 존재 여부
    pub fn contains(&self, id: &str) -> StoreResult<bool> {
        let conn = lock(&self.conn)?;
        let found = conn
            .query_row(
                "SELECT 1 FROM documents WHERE collection = ?1 AND id = ?2",
                params![self.name, id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// 문서 개수
    pub fn count(&self) -> StoreResult<usize> {
        let conn = lock(&self.conn)?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            params![self.name],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

/// RFC3339 문자열 파싱 (실패 시 None)
fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

// ============================================================================
// Tests
// ============================================================================
