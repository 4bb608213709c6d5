//! Document Store - rusqlite 인메모리 컬렉션 저장소
//!
//! 프로세스 수명 동안만 유지되는 SQLite `:memory:` 데이터베이스에
//! 이름이 붙은 컬렉션과 문서(텍스트, 메타데이터, 임베딩)를 저장합니다.
//! 재시작하면 사용자 추가 문서는 사라지고 시드 데이터만 다시 적재됩니다.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::embedding::EmbeddingProvider;

use super::collection::Collection;

// ============================================================================
// Errors
// ============================================================================

/// 저장소 에러
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Collection already exists: {0}")]
    CollectionExists(String),

    #[error("Duplicate document id '{id}' in collection '{collection}'")]
    DuplicateId { collection: String, id: String },

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding failed: {0}")]
    Embedding(#[source] anyhow::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Store lock poisoned")]
    LockPoisoned,
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

// ============================================================================
// Types
// ============================================================================

/// 문서 메타데이터
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// 출처 태그 (`blog_0`, `user_input` 등)
    pub source: String,
    /// 사용자가 추가한 시각 (시드 문서는 없음)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_added: Option<DateTime<Utc>>,
}

impl DocumentMetadata {
    pub fn source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            date_added: None,
        }
    }

    pub fn added_now(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            date_added: Some(Utc::now()),
        }
    }
}

/// 저장된 문서 엔트리
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub metadata: DocumentMetadata,
    #[serde(skip)]
    pub embedding: Vec<f32>,
}

/// 새 문서 입력용 구조체 (임베딩은 컬렉션이 계산)
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub id: String,
    pub text: String,
    pub metadata: DocumentMetadata,
}

// ============================================================================
// DocumentStore
// ============================================================================

/// 인메모리 문서 저장소 (벡터 DB 클라이언트 역할)
///
/// 복제해도 같은 연결을 공유합니다.
#[derive(Clone)]
pub struct DocumentStore {
    conn: Arc<Mutex<Connection>>,
}

impl DocumentStore {
    /// 새 인메모리 저장소 생성
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.initialize()?;
        Ok(store)
    }

    /// 스키마 초기화
    fn initialize(&self) -> StoreResult<()> {
        let conn = lock(&self.conn)?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS collections (
                name TEXT PRIMARY KEY,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL REFERENCES collections(name),
                id TEXT NOT NULL,
                text TEXT NOT NULL,
                source TEXT NOT NULL,
                date_added TEXT,
                embedding BLOB NOT NULL,
                PRIMARY KEY (collection, id)
            );
            "#,
        )?;

        tracing::debug!("In-memory document store initialized");
        Ok(())
    }

    /// 컬렉션 존재 여부
    pub fn has_collection(&self, name: &str) -> StoreResult<bool> {
        let conn = lock(&self.conn)?;
        let found = conn
            .query_row(
                "SELECT 1 FROM collections WHERE name = ?1",
                params![name],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// 컬렉션 조회 (없으면 `Ok(None)`)
    pub fn get_collection(
        &self,
        name: &str,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> StoreResult<Option<Collection>> {
        if !self.has_collection(name)? {
            return Ok(None);
        }
        Ok(Some(self.handle(name, embedder)))
    }

    /// 컬렉션 생성 (이미 있으면 에러)
    pub fn create_collection(
        &self,
        name: &str,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> StoreResult<Collection> {
        let (collection, created) = self.get_or_create_collection(name, embedder)?;
        if !created {
            return Err(StoreError::CollectionExists(name.to_string()));
        }
        Ok(collection)
    }

    /// 컬렉션 조회 또는 생성
    ///
    /// # Returns
    /// (컬렉션, 이번 호출에서 새로 생성되었는지)
    pub fn get_or_create_collection(
        &self,
        name: &str,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> StoreResult<(Collection, bool)> {
        let created = {
            let conn = lock(&self.conn)?;
            let rows = conn.execute(
                "INSERT OR IGNORE INTO collections (name, created_at) VALUES (?1, ?2)",
                params![name, Utc::now().to_rfc3339()],
            )?;
            rows == 1
        };

        if created {
            tracing::info!("Created collection: {}", name);
        }

        Ok((self.handle(name, embedder), created))
    }

    /// 컬렉션과 소속 문서 삭제
    pub fn delete_collection(&self, name: &str) -> StoreResult<bool> {
        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM documents WHERE collection = ?1", params![name])?;
        let rows = tx.execute("DELETE FROM collections WHERE name = ?1", params![name])?;
        tx.commit()?;
        Ok(rows > 0)
    }

    /// 전체 컬렉션 이름 (생성 순)
    pub fn collection_names(&self) -> StoreResult<Vec<String>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare("SELECT name FROM collections ORDER BY rowid")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    fn handle(&self, name: &str, embedder: Arc<dyn EmbeddingProvider>) -> Collection {
        Collection::new(name.to_string(), Arc::clone(&self.conn), embedder)
    }
}

/// 연결 잠금 (poison은 에러로 변환)
pub(super) fn lock(conn: &Mutex<Connection>) -> StoreResult<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|_| StoreError::LockPoisoned)
}

// ============================================================================
// Tests
// ============================================================================
