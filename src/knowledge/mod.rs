//! Knowledge 모듈 - 인메모리 벡터 컬렉션
//!
//! - Store: rusqlite `:memory:` 기반 컬렉션 레지스트리
//! - Collection: 문서 추가, 코사인 유사도 최근접 질의, 전체 조회
//! - Seed: get-or-create + 시드 적재

mod collection;
mod seed;
mod store;
mod vector;

// Re-exports
pub use collection::{Collection, QueryMatch};
pub use seed::{ensure_collection, seed_documents};
pub use store::{
    Document, DocumentMetadata, DocumentStore, NewDocument, StoreError, StoreResult,
};
pub use vector::cosine_similarity;
