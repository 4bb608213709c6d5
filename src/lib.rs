//! snippet-chat - 한국어 스니펫 RAG 챗봇
//!
//! 소규모 한국어 코퍼스(부동산 블로그 발췌 / 지역 착한가게 목록)를 인메모리 벡터
//! 컬렉션에 적재하고, 질문과 가장 가까운 문서를 검색해 키워드 규칙으로 응답을 만듭니다.

pub mod chat;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod knowledge;
pub mod responder;
pub mod retriever;
pub mod server;
pub mod variant;

// Re-exports
pub use chat::{AppContext, ChatError, ChatRole, ChatTurn, SessionRegistry, Transcript};
pub use config::{AppConfig, EmbeddingBackend, EmbeddingConfig};
pub use embedding::{
    create_embedder, EmbeddingProvider, GeminiEmbedding, HashingEmbedding, LocalEmbedding,
};
pub use knowledge::{
    cosine_similarity, ensure_collection, Collection, Document, DocumentMetadata, DocumentStore,
    NewDocument, QueryMatch, StoreError,
};
pub use responder::{Responder, ResponseRule};
pub use retriever::{Retriever, NOT_FOUND_SENTINEL};
pub use variant::Variant;
