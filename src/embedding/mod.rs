//! 임베딩 모듈 - 텍스트 벡터화
//!
//! 텍스트를 고정 길이 벡터로 변환하는 프로바이더들입니다.
//! 컬렉션은 이 트레이트 뒤의 구현체로 문서와 질의를 모두 임베딩합니다.
//!
//! - [`LocalEmbedding`]: 기본값. 다국어 MiniLM 문장 임베딩 모델 (Candle, CPU)
//! - [`GeminiEmbedding`]: Gemini API (`GEMINI_API_KEY` 필요)
//! - [`HashingEmbedding`]: 모델 없이 동작하는 토큰 + 문자 바이그램 feature hashing
//!
//! ## 사용법
//! ```rust,ignore
//! let embedder = create_embedder(&EmbeddingConfig::default()).await?;
//! let embedding = embedder.embed("강남 아파트 가격").await?;
//! ```

mod gemini;
mod hashing;
mod local;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::{EmbeddingBackend, EmbeddingConfig};

pub use gemini::{get_api_key, has_api_key, GeminiEmbedding, GEMINI_DIMENSIONS};
pub use hashing::{HashingEmbedding, DEFAULT_HASH_DIMENSION};
pub use local::{LocalEmbedding, DEFAULT_LOCAL_MODEL, LOCAL_EMBEDDING_DIM};

// ============================================================================
// EmbeddingProvider Trait
// ============================================================================

/// 임베딩 프로바이더 트레이트
///
/// 텍스트를 벡터로 변환하는 인터페이스입니다.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// 단일 텍스트 임베딩
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// 배치 임베딩 (기본 구현: 순차 호출)
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// 임베딩 차원 수
    fn dimension(&self) -> usize;

    /// 프로바이더 이름
    fn name(&self) -> &str;
}

// ============================================================================
// Factory Function
// ============================================================================

/// 설정에 따라 임베딩 프로바이더 생성
///
/// 로컬 모델은 차원이 모델에 고정되므로, 설정 차원과 다르면 에러를 반환합니다.
pub async fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let embedder: Arc<dyn EmbeddingProvider> = match config.backend {
        EmbeddingBackend::Local => {
            let local = LocalEmbedding::load(&config.model, config.model_dir.as_deref()).await?;
            if local.dimension() != config.dimension {
                anyhow::bail!(
                    "Model {} produces {} dims, but {} configured",
                    config.model,
                    local.dimension(),
                    config.dimension
                );
            }
            Arc::new(local)
        }
        EmbeddingBackend::Hash => Arc::new(HashingEmbedding::new(config.dimension)?),
        EmbeddingBackend::Gemini => {
            if !has_api_key() {
                anyhow::bail!(
                    "GEMINI_API_KEY or GOOGLE_AI_API_KEY not set.\n\
                     Set: export GEMINI_API_KEY=your-api-key\n\
                     Or use the local model: --embedder local"
                );
            }
            Arc::new(GeminiEmbedding::from_env_with_dimension(config.dimension)?)
        }
    };

    tracing::info!(
        "Using {} embedding (dimension: {})",
        embedder.name(),
        embedder.dimension()
    );
    Ok(embedder)
}
