//! 오프라인 해싱 임베딩
//!
//! 외부 모델 없이 동작하는 결정적 임베딩입니다. 테스트와 모델을 받을 수 없는 환경용입니다.
//! 소문자화한 공백 토큰과 토큰 내부의 문자 바이그램을 feature로 사용하고,
//! 각 feature를 SHA-256으로 해싱해 `dimension`개 버킷 중 하나에 부호와 함께 누적한 뒤
//! L2 정규화합니다. 한국어 조사("가격이", "가격은")가 붙어도 바이그램이 겹쳐 유사도가 유지됩니다.

use anyhow::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::EmbeddingProvider;

/// 기본 임베딩 차원 (MiniLM 계열과 동일)
pub const DEFAULT_HASH_DIMENSION: usize = 384;

/// 토큰 전체 feature 가중치 (바이그램은 1.0)
const TOKEN_WEIGHT: f32 = 1.5;

/// Feature hashing 임베딩
#[derive(Debug, Clone)]
pub struct HashingEmbedding {
    dimension: usize,
}

impl HashingEmbedding {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            anyhow::bail!("Embedding dimension must be greater than 0");
        }
        Ok(Self { dimension })
    }

    /// 동기 임베딩 (async 래퍼 없이 테스트/배치에서 사용)
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in tokenize(text) {
            self.accumulate(&mut vector, &token, TOKEN_WEIGHT);

            let chars: Vec<char> = token.chars().collect();
            for pair in chars.windows(2) {
                let bigram: String = pair.iter().collect();
                self.accumulate(&mut vector, &bigram, 1.0);
            }
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }

    fn accumulate(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let digest = Sha256::digest(feature.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        let hash = u64::from_le_bytes(bytes);

        let bucket = (hash % self.dimension as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

/// 소문자화 + 영숫자(한글 포함) 이외 문자를 구분자로 처리
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "ngram-hash"
    }
}
