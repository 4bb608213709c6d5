//! 로컬 문장 임베딩 (Hugging Face Candle)
//!
//! 사전학습된 다국어 BERT 계열 문장 임베딩 모델을 CPU에서 실행합니다.
//! 기본 모델은 `sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2` (384차원)이며,
//! 첫 실행 시 Hugging Face Hub에서 내려받아 캐시합니다.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config, DTYPE};
use tokenizers::{Tokenizer, TruncationParams};

use super::EmbeddingProvider;

/// 기본 로컬 모델
pub const DEFAULT_LOCAL_MODEL: &str = "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2";

/// 기본 로컬 모델 차원
pub const LOCAL_EMBEDDING_DIM: usize = 384;

/// 모델 입력 최대 토큰 수
const MAX_SEQ_LEN: usize = 128;

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const SAFETENSORS_FILE: &str = "model.safetensors";
const PYTORCH_FILE: &str = "pytorch_model.bin";

// ============================================================================
// Model Files
// ============================================================================

/// 모델 로드에 필요한 파일 경로
#[derive(Debug, Clone)]
struct ModelFiles {
    config: PathBuf,
    tokenizer: PathBuf,
    weights: PathBuf,
}

impl ModelFiles {
    /// 로컬 디렉토리에서 파일 찾기
    fn from_dir(dir: &Path) -> Result<Self> {
        let require = |name: &str| -> Result<PathBuf> {
            let path = dir.join(name);
            if !path.exists() {
                anyhow::bail!("{} not found in {}", name, dir.display());
            }
            Ok(path)
        };

        let config = require(CONFIG_FILE)?;
        let tokenizer = require(TOKENIZER_FILE)?;
        let weights = if dir.join(SAFETENSORS_FILE).exists() {
            dir.join(SAFETENSORS_FILE)
        } else {
            require(PYTORCH_FILE)?
        };

        Ok(Self {
            config,
            tokenizer,
            weights,
        })
    }

    /// Hugging Face Hub에서 내려받기 (캐시 재사용)
    async fn download(model_id: &str) -> Result<Self> {
        tracing::info!("Fetching embedding model {} from Hugging Face Hub", model_id);

        let api =
            hf_hub::api::tokio::Api::new().context("Failed to init Hugging Face Hub client")?;
        let repo = api.model(model_id.to_string());

        let config = repo
            .get(CONFIG_FILE)
            .await
            .with_context(|| format!("Failed to fetch {} for {}", CONFIG_FILE, model_id))?;
        let tokenizer = repo
            .get(TOKENIZER_FILE)
            .await
            .with_context(|| format!("Failed to fetch {} for {}", TOKENIZER_FILE, model_id))?;
        let weights = match repo.get(SAFETENSORS_FILE).await {
            Ok(path) => path,
            Err(e) => {
                tracing::debug!("{} unavailable: {}", SAFETENSORS_FILE, e);
                repo.get(PYTORCH_FILE)
                    .await
                    .with_context(|| format!("Failed to fetch weights for {}", model_id))?
            }
        };

        Ok(Self {
            config,
            tokenizer,
            weights,
        })
    }
}

// ============================================================================
// Model
// ============================================================================

struct SentenceModel {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

impl SentenceModel {
    fn load(files: &ModelFiles) -> Result<Self> {
        let device = Device::Cpu;

        let config_str = std::fs::read_to_string(&files.config)
            .with_context(|| format!("Failed to read {}", files.config.display()))?;
        let config: Config = serde_json::from_str(&config_str)
            .with_context(|| format!("Failed to parse {}", files.config.display()))?;

        let mut tokenizer = Tokenizer::from_file(&files.tokenizer)
            .map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer.with_padding(None);
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQ_LEN,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("Failed to configure truncation: {}", e))?;

        let is_safetensors = files
            .weights
            .extension()
            .map(|ext| ext == "safetensors")
            .unwrap_or(false);
        // SAFETY: 모델 파일은 로드 중 수정되지 않는다고 가정 (hf-hub 캐시 / 사용자 디렉토리)
        let vb = if is_safetensors {
            unsafe {
                VarBuilder::from_mmaped_safetensors(&[&files.weights], DTYPE, &device)?
            }
        } else {
            VarBuilder::from_pth(&files.weights, DTYPE, &device)?
        };

        let model = BertModel::load(vb, &config).context("Failed to build BERT model")?;

        Ok(Self {
            model,
            tokenizer,
            device,
        })
    }

    /// 토큰 임베딩 평균 (mean pooling) 후 L2 정규화
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;

        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let token_type_ids = input_ids.zeros_like()?;
        let attention_mask =
            Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        // [1, seq_len, hidden]
        let output = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        let mask = attention_mask.to_dtype(DTYPE)?.unsqueeze(2)?;
        let summed = output.broadcast_mul(&mask)?.sum(1)?;
        let count = mask.sum(1)?;
        let pooled = summed.broadcast_div(&count)?;

        let norm = (pooled.sqr()?.sum_keepdim(1)?.sqrt()? + 1e-12)?;
        let normalized = pooled.broadcast_div(&norm)?;

        Ok(normalized.squeeze(0)?.to_vec1::<f32>()?)
    }
}

// ============================================================================
// LocalEmbedding
// ============================================================================

/// 로컬 문장 임베딩 프로바이더
pub struct LocalEmbedding {
    model: Arc<SentenceModel>,
    model_id: String,
    dimension: usize,
}

impl LocalEmbedding {
    /// 모델 로드
    ///
    /// `model_dir`가 있으면 그 디렉토리의 파일을 쓰고, 없으면 `model_id`를 Hub에서 받습니다.
    pub async fn load(model_id: &str, model_dir: Option<&Path>) -> Result<Self> {
        let files = match model_dir {
            Some(dir) => ModelFiles::from_dir(dir)?,
            None => ModelFiles::download(model_id).await?,
        };

        let model = tokio::task::spawn_blocking(move || SentenceModel::load(&files))
            .await
            .context("Model loading task failed")??;
        let model = Arc::new(model);

        let warmup = Arc::clone(&model);
        let dimension = tokio::task::spawn_blocking(move || warmup.embed("dimension"))
            .await
            .context("Embedding task failed")??
            .len();

        tracing::info!("Loaded local embedding model {} ({} dims)", model_id, dimension);

        Ok(Self {
            model,
            model_id: model_id.to_string(),
            dimension,
        })
    }

}

#[async_trait]
impl EmbeddingProvider for LocalEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let model = Arc::clone(&self.model);
        let text = text.to_string();
        tokio::task::spawn_blocking(move || model.embed(&text))
            .await
            .context("Embedding task failed")?
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let model = Arc::clone(&self.model);
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || {
            texts
                .iter()
                .map(|t| model.embed(t))
                .collect::<Result<Vec<_>>>()
        })
        .await
        .context("Embedding task failed")?
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::cosine_similarity;

    #[tokio::test]
    async fn test_missing_model_dir_returns_error() {
        let dir = std::env::temp_dir().join("snippet-chat-no-such-model");
        let err = LocalEmbedding::load(DEFAULT_LOCAL_MODEL, Some(&dir))
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    #[ignore = "requires network access to Hugging Face"]
    async fn test_minilm_embeds_korean_sentences() {
        let embedder = LocalEmbedding::load(DEFAULT_LOCAL_MODEL, None).await.unwrap();
        assert_eq!(embedder.dimension(), LOCAL_EMBEDDING_DIM);

        let query = embedder.embed("요즘 집값 어때?").await.unwrap();
        let related = embedder
            .embed("강남 아파트 가격이 3개월 연속 하락세를 보이고 있습니다.")
            .await
            .unwrap();
        let unrelated = embedder
            .embed("신촌 '청년 김밥'은 김밥 한 줄을 2,500원에 판매합니다.")
            .await
            .unwrap();

        let norm: f32 = query.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[tokio::test]
    #[ignore = "requires network access to Hugging Face"]
    async fn test_batch_matches_single() {
        let embedder = LocalEmbedding::load(DEFAULT_LOCAL_MODEL, None).await.unwrap();
        let texts = vec!["부동산 시장".to_string(), "세탁소 위치".to_string()];

        let batch = embedder.embed_batch(&texts).await.unwrap();
        let single = embedder.embed("세탁소 위치").await.unwrap();
        assert_eq!(batch.len(), 2);
        assert!(cosine_similarity(&batch[1], &single) > 0.9999);
    }
}
