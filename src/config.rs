//! 애플리케이션 설정
//!
//! 기본값 → 환경변수(`RAG_*`) → CLI 인자 순으로 덮어씁니다.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::embedding::{DEFAULT_HASH_DIMENSION, DEFAULT_LOCAL_MODEL, LOCAL_EMBEDDING_DIM};
use crate::variant::Variant;

/// 기본 검색 결과 개수
pub const DEFAULT_TOP_K: usize = 3;
/// 기본 바인드 주소
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// 기본 포트
pub const DEFAULT_PORT: u16 = 8501;
/// 기본 유휴 세션 만료 시간 (30분)
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;

// ============================================================================
// Types
// ============================================================================

/// 임베딩 백엔드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// 로컬 사전학습 문장 임베딩 모델 (기본값)
    Local,
    /// Gemini API
    Gemini,
    /// 모델 없는 해싱 임베딩 (테스트 / 오프라인용)
    Hash,
}

impl FromStr for EmbeddingBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "gemini" => Ok(Self::Gemini),
            "hash" => Ok(Self::Hash),
            other => anyhow::bail!(
                "Unknown embedding backend: {} (expected local, gemini or hash)",
                other
            ),
        }
    }
}

impl fmt::Display for EmbeddingBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Gemini => write!(f, "gemini"),
            Self::Hash => write!(f, "hash"),
        }
    }
}

/// 임베딩 설정
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    pub dimension: usize,
    /// 로컬 모델 Hugging Face id
    pub model: String,
    /// 미리 받아 둔 로컬 모델 디렉토리 (없으면 Hub에서 받음)
    pub model_dir: Option<PathBuf>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self::for_backend(EmbeddingBackend::Local)
    }
}

impl EmbeddingConfig {
    /// 백엔드 기본 차원으로 설정 생성
    pub fn for_backend(backend: EmbeddingBackend) -> Self {
        let dimension = match backend {
            EmbeddingBackend::Local => LOCAL_EMBEDDING_DIM,
            EmbeddingBackend::Gemini => 768,
            EmbeddingBackend::Hash => DEFAULT_HASH_DIMENSION,
        };
        Self {
            backend,
            dimension,
            model: DEFAULT_LOCAL_MODEL.to_string(),
            model_dir: None,
        }
    }

    /// 백엔드만 바꾸고 모델 위치 설정은 유지
    pub fn switch_backend(&mut self, backend: EmbeddingBackend) {
        let model = std::mem::take(&mut self.model);
        let model_dir = self.model_dir.take();
        *self = Self {
            model,
            model_dir,
            ..Self::for_backend(backend)
        };
    }
}

/// 전체 애플리케이션 설정
#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    /// 코퍼스 종류
    pub variant: Variant,
    pub embedding: EmbeddingConfig,
    /// 질의당 검색 문서 수
    pub top_k: usize,
    pub host: String,
    pub port: u16,
    /// 마지막 활동 후 세션을 유지하는 시간 (초, 0이면 만료 없음)
    pub session_idle_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            variant: Variant::RealEstate,
            embedding: EmbeddingConfig::default(),
            top_k: DEFAULT_TOP_K,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            session_idle_secs: DEFAULT_SESSION_IDLE_SECS,
        }
    }
}

impl AppConfig {
    /// 환경변수에서 설정 로드
    ///
    /// - `RAG_VARIANT`: `real-estate` | `shop`
    /// - `RAG_EMBEDDER`: `local` | `gemini` | `hash`
    /// - `RAG_EMBEDDING_MODEL`, `RAG_MODEL_DIR`: 로컬 모델 id / 디렉토리
    /// - `RAG_EMBEDDING_DIM`, `RAG_TOP_K`, `RAG_HOST`, `RAG_PORT`
    /// - `RAG_SESSION_IDLE_SECS`: 유휴 세션 만료 시간 (초)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 임의의 키 조회 함수로 설정 로드 (테스트용 분리)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("RAG_VARIANT") {
            config.variant = v.parse().context("Invalid RAG_VARIANT")?;
        }
        if let Some(v) = get("RAG_EMBEDDER") {
            config
                .embedding
                .switch_backend(v.parse().context("Invalid RAG_EMBEDDER")?);
        }
        if let Some(v) = get("RAG_EMBEDDING_MODEL") {
            config.embedding.model = v.trim().to_string();
        }
        if let Some(v) = get("RAG_MODEL_DIR") {
            config.embedding.model_dir = Some(PathBuf::from(v.trim()));
        }
        if let Some(v) = get("RAG_EMBEDDING_DIM") {
            config.embedding.dimension = v
                .trim()
                .parse()
                .with_context(|| format!("Invalid RAG_EMBEDDING_DIM: {}", v))?;
        }
        if let Some(v) = get("RAG_TOP_K") {
            config.top_k = v
                .trim()
                .parse()
                .with_context(|| format!("Invalid RAG_TOP_K: {}", v))?;
        }
        if let Some(v) = get("RAG_HOST") {
            config.host = v.trim().to_string();
        }
        if let Some(v) = get("RAG_PORT") {
            config.port = v
                .trim()
                .parse()
                .with_context(|| format!("Invalid RAG_PORT: {}", v))?;
        }
        if let Some(v) = get("RAG_SESSION_IDLE_SECS") {
            config.session_idle_secs = v
                .trim()
                .parse()
                .with_context(|| format!("Invalid RAG_SESSION_IDLE_SECS: {}", v))?;
        }

        Ok(config)
    }

    /// 바인드 주소 문자열 (`host:port`)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }

    /// 모델 없이 동작하는 설정 (해싱 임베딩)
    pub fn offline(variant: Variant) -> Self {
        Self {
            variant,
            embedding: EmbeddingConfig::for_backend(EmbeddingBackend::Hash),
            ..Self::default()
        }
    }
}
