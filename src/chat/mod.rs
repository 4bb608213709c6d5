//! Chat 모듈 - 애플리케이션 컨텍스트와 세션
//!
//! [`AppContext`]는 시작 시 한 번 만들어져 모든 핸들러(HTTP, REPL)에 `Arc`로 공유됩니다.
//! 임베딩 프로바이더, 시드된 컬렉션, 검색기, 응답기를 소유합니다.
//!
//! ## 사용법
//! ```rust,ignore
//! let context = AppContext::new(AppConfig::from_env()?).await?;
//! let mut transcript = Transcript::new();
//! let reply = context.ask(&mut transcript, "부동산 시장 앞으로 어떻게 될까요?").await?;
//! ```

mod session;
mod transcript;

use std::sync::Arc;

use anyhow::Context as _;
use rand::Rng;
use thiserror::Error;

use crate::config::AppConfig;
use crate::embedding::{create_embedder, EmbeddingProvider};
use crate::knowledge::{
    ensure_collection, Collection, Document, DocumentMetadata, DocumentStore, NewDocument,
    StoreError,
};
use crate::responder::Responder;
use crate::retriever::Retriever;
use crate::variant::{UiText, Variant};

pub use session::{SessionId, SessionRegistry};
pub use transcript::{ChatRole, ChatTurn, Transcript};

/// 사용자 추가 문서의 `source` 메타데이터
pub const USER_INPUT_SOURCE: &str = "user_input";

/// 랜덤 문서 id 범위 (`doc_0` ~ `doc_9999`)
const RANDOM_ID_SPACE: u32 = 10_000;

/// id 충돌 시 재시도 횟수
const MAX_ID_ATTEMPTS: usize = 16;

// ============================================================================
// Errors
// ============================================================================

/// 챗봇 동작 에러
///
/// 입력 검증 에러의 메시지는 화면에 그대로 표시됩니다.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("데이터를 입력해주세요.")]
    EmptyDocument,

    #[error("질문을 입력해주세요.")]
    EmptyQuestion,

    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Failed to allocate a document id after {attempts} attempts")]
    IdExhausted { attempts: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ChatError {
    /// 사용자 입력 문제인지 (서버 에러와 구분)
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::EmptyDocument | Self::EmptyQuestion)
    }
}

pub type ChatResult<T> = std::result::Result<T, ChatError>;

// ============================================================================
// AppContext
// ============================================================================

/// 애플리케이션 컨텍스트
pub struct AppContext {
    config: AppConfig,
    retriever: Retriever,
    responder: Responder,
}

impl AppContext {
    /// 설정의 임베딩 백엔드로 컨텍스트 생성
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let embedder = create_embedder(&config.embedding)
            .await
            .context("Failed to create embedder")?;
        Self::with_embedder(config, embedder).await
    }

    /// 지정된 임베딩 프로바이더로 컨텍스트 생성
    pub async fn with_embedder(
        config: AppConfig,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> anyhow::Result<Self> {
        let store = DocumentStore::in_memory().context("Failed to open document store")?;
        let variant = config.variant;

        let collection = ensure_collection(
            &store,
            variant.collection_name(),
            variant.seed_documents(),
            variant.seed_source_prefix(),
            embedder,
        )
        .await
        .with_context(|| format!("Failed to prepare collection {}", variant.collection_name()))?;

        tracing::info!(
            "Chat context ready: variant={}, collection={}, top_k={}",
            variant,
            collection.name(),
            config.top_k
        );

        Ok(Self {
            retriever: Retriever::new(collection),
            responder: Responder::for_variant(variant),
            config,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn variant(&self) -> Variant {
        self.config.variant
    }

    pub fn ui(&self) -> &'static UiText {
        self.config.variant.ui()
    }

    pub fn collection(&self) -> &Collection {
        self.retriever.collection()
    }

    pub fn example_questions(&self) -> &'static [&'static str] {
        self.config.variant.example_questions()
    }

    /// 예시 질문 (0-based)
    pub fn example_question(&self, index: usize) -> Option<&'static str> {
        self.example_questions().get(index).copied()
    }

    /// 질문 하나에 대한 응답 (검색 → 응답 생성)
    pub async fn answer(&self, question: &str) -> ChatResult<String> {
        validate_question(question)?;

        let context = self.retriever.search(question, self.config.top_k).await?;
        tracing::debug!("Retrieved {} context documents", context.len());

        Ok(self.responder.respond(question, &context))
    }

    /// 대화 기록에 질문과 응답을 추가
    ///
    /// 사용자 턴을 먼저 기록한 뒤 응답을 생성합니다.
    /// 응답 생성이 실패하면 사용자 턴만 남고 에러를 반환합니다.
    pub async fn ask(&self, transcript: &mut Transcript, question: &str) -> ChatResult<String> {
        validate_question(question)?;

        transcript.push(ChatTurn::user(question));
        let response = self.answer(question).await?;
        transcript.push(ChatTurn::assistant(response.clone()));

        Ok(response)
    }

    /// 사용자 문서 추가
    ///
    /// 빈 텍스트는 [`ChatError::EmptyDocument`]로 거부합니다.
    /// id는 `doc_<0..=9999 랜덤>`이며 충돌하면 새 id로 재시도합니다.
    ///
    /// # Returns
    /// 할당된 문서 id
    pub async fn add_document(&self, text: &str) -> ChatResult<String> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyDocument);
        }

        for attempt in 1..=MAX_ID_ATTEMPTS {
            let doc = NewDocument {
                id: random_document_id(),
                text: text.to_string(),
                metadata: DocumentMetadata::added_now(USER_INPUT_SOURCE),
            };
            let id = doc.id.clone();

            match self.collection().add(&[doc]).await {
                Ok(_) => {
                    tracing::info!("Added document: {} ({} chars)", id, text.chars().count());
                    return Ok(id);
                }
                Err(StoreError::DuplicateId { .. }) => {
                    tracing::warn!(
                        "Document id collision: {} (attempt {}/{})",
                        id,
                        attempt,
                        MAX_ID_ATTEMPTS
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ChatError::IdExhausted {
            attempts: MAX_ID_ATTEMPTS,
        })
    }

    /// 컬렉션의 전체 문서 (추가 순)
    pub fn all_documents(&self) -> ChatResult<Vec<Document>> {
        Ok(self.collection().get_all()?)
    }

    pub fn document_count(&self) -> ChatResult<usize> {
        Ok(self.collection().count()?)
    }
}

fn validate_question(question: &str) -> ChatResult<()> {
    if question.trim().is_empty() {
        return Err(ChatError::EmptyQuestion);
    }
    Ok(())
}

/// `doc_<0..=9999>` 랜덤 id
fn random_document_id() -> String {
    let n = rand::thread_rng().gen_range(0..RANDOM_ID_SPACE);
    format!("doc_{}", n)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedding;
    use crate::retriever::NOT_FOUND_SENTINEL;

    async fn context(variant: Variant) -> AppContext {
        AppContext::new(AppConfig::offline(variant)).await.unwrap()
    }

    #[tokio::test]
    async fn test_context_is_seeded() {
        let ctx = context(Variant::RealEstate).await;
        assert_eq!(ctx.document_count().unwrap(), 5);
        assert_eq!(ctx.collection().name(), "property_data");

        let docs = ctx.all_documents().unwrap();
        assert_eq!(docs[0].id, "doc_0");
        assert_eq!(docs[0].metadata.source, "blog_0");
    }

    #[tokio::test]
    async fn test_ask_appends_user_then_assistant() {
        let ctx = context(Variant::RealEstate).await;
        let mut transcript = Transcript::new();

        let reply = ctx
            .ask(&mut transcript, "최근 아파트 가격 변화에 대한 사람들의 생각이 어떤가요?")
            .await
            .unwrap();

        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.turns()[0].role, ChatRole::User);
        assert_eq!(transcript.turns()[1], ChatTurn::assistant(reply.clone()));
        assert!(reply.starts_with("블로그 데이터 분석 결과: "));
        assert!(reply.ends_with("가격 동향을 살펴보면, 전반적으로 하락세를 보이고 있습니다."));
    }

    #[tokio::test]
    async fn test_blank_question_rejected() {
        let ctx = context(Variant::Shop).await;
        let mut transcript = Transcript::new();

        let err = ctx.ask(&mut transcript, "   ").await.unwrap_err();
        assert!(matches!(err, ChatError::EmptyQuestion));
        assert!(err.is_user_error());
        assert!(transcript.is_empty());
    }

    #[tokio::test]
    async fn test_add_document_increments_count() {
        let ctx = context(Variant::RealEstate).await;
        let before = ctx.document_count().unwrap();

        let id = ctx
            .add_document("서울 전세가율이 다시 오르고 있다는 글이 늘었습니다.")
            .await
            .unwrap();
        assert!(id.starts_with("doc_"));

        assert_eq!(ctx.document_count().unwrap(), before + 1);
        let docs = ctx.all_documents().unwrap();
        let added = docs.iter().find(|d| d.id == id).unwrap();
        assert_eq!(added.text, "서울 전세가율이 다시 오르고 있다는 글이 늘었습니다.");
        assert_eq!(added.metadata.source, USER_INPUT_SOURCE);
        assert!(added.metadata.date_added.is_some());
    }

    #[tokio::test]
    async fn test_empty_document_rejected() {
        let ctx = context(Variant::RealEstate).await;
        let before = ctx.document_count().unwrap();

        for text in ["", "   ", "\n\t"] {
            let err = ctx.add_document(text).await.unwrap_err();
            assert_eq!(err.to_string(), "데이터를 입력해주세요.");
        }
        assert_eq!(ctx.document_count().unwrap(), before);
    }

    #[tokio::test]
    async fn test_many_adds_survive_id_collisions() {
        let ctx = context(Variant::Shop).await;
        for i in 0..50 {
            ctx.add_document(&format!("테스트 가게 {}", i)).await.unwrap();
        }
        assert_eq!(ctx.document_count().unwrap(), 55);
    }

    #[tokio::test]
    async fn test_empty_collection_answers_not_found() {
        // 시드가 없는 컬렉션은 AppContext로 만들 수 없으므로 구성 요소를 직접 조립
        let store = DocumentStore::in_memory().unwrap();
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HashingEmbedding::new(64).unwrap());
        let collection = store.create_collection("empty", embedder).unwrap();

        let context = Retriever::new(collection).search("가격", 3).await.unwrap();
        assert_eq!(context, vec![NOT_FOUND_SENTINEL.to_string()]);
        assert_eq!(
            Responder::for_variant(Variant::RealEstate).respond("가격", &context),
            Variant::RealEstate.not_found_message()
        );
    }

    #[test]
    fn test_random_document_id_range() {
        for _ in 0..200 {
            let id = random_document_id();
            let n: u32 = id.trim_start_matches("doc_").parse().unwrap();
            assert!(n < 10_000);
        }
    }

    #[tokio::test]
    async fn test_example_questions() {
        let ctx = context(Variant::RealEstate).await;
        assert_eq!(ctx.example_questions().len(), 4);
        assert_eq!(
            ctx.example_question(2),
            Some("부동산 시장 앞으로 어떻게 될까요?")
        );
        assert!(ctx.example_question(10).is_none());
    }
}
