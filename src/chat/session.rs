//! 세션 레지스트리 - 세션별 대화 기록
//!
//! 응답 생성 중에는 잠금을 잡지 않아, 한 세션의 검색이 다른 세션을 막지 않습니다.
//! 세션은 명시적으로 종료하거나([`SessionRegistry::end`]) 유휴 시간이 지나면
//! ([`SessionRegistry::evict_idle`]) 대화 기록과 함께 사라집니다.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use uuid::Uuid;

use super::{validate_question, AppContext, ChatError, ChatResult, ChatTurn, Transcript};

/// 세션 식별자
pub type SessionId = Uuid;

#[derive(Debug)]
struct Session {
    transcript: Transcript,
    last_active: Instant,
}

impl Session {
    fn new() -> Self {
        Self {
            transcript: Transcript::new(),
            last_active: Instant::now(),
        }
    }

    fn touch(&mut self) -> &mut Transcript {
        self.last_active = Instant::now();
        &mut self.transcript
    }
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 빈 대화 기록으로 새 세션 생성
    pub async fn create(&self) -> SessionId {
        let id = Uuid::new_v4();
        self.sessions.write().await.insert(id, Session::new());
        tracing::debug!("Created session {}", id);
        id
    }

    /// 대화 기록 스냅샷
    pub async fn transcript(&self, id: SessionId) -> ChatResult<Transcript> {
        self.sessions
            .read()
            .await
            .get(&id)
            .map(|session| session.transcript.clone())
            .ok_or(ChatError::SessionNotFound(id))
    }

    /// 세션에 질문하고 응답을 기록
    ///
    /// 사용자 턴 기록 → (잠금 없이) 응답 생성 → 어시스턴트 턴 기록 순서입니다.
    /// 응답 생성 중 세션이 초기화되었다면 어시스턴트 턴은 초기화 이후 기록에 붙습니다.
    pub async fn ask(
        &self,
        context: &AppContext,
        id: SessionId,
        question: &str,
    ) -> ChatResult<String> {
        validate_question(question)?;
        self.push(id, ChatTurn::user(question)).await?;

        let response = context.answer(question).await?;
        self.push(id, ChatTurn::assistant(response.clone())).await?;

        Ok(response)
    }

    /// 대화 기록 초기화
    pub async fn reset(&self, id: SessionId) -> ChatResult<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(ChatError::SessionNotFound(id))?;
        session.touch().clear();
        tracing::debug!("Reset session {}", id);
        Ok(())
    }

    /// 세션 종료 (대화 기록 폐기)
    pub async fn end(&self, id: SessionId) -> ChatResult<()> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .map(|_| tracing::debug!("Ended session {}", id))
            .ok_or(ChatError::SessionNotFound(id))
    }

    /// `max_idle` 이상 활동이 없던 세션 제거
    ///
    /// # Returns
    /// 제거된 세션 수
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| now.duration_since(session.last_active) < max_idle);
        before - sessions.len()
    }

    /// 활성 세션 수
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn push(&self, id: SessionId, turn: ChatTurn) -> ChatResult<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(ChatError::SessionNotFound(id))?;
        session.touch().push(turn);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatRole;
    use crate::config::AppConfig;
    use crate::variant::Variant;

    #[tokio::test]
    async fn test_create_and_reset() {
        let registry = SessionRegistry::new();
        let context = AppContext::new(AppConfig::offline(Variant::RealEstate)).await.unwrap();
        let id = registry.create().await;

        registry.ask(&context, id, "부동산 시장 앞으로 어떻게 될까요?").await.unwrap();
        registry.ask(&context, id, "30대 생각은?").await.unwrap();
        assert_eq!(registry.transcript(id).await.unwrap().len(), 4);

        registry.reset(id).await.unwrap();
        assert!(registry.transcript(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let registry = SessionRegistry::new();
        let context = AppContext::new(AppConfig::offline(Variant::RealEstate)).await.unwrap();
        let a = registry.create().await;
        let b = registry.create().await;

        registry.ask(&context, a, "가격은?").await.unwrap();

        let transcript = registry.transcript(a).await.unwrap();
        assert_eq!(transcript.turns()[0].role, ChatRole::User);
        assert_eq!(transcript.turns()[1].role, ChatRole::Assistant);
        assert!(registry.transcript(b).await.unwrap().is_empty());
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let registry = SessionRegistry::new();
        let context = AppContext::new(AppConfig::offline(Variant::RealEstate)).await.unwrap();
        let unknown = Uuid::new_v4();

        assert!(matches!(
            registry.ask(&context, unknown, "가격").await,
            Err(ChatError::SessionNotFound(id)) if id == unknown
        ));
        assert!(registry.reset(unknown).await.is_err());
        assert!(registry.end(unknown).await.is_err());
    }

    #[tokio::test]
    async fn test_ended_session_is_gone() {
        let registry = SessionRegistry::new();
        let context = AppContext::new(AppConfig::offline(Variant::RealEstate)).await.unwrap();
        let id = registry.create().await;
        let other = registry.create().await;

        registry.ask(&context, id, "가격은?").await.unwrap();
        registry.end(id).await.unwrap();

        assert_eq!(registry.len().await, 1);
        assert!(matches!(
            registry.transcript(id).await,
            Err(ChatError::SessionNotFound(_))
        ));
        assert!(matches!(
            registry.ask(&context, id, "가격은?").await,
            Err(ChatError::SessionNotFound(_))
        ));
        assert!(registry.transcript(other).await.is_ok());
    }

    #[tokio::test]
    async fn test_evict_idle_sessions() {
        let registry = SessionRegistry::new();
        registry.create().await;
        registry.create().await;

        assert_eq!(registry.evict_idle(Duration::from_secs(3600)).await, 0);
        assert_eq!(registry.len().await, 2);

        tokio::time::sleep(Duration::from_millis(20)).await;
        let active = registry.create().await;

        assert_eq!(registry.evict_idle(Duration::from_millis(10)).await, 2);
        assert_eq!(registry.len().await, 1);
        assert!(registry.transcript(active).await.is_ok());
    }

    #[tokio::test]
    async fn test_activity_keeps_session_alive() {
        let registry = SessionRegistry::new();
        let context = AppContext::new(AppConfig::offline(Variant::RealEstate)).await.unwrap();
        let id = registry.create().await;

        tokio::time::sleep(Duration::from_millis(30)).await;
        registry.ask(&context, id, "전망은?").await.unwrap();

        assert_eq!(registry.evict_idle(Duration::from_millis(20)).await, 0);
        assert_eq!(registry.transcript(id).await.unwrap().len(), 2);
    }
}
