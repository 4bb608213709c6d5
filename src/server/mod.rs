//! HTTP 서버 - 챗봇 단일 페이지 + JSON API
//!
//! | Method | Path | 설명 |
//! |--------|------|------|
//! | GET | `/` | 챗봇 페이지 |
//! | GET | `/health` | 헬스 체크 |
//! | GET | `/api/info` | 화면 문구, 컬렉션 상태 |
//! | GET | `/api/examples` | 예시 질문 |
//! | POST | `/api/sessions` | 세션 생성 |
//! | DELETE | `/api/sessions/:id` | 세션 종료 |
//! | GET/POST/DELETE | `/api/sessions/:id/messages` | 대화 조회 / 질문 / 초기화 |
//! | GET/POST | `/api/documents` | 문서 목록 / 추가 |

mod error;
mod handlers;
mod models;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::chat::{AppContext, SessionRegistry};

pub use error::ApiError;

/// 챗봇 페이지 HTML
pub(crate) const INDEX_HTML: &str = include_str!("index.html");

/// 유휴 세션 정리 주기 상한
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// 핸들러 공유 상태
pub struct AppState {
    pub context: Arc<AppContext>,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(context: Arc<AppContext>) -> Self {
        Self {
            context,
            sessions: SessionRegistry::new(),
        }
    }
}

/// 라우터 구성
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/info", get(handlers::info))
        .route("/api/examples", get(handlers::examples))
        .route("/api/sessions", post(handlers::create_session))
        .route("/api/sessions/:id", delete(handlers::end_session))
        .route(
            "/api/sessions/:id/messages",
            get(handlers::get_messages)
                .post(handlers::post_message)
                .delete(handlers::reset_messages),
        )
        .route(
            "/api/documents",
            get(handlers::list_documents).post(handlers::add_document),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 서버 실행 (종료 신호까지 블로킹)
pub async fn serve(context: Arc<AppContext>) -> Result<()> {
    let addr = context.config().bind_addr();
    let idle_timeout = context.config().session_idle_timeout();
    let state = Arc::new(AppState::new(context));
    let app = router(Arc::clone(&state));

    // 0이면 만료 없음
    let sweeper = (!idle_timeout.is_zero())
        .then(|| tokio::spawn(sweep_idle_sessions(state, idle_timeout)));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Serving chatbot on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    tracing::info!("Server stopped");
    Ok(())
}

/// 유휴 세션을 주기적으로 제거
async fn sweep_idle_sessions(state: Arc<AppState>, idle_timeout: Duration) {
    let period = idle_timeout.clamp(Duration::from_secs(1), MAX_SWEEP_INTERVAL);
    let mut interval = tokio::time::interval(period);

    loop {
        interval.tick().await;
        let evicted = state.sessions.evict_idle(idle_timeout).await;
        if evicted > 0 {
            tracing::info!(
                "Evicted {} idle sessions ({} active)",
                evicted,
                state.sessions.len().await
            );
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
