//! HTTP 핸들러

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    Json,
};

use crate::chat::SessionId;

use super::error::ApiError;
use super::models::*;
use super::{AppState, INDEX_HTML};

/// 챗봇 단일 페이지
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// 헬스 체크
pub async fn health() -> &'static str {
    "OK"
}

/// 화면 문구 + 컬렉션 상태
pub async fn info(State(state): State<Arc<AppState>>) -> Result<Json<InfoResponse>, ApiError> {
    let context = &state.context;
    Ok(Json(InfoResponse {
        variant: context.variant(),
        collection: context.collection().name().to_string(),
        embedder: context.collection().embedder().name().to_string(),
        document_count: context.document_count()?,
        top_k: context.config().top_k,
        active_sessions: state.sessions.len().await,
        ui: context.ui(),
    }))
}

/// 예시 질문 목록
pub async fn examples(State(state): State<Arc<AppState>>) -> Json<ExamplesResponse> {
    Json(ExamplesResponse {
        examples: state.context.example_questions(),
    })
}

/// 새 세션 생성
pub async fn create_session(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<SessionResponse>) {
    let session_id = state.sessions.create().await;
    (
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id,
            messages: Default::default(),
        }),
    )
}

/// 세션 종료
pub async fn end_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
) -> Result<StatusCode, ApiError> {
    state.sessions.end(session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 세션 대화 기록 조회
pub async fn get_messages(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<SessionResponse>, ApiError> {
    let messages = state.sessions.transcript(session_id).await?;
    Ok(Json(SessionResponse {
        session_id,
        messages,
    }))
}

/// 질문 전송 (예시 질문 버튼도 같은 경로 사용)
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let reply = state
        .sessions
        .ask(&state.context, session_id, &req.question)
        .await?;
    let messages = state.sessions.transcript(session_id).await?;

    Ok(Json(AskResponse {
        session_id,
        reply,
        messages,
    }))
}

/// 대화 기록 초기화
pub async fn reset_messages(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<SessionResponse>, ApiError> {
    state.sessions.reset(session_id).await?;
    Ok(Json(SessionResponse {
        session_id,
        messages: Default::default(),
    }))
}

/// 전체 문서 목록
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DocumentListResponse>, ApiError> {
    let docs = state.context.all_documents()?;
    Ok(Json(docs.into()))
}

/// 문서 추가
pub async fn add_document(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddDocumentRequest>,
) -> Result<(StatusCode, Json<AddDocumentResponse>), ApiError> {
    let id = state.context.add_document(&req.text).await?;

    Ok((
        StatusCode::CREATED,
        Json(AddDocumentResponse {
            id,
            message: state.context.ui().add_success,
            document_count: state.context.document_count()?,
        }),
    ))
}
