//! HTTP API 통합 테스트
//!
//! 라우터에 직접 요청을 보내 세션, 질문, 문서 추가/조회 흐름을 확인합니다.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use snippet_chat::server::{router, AppState};
use snippet_chat::{AppConfig, AppContext, Variant};

async fn app(variant: Variant) -> Router {
    let context = AppContext::new(AppConfig::offline(variant)).await.unwrap();
    router(Arc::new(AppState::new(Arc::new(context))))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn new_session(app: &Router) -> String {
    let (status, body) = send(app, Method::POST, "/api/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    body["session_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_and_index() {
    let app = app(Variant::RealEstate).await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&html).contains("/api/sessions"));
}

#[tokio::test]
async fn test_info_reports_variant() {
    let app = app(Variant::Shop).await;
    let (status, body) = send(&app, Method::GET, "/api/info", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["variant"], "shop");
    assert_eq!(body["collection"], "shop_data");
    assert_eq!(body["document_count"], 5);
    assert_eq!(body["embedder"], "ngram-hash");
    assert_eq!(body["active_sessions"], 0);
    assert_eq!(body["ui"]["page_title"], "우리동네 착한가게 챗봇");
}

#[tokio::test]
async fn test_examples() {
    let app = app(Variant::RealEstate).await;
    let (_, body) = send(&app, Method::GET, "/api/examples", None).await;

    let examples = body["examples"].as_array().unwrap();
    assert_eq!(examples.len(), 4);
    assert_eq!(examples[3], "경기도 지역 아파트 가격은 어떻게 변했나요?");
}

#[tokio::test]
async fn test_ask_records_transcript() {
    let app = app(Variant::RealEstate).await;
    let session = new_session(&app).await;
    let uri = format!("/api/sessions/{}/messages", session);

    let (status, body) = send(
        &app,
        Method::POST,
        &uri,
        Some(json!({ "question": "부동산 가격 전망은 어떤가요?" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let reply = body["reply"].as_str().unwrap();
    assert!(reply.starts_with("블로그 데이터 분석 결과: "));
    assert!(reply.contains("가격 동향을 살펴보면"));
    assert!(!reply.contains("향후 시장 전망은"));

    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[1]["content"], reply);

    let (_, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(body["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_reset_empties_transcript() {
    let app = app(Variant::RealEstate).await;
    let session = new_session(&app).await;
    let uri = format!("/api/sessions/{}/messages", session);

    for question in ["가격은?", "앞으로는?", "젊은 층은?"] {
        send(&app, Method::POST, &uri, Some(json!({ "question": question }))).await;
    }
    let (_, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(body["messages"].as_array().unwrap().len(), 6);

    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["messages"].as_array().unwrap().is_empty());

    let (_, body) = send(&app, Method::GET, &uri, None).await;
    assert!(body["messages"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_blank_question_is_bad_request() {
    let app = app(Variant::RealEstate).await;
    let session = new_session(&app).await;
    let uri = format!("/api/sessions/{}/messages", session);

    let (status, body) = send(&app, Method::POST, &uri, Some(json!({ "question": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "질문을 입력해주세요.");
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let app = app(Variant::RealEstate).await;
    let uri = format!("/api/sessions/{}/messages", uuid::Uuid::new_v4());

    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::POST, &uri, Some(json!({ "question": "가격" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_ended_session_is_not_found() {
    let app = app(Variant::RealEstate).await;
    let session = new_session(&app).await;
    let kept = new_session(&app).await;
    let session_uri = format!("/api/sessions/{}", session);
    let uri = format!("{}/messages", session_uri);
    send(&app, Method::POST, &uri, Some(json!({ "question": "가격" }))).await;

    let (status, _) = send(&app, Method::DELETE, &session_uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::DELETE, &session_uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, info) = send(&app, Method::GET, "/api/info", None).await;
    assert_eq!(info["active_sessions"], 1);

    let kept_uri = format!("/api/sessions/{}/messages", kept);
    let (status, _) = send(&app, Method::GET, &kept_uri, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_add_document_then_list() {
    let app = app(Variant::RealEstate).await;
    let text = "인천 신축 아파트 청약 경쟁률이 높아졌다는 후기가 많습니다.";

    let payload = Some(json!({ "text": text }));
    let (status, body) = send(&app, Method::POST, "/api/documents", payload).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "데이터가 추가되었습니다!");
    assert_eq!(body["document_count"], 6);
    let id = body["id"].as_str().unwrap().to_string();

    let (_, body) = send(&app, Method::GET, "/api/documents", None).await;
    assert_eq!(body["count"], 6);
    let documents = body["documents"].as_array().unwrap();
    let added = documents.iter().find(|d| d["id"] == id.as_str()).unwrap();
    assert_eq!(added["text"], text);
    assert_eq!(added["metadata"]["source"], "user_input");
    assert!(added["metadata"]["date_added"].is_string());
    assert_eq!(documents[0]["index"], 1);
}

#[tokio::test]
async fn test_empty_document_rejected() {
    let app = app(Variant::RealEstate).await;

    for body in [json!({ "text": "" }), json!({ "text": "   " }), json!({})] {
        let (status, body) = send(&app, Method::POST, "/api/documents", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "데이터를 입력해주세요.");
    }

    let (_, body) = send(&app, Method::GET, "/api/documents", None).await;
    assert_eq!(body["count"], 5);
}

#[tokio::test]
async fn test_added_document_is_retrievable() {
    let app = app(Variant::Shop).await;
    let text = "을지로 '행복 수선집'은 바지 기장 수선을 3,000원에 해줍니다.";
    send(&app, Method::POST, "/api/documents", Some(json!({ "text": text }))).await;

    let session = new_session(&app).await;
    let uri = format!("/api/sessions/{}/messages", session);
    let (_, body) = send(
        &app,
        Method::POST,
        &uri,
        Some(json!({ "question": "을지로 행복 수선집 바지 기장 수선" })),
    )
    .await;

    let reply = body["reply"].as_str().unwrap();
    assert!(reply.starts_with(&format!("착한가게 정보 검색 결과: {}", text)));
}
