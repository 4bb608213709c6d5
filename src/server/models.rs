//! HTTP 요청/응답 모델

use serde::{Deserialize, Serialize};

use crate::chat::{SessionId, Transcript};
use crate::knowledge::{Document, DocumentMetadata};
use crate::variant::{UiText, Variant};

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub variant: Variant,
    pub collection: String,
    pub embedder: String,
    pub document_count: usize,
    pub top_k: usize,
    pub active_sessions: usize,
    pub ui: &'static UiText,
}

#[derive(Debug, Serialize)]
pub struct ExamplesResponse {
    pub examples: &'static [&'static str],
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: SessionId,
    pub messages: Transcript,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub session_id: SessionId,
    pub reply: String,
    pub messages: Transcript,
}

#[derive(Debug, Deserialize)]
pub struct AddDocumentRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct AddDocumentResponse {
    pub id: String,
    pub message: &'static str,
    pub document_count: usize,
}

/// 문서 목록 한 줄 (1부터 번호)
#[derive(Debug, Serialize)]
pub struct DocumentEntry {
    pub index: usize,
    pub id: String,
    pub text: String,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Serialize)]
pub struct DocumentListResponse {
    pub count: usize,
    pub documents: Vec<DocumentEntry>,
}

impl From<Vec<Document>> for DocumentListResponse {
    fn from(docs: Vec<Document>) -> Self {
        let documents: Vec<DocumentEntry> = docs
            .into_iter()
            .enumerate()
            .map(|(i, doc)| DocumentEntry {
                index: i + 1,
                id: doc.id,
                text: doc.text,
                metadata: doc.metadata,
            })
            .collect();

        Self {
            count: documents.len(),
            documents,
        }
    }
}
