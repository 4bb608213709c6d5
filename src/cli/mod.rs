//! CLI 모듈
//!
//! snippet-chat CLI 명령어 정의 및 구현

mod repl;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::chat::AppContext;
use crate::config::{AppConfig, EmbeddingBackend};
use crate::embedding::has_api_key;
use crate::server;
use crate::variant::Variant;

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "snippet-chat")]
#[command(version, about = "한국어 스니펫 RAG 챗봇", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// 모든 명령어 공통 옵션 (환경변수 설정보다 우선)
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// 코퍼스 종류
    #[arg(long, global = true, value_enum)]
    pub variant: Option<Variant>,

    /// 임베딩 백엔드
    #[arg(long, global = true, value_enum)]
    pub embedder: Option<EmbeddingBackend>,

    /// 임베딩 차원
    #[arg(long, global = true)]
    pub dimension: Option<usize>,

    /// 미리 받아 둔 로컬 임베딩 모델 디렉토리
    #[arg(long, global = true)]
    pub model_dir: Option<PathBuf>,

    /// 질의당 검색 문서 수
    #[arg(short = 'k', long, global = true)]
    pub top_k: Option<usize>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 웹 챗봇 서버 실행
    Serve {
        /// 바인드 호스트
        #[arg(long)]
        host: Option<String>,

        /// 바인드 포트
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// 질문 하나에 답하고 종료
    Ask {
        /// 질문
        question: String,
    },

    /// 터미널 대화 모드
    Chat,

    /// 컬렉션의 전체 문서 목록
    List,

    /// 상태 확인
    Status,
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    let mut config = AppConfig::from_env().context("설정 로드 실패")?;
    cli.global.apply(&mut config);

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            cmd_serve(config).await
        }
        Commands::Ask { question } => cmd_ask(config, &question).await,
        Commands::Chat => cmd_chat(config).await,
        Commands::List => cmd_list(config).await,
        Commands::Status => cmd_status(config).await,
    }
}

impl GlobalArgs {
    /// CLI 인자를 설정에 덮어쓰기
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(variant) = self.variant {
            config.variant = variant;
        }
        if let Some(backend) = self.embedder {
            if backend != config.embedding.backend {
                config.embedding.switch_backend(backend);
            }
        }
        if let Some(dir) = &self.model_dir {
            config.embedding.model_dir = Some(dir.clone());
        }
        if let Some(dimension) = self.dimension {
            config.embedding.dimension = dimension;
        }
        if let Some(top_k) = self.top_k {
            config.top_k = top_k;
        }
    }
}

async fn build_context(config: AppConfig) -> Result<Arc<AppContext>> {
    let context = AppContext::new(config)
        .await
        .context("챗봇 컨텍스트 초기화 실패")?;
    Ok(Arc::new(context))
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 서버 명령어 (serve)
async fn cmd_serve(config: AppConfig) -> Result<()> {
    let context = build_context(config).await?;
    let ui = context.ui();
    println!("{} {}", ui.icon, ui.page_title);
    println!("[*] http://{}", context.config().bind_addr());

    server::serve(context).await
}

/// 단일 질문 명령어 (ask)
async fn cmd_ask(config: AppConfig, question: &str) -> Result<()> {
    let context = build_context(config).await?;
    let reply = context.answer(question).await.context("응답 생성 실패")?;
    println!("{}", reply);
    Ok(())
}

/// 대화 모드 명령어 (chat)
async fn cmd_chat(config: AppConfig) -> Result<()> {
    let context = build_context(config).await?;
    repl::run(&context).await
}

/// 목록 명령어 (list)
async fn cmd_list(config: AppConfig) -> Result<()> {
    let context = build_context(config).await?;
    print_documents(&context)
}

/// 상태 명령어 (status)
async fn cmd_status(config: AppConfig) -> Result<()> {
    println!("snippet-chat v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("[*] 코퍼스: {} ({})", config.variant, config.variant.collection_name());
    println!(
        "[*] 임베딩: {} (dimension: {})",
        config.embedding.backend, config.embedding.dimension
    );
    if config.embedding.backend == EmbeddingBackend::Local {
        match &config.embedding.model_dir {
            Some(dir) => println!("[*] 모델: {} ({})", config.embedding.model, dir.display()),
            None => println!("[*] 모델: {} (Hugging Face Hub)", config.embedding.model),
        }
    }
    println!("[*] 검색 개수: {}", config.top_k);
    println!("[*] 서버 주소: {}", config.bind_addr());

    if config.embedding.backend == EmbeddingBackend::Gemini {
        if has_api_key() {
            println!("[OK] API 키: 설정됨");
        } else {
            println!("[!] API 키: 미설정");
            println!("    설정: export GEMINI_API_KEY=your-key");
            return Ok(());
        }
    }

    match AppContext::new(config).await {
        Ok(context) => match context.document_count() {
            Ok(count) => println!("[OK] 저장된 문서: {} 건", count),
            Err(e) => println!("[!] 문서 수 조회 실패: {}", e),
        },
        Err(e) => println!("[!] 컨텍스트 초기화 실패: {:#}", e),
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 전체 문서 출력
pub(crate) fn print_documents(context: &AppContext) -> Result<()> {
    let docs = context.all_documents().context("문서 목록 조회 실패")?;

    if docs.is_empty() {
        println!("[!] 데이터가 없습니다.");
        return Ok(());
    }

    println!("현재 분석에 사용 중인 데이터 ({} 건):", docs.len());
    for (i, doc) in docs.iter().enumerate() {
        println!("{}. [{}] {}", i + 1, doc.id, truncate_text(&doc.text, 80));
    }

    Ok(())
}

/// 텍스트 자르기 (UTF-8 안전)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

// ============================================================================
// Tests
// ============================================================================
