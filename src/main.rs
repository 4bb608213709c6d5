//! snippet-chat 진입점

use anyhow::Result;
use clap::Parser;
use snippet_chat::cli::{run, Cli};

fn main() -> Result<()> {
    // 로그는 stderr로 (대화 모드 출력과 분리)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}
