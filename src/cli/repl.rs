//! 터미널 대화 모드
//!
//! 한 줄에 질문 하나. `/`로 시작하면 명령어입니다.

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::chat::{AppContext, ChatError, Transcript};

use super::print_documents;

/// 대화 모드 입력 한 줄
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// 일반 질문
    Ask(String),
    /// 예시 질문 (1-based 번호)
    Example(usize),
    /// 예시 질문 목록
    Examples,
    /// 문서 추가
    Add(String),
    /// 문서 목록
    Docs,
    /// 대화 기록 출력
    History,
    /// 대화 기록 초기화
    Reset,
    Help,
    Quit,
    /// 빈 줄
    Empty,
    /// 알 수 없는 명령어
    Unknown(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Self::Ask(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match name {
            "ex" => match arg.parse() {
                Ok(n) => Self::Example(n),
                Err(_) => Self::Examples,
            },
            "examples" => Self::Examples,
            // 빈 텍스트 검증은 AppContext가 담당
            "add" => Self::Add(arg.to_string()),
            "docs" => Self::Docs,
            "history" => Self::History,
            "reset" => Self::Reset,
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => Self::Unknown(other.to_string()),
        }
    }
}

const HELP: &str = "\
명령어:
  /examples        예시 질문 목록
  /ex <번호>        예시 질문 보내기
  /add <텍스트>     새 데이터 추가
  /docs            데이터 확인
  /history         대화 기록 보기
  /reset           대화 기록 초기화
  /quit            종료";

/// 대화 루프 실행 (stdin EOF 또는 /quit 까지)
pub async fn run(context: &AppContext) -> Result<()> {
    let ui = context.ui();
    println!("{} {}", ui.icon, ui.page_title);
    println!("{}", ui.description);
    println!("(/help 로 명령어 확인)");
    println!();

    let mut transcript = Transcript::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all("> ".as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match ReplCommand::parse(&line) {
            ReplCommand::Empty => {}
            ReplCommand::Ask(question) => ask(context, &mut transcript, &question).await?,
            ReplCommand::Example(n) => {
                let question = n.checked_sub(1).and_then(|i| context.example_question(i));
                match question {
                    Some(question) => {
                        println!("> {}", question);
                        ask(context, &mut transcript, question).await?;
                    }
                    None => {
                        let count = context.example_questions().len();
                        println!("[!] 예시 질문 번호는 1~{} 입니다.", count);
                    }
                }
            }
            ReplCommand::Examples => {
                for (i, question) in context.example_questions().iter().enumerate() {
                    println!("  {}. {}", i + 1, question);
                }
            }
            ReplCommand::Add(text) => match context.add_document(&text).await {
                Ok(id) => println!("[OK] {} (ID: {})", ui.add_success, id),
                Err(e) if e.is_user_error() => println!("[!] {}", e),
                Err(e) => return Err(e.into()),
            },
            ReplCommand::Docs => print_documents(context)?,
            ReplCommand::History => {
                if transcript.is_empty() {
                    println!("(대화 기록 없음)");
                }
                for turn in transcript.turns() {
                    println!("[{:?}] {}", turn.role, turn.content);
                }
            }
            ReplCommand::Reset => {
                transcript.clear();
                println!("[OK] 대화 기록을 초기화했습니다.");
            }
            ReplCommand::Help => println!("{}", HELP),
            ReplCommand::Quit => break,
            ReplCommand::Unknown(name) => println!("[!] 알 수 없는 명령어: /{} (/help 참고)", name),
        }
    }

    Ok(())
}

async fn ask(context: &AppContext, transcript: &mut Transcript, question: &str) -> Result<()> {
    match context.ask(transcript, question).await {
        Ok(reply) => {
            println!();
            println!("{}", reply);
            println!();
            Ok(())
        }
        Err(ChatError::EmptyQuestion) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
