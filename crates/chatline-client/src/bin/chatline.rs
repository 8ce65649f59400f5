use std::io::Write;

use anyhow::Result;
use chatline_client::{ChatSession, ClientConfig, HttpTransport, SessionRequest};
use chatline_persist::{FileStorage, MessageRole, StateStorage, ThreadRecord, ThreadStore};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Send(String),
    New,
    Threads,
    Switch(usize),
    Delete(usize),
    Help,
    Quit,
    Invalid(String),
}

impl Command {
    /// Thread numbers on the command line are 1-based
    fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Send(line.to_string());
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let index = parts
            .next()
            .and_then(|n| n.parse::<usize>().ok())
            .and_then(|n| n.checked_sub(1));

        match (name, index) {
            ("new", _) => Command::New,
            ("threads", _) => Command::Threads,
            ("switch", Some(index)) => Command::Switch(index),
            ("delete", Some(index)) => Command::Delete(index),
            ("help", _) => Command::Help,
            ("quit" | "exit", _) => Command::Quit,
            _ => Command::Invalid(line.to_string()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = ClientConfig::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    let transport = HttpTransport::new(&config.proxy_url)?;
    let store = ThreadStore::load(FileStorage::new(&config.state_dir));
    let mut session = ChatSession::new(transport, store);

    println!("Connecting to {} ...", config.proxy_url);
    session
        .initialize(SessionRequest::new(&config.workflow_id))
        .await?;
    println!("Session active. Type /help for commands.\n");
    print_thread(session.store().active());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt();

    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Send(text) if text.is_empty() => {}
            Command::Send(text) => send(&mut session, &text).await,
            Command::New => {
                session.new_thread()?;
                println!("Started a new chat.");
            }
            Command::Threads => list_threads(session.store()),
            Command::Switch(index) => match session.switch_to(index) {
                Ok(thread) => print_thread(thread),
                Err(e) => println!("! {e}"),
            },
            Command::Delete(index) => match session.delete_thread(index) {
                Ok(()) => list_threads(session.store()),
                Err(e) => println!("! {e}"),
            },
            Command::Help => print_help(),
            Command::Quit => break,
            Command::Invalid(line) => println!("Unknown command: {line} (try /help)"),
        }
        prompt();
    }

    Ok(())
}

async fn send<S: StateStorage>(session: &mut ChatSession<HttpTransport, S>, text: &str) {
    let mut printed = 0;
    let mut stdout = std::io::stdout();

    let result = session
        .send_with(text, |thread| {
            let Some(last) = thread.messages.last() else {
                return;
            };
            if last.role != MessageRole::Assistant {
                return;
            }
            if printed == 0 {
                print!("assistant> ");
            }
            // assistant text only grows within a turn
            print!("{}", &last.content[printed..]);
            printed = last.content.len();
            let _ = stdout.flush();
        })
        .await;

    println!();
    if result.is_err() {
        if let Some(banner) = session.error() {
            println!("! {banner}");
        }
        session.dismiss_error();
    }
}

fn list_threads<S: StateStorage>(store: &ThreadStore<S>) {
    for (index, thread) in store.threads().iter().enumerate() {
        let marker = if index == store.active_index() { '*' } else { ' ' };
        println!(
            "{marker} {:>2}. {} ({} messages)",
            index + 1,
            thread.title,
            thread.messages.len()
        );
    }
}

fn print_thread(thread: &ThreadRecord) {
    println!("== {} ==", thread.title);
    for message in &thread.messages {
        let who = match message.role {
            MessageRole::User => "you",
            MessageRole::Assistant => "assistant",
        };
        println!("{who}> {}", message.content);
    }
}

fn print_help() {
    println!("/new          start a new chat");
    println!("/threads      list chats");
    println!("/switch N     open chat N");
    println!("/delete N     delete chat N");
    println!("/quit         exit");
}

fn prompt() {
    print!("you> ");
    let _ = std::io::stdout().flush();
}

fn init_logging(config: &ClientConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}
