//! charla: ask the assistant from a terminal
//!
//! One-shot question as an argument, or a line-oriented conversation on stdin.

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use charla::{
    Assistant, AssistantRequest, Availability, Catalog, Config, DispatchEngine, MemorySessionStore,
    Picker, RandomPicker, Secrets, SeededPicker, SpokenReply,
};

/// Charla voice assistant, text edition
#[derive(Parser)]
#[command(name = "charla")]
#[command(version = charla::PKG_VERSION)]
#[command(about = "Ask an LLM-backed Spanish assistant, with provider fallback")]
struct Args {
    /// Question to ask (omit for an interactive conversation on stdin)
    question: Option<String>,

    /// Config file (default: ~/.charla/config.toml, then /etc/charla/config.toml)
    #[arg(short, long, env = "CHARLA_CONFIG")]
    config: Option<PathBuf>,

    /// Pin every turn to this provider, disabling fallback
    #[arg(short, long)]
    provider: Option<String>,

    /// Seed for reproducible provider and prompt choice
    #[arg(long)]
    seed: Option<u64>,

    /// Conversation id used for the session store
    #[arg(long, default_value = "cli")]
    conversation: String,

    /// Print which provider answered each turn
    #[arg(short, long)]
    verbose: bool,
}

const COMMANDS_HELP: &str = "/help  ayuda   /new  tema nuevo   /quit  salir";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(provider) = args.provider {
        config.dispatch.forced_provider = Some(provider);
    }
    let secrets = Secrets::load()?;
    let availability = Availability::resolve(&Catalog::builtin(), &secrets)?;

    let picker: Arc<dyn Picker> = match args.seed {
        Some(seed) => Arc::new(SeededPicker::new(seed)),
        None => Arc::new(RandomPicker),
    };
    let engine = DispatchEngine::builder(Arc::new(availability))
        .picker(picker)
        .persona(config.persona.clone())
        .config(config.dispatch.clone())
        .build()?;
    let store = MemorySessionStore::new(&config.sessions.store_config());
    let assistant = Assistant::new(Arc::new(engine), Arc::new(store));
    let id = args.conversation.as_str();

    if let Some(question) = args.question {
        assistant.handle(id, AssistantRequest::Launch).await;
        if let Some(reply) = assistant.handle(id, AssistantRequest::Query(question)).await {
            println!("{}", reply.speech);
        }
        if args.verbose {
            print_provider(&assistant, id);
        }
        assistant.handle(id, AssistantRequest::SessionEnded).await;
        return Ok(());
    }

    let interactive = io::stdin().is_terminal();
    if let Some(reply) = assistant.handle(id, AssistantRequest::Launch).await {
        say(&reply, interactive)?;
    }
    if interactive {
        eprintln!("{COMMANDS_HELP}");
    }

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let request = match line.trim() {
            "/quit" | "/exit" => AssistantRequest::Stop,
            "/help" => AssistantRequest::Help,
            "/new" => AssistantRequest::NewTopic,
            text => AssistantRequest::Query(text.to_string()),
        };

        if let Some(reply) = assistant.handle(id, request).await {
            say(&reply, interactive)?;
            if args.verbose {
                print_provider(&assistant, id);
            }
            if reply.end_session {
                break;
            }
        }
    }

    assistant.handle(id, AssistantRequest::SessionEnded).await;
    Ok(())
}

fn say(reply: &SpokenReply, interactive: bool) -> io::Result<()> {
    println!("{}", reply.speech);
    if interactive && let Some(reprompt) = &reply.reprompt {
        eprint!("({reprompt}) > ");
        io::stderr().flush()?;
    }
    Ok(())
}

fn print_provider(assistant: &Assistant, id: &str) {
    let provider = assistant
        .session(id)
        .and_then(|s| s.current_provider().map(str::to_string));
    eprintln!("[{}]", provider.as_deref().unwrap_or("unknown"));
}
