use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use mortgage_assist::config::AssistantConfig;
use mortgage_assist::engine::ConversationEngine;
use mortgage_assist::events::TracingSink;
use mortgage_assist::responder::OpenAiResponder;
use mortgage_assist::script::Script;
use mortgage_assist::store::JsonFileStore;

#[tokio::main]
async fn main() -> mortgage_assist::error::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AssistantConfig::default();

    let snapshot_path = std::env::var("MORTGAGE_ASSIST_SNAPSHOT")
        .unwrap_or_else(|_| "./data/lead-snapshot.json".to_string());

    let mut engine = ConversationEngine::new(Script::standard(), config.clone())
        .with_store(Arc::new(JsonFileStore::new(&snapshot_path)))
        .with_events(Arc::new(TracingSink));

    // The responder is optional: without an API key the assistant runs on
    // static step text alone.
    match std::env::var("OPENAI_API_KEY") {
        Ok(api_key) => {
            let model = std::env::var("MORTGAGE_ASSIST_MODEL")
                .unwrap_or_else(|_| "gpt-3.5-turbo".to_string());
            let responder =
                OpenAiResponder::new(secrecy::SecretString::from(api_key), config.responder_timeout)?
                    .with_model(&model);
            engine = engine.with_responder(Arc::new(responder));
            eprintln!("🏠 Mortgage Assist v{} (model: {})", env!("CARGO_PKG_VERSION"), model);
        }
        Err(_) => {
            eprintln!(
                "🏠 Mortgage Assist v{} (no OPENAI_API_KEY — static prompts only)",
                env!("CARGO_PKG_VERSION")
            );
        }
    }
    eprintln!("   Snapshot: {}", snapshot_path);
    eprintln!("   Type a message and press Enter. /quit to exit.\n");

    let opening = engine.start();
    for message in &opening.messages {
        println!("{message}\n");
    }

    let stdin = tokio::io::stdin();
    let reader = BufReader::new(stdin);
    let mut lines = reader.lines();

    loop {
        eprint!("> ");
        let line = match lines.next_line().await {
            Ok(Some(line)) => line.trim().to_string(),
            Ok(None) => break, // EOF
            Err(e) => {
                tracing::error!("Error reading stdin: {}", e);
                break;
            }
        };
        // Empty lines go through: the phone step treats one as an explicit
        // skip.
        if line == "/quit" {
            break;
        }

        let reply = engine.handle_input(&line).await;

        // Simulated typing. Lives here, not in the engine, so dropping the
        // loop cancels it cleanly.
        tokio::time::sleep(reply.typing_delay).await;

        for message in &reply.messages {
            println!("\n{message}");
        }
        if let Some(url) = &reply.open_url {
            println!("\n📅 Book a time here: {url}");
        }
        println!();

        if reply.done {
            break;
        }
    }

    Ok(())
}
