use anyhow::{Context, Result};
use clap::Parser;
use folio_chat::config::Config;
use folio_chat::conversation::Message;
use folio_chat::profile::ProfileRecord;
use folio_chat::router::Router;
use folio_chat::server::{self, AppState, EnvCheck};
use folio_chat::session::ChatSession;
use folio_chat::speech::{LineInput, SilentOutput, SpeechInput};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "folio-chat",
    about = "Portfolio chat assistant — profile answers with hosted-model fallback"
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, default_value = "folio-chat.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Serve the chat and env-check endpoints
    Serve {
        /// Bind address override
        #[arg(long)]
        bind: Option<String>,
    },

    /// Answer a single question and print the response envelope
    Ask {
        question: String,

        /// Answer from the profile only, even when a credential is set
        #[arg(long)]
        local: bool,
    },

    /// Interactive chat on the terminal
    Chat,

    /// Show whether a credential is configured (preview only)
    EnvCheck,
}

/// Config, profile and injected credential, resolved once at startup.
fn build_router(config_path: &Path) -> Result<(Config, Router)> {
    let config = Config::load_or_default(config_path)?;
    config.validate()?;
    let profile = ProfileRecord::load_or_bundled(config.profile.path.as_deref())
        .context("loading profile")?;
    let credential = config.llm.credential_from_env();
    let router = Router::from_config(&config, Arc::new(profile), credential)?;
    Ok((config, router))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("folio_chat=info")),
        )
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let (config, router) = build_router(&cli.config)?;

    match cli.command {
        Command::Serve { bind } => {
            let bind = bind.unwrap_or(config.server.bind);
            info!(
                hosted = router.credential().is_some(),
                candidates = config.llm.models.len(),
                "starting chat server"
            );
            server::serve(&bind, Arc::new(AppState { router })).await?;
            Ok(())
        }
        Command::Ask { question, local } => {
            let router = if local { router.local_only() } else { router };
            let envelope = router.route(vec![Message::user(question)]).await;
            println!("{}", serde_json::to_string_pretty(&envelope)?);
            Ok(())
        }
        Command::Chat => run_chat(router).await,
        Command::EnvCheck => {
            let check = EnvCheck::for_credential(router.credential());
            println!("{}", serde_json::to_string_pretty(&check)?);
            Ok(())
        }
    }
}

async fn run_chat(router: Router) -> Result<()> {
    let mut session = ChatSession::new(router, SilentOutput);
    if let Some(greeting) = session.history().first() {
        println!("{}\n", greeting.content);
    }

    let mut input = LineInput;
    let mut transcripts = input.transcribe();
    while let Some(line) = transcripts.recv().await {
        if let Some(envelope) = session.send(&line).await {
            println!("[{:?}] {}\n", envelope.source, envelope.text);
        }
    }
    Ok(())
}
