//! Command-line interface parsing and handling
//!
//! This module parses command-line arguments and routes into the terminal
//! or web adapter.

use std::error::Error;

use clap::{Parser, Subcommand};
use tracing::warn;

use crate::api::ChatClient;
use crate::core::assistant::Assistant;
use crate::core::config::Config;
use crate::core::store::ChatMode;
use crate::logging;
use crate::server;
use crate::ui::ChatTerminal;

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "A terminal and web chat client for OpenAI-compatible APIs")]
#[command(
    long_about = "Parley is a chat client for OpenAI-compatible APIs that keeps \
conversation context across turns. History is tracked in one of two switchable \
memory modes: a raw role-tagged transcript sent wholesale as context, or a \
templated buffer rendered into a single prompt per turn.\n\n\
Environment Variables:\n\
  OPENAI_API_KEY    API key (or the variable named by api_key_env in the config)\n\
  OPENAI_BASE_URL   Endpoint base URL when not set in the config\n\n\
Commands inside the chat:\n\
  /help /quit /clear /mode /save /load <path> /status"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use for chat
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Memory mode to start in ("raw" or "templated")
    #[arg(long, global = true, value_name = "MODE")]
    pub mode: Option<ChatMode>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the interactive terminal chat (default)
    Chat,
    /// Serve the chat over HTTP
    Serve {
        /// Address to bind, e.g. 127.0.0.1:5000
        #[arg(long, value_name = "ADDR")]
        addr: Option<String>,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    logging::init();

    let args = Args::parse();
    let config = Config::load()?;

    let model = args.model.unwrap_or_else(|| config.model());
    let mode = args.mode.unwrap_or_else(|| config.default_mode());
    let api_key = config.api_key();
    if api_key.is_none() {
        warn!("no API key found in the environment; requests will be sent unauthenticated");
    }

    let client = ChatClient::new(&config.base_url(), api_key, model.clone());
    let assistant = Assistant::new(Box::new(client), model, mode, config.history_dir());

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            ChatTerminal::new(assistant, config.typewriter_delay())
                .run()
                .await
        }
        Commands::Serve { addr } => {
            let addr = addr.unwrap_or_else(|| config.listen_addr());
            server::run(assistant, &addr).await
        }
    }
}
