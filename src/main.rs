mod cli;
mod config;
mod inference;
mod models;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use eyre::Result;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use crate::cli::chat::ChatContext;
use crate::cli::chat::display;
use crate::config::{ChatConfig, ConfigOverrides, ProviderKind};
use crate::models::ModelSelector;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    chat: ChatArgs,

    /// Path to a JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args, Clone, Default)]
struct ChatArgs {
    /// Input to send to the chat
    #[arg(short, long)]
    input: Option<String>,

    /// Model id or name to start with
    #[arg(short, long)]
    model: Option<String>,

    /// Where replies come from
    #[arg(long, value_enum)]
    provider: Option<ProviderKind>,

    /// Base URL of the inference API
    #[arg(long)]
    api_base: Option<String>,
}

impl ChatArgs {
    /// Fill unset values from `fallback`, which holds the flags given before
    /// the subcommand.
    fn or(self, fallback: ChatArgs) -> ChatArgs {
        ChatArgs {
            input: self.input.or(fallback.input),
            model: self.model.or(fallback.model),
            provider: self.provider.or(fallback.provider),
            api_base: self.api_base.or(fallback.api_base),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start a chat session
    Chat(ChatArgs),
    /// List the models the configured provider offers
    Models {
        /// Provider whose catalog to list
        #[arg(long, value_enum)]
        provider: Option<ProviderKind>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables from .env file
    dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Some(Commands::Models { provider }) => {
            let overrides = ConfigOverrides {
                provider: provider.or(cli.chat.provider),
                model: cli.chat.model,
                api_base: cli.chat.api_base,
            };
            let config = ChatConfig::load(cli.config.as_deref(), overrides)?;
            let selector = ModelSelector::for_provider(config.provider, config.model.as_deref())?;
            display::render_models(&mut io::stdout(), selector.models(), selector.selected())?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Chat(args)) => run_chat(cli.config, args.or(cli.chat)).await,
        // Default to chat if no subcommand is provided
        None => run_chat(cli.config, cli.chat).await,
    }
}

async fn run_chat(config_path: Option<PathBuf>, args: ChatArgs) -> Result<ExitCode> {
    let overrides = ConfigOverrides {
        provider: args.provider,
        model: args.model,
        api_base: args.api_base,
    };
    let config = ChatConfig::load(config_path.as_deref(), overrides)?;

    info!("Starting FinSLM chat with the {:?} provider", config.provider);
    if config.provider == ProviderKind::Live && !config.has_token() {
        warn!(
            "No Hugging Face API token found; set HF_API_TOKEN or every request will fail"
        );
    }

    let model_selector = ModelSelector::for_provider(config.provider, config.model.as_deref())?;
    let provider = inference::build_provider(&config)?;

    let interactive = args.input.is_none();
    let mut chat_context = ChatContext::new(
        Box::new(io::stdout()),
        args.input,
        interactive,
        model_selector,
        provider,
    );
    chat_context.run().await
}
