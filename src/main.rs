use clap::{Parser, Subcommand};
use std::sync::Arc;

use carik_commands::application::errors::BotError;
use carik_commands::application::messaging::Dispatcher;
use carik_commands::application::services::CommandService;
use carik_commands::domain::entities::Value;
use carik_commands::domain::traits::{Adapter, Storage, PREFIX_KEY};
use carik_commands::infrastructure::adapters::{ConsoleAdapter, ConsoleSender};
use carik_commands::infrastructure::config::Config;
use carik_commands::infrastructure::storage::{MemoryStore, PersistedStore};

#[derive(Parser)]
#[command(name = "carik-commands")]
#[command(about = "Multi-tenant chat command dispatcher", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Default command prefix (overrides config)
    #[arg(short, long)]
    prefix: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the dispatcher on the console adapter
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            if let Err(e) = run(&cli.config, cli.prefix).await {
                tracing::error!("Dispatcher stopped: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Version => {
            println!("carik-commands v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => init_config(&cli.config),
    }
}

fn load_config(path: &str) -> Config {
    let mut config = if std::path::Path::new(path).exists() {
        Config::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::default()
        })
    } else {
        Config::default()
    };
    config.apply_env();
    config
}

fn open_store(config: &Config) -> Result<Arc<dyn Storage>, BotError> {
    let store: Arc<dyn Storage> = match &config.storage.path {
        Some(path) => {
            tracing::info!("Using persisted store at {}", path.display());
            Arc::new(PersistedStore::open(path)?)
        }
        None => {
            tracing::info!("Using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };
    Ok(store)
}

async fn run(config_path: &str, prefix_override: Option<String>) -> Result<(), BotError> {
    let mut config = load_config(config_path);
    if let Some(prefix) = prefix_override {
        config.bot.default_prefix = prefix;
    }
    tracing::info!("Starting {}", config.bot.name);

    let storage = open_store(&config)?;
    if let Err(e) = storage.set_default_guild_value(
        PREFIX_KEY,
        Value::from(config.bot.default_prefix.as_str()),
    ) {
        tracing::warn!("Failed to persist default prefix: {}", e);
    }

    let mut commands = CommandService::new().with_rate_limits(config.rate_limits.clone());
    commands.register_defaults()?;
    commands.add_sender(Arc::new(ConsoleSender::new(config.console.service_id.clone())));
    let registry = commands.into_registry();
    tracing::info!("Registered {} commands", registry.len());

    let dispatcher = Arc::new(Dispatcher::new(Arc::new(registry), storage));
    let console = ConsoleAdapter::new(dispatcher, config.console.clone());
    tracing::info!(
        "Adapter '{}' ready, default prefix '{}'",
        console.info().name,
        config.bot.default_prefix
    );
    console.start().await
}

fn init_config(path: &str) {
    if std::path::Path::new(path).exists() {
        eprintln!("{} already exists", path);
        return;
    }
    match Config::default().save(path) {
        Ok(()) => println!("Wrote default config to {}", path),
        Err(e) => eprintln!("Failed to write config: {}", e),
    }
}
