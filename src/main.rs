use dotenvy::dotenv;
use figurine_bot::bot::handlers::{self, Command};
use figurine_bot::config::Settings;
use figurine_bot::llm::{GenerationClient, ImageGenerator};
use figurine_bot::logging::{init_logging, RedactionPatterns};
use figurine_bot::storage::KeyStore;
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenv().ok();

    // Initialize redaction patterns early (before logging)
    let patterns = Arc::new(RedactionPatterns::new().map_err(|e| {
        eprintln!("Failed to compile regex patterns: {e}");
        e
    })?);
    init_logging(patterns);

    info!("Starting figurine bot...");

    let settings = init_settings();

    let keys = Arc::new(KeyStore::new(settings.keys_file()));
    info!("Key store at {}", keys.path().display());

    let generator: Arc<dyn ImageGenerator> = Arc::new(GenerationClient::new(&settings));
    info!(model = %settings.figurine_model, "Generation client initialized.");

    let bot = Bot::new(settings.telegram_token.clone());
    let handler = setup_handler();

    info!("Bot is running...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![keys, generator, settings])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

fn init_settings() -> Arc<Settings> {
    match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            if s.admin_users().is_empty() {
                warn!("No admin users configured; key management commands are disabled.");
            }
            Arc::new(s)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(
            dptree::filter(|msg: Message| msg.text().is_some() || msg.caption().is_some())
                .endpoint(handle_text),
        )
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    keys: Arc<KeyStore>,
    settings: Arc<Settings>,
) -> Result<(), teloxide::RequestError> {
    let res = match cmd {
        Command::Start => handlers::start(bot, msg).await,
        Command::AddKeys(args) => handlers::add_keys(bot, msg, keys, settings, args).await,
        Command::Keys => handlers::list_keys(bot, msg, keys, settings).await,
    };
    if let Err(e) = res {
        error!("Command error: {}", e);
    }
    respond(())
}

async fn handle_text(
    bot: Bot,
    msg: Message,
    generator: Arc<dyn ImageGenerator>,
    keys: Arc<KeyStore>,
    settings: Arc<Settings>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::handle_trigger(bot, msg, generator, keys, settings).await {
        error!("Trigger handler error: {}", e);
    }
    respond(())
}
