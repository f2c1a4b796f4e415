//! Gatherly Telegram Bot
//!
//! Main application entry point

use std::sync::Arc;
use teloxide::{prelude::*, types::Update};
use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use tracing::{info, warn, error};

use Gatherly::{
    config::Settings,
    utils::logging,
    database::{DatabaseService, connection::create_pool},
    services::ServiceFactory,
    state::{ScenarioManager, StateStorage},
    handlers::{commands, handle_callback_query, handle_message},
};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging
    logging::init_logging(&settings.logging)?;

    info!("Starting {}...", Gatherly::info());

    // Initialize database connection
    info!("Connecting to database...");
    let db_config = Gatherly::database::connection::DatabaseConfig {
        url: settings.database.url.clone(),
        max_connections: settings.database.max_connections,
        min_connections: settings.database.min_connections,
        acquire_timeout: std::time::Duration::from_secs(30),
        idle_timeout: Some(std::time::Duration::from_secs(600)),
        max_lifetime: Some(std::time::Duration::from_secs(1800)),
    };
    let db_pool = create_pool(&db_config).await?;

    // Run database migrations
    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&db_pool).await?;

    // Initialize database service
    let database_service = DatabaseService::new(db_pool);

    // Initialize state management
    let state_storage = StateStorage::new(settings.redis.clone()).await?;
    let scenario_manager = ScenarioManager::new();

    // Initialize bot
    let bot = Bot::new(&settings.bot.token);

    // Initialize services
    info!("Initializing services...");
    let services = ServiceFactory::new(bot.clone(), settings.clone(), database_service)?;

    let health = services.health_check().await;
    if !health.is_healthy() {
        warn!(issues = ?health.get_issues(), "Some services reported issues at startup");
    }

    // Wrap shared components for dependency injection
    let services_arc = Arc::new(services);
    let scenario_manager_arc = Arc::new(scenario_manager);
    let state_storage_arc = Arc::new(state_storage);

    info!("Setting up bot handlers...");
    let handler = create_handler();

    let mut dispatcher = Dispatcher::builder(bot.clone(), handler)
        .dependencies(dptree::deps![
            services_arc,
            scenario_manager_arc,
            state_storage_arc
        ])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd);
        })
        .enable_ctrlc_handler()
        .build();

    if let Some(webhook_url) = &settings.bot.webhook_url {
        info!("Webhook URL configured: {}", webhook_url);
        info!("Note: webhook mode is not wired up, falling back to polling");
    }

    info!("Gatherly bot is ready, starting polling...");
    dispatcher.dispatch().await;

    info!("Gatherly bot has been shut down.");

    Ok(())
}

/// Create the main update handler
fn create_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    dptree::entry()
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<commands::Command>()
                        .endpoint(handle_commands),
                )
                .branch(dptree::endpoint(handle_messages)),
        )
        .branch(Update::filter_callback_query().endpoint(handle_callbacks))
}

/// Handle bot commands
async fn handle_commands(
    bot: Bot,
    msg: Message,
    cmd: commands::Command,
    services: Arc<ServiceFactory>,
    scenario_manager: Arc<ScenarioManager>,
    state_storage: Arc<StateStorage>,
) -> HandlerResult {
    let services = (*services).clone();
    let scenario_manager = (*scenario_manager).clone();
    let state_storage = (*state_storage).clone();

    if let Err(e) = commands::handle_command(bot, msg, cmd, services, scenario_manager, state_storage).await {
        error!(error = %e, "Error handling command");
        return Err(e.into());
    }

    Ok(())
}

/// Handle regular messages
async fn handle_messages(
    bot: Bot,
    msg: Message,
    services: Arc<ServiceFactory>,
    scenario_manager: Arc<ScenarioManager>,
    state_storage: Arc<StateStorage>,
) -> HandlerResult {
    let services = (*services).clone();
    let scenario_manager = (*scenario_manager).clone();
    let state_storage = (*state_storage).clone();

    if let Err(e) = handle_message(bot, msg, services, scenario_manager, state_storage).await {
        error!(error = %e, "Error handling message");
        return Err(e.into());
    }

    Ok(())
}

/// Handle callback queries
async fn handle_callbacks(
    bot: Bot,
    query: teloxide::types::CallbackQuery,
    services: Arc<ServiceFactory>,
    scenario_manager: Arc<ScenarioManager>,
    state_storage: Arc<StateStorage>,
) -> HandlerResult {
    let services = (*services).clone();
    let scenario_manager = (*scenario_manager).clone();
    let state_storage = (*state_storage).clone();

    if let Err(e) = handle_callback_query(bot, query, services, scenario_manager, state_storage).await {
        error!(error = %e, "Error handling callback query");
        return Err(e.into());
    }

    Ok(())
}
