//! Command handlers module
//!
//! This module contains handlers for all bot commands like /start, /events, etc.

pub mod start;
pub mod help;
pub mod events;
pub mod facilities;
pub mod admin;

use teloxide::{Bot, types::Message, utils::command::BotCommands};
use crate::utils::errors::Result;
use crate::services::ServiceFactory;
use crate::state::{ScenarioManager, StateStorage};

/// All available bot commands
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Gatherly commands:")]
pub enum Command {
    #[command(description = "Start the bot and set up your profile")]
    Start,
    #[command(description = "Show help information")]
    Help,
    #[command(description = "Browse available events")]
    Events,
    #[command(description = "Events you created or entered")]
    MyEvents,
    #[command(description = "Create a new event (organizers)")]
    NewEvent,
    #[command(description = "List facilities")]
    Facilities,
    #[command(description = "Register a new facility (organizers)")]
    NewFacility,
    #[command(description = "Show your profile")]
    Profile,
    #[command(description = "Admin panel (admins only)")]
    Admin,
    #[command(description = "Grant a role: /promote <telegram_id> <organizer|admin>")]
    Promote(String),
    #[command(description = "Show bot statistics (admins only)")]
    Stats,
    #[command(description = "Cancel the current flow")]
    Cancel,
}

/// Main command dispatcher
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    services: ServiceFactory,
    scenario_manager: ScenarioManager,
    state_storage: StateStorage,
) -> Result<()> {
    match cmd {
        Command::Start => start::handle_start(bot, msg, services, scenario_manager, state_storage).await,
        Command::Help => help::handle_help(bot, msg).await,
        Command::Events => events::handle_events_list(bot, msg, services).await,
        Command::MyEvents => events::handle_my_events(bot, msg, services).await,
        Command::NewEvent => events::handle_new_event(bot, msg, services, scenario_manager, state_storage).await,
        Command::Facilities => facilities::handle_facilities_list(bot, msg, services).await,
        Command::NewFacility => facilities::handle_new_facility(bot, msg, services, scenario_manager, state_storage).await,
        Command::Profile => start::handle_profile(bot, msg, services).await,
        Command::Admin => admin::handle_admin_panel(bot, msg, services).await,
        Command::Promote(args) => admin::handle_promote(bot, msg, args, services).await,
        Command::Stats => admin::handle_stats(bot, msg, services).await,
        Command::Cancel => start::handle_cancel(bot, msg, scenario_manager, state_storage).await,
    }
}
