//! Command parsing and callback vocabulary tests
//!
//! Verifies the bot's command surface parses the way the menus advertise it,
//! and that the callback-data conventions used by the keyboards stay within
//! Telegram's limits.

mod fixtures;
mod helpers;

use teloxide::utils::command::BotCommands;
use Gatherly::handlers::Command;
use fixtures::{TestEvent, UserFixtures};
use helpers::{create_join_keyboard, create_leave_confirm_keyboard};

#[test]
fn test_all_commands_parse() {
    let bot_name = "gatherly_bot";

    assert!(Command::parse("/start", bot_name).is_ok());
    assert!(Command::parse("/help", bot_name).is_ok());
    assert!(Command::parse("/events", bot_name).is_ok());
    assert!(Command::parse("/myevents", bot_name).is_ok());
    assert!(Command::parse("/newevent", bot_name).is_ok());
    assert!(Command::parse("/facilities", bot_name).is_ok());
    assert!(Command::parse("/newfacility", bot_name).is_ok());
    assert!(Command::parse("/profile", bot_name).is_ok());
    assert!(Command::parse("/admin", bot_name).is_ok());
    assert!(Command::parse("/promote 123 organizer", bot_name).is_ok());
    assert!(Command::parse("/stats", bot_name).is_ok());
    assert!(Command::parse("/cancel", bot_name).is_ok());
}

#[test]
fn test_unknown_command_rejected() {
    // /skip is scenario input, not a command
    assert!(Command::parse("/skip", "gatherly_bot").is_err());
    assert!(Command::parse("just text", "gatherly_bot").is_err());
}

#[test]
fn test_descriptions_cover_every_command() {
    let descriptions = Command::descriptions().to_string();
    for command in [
        "/start", "/help", "/events", "/myevents", "/newevent",
        "/facilities", "/newfacility", "/profile", "/admin", "/promote", "/stats", "/cancel",
    ] {
        assert!(descriptions.contains(command), "missing description for {}", command);
    }
}

#[test]
fn test_callback_data_stays_within_telegram_limit() {
    // Telegram rejects callback data over 64 bytes
    let keyboards = [create_join_keyboard(i64::MAX), create_leave_confirm_keyboard(i64::MAX)];

    for keyboard in &keyboards {
        for row in &keyboard.inline_keyboard {
            for button in row {
                if let teloxide::types::InlineKeyboardButtonKind::CallbackData(data) = &button.kind {
                    assert!(data.len() <= 64, "callback data too long: {}", data);
                }
            }
        }
    }
}

#[test]
fn test_fixture_defaults_are_coherent() {
    let cast = UserFixtures::standard();
    assert!(cast.organizer.is_organizer);
    assert!(cast.admin.is_admin);
    assert!(!cast.entrant.is_admin && !cast.entrant.is_organizer);

    let event = TestEvent::new("Summer Dance").with_capacity(5).with_price(1250);
    assert!(event.deadline < event.start_date);
    assert_eq!(event.capacity, 5);
    assert_eq!(event.ticket_price, 1250);
}
