//! Test data helpers for creating test objects
//!
//! This module provides helper functions for creating test Telegram messages,
//! callback queries, users, and keyboards used by the handler tests.

use teloxide::types::{
    Message, User, Chat, ChatKind, MessageKind, MessageCommon, CallbackQuery,
    InlineKeyboardButton, InlineKeyboardMarkup, UserId, ChatId, MessageId,
    ChatPrivate, ChatPublic, PublicChatKind, PublicChatSupergroup,
    MediaKind, MediaText
};
use chrono::Utc;

/// Helper function to create a test Telegram user
pub fn create_test_user(
    user_id: i64,
    username: Option<&str>,
    first_name: &str,
    last_name: Option<&str>,
    language_code: Option<&str>,
) -> User {
    User {
        id: UserId(user_id as u64),
        is_bot: false,
        first_name: first_name.to_string(),
        last_name: last_name.map(|s| s.to_string()),
        username: username.map(|s| s.to_string()),
        language_code: language_code.map(|s| s.to_string()),
        is_premium: false,
        added_to_attachment_menu: false,
    }
}

/// Helper function to create a test private chat
pub fn create_test_private_chat(
    chat_id: i64,
    username: Option<&str>,
    first_name: Option<&str>,
    last_name: Option<&str>,
) -> Chat {
    Chat {
        id: ChatId(chat_id),
        kind: ChatKind::Private(ChatPrivate {
            username: username.map(|s| s.to_string()),
            first_name: first_name.map(|s| s.to_string()),
            last_name: last_name.map(|s| s.to_string()),
        }),
    }
}

/// Helper function to create a test group chat
pub fn create_test_group_chat(chat_id: i64, title: &str) -> Chat {
    Chat {
        id: ChatId(chat_id),
        kind: ChatKind::Public(ChatPublic {
            title: Some(title.to_string()),
            kind: PublicChatKind::Supergroup(PublicChatSupergroup {
                username: None,
                is_forum: false,
            }),
        }),
    }
}

/// Helper function to create a test Telegram message
pub fn create_test_message(
    user_id: i64,
    chat_id: i64,
    text: &str,
    username: Option<&str>,
    first_name: &str,
    last_name: Option<&str>,
) -> Message {
    let user = create_test_user(user_id, username, first_name, last_name, Some("en"));

    let chat = if chat_id > 0 {
        create_test_private_chat(chat_id, username, Some(first_name), last_name)
    } else {
        create_test_group_chat(chat_id, "Test Group")
    };

    Message {
        id: MessageId(1),
        thread_id: None,
        from: Some(user),
        sender_chat: None,
        sender_business_bot: None,
        date: Utc::now(),
        chat,
        is_topic_message: false,
        via_bot: None,
        kind: MessageKind::Common(MessageCommon {
            author_signature: None,
            forward_origin: None,
            external_reply: None,
            quote: None,
            reply_to_story: None,
            edit_date: None,
            media_kind: MediaKind::Text(MediaText {
                text: text.to_string(),
                entities: vec![],
                link_preview_options: None,
            }),
            reply_markup: None,
            effect_id: None,
            reply_to_message: None,
            sender_boost_count: None,
            is_automatic_forward: false,
            has_protected_content: false,
            is_from_offline: false,
            business_connection_id: None,
        }),
    }
}

/// Helper function to create a simple test message with default user data
pub fn create_simple_test_message(user_id: i64, chat_id: i64, text: &str) -> Message {
    create_test_message(
        user_id,
        chat_id,
        text,
        Some("testuser"),
        "TestUser",
        Some("LastName"),
    )
}

/// Helper function to create a test callback query
pub fn create_test_callback_query(
    user_id: i64,
    chat_id: i64,
    data: &str,
    username: Option<&str>,
    first_name: &str,
    last_name: Option<&str>,
) -> CallbackQuery {
    let user = create_test_user(user_id, username, first_name, last_name, Some("en"));
    let message = create_test_message(user_id, chat_id, "Test message", username, first_name, last_name);

    CallbackQuery {
        id: format!("callback_{}", user_id),
        from: user,
        message: Some(teloxide::types::MaybeInaccessibleMessage::Regular(Box::new(message))),
        inline_message_id: None,
        data: Some(data.to_string()),
        game_short_name: None,
        chat_instance: "test_chat_instance".to_string(),
    }
}

/// Helper function to create a simple test callback query with default user data
pub fn create_simple_test_callback_query(user_id: i64, chat_id: i64, data: &str) -> CallbackQuery {
    create_test_callback_query(
        user_id,
        chat_id,
        data,
        Some("testuser"),
        "TestUser",
        Some("LastName"),
    )
}

/// The join/leave keyboard shown on an event landing page
pub fn create_join_keyboard(event_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback("✅ Join waiting list", format!("event:join:{}", event_id)),
        ],
        vec![
            InlineKeyboardButton::callback("« Back to events", "event:back"),
        ],
    ])
}

/// The leave confirmation keyboard
pub fn create_leave_confirm_keyboard(event_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback("Yes, leave", format!("event:leave_confirm:{}", event_id)),
            InlineKeyboardButton::callback("No, stay", format!("event:view:{}", event_id)),
        ],
    ])
}
