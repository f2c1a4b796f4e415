//! Simple integration test to verify basic test infrastructure
//!
//! This test file verifies that the basic test infrastructure components
//! work correctly without external services.

mod helpers;

use helpers::*;
use serial_test::serial;

#[tokio::test]
#[serial]
async fn test_simple_infrastructure_setup() {
    let ctx = SimpleTestContext::new().expect("Failed to create simple test context");

    assert!(ctx.temp_path().is_some());
    let temp_path = ctx.temp_path().unwrap();
    assert!(temp_path.exists());
}

#[tokio::test]
#[serial]
async fn test_telegram_mock_basic() {
    let mock_server = TelegramMockServer::new().await;

    let token = test_bot_token();
    let api_url = mock_server.get_api_url(&token);
    assert!(api_url.contains(&token));
    assert!(!api_url.is_empty());
}

#[tokio::test]
#[serial]
async fn test_mock_send_message_endpoint() {
    let mock_server = TelegramMockServer::new().await;
    mock_server.mock_send_message(MockResponseConfig::default()).await;

    let client = reqwest::Client::new();
    let url = format!("{}/SendMessage", mock_server.get_api_url(&test_bot_token()));
    let response = client
        .post(&url)
        .json(&serde_json::json!({"chat_id": test_chat_id(), "text": "hi"}))
        .send()
        .await
        .expect("mock request");

    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.expect("json body");
    assert_eq!(body["ok"], true);
    assert_eq!(mock_server.received_request_count().await, 1);
}

#[tokio::test]
#[serial]
async fn test_mock_error_response() {
    let mock_server = TelegramMockServer::new().await;
    mock_server
        .mock_send_message(MockResponseConfig {
            success: false,
            delay_ms: None,
            custom_response: None,
        })
        .await;

    let client = reqwest::Client::new();
    let url = format!("{}/SendMessage", mock_server.get_api_url(&test_bot_token()));
    let response = client
        .post(&url)
        .json(&serde_json::json!({"chat_id": test_chat_id(), "text": ""}))
        .send()
        .await
        .expect("mock request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
#[serial]
async fn test_test_data_builders() {
    let msg = create_simple_test_message(test_user_id(), test_chat_id(), "/events");
    assert_eq!(msg.text(), Some("/events"));
    assert!(msg.from.is_some());
    assert!(msg.chat.id.is_user());

    let query = create_simple_test_callback_query(test_user_id(), test_chat_id(), "event:view:7");
    assert_eq!(query.data.as_deref(), Some("event:view:7"));

    let group = create_test_group_chat(-1001234567890, "Dance Crew");
    assert!(!group.id.is_user());
}
