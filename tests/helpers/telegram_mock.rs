//! Mock Telegram API Server for testing
//!
//! This module provides a mock HTTP server that simulates the Telegram Bot API
//! for testing purposes. It uses wiremock to create configurable mock responses.

use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path_regex},
    Mock, MockServer, ResponseTemplate,
};

/// Mock Telegram API server for testing
pub struct TelegramMockServer {
    pub server: MockServer,
    pub base_url: String,
}

/// Configuration for mock responses
#[derive(Debug, Clone)]
pub struct MockResponseConfig {
    pub success: bool,
    pub delay_ms: Option<u64>,
    pub custom_response: Option<Value>,
}

impl Default for MockResponseConfig {
    fn default() -> Self {
        Self {
            success: true,
            delay_ms: None,
            custom_response: None,
        }
    }
}

impl TelegramMockServer {
    /// Create a new mock Telegram API server
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        let base_url = format!("{}/bot{{token}}", server.uri());

        Self { server, base_url }
    }

    /// Get the mock server URL for a given bot token
    pub fn get_api_url(&self, token: &str) -> String {
        self.base_url.replace("{token}", token)
    }

    /// Setup mock for the sendMessage endpoint
    pub async fn mock_send_message(&self, config: MockResponseConfig) {
        let response_body = config.custom_response.clone().unwrap_or_else(|| {
            if config.success {
                json!({
                    "ok": true,
                    "result": {
                        "message_id": 123,
                        "from": {
                            "id": 12345,
                            "is_bot": true,
                            "first_name": "GatherlyBot",
                            "username": "gatherly_bot"
                        },
                        "chat": {
                            "id": 987654321_i64,
                            "first_name": "Test",
                            "type": "private"
                        },
                        "date": 1640995200,
                        "text": "Test message"
                    }
                })
            } else {
                json!({
                    "ok": false,
                    "error_code": 400,
                    "description": "Bad Request: message text is empty"
                })
            }
        });

        let mut response = ResponseTemplate::new(if config.success { 200 } else { 400 })
            .set_body_json(response_body);

        if let Some(delay) = config.delay_ms {
            response = response.set_delay(std::time::Duration::from_millis(delay));
        }

        Mock::given(method("POST"))
            .and(path_regex(r"^/bot.*/[Ss]endMessage$"))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    /// Setup mock for the answerCallbackQuery endpoint
    pub async fn mock_answer_callback_query(&self, config: MockResponseConfig) {
        let response_body = config.custom_response.clone().unwrap_or_else(|| {
            if config.success {
                json!({ "ok": true, "result": true })
            } else {
                json!({
                    "ok": false,
                    "error_code": 400,
                    "description": "Bad Request: query is too old"
                })
            }
        });

        let response = ResponseTemplate::new(if config.success { 200 } else { 400 })
            .set_body_json(response_body);

        Mock::given(method("POST"))
            .and(path_regex(r"^/bot.*/[Aa]nswerCallbackQuery$"))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    /// Number of requests the mock server has received
    pub async fn received_request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }
}
