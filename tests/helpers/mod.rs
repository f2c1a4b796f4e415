//! Test helpers module
//!
//! This module provides utilities and helpers for testing the Gatherly
//! application: a mock Telegram API server, test data builders, and a
//! simple test context.

pub mod telegram_mock;
pub mod simple_test;
pub mod test_data;

pub use telegram_mock::*;
pub use simple_test::*;
pub use test_data::*;
