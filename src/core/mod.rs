//! Core business logic, independent of HTTP and Telegram.
//!
//! Functions take a `SeaORM` connection (or plain data) and return
//! [`crate::errors::Result`]. Every database query is scoped to a user id.

/// Signup and login
pub mod account;
/// Spending analysis and rule-based advice
pub mod analysis;
/// Spending categories
pub mod category;
/// Advisor chat history
pub mod chat_history;
/// Health score ladder and detailed assessment
pub mod health;
/// Profile reads and updates
pub mod profile;
/// Summaries and text formatting
pub mod report;
/// Telegram link codes
pub mod telegram_link;
/// Dashboard health tips
pub mod tips;
/// Access tokens
pub mod token;
/// Transaction CRUD
pub mod transaction;
