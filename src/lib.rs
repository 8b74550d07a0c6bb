// Library root - exposes modules for integration tests

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod mailer;
pub mod models;
pub mod reports;
