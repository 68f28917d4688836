pub mod app;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod services;
pub mod shutdown;
pub mod sso;
pub mod telemetry;
