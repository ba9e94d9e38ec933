//! HTTP transport, dispatcher and business methods of the Scorix
//! scoring service.

pub mod auth;
pub mod config;
pub mod dispatch;
pub mod handlers;
pub mod observability;
pub mod scoring;
pub mod server;

pub use config::AppConfig;
pub use server::{AppState, ScorixServer, ServerBuilder, build_app};
