//! `docchat-server` exposes the `docchat-rag` pipeline over HTTP.
//! Each conversation thread gets its own vector collection.

pub mod commands;
pub mod config;
pub mod error;
pub mod server;
pub mod telemetry;
pub mod wire;

pub use config::ServerConfig;
pub use server::{AppState, app_router, run_server};
