// ABOUTME: Library root for slipway - exposes the pipeline engine modules.
// ABOUTME: The CLI binary is in main.rs.

pub mod config;
pub mod error;
pub mod notify;
pub mod output;
pub mod pipeline;
pub mod platform;
pub mod retry;
pub mod secrets;
pub mod types;
