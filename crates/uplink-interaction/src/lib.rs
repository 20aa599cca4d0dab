//! HTTP transport and configuration for the uplink session core.
//!
//! This crate connects [`uplink_core`] to a running agent coordination
//! service: [`BackendConfig`] locates the endpoint and
//! [`HttpChatBackend`] speaks its JSON contract.

pub mod config;
pub mod http_backend;

pub use config::{BackendConfig, ConfigError};
pub use http_backend::HttpChatBackend;
