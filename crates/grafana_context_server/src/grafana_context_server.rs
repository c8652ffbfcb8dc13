//! Configuration and launch plumbing for the Grafana MCP context server.
//!
//! The MCP server itself is an external binary (`mcp-grafana`). This crate
//! decides how it gets launched:
//! - `settings`: the typed `settings` object the user writes for the server
//! - `environment`: environment lookups behind an injectable trait
//! - `resolver`: merging settings and environment into a `ServerConfig`
//! - `launch`: the command, args and env handed to the host
//! - `release`: which GitHub release asset to install for a platform

pub mod environment;
pub mod launch;
pub mod release;
pub mod resolver;
pub mod settings;

pub use environment::{Environment, ProcessEnvironment};
pub use launch::LaunchDescriptor;
pub use resolver::{ApiKey, ConfigField, ConfigurationError, ConfigurationState, ServerConfig};
pub use settings::GrafanaContextServerSettings;

/// The key under `context_servers` in the host settings.
pub const CONTEXT_SERVER_ID: &str = "mcp-grafana";

pub const REPO_NAME: &str = "grafana/mcp-grafana";
pub const BINARY_NAME: &str = "mcp-grafana";
