use std::fmt;

use crate::resolver::{ConfigField, ServerConfig};

/// How the host should spawn the server process.
#[derive(Clone, PartialEq, Eq)]
pub struct LaunchDescriptor {
    pub command: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl LaunchDescriptor {
    /// The server talks MCP over stdio by default, so no arguments are passed.
    pub fn new(binary_path: impl Into<String>, config: &ServerConfig) -> Self {
        Self {
            command: binary_path.into(),
            args: Vec::new(),
            env: vec![
                (
                    ConfigField::GrafanaUrl.env_var().to_string(),
                    config.grafana_url().to_string(),
                ),
                (
                    ConfigField::GrafanaApiKey.env_var().to_string(),
                    config.grafana_api_key().expose().to_string(),
                ),
            ],
        }
    }
}

impl fmt::Debug for LaunchDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let env = self
            .env
            .iter()
            .map(|(key, value)| {
                if key == ConfigField::GrafanaApiKey.env_var() {
                    (key.as_str(), "<redacted>")
                } else {
                    (key.as_str(), value.as_str())
                }
            })
            .collect::<Vec<_>>();
        f.debug_struct("LaunchDescriptor")
            .field("command", &self.command)
            .field("args", &self.args)
            .field("env", &env)
            .finish()
    }
}
