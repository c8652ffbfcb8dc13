use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::resolver::ConfigurationError;

/// Default settings shown by the host when the user configures the server.
pub const DEFAULT_SETTINGS: &str = include_str!("../configuration/default_settings.jsonc");

/// Markdown shown by the host next to the settings editor.
pub const INSTALLATION_INSTRUCTIONS: &str =
    include_str!("../configuration/installation_instructions.md");

/// The `settings` object of the `mcp-grafana` context server.
#[derive(Deserialize, Serialize, Default, Clone, PartialEq, Eq, JsonSchema)]
#[serde(default)]
pub struct GrafanaContextServerSettings {
    /// The URL of the Grafana instance.
    ///
    /// Falls back to the `GRAFANA_URL` environment variable when unset.
    pub grafana_url: Option<String>,

    /// A Grafana service account token.
    ///
    /// Falls back to the `GRAFANA_API_KEY` environment variable when unset.
    pub grafana_api_key: Option<String>,
}

impl GrafanaContextServerSettings {
    /// Deserializes the `settings` value the host hands to the extension.
    /// A missing or `null` value is the same as an empty object.
    pub fn from_value(value: Option<Value>) -> Result<Self, ConfigurationError> {
        match value {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(value) => serde_json::from_value(value)
                .map_err(|error| ConfigurationError::InvalidSettings(error.to_string())),
        }
    }
}

impl std::fmt::Debug for GrafanaContextServerSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrafanaContextServerSettings")
            .field("grafana_url", &self.grafana_url)
            .field(
                "grafana_api_key",
                &self.grafana_api_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// The JSON schema of [`GrafanaContextServerSettings`], serialized for the host.
pub fn settings_schema() -> serde_json::Result<String> {
    serde_json::to_string(&schemars::schema_for!(GrafanaContextServerSettings))
}
