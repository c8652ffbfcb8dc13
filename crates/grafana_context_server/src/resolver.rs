use std::fmt;

use thiserror::Error;

use crate::{environment::Environment, settings::GrafanaContextServerSettings};

/// A setting the server cannot be launched without.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigField {
    GrafanaUrl,
    GrafanaApiKey,
}

impl ConfigField {
    pub const ALL: [ConfigField; 2] = [ConfigField::GrafanaUrl, ConfigField::GrafanaApiKey];

    /// The key of this field in the context server's `settings` object.
    pub fn setting_name(self) -> &'static str {
        match self {
            ConfigField::GrafanaUrl => "grafana_url",
            ConfigField::GrafanaApiKey => "grafana_api_key",
        }
    }

    pub fn env_var(self) -> &'static str {
        match self {
            ConfigField::GrafanaUrl => "GRAFANA_URL",
            ConfigField::GrafanaApiKey => "GRAFANA_API_KEY",
        }
    }

    fn setting_value(self, settings: &GrafanaContextServerSettings) -> Option<&str> {
        match self {
            ConfigField::GrafanaUrl => settings.grafana_url.as_deref(),
            ConfigField::GrafanaApiKey => settings.grafana_api_key.as_deref(),
        }
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.setting_name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("missing Grafana configuration: {}", describe_missing(.missing_fields))]
    MissingConfiguration { missing_fields: Vec<ConfigField> },
    #[error("invalid Grafana settings: {0}")]
    InvalidSettings(String),
}

fn describe_missing(fields: &[ConfigField]) -> String {
    fields
        .iter()
        .map(|field| {
            format!(
                "set `{}` in the context server settings or the {} environment variable",
                field.setting_name(),
                field.env_var()
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// A Grafana service account token. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Everything the external server needs to reach Grafana.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    grafana_url: String,
    grafana_api_key: ApiKey,
}

impl ServerConfig {
    /// Merges explicit settings with the environment.
    ///
    /// Each field is taken from the settings when it is non-empty there, then
    /// from its environment variable. Every field that resolves from neither
    /// is reported in the error.
    pub fn resolve(
        settings: &GrafanaContextServerSettings,
        env: &impl Environment,
    ) -> Result<Self, ConfigurationError> {
        let mut grafana_url = None;
        let mut grafana_api_key = None;
        let mut missing_fields = Vec::new();

        for field in ConfigField::ALL {
            match resolve_field(field, settings, env) {
                Some(value) => match field {
                    ConfigField::GrafanaUrl => grafana_url = Some(value),
                    ConfigField::GrafanaApiKey => grafana_api_key = Some(value),
                },
                None => missing_fields.push(field),
            }
        }

        match (grafana_url, grafana_api_key) {
            (Some(grafana_url), Some(grafana_api_key)) => {
                log::info!("resolved Grafana configuration for {grafana_url}");
                Ok(Self {
                    grafana_url,
                    grafana_api_key: ApiKey(grafana_api_key),
                })
            }
            _ => {
                let error = ConfigurationError::MissingConfiguration { missing_fields };
                log::warn!("{error}");
                Err(error)
            }
        }
    }

    pub fn grafana_url(&self) -> &str {
        &self.grafana_url
    }

    pub fn grafana_api_key(&self) -> &ApiKey {
        &self.grafana_api_key
    }
}

fn resolve_field(
    field: ConfigField,
    settings: &GrafanaContextServerSettings,
    env: &impl Environment,
) -> Option<String> {
    if let Some(value) = non_empty(field.setting_value(settings)) {
        log::debug!("using `{field}` from settings");
        return Some(value.to_string());
    }
    let value = env.var(field.env_var());
    let value = non_empty(value.as_deref())?;
    log::debug!("using `{field}` from {}", field.env_var());
    Some(value.to_string())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

/// One activation of the context server.
///
/// Resolution happens once; both outcomes are terminal and reconfiguring
/// requires a fresh activation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigurationState {
    #[default]
    Unconfigured,
    Configured(ServerConfig),
    Failed(ConfigurationError),
}

impl ConfigurationState {
    /// Leaves `Unconfigured` by resolving against the given inputs and
    /// returns the outcome. Once configured or failed, the inputs are ignored.
    pub fn resolve(
        &mut self,
        settings: &GrafanaContextServerSettings,
        env: &impl Environment,
    ) -> Result<&ServerConfig, &ConfigurationError> {
        if let ConfigurationState::Unconfigured = self {
            *self = match ServerConfig::resolve(settings, env) {
                Ok(config) => ConfigurationState::Configured(config),
                Err(error) => ConfigurationState::Failed(error),
            };
        }
        match self {
            ConfigurationState::Configured(config) => Ok(config),
            ConfigurationState::Failed(error) => Err(error),
            ConfigurationState::Unconfigured => {
                unreachable!("resolution always leaves Unconfigured")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    fn settings(url: Option<&str>, key: Option<&str>) -> GrafanaContextServerSettings {
        GrafanaContextServerSettings {
            grafana_url: url.map(Into::into),
            grafana_api_key: key.map(Into::into),
        }
    }

    #[test]
    fn test_settings_take_precedence_over_env() {
        let config = ServerConfig::resolve(
            &settings(Some("https://g.example.com"), Some("tok123")),
            &env(&[
                ("GRAFANA_URL", "https://other.example.com"),
                ("GRAFANA_API_KEY", "other"),
            ]),
        )
        .unwrap();
        assert_eq!(config.grafana_url(), "https://g.example.com");
        assert_eq!(config.grafana_api_key().expose(), "tok123");
    }

    #[test]
    fn test_empty_settings_fall_back_to_env() {
        let config = ServerConfig::resolve(
            &settings(Some(""), Some("")),
            &env(&[("GRAFANA_URL", "https://g2.example.com"), ("GRAFANA_API_KEY", "abc")]),
        )
        .unwrap();
        assert_eq!(config.grafana_url(), "https://g2.example.com");
        assert_eq!(config.grafana_api_key().expose(), "abc");
    }

    #[test]
    fn test_non_empty_values_are_kept_verbatim() {
        let config = ServerConfig::resolve(
            &settings(Some(" https://g.example.com "), Some("   ")),
            &env(&[("GRAFANA_URL", "https://env.example.com"), ("GRAFANA_API_KEY", "envkey")]),
        )
        .unwrap();
        assert_eq!(config.grafana_url(), " https://g.example.com ");
        assert_eq!(config.grafana_api_key().expose(), "   ");

        let config = ServerConfig::resolve(
            &settings(None, None),
            &env(&[("GRAFANA_URL", "https://g2.example.com\n"), ("GRAFANA_API_KEY", " abc ")]),
        )
        .unwrap();
        assert_eq!(config.grafana_url(), "https://g2.example.com\n");
        assert_eq!(config.grafana_api_key().expose(), " abc ");
    }

    #[test]
    fn test_missing_single_field() {
        let error = ServerConfig::resolve(
            &settings(Some("https://g.example.com"), None),
            &env(&[("GRAFANA_API_KEY", "")]),
        )
        .unwrap_err();
        assert_eq!(
            error,
            ConfigurationError::MissingConfiguration {
                missing_fields: vec![ConfigField::GrafanaApiKey],
            }
        );
        assert_eq!(
            error.to_string(),
            "missing Grafana configuration: set `grafana_api_key` in the context server \
             settings or the GRAFANA_API_KEY environment variable"
        );
    }

    #[test]
    fn test_missing_both_fields() {
        let error = ServerConfig::resolve(&settings(None, None), &env(&[])).unwrap_err();
        assert_eq!(
            error,
            ConfigurationError::MissingConfiguration {
                missing_fields: vec![ConfigField::GrafanaUrl, ConfigField::GrafanaApiKey],
            }
        );
        let message = error.to_string();
        assert!(message.contains("grafana_url"), "{message}");
        assert!(message.contains("grafana_api_key"), "{message}");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ServerConfig::resolve(
            &settings(Some("https://g.example.com"), Some("tok123")),
            &env(&[]),
        )
        .unwrap();
        let debug = format!("{config:?}");
        assert!(debug.contains("https://g.example.com"));
        assert!(!debug.contains("tok123"), "{debug}");
    }

    #[test]
    fn test_state_transitions_are_terminal() {
        let mut state = ConfigurationState::Unconfigured;
        let config = state
            .resolve(
                &settings(Some("https://g.example.com"), Some("tok123")),
                &env(&[]),
            )
            .unwrap()
            .clone();
        assert_eq!(state, ConfigurationState::Configured(config.clone()));

        // Later resolutions with different inputs do not change the outcome.
        assert_eq!(state.resolve(&settings(None, None), &env(&[])), Ok(&config));
        assert_eq!(state, ConfigurationState::Configured(config));

        let mut state = ConfigurationState::default();
        let error = state
            .resolve(&settings(None, None), &env(&[]))
            .unwrap_err()
            .clone();
        assert_eq!(
            error,
            ConfigurationError::MissingConfiguration {
                missing_fields: vec![ConfigField::GrafanaUrl, ConfigField::GrafanaApiKey],
            }
        );
        assert_eq!(
            state.resolve(
                &settings(Some("https://g.example.com"), Some("tok123")),
                &env(&[]),
            ),
            Err(&error)
        );
        assert_eq!(state, ConfigurationState::Failed(error));
    }
}
