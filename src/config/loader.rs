//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{AppConfig, Environment};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {value:?}")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML configuration file; absent sections keep their defaults.
fn read_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Build the runtime configuration: optional file, then process
/// environment, then validation.
pub fn load(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_file(path)?,
        None => AppConfig::default(),
    };

    apply_env(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment variables onto `config`.
///
/// `lookup` abstracts the environment so tests never touch process state.
/// Blank values are treated as unset.
pub fn apply_env<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| {
        lookup(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    if let Some(port) = get("PORT") {
        config.listener.port = port
            .parse()
            .map_err(|_| ConfigError::Env { var: "PORT", value: port })?;
    }

    if let Some(user) = get("EMAIL_USER") {
        config.mail.user = Some(user);
    }
    if let Some(password) = get("EMAIL_PASS") {
        config.mail.password = Some(password);
    }
    if let Some(to) = get("EMAIL_TO") {
        config.mail.to = Some(to);
    }
    if let Some(host) = get("EMAIL_HOST") {
        config.mail.host = Some(host);
    }
    if let Some(port) = get("EMAIL_PORT") {
        let parsed = port
            .parse()
            .map_err(|_| ConfigError::Env { var: "EMAIL_PORT", value: port })?;
        config.mail.port = Some(parsed);
    }
    if let Some(secure) = get("EMAIL_SECURE") {
        config.mail.secure = match secure.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            _ => return Err(ConfigError::Env { var: "EMAIL_SECURE", value: secure }),
        };
    }

    if let Some(origins) = get("ALLOWED_ORIGINS") {
        config.cors.allowed_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect();
    }

    // APP_ENV wins over NODE_ENV when both are set. Unknown modes run as
    // production.
    for var in ["NODE_ENV", "APP_ENV"] {
        if let Some(mode) = get(var) {
            config.environment = Environment::parse(&mode).unwrap_or_default();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_file_sections_merge_with_defaults() {
        let path = std::env::temp_dir().join(format!("contact-{}.toml", uuid::Uuid::new_v4()));
        fs::write(
            &path,
            "[listener]\nport = 8080\n\n[cors]\nallowed_origins = [\"https://portfolio.example\"]\n",
        )
        .unwrap();

        let config = read_file(&path);
        fs::remove_file(&path).unwrap();

        let config = config.unwrap();
        assert_eq!(config.listener.port, 8080);
        assert_eq!(config.cors.allowed_origins, vec!["https://portfolio.example".to_string()]);
        assert_eq!(config.rate_limit.max_attempts, AppConfig::default().rate_limit.max_attempts);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let path = std::env::temp_dir().join(format!("contact-{}.toml", uuid::Uuid::new_v4()));
        assert!(matches!(read_file(&path), Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_env_overrides_mail_and_listener() {
        let mut config = AppConfig::default();
        apply_env(
            &mut config,
            env(&[
                ("PORT", "8081"),
                ("EMAIL_USER", "me@gmail.com"),
                ("EMAIL_PASS", "app-password"),
                ("EMAIL_TO", "inbox@example.com"),
                ("EMAIL_PORT", "2525"),
                ("NODE_ENV", "development"),
            ]),
        )
        .unwrap();

        assert_eq!(config.listener.port, 8081);
        assert_eq!(config.mail.user.as_deref(), Some("me@gmail.com"));
        assert_eq!(config.mail.password.as_deref(), Some("app-password"));
        assert_eq!(config.mail.to.as_deref(), Some("inbox@example.com"));
        assert_eq!(config.mail.port, Some(2525));
        assert_eq!(config.environment, Environment::Development);
    }

    #[test]
    fn test_allowed_origins_split_and_trimmed() {
        let mut config = AppConfig::default();
        apply_env(
            &mut config,
            env(&[("ALLOWED_ORIGINS", "https://a.dev, https://b.dev,,")]),
        )
        .unwrap();
        assert_eq!(config.cors.allowed_origins, vec!["https://a.dev", "https://b.dev"]);
        assert!(!config.cors.allows_any_origin());
    }

    #[test]
    fn test_blank_values_are_unset() {
        let mut config = AppConfig::default();
        apply_env(&mut config, env(&[("EMAIL_USER", "   "), ("PORT", "")])).unwrap();
        assert!(config.mail.user.is_none());
        assert_eq!(config.listener.port, 3000);
    }

    #[test]
    fn test_invalid_port_rejected() {
        let mut config = AppConfig::default();
        let err = apply_env(&mut config, env(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "PORT", .. }));
    }

    #[test]
    fn test_app_env_wins_over_node_env() {
        let mut config = AppConfig::default();
        apply_env(
            &mut config,
            env(&[("NODE_ENV", "development"), ("APP_ENV", "production")]),
        )
        .unwrap();
        assert_eq!(config.environment, Environment::Production);
    }

    #[test]
    fn test_unknown_mode_runs_as_production() {
        let mut config = AppConfig::default();
        config.environment = Environment::Development;
        apply_env(&mut config, env(&[("NODE_ENV", "staging")])).unwrap();
        assert_eq!(config.environment, Environment::Production);
    }
}
