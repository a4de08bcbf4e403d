//! Configuration loading from disk.
//!
//! Values may reference the environment with `${NAME}` or `${NAME:default}`
//! placeholders. Placeholders are resolved on the raw text before TOML
//! parsing, so they work for any field type.

use std::borrow::Cow;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

static ENV_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{(?P<env>[A-Z0-9_]+)(?::(?P<def>[^}]*))?\}")
        .expect("placeholder pattern is valid")
});

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration text, resolving environment placeholders.
pub fn parse_config(content: &str) -> Result<ProxyConfig, ConfigError> {
    let resolved = expand_env(content, |name| std::env::var(name).ok());
    let config: ProxyConfig = toml::from_str(&resolved)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Replace `${NAME:default}` placeholders using `lookup`.
///
/// A variable that is unset or empty falls back to the default, or to the
/// empty string when no default is given.
pub fn expand_env<F>(content: &str, lookup: F) -> Cow<'_, str>
where
    F: Fn(&str) -> Option<String>,
{
    ENV_PLACEHOLDER.replace_all(content, |caps: &Captures<'_>| {
        lookup(&caps["env"])
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| {
                caps.name("def")
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default()
            })
    })
}
