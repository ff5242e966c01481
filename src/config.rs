use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use jsonschema::{JSONSchema, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub intake: IntakeConfig,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_logging_dir() -> PathBuf {
    PathBuf::from("./logs")
}

fn default_logging_filter() -> String {
    "info".to_string()
}

fn default_logging_rotation() -> LoggingRotation {
    LoggingRotation::Daily
}

fn default_logging_retention_days() -> usize {
    14
}

fn default_enabled_true() -> bool {
    true
}

fn default_rate_window_secs() -> u64 {
    600
}

fn default_rate_max_requests() -> usize {
    12
}

fn default_rate_max_identities() -> usize {
    4096
}

fn default_relay_timeout_ms() -> u64 {
    6_000
}

fn default_inbox() -> String {
    "intake@concierge.example".to_string()
}

fn default_source_tag() -> String {
    "concierge_contact_form".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LoggingRotation {
    Daily,
    Hourly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_logging_filter")]
    pub filter: String,
    #[serde(default = "default_logging_rotation")]
    pub rotation: LoggingRotation,
    #[serde(default = "default_logging_retention_days")]
    pub retention_days: usize,
    #[serde(default = "default_enabled_true")]
    pub stderr_warn_enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_logging_dir(),
            filter: default_logging_filter(),
            rotation: default_logging_rotation(),
            retention_days: default_logging_retention_days(),
            stderr_warn_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeConfig {
    #[serde(default = "default_rate_window_secs")]
    pub rate_window_secs: u64,
    #[serde(default = "default_rate_max_requests")]
    pub rate_max_requests: usize,
    #[serde(default = "default_rate_max_identities")]
    pub rate_max_identities: usize,
    #[serde(default = "default_relay_timeout_ms")]
    pub relay_timeout_ms: u64,
    #[serde(default = "default_inbox")]
    pub inbox: String,
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default = "default_source_tag")]
    pub source_tag: String,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            rate_window_secs: default_rate_window_secs(),
            rate_max_requests: default_rate_max_requests(),
            rate_max_identities: default_rate_max_identities(),
            relay_timeout_ms: default_relay_timeout_ms(),
            inbox: default_inbox(),
            webhook_url: None,
            source_tag: default_source_tag(),
        }
    }
}

impl Config {
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let config_value: Value = json5::from_str(&config_content)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;

        let config_base = config_path.parent().unwrap_or_else(|| Path::new("."));
        let schema_path = resolve_schema_path(config_base, &config_value)?;
        validate_against_schema(&config_value, &schema_path)?;

        let mut config: Config =
            serde_json::from_value(config_value).context("failed to deserialize config")?;
        apply_overrides(
            &mut config,
            env::var("CONCIERGE_CONTACT_WEBHOOK_URL").ok(),
            env::var("CONCIERGE_CONTACT_INBOX").ok(),
        );

        Ok(config)
    }
}

/// Deployment secrets arrive through the environment rather than the checked
/// in config file; non-empty values win over whatever the file says.
fn apply_overrides(config: &mut Config, webhook_url: Option<String>, inbox: Option<String>) {
    if let Some(url) = webhook_url {
        let url = url.trim();
        if !url.is_empty() {
            config.intake.webhook_url = Some(url.to_string());
        }
    }
    if let Some(inbox) = inbox {
        let inbox = inbox.trim();
        if !inbox.is_empty() {
            config.intake.inbox = inbox.to_string();
        }
    }
}

fn resolve_schema_path(config_base: &Path, config_value: &Value) -> Result<PathBuf> {
    if let Some(path_text) = config_value.get("$schema").and_then(|value| value.as_str()) {
        let configured = PathBuf::from(path_text);
        if configured.is_absolute() {
            return Ok(configured);
        }
        return Ok(config_base.join(&configured));
    }

    let local_default = config_base.join("concierge.schema.json");
    if local_default.exists() {
        return Ok(local_default);
    }

    Err(anyhow!(
        "unable to resolve schema path: expected $schema in config or concierge.schema.json"
    ))
}

fn validate_against_schema(config_value: &Value, schema_path: &Path) -> Result<()> {
    let schema_content = fs::read_to_string(schema_path)
        .with_context(|| format!("failed to read schema {}", schema_path.display()))?;
    let schema: Value = serde_json::from_str(&schema_content)
        .with_context(|| format!("failed to parse schema {}", schema_path.display()))?;

    let compiled =
        JSONSchema::compile(&schema).map_err(|e| anyhow!("failed to compile schema: {e}"))?;

    match compiled.validate(config_value) {
        Ok(()) => Ok(()),
        Err(errors_iter) => {
            let validation_errors: Vec<ValidationError> = errors_iter.collect();
            let messages: Vec<String> = validation_errors
                .into_iter()
                .map(|error| error.to_string())
                .collect();
            Err(anyhow!("config validation failed: {}", messages.join("; ")))
        }
    }
}
