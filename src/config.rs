//! Configuration loading.
//!
//! Herald reads a single `herald.toml`. The `[properties]` table (plus an
//! optional `.env` file) forms the property environment consulted by
//! conditions and fillers; nested tables are flattened into dotted keys, so
//! `[properties.herald.sms] from = "MYBRAND"` defines `herald.sms.from`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::addressing::ClassifierRules;
use crate::environment::{load_properties, Capabilities, Environment, Properties};

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct HeraldConfig {
    /// Register the logging transport as a last-resort implementation.
    #[serde(default)]
    pub dry_run: bool,

    /// Optional `.env` file merged into the properties.
    #[serde(default)]
    pub env_file: Option<PathBuf>,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Raw property table.
    #[serde(default)]
    pub properties: toml::Table,

    /// Capability overrides.
    #[serde(default)]
    pub capabilities: CapabilitiesConfig,

    /// SMS pipeline settings.
    #[serde(default)]
    pub sms: SmsConfig,

    /// Email pipeline settings.
    #[serde(default)]
    pub email: EmailConfig,

    /// Template settings.
    #[serde(default)]
    pub templates: TemplatesConfig,
}

/// Logging settings.
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for JSON log files; console-only when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
        }
    }
}

/// Capability overrides.
#[derive(Debug, Default, Deserialize)]
pub struct CapabilitiesConfig {
    /// Compiled-in capabilities to treat as unavailable.
    #[serde(default)]
    pub disabled: Vec<String>,
}

/// SMS pipeline settings.
#[derive(Debug, Deserialize)]
pub struct SmsConfig {
    /// Build the SMS pipeline at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Fill unset fields from `herald.sms.*` / `sms.*` properties.
    #[serde(default = "default_true")]
    pub fill: bool,

    /// Classify phone numbers before delivery.
    #[serde(default = "default_true")]
    pub addressing: bool,

    /// Country calling code applied to both roles unless a role sets its own.
    #[serde(default)]
    pub country_code: Option<String>,

    /// Sender classification rules.
    #[serde(default = "ClassifierRules::sender")]
    pub sender: ClassifierRules,

    /// Recipient classification rules.
    #[serde(default = "default_recipient_rules")]
    pub recipient: ClassifierRules,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fill: true,
            addressing: true,
            country_code: None,
            sender: ClassifierRules::sender(),
            recipient: default_recipient_rules(),
        }
    }
}

impl SmsConfig {
    /// Sender rules with the shared country code applied.
    pub fn sender_rules(&self) -> ClassifierRules {
        with_shared_country_code(self.sender.clone(), self.country_code.as_deref())
    }

    /// Recipient rules with the shared country code applied.
    pub fn recipient_rules(&self) -> ClassifierRules {
        with_shared_country_code(self.recipient.clone(), self.country_code.as_deref())
    }
}

/// Email pipeline settings.
#[derive(Debug, Deserialize)]
pub struct EmailConfig {
    /// Build the email pipeline at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Fill unset fields from `herald.email.*` / `email.*` properties.
    #[serde(default = "default_true")]
    pub fill: bool,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fill: true,
        }
    }
}

/// Template settings.
#[derive(Debug, Deserialize)]
pub struct TemplatesConfig {
    /// Enable template translation. Defaults to on when the template engine
    /// is compiled in.
    #[serde(default = "default_templates_enabled")]
    pub enabled: bool,

    /// Prefix prepended to template names.
    #[serde(default)]
    pub prefix: String,

    /// Suffix appended to template names.
    #[serde(default)]
    pub suffix: String,

    /// SMS-specific location overriding `prefix`/`suffix`.
    #[serde(default)]
    pub sms: Option<TemplateLocationConfig>,

    /// Email-specific location overriding `prefix`/`suffix`.
    #[serde(default)]
    pub email: Option<TemplateLocationConfig>,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            enabled: default_templates_enabled(),
            prefix: String::new(),
            suffix: String::new(),
            sms: None,
            email: None,
        }
    }
}

/// Channel-specific template location.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateLocationConfig {
    /// Prefix override.
    #[serde(default)]
    pub prefix: Option<String>,
    /// Suffix override.
    #[serde(default)]
    pub suffix: Option<String>,
}

// Default value functions for serde

fn default_log_level() -> String {
    "info".to_owned()
}
fn default_true() -> bool {
    true
}
fn default_templates_enabled() -> bool {
    cfg!(feature = "templates")
}
fn default_recipient_rules() -> ClassifierRules {
    ClassifierRules {
        international: true,
        ..ClassifierRules::default()
    }
}

fn with_shared_country_code(mut rules: ClassifierRules, shared: Option<&str>) -> ClassifierRules {
    if rules.country_code.is_none() {
        rules.country_code = shared.map(str::to_owned);
    }
    rules
}

impl HeraldConfig {
    /// Properties from `[properties]`, completed by `env_file` when set.
    /// Relative `env_file` paths are resolved against `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the `.env` file cannot be read.
    pub fn load_properties(&self, base_dir: &Path) -> anyhow::Result<Properties> {
        let mut properties = Properties::from_map(flatten_properties(&self.properties));
        if let Some(env_file) = &self.env_file {
            let path = if env_file.is_relative() {
                base_dir.join(env_file)
            } else {
                env_file.clone()
            };
            properties.merge_missing(load_properties(&path)?);
        }
        Ok(properties)
    }

    /// Compiled-in capabilities minus `[capabilities].disabled`.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
            .disabled
            .iter()
            .fold(Capabilities::detect(), |caps, name| caps.without(name))
    }

    /// Build the runtime environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the `.env` file cannot be read.
    pub fn environment(&self, base_dir: &Path) -> anyhow::Result<Environment> {
        let properties = self.load_properties(base_dir)?;
        let capabilities = self.capabilities();
        debug!(
            properties = properties.len(),
            capabilities = ?capabilities.names().collect::<Vec<_>>(),
            "environment assembled"
        );
        Ok(Environment::new(Arc::new(properties), Arc::new(capabilities)))
    }
}

/// Flatten a TOML table into dotted keys. Scalars are stringified; arrays of
/// scalars become comma separated lists.
pub fn flatten_properties(table: &toml::Table) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    flatten_into(&mut out, None, table);
    out
}

fn flatten_into(out: &mut BTreeMap<String, String>, prefix: Option<&str>, table: &toml::Table) {
    for (key, value) in table {
        let full = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.clone(),
        };
        match value {
            toml::Value::Table(nested) => flatten_into(out, Some(&full), nested),
            toml::Value::Array(items) => {
                let joined = items
                    .iter()
                    .filter_map(scalar_to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                out.insert(full, joined);
            }
            scalar => {
                if let Some(text) = scalar_to_string(scalar) {
                    out.insert(full, text);
                }
            }
        }
    }
}

fn scalar_to_string(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        toml::Value::Datetime(d) => Some(d.to_string()),
        toml::Value::Array(_) | toml::Value::Table(_) => None,
    }
}

/// Load the configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_config(path: &Path) -> anyhow::Result<HeraldConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config at {}: {e}", path.display()))?;
    let config: HeraldConfig = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("failed to parse config at {}: {e}", path.display()))?;
    Ok(config)
}

/// Resolve the default config directory (`~/.herald/`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> anyhow::Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(".herald"))
}

/// Default config file path (`~/.herald/herald.toml`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(config_dir()?.join("herald.toml"))
}
