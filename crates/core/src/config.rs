use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::advisor::{AdvisorRules, DowngradeRule, Predicate};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub artifacts: ArtifactsConfig,
    pub pricing: PricingConfig,
    pub advisor: AdvisorConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ArtifactsConfig {
    pub catalog_path: PathBuf,
    pub schema_path: PathBuf,
    pub model_path: PathBuf,
    pub price_column: String,
}

#[derive(Clone, Debug)]
pub struct PricingConfig {
    pub currency: String,
}

/// `rules: None` keeps the built-in downgrade table.
#[derive(Clone, Debug, Default)]
pub struct AdvisorConfig {
    pub rules: Option<Vec<DowngradeRule>>,
}

impl AdvisorConfig {
    pub fn advisor_rules(&self) -> AdvisorRules {
        match &self.rules {
            Some(rules) => AdvisorRules::new(rules.clone()),
            None => AdvisorRules::default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub catalog_path: Option<PathBuf>,
    pub schema_path: Option<PathBuf>,
    pub model_path: Option<PathBuf>,
    pub currency: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            artifacts: ArtifactsConfig {
                catalog_path: PathBuf::from("laptop_price.csv"),
                schema_path: PathBuf::from("processed_columns.json"),
                model_path: PathBuf::from("model.json"),
                price_column: "Price_euros".to_string(),
            },
            pricing: PricingConfig { currency: "SGD".to_string() },
            advisor: AdvisorConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("lapprice.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(artifacts) = patch.artifacts {
            if let Some(catalog_path) = artifacts.catalog_path {
                self.artifacts.catalog_path = catalog_path;
            }
            if let Some(schema_path) = artifacts.schema_path {
                self.artifacts.schema_path = schema_path;
            }
            if let Some(model_path) = artifacts.model_path {
                self.artifacts.model_path = model_path;
            }
            if let Some(price_column) = artifacts.price_column {
                self.artifacts.price_column = price_column;
            }
        }

        if let Some(pricing) = patch.pricing {
            if let Some(currency) = pricing.currency {
                self.pricing.currency = currency;
            }
        }

        if let Some(advisor) = patch.advisor {
            if let Some(rules) = advisor.rules {
                self.advisor.rules = Some(rules);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("LAPPRICE_CATALOG_PATH") {
            self.artifacts.catalog_path = PathBuf::from(value);
        }
        if let Some(value) = read_env("LAPPRICE_SCHEMA_PATH") {
            self.artifacts.schema_path = PathBuf::from(value);
        }
        if let Some(value) = read_env("LAPPRICE_MODEL_PATH") {
            self.artifacts.model_path = PathBuf::from(value);
        }
        if let Some(value) = read_env("LAPPRICE_PRICE_COLUMN") {
            self.artifacts.price_column = value;
        }

        if let Some(value) = read_env("LAPPRICE_CURRENCY") {
            self.pricing.currency = value;
        }

        let log_level =
            read_env("LAPPRICE_LOGGING_LEVEL").or_else(|| read_env("LAPPRICE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("LAPPRICE_LOGGING_FORMAT").or_else(|| read_env("LAPPRICE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                key: "LAPPRICE_LOGGING_FORMAT".to_string(),
                value,
            })?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(catalog_path) = overrides.catalog_path {
            self.artifacts.catalog_path = catalog_path;
        }
        if let Some(schema_path) = overrides.schema_path {
            self.artifacts.schema_path = schema_path;
        }
        if let Some(model_path) = overrides.model_path {
            self.artifacts.model_path = model_path;
        }
        if let Some(currency) = overrides.currency {
            self.pricing.currency = currency;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_artifacts(&self.artifacts)?;
        validate_pricing(&self.pricing)?;
        validate_advisor(&self.advisor)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("lapprice.toml"), PathBuf::from("config/lapprice.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_artifacts(artifacts: &ArtifactsConfig) -> Result<(), ConfigError> {
    let paths = [
        ("artifacts.catalog_path", &artifacts.catalog_path),
        ("artifacts.schema_path", &artifacts.schema_path),
        ("artifacts.model_path", &artifacts.model_path),
    ];
    for (key, path) in paths {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(format!("{key} must not be empty")));
        }
    }

    if artifacts.price_column.trim().is_empty() {
        return Err(ConfigError::Validation(
            "artifacts.price_column must name the catalog's price column".to_string(),
        ));
    }

    Ok(())
}

fn validate_pricing(pricing: &PricingConfig) -> Result<(), ConfigError> {
    let currency = pricing.currency.trim();
    if currency.len() != 3 || !currency.chars().all(|ch| ch.is_ascii_uppercase()) {
        return Err(ConfigError::Validation(format!(
            "pricing.currency must be a three-letter ISO code such as `SGD` (got `{currency}`)"
        )));
    }
    Ok(())
}

fn validate_advisor(advisor: &AdvisorConfig) -> Result<(), ConfigError> {
    let Some(rules) = &advisor.rules else {
        return Ok(());
    };

    for (index, rule) in rules.iter().enumerate() {
        if rule.attribute.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "advisor.rules[{index}].attribute must not be empty"
            )));
        }
        if rule.label.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "advisor.rules[{index}].label must not be empty"
            )));
        }
        for (field, predicate) in [("trigger", &rule.trigger), ("candidate", &rule.candidate)] {
            if !predicate_is_populated(predicate) {
                return Err(ConfigError::Validation(format!(
                    "advisor.rules[{index}].{field} has an empty token or value list"
                )));
            }
        }
    }

    Ok(())
}

fn predicate_is_populated(predicate: &Predicate) -> bool {
    match predicate {
        Predicate::ContainsAny { tokens, .. } => !tokens.is_empty(),
        Predicate::OneOf { values } => !values.is_empty(),
        Predicate::StartsWith { .. } => true,
        Predicate::Not { predicate } => predicate_is_populated(predicate),
    }
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    artifacts: Option<ArtifactsPatch>,
    pricing: Option<PricingPatch>,
    advisor: Option<AdvisorPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ArtifactsPatch {
    catalog_path: Option<PathBuf>,
    schema_path: Option<PathBuf>,
    model_path: Option<PathBuf>,
    price_column: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PricingPatch {
    currency: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AdvisorPatch {
    rules: Option<Vec<DowngradeRule>>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
