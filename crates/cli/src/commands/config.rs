use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use lapprice_core::config::LoadOptions;
use serde::Serialize;
use serde_json::json;
use toml::Value;

use crate::commands::{CommandResult, LoadedConfig};

#[derive(Debug, Serialize)]
struct ConfigEntry {
    key: &'static str,
    value: String,
    source: String,
}

pub fn run(options: &LoadOptions, loaded: LoadedConfig) -> CommandResult {
    let config = match loaded {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            )
        }
    };

    let config_file_path = detect_config_path(options.config_path.as_deref());
    let config_file_doc = match load_config_file_doc(config_file_path.as_deref()) {
        Ok(doc) => doc,
        Err(error) => {
            return CommandResult::failure("config", "config_validation", format!("{error:#}"), 2)
        }
    };
    let attribution = Attribution {
        doc: config_file_doc.as_ref(),
        path: config_file_path.as_deref(),
    };

    let advisor_rules = match &config.advisor.rules {
        Some(rules) => format!("{} custom rules", rules.len()),
        None => format!("built-in ({} rules)", config.advisor.advisor_rules().rules().len()),
    };

    let entries = vec![
        attribution.entry(
            "artifacts.catalog_path",
            config.artifacts.catalog_path.display().to_string(),
            Some("LAPPRICE_CATALOG_PATH"),
            options.overrides.catalog_path.is_some(),
        ),
        attribution.entry(
            "artifacts.schema_path",
            config.artifacts.schema_path.display().to_string(),
            Some("LAPPRICE_SCHEMA_PATH"),
            options.overrides.schema_path.is_some(),
        ),
        attribution.entry(
            "artifacts.model_path",
            config.artifacts.model_path.display().to_string(),
            Some("LAPPRICE_MODEL_PATH"),
            options.overrides.model_path.is_some(),
        ),
        attribution.entry(
            "artifacts.price_column",
            config.artifacts.price_column.clone(),
            Some("LAPPRICE_PRICE_COLUMN"),
            false,
        ),
        attribution.entry(
            "pricing.currency",
            config.pricing.currency.clone(),
            Some("LAPPRICE_CURRENCY"),
            options.overrides.currency.is_some(),
        ),
        attribution.entry("advisor.rules", advisor_rules, None, false),
        attribution.entry(
            "logging.level",
            config.logging.level.clone(),
            Some("LAPPRICE_LOGGING_LEVEL"),
            options.overrides.log_level.is_some(),
        ),
        attribution.entry(
            "logging.format",
            format!("{:?}", config.logging.format).to_ascii_lowercase(),
            Some("LAPPRICE_LOGGING_FORMAT"),
            options.overrides.log_format.is_some(),
        ),
    ];

    CommandResult::success(
        "config",
        "effective config (source precedence: flag > env > file > default)",
        Some(json!({ "entries": entries })),
    )
}

struct Attribution<'a> {
    doc: Option<&'a Value>,
    path: Option<&'a Path>,
}

impl Attribution<'_> {
    fn entry(
        &self,
        key: &'static str,
        value: String,
        env_key: Option<&str>,
        overridden: bool,
    ) -> ConfigEntry {
        let source = if overridden {
            "flag".to_string()
        } else {
            field_source(key, env_key, self.doc, self.path)
        };
        ConfigEntry { key, value, source }
    }
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    [PathBuf::from("lapprice.toml"), PathBuf::from("config/lapprice.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> anyhow::Result<Option<Value>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read config file `{}`", path.display()))?;
    let doc = raw
        .parse::<Value>()
        .with_context(|| format!("could not parse config file `{}`", path.display()))?;
    Ok(Some(doc))
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        let alias = env_key.replace("_LOGGING_", "_LOG_");
        for candidate in [env_key, alias.as_str()] {
            if env::var(candidate).is_ok_and(|value| !value.trim().is_empty()) {
                return format!("env ({candidate})");
            }
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    key_path.split('.').try_fold(root, |current, key| current.get(key)).is_some()
}
