pub mod config;
pub mod doctor;
pub mod domains;
pub mod predict;
pub mod suggest;

use lapprice_core::config::{AppConfig, ConfigError};
use lapprice_core::{PriceAdvisor, StartupError, UserSelection};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>, data: Option<Value>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn startup_failure(command: &str, error: &StartupError) -> Self {
        let exit_code = match error {
            StartupError::Config(_) => 2,
            StartupError::Catalog(_) => 3,
            StartupError::Artifact(lapprice_core::ArtifactError::SchemaMismatch { .. }) => 5,
            StartupError::Artifact(_) => 4,
        };
        Self::failure(command, error.error_class(), format!("startup failed: {error}"), exit_code)
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Config as loaded once by the entry point. Commands report a load failure.
pub type LoadedConfig = Result<AppConfig, ConfigError>;

/// Runs the fatal startup sequence shared by every pricing command.
pub fn load_advisor(config: LoadedConfig) -> Result<(AppConfig, PriceAdvisor), StartupError> {
    let config = config?;
    let advisor = PriceAdvisor::load(&config)?;
    Ok((config, advisor))
}

/// Parses repeated `ATTRIBUTE=VALUE` arguments. The value may itself contain `=`.
pub fn parse_selection(specs: &[String]) -> Result<UserSelection, String> {
    let mut selection = UserSelection::new();
    for spec in specs {
        let Some((attribute, value)) = spec.split_once('=') else {
            return Err(format!("`{spec}` is not in ATTRIBUTE=VALUE form"));
        };
        let attribute = attribute.trim();
        if attribute.is_empty() {
            return Err(format!("`{spec}` has an empty attribute name"));
        }
        selection.insert(attribute, value.trim());
    }
    Ok(selection)
}

/// Renders `1234.5` as `SGD $1,234.50`.
pub fn format_price(currency: &str, amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("{currency} {sign}${grouped}.{:02}", cents % 100)
}
