use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use lapprice_cli::commands::{config, doctor, domains, predict, suggest};
use lapprice_core::config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};
use lapprice_core::NO_SUGGESTIONS_MESSAGE;
use serde_json::Value;
use tempfile::TempDir;

const CATALOG: &str = "\
Company,Processor,RAM,Memory,Gpu,Price_euros
Apple,Intel Core i7,16GB,512GB SSD,Nvidia GeForce GTX 1050,2100
Acer,Intel Core i5,8GB,1TB HDD,Intel HD Graphics 620,650
HP,Intel Core i3,4GB,500GB HDD,Intel UHD Graphics 620,480
";

const SCHEMA: &str = r#"[
  "Company_Apple",
  "Company_Acer",
  "Company_HP",
  "RAM_16GB",
  "RAM_8GB",
  "Processor_Intel Core i7",
  "Gpu_Nvidia GeForce GTX 1050",
  "Memory_512GB SSD"
]"#;

const MODEL: &str = r#"{
  "version": "fixture-v1",
  "trained_at": "2026-01-15T08:00:00Z",
  "kind": "linear",
  "intercept": 300.0,
  "weights": [900.0, 100.0, 80.0, 400.0, 150.0, 500.0, 300.0, 100.0]
}"#;

struct Fixture {
    _dir: TempDir,
    options: LoadOptions,
}

impl Fixture {
    fn load(&self) -> Result<AppConfig, ConfigError> {
        AppConfig::load(self.options.clone())
    }
}

fn fixture_with_model(model: &str) -> Fixture {
    fixture_with_artifacts(SCHEMA, model)
}

fn fixture_with_artifacts(schema: &str, model: &str) -> Fixture {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "laptop_price.csv", CATALOG);
    write(dir.path(), "processed_columns.json", schema);
    write(dir.path(), "model.json", model);

    let options = LoadOptions {
        overrides: ConfigOverrides {
            catalog_path: Some(dir.path().join("laptop_price.csv")),
            schema_path: Some(dir.path().join("processed_columns.json")),
            model_path: Some(dir.path().join("model.json")),
            ..ConfigOverrides::default()
        },
        ..LoadOptions::default()
    };
    Fixture { _dir: dir, options }
}

fn fixture() -> Fixture {
    fixture_with_model(MODEL)
}

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).expect("write fixture file");
}

fn premium_specs() -> Vec<String> {
    [
        "Company=Apple",
        "RAM=16GB",
        "Processor=Intel Core i7",
        "Gpu=Nvidia GeForce GTX 1050",
        "Memory=512GB SSD",
    ]
    .iter()
    .map(|spec| (*spec).to_string())
    .collect()
}

#[test]
fn domains_lists_sorted_catalog_values_per_schema_attribute() {
    with_env(&[], || {
        let fixture = fixture();
        let result = domains::run(fixture.load());
        assert_eq!(result.exit_code, 0, "expected domains success");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "domains");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["data"]["domains"]["Company"], serde_json::json!(["Acer", "Apple", "HP"]));
        assert_eq!(payload["data"]["domains"]["RAM"], serde_json::json!(["16GB", "4GB", "8GB"]));
    });
}

#[test]
fn predict_over_budget_offers_suggestions() {
    with_env(&[], || {
        let fixture = fixture();
        let result = predict::run(fixture.load(), &premium_specs(), Some(1500.0));
        assert_eq!(result.exit_code, 0, "expected predict success");

        let payload = parse_payload(&result.output);
        let data = &payload["data"];
        assert_eq!(data["price"], 2500.0);
        assert_eq!(data["formatted_price"], "SGD $2,500.00");
        assert_eq!(data["outcome"], "OVER_BUDGET");
        assert_eq!(data["outcome_message"], "This laptop exceeds your budget.");
        assert_eq!(data["model_version"], "fixture-v1");
        assert_eq!(data["session"]["to"], "over_budget");
        assert_eq!(data["suggestions_available"], true);
        assert_eq!(
            data["session"]["actions"],
            serde_json::json!(["show_estimate", "warn_over_budget", "offer_suggestions"])
        );
    });
}

#[test]
fn predict_without_budget_prompts_for_one() {
    with_env(&[("LAPPRICE_CURRENCY", "EUR")], || {
        let fixture = fixture();
        let result = predict::run(fixture.load(), &premium_specs(), None);
        assert_eq!(result.exit_code, 0, "expected predict success");

        let payload = parse_payload(&result.output);
        let data = &payload["data"];
        assert_eq!(data["formatted_price"], "EUR $2,500.00");
        assert_eq!(data["outcome"], "NO_BUDGET");
        assert_eq!(data["session"]["to"], "no_prediction");
        assert_eq!(data["suggestions_available"], false);
        assert_eq!(data["session"]["actions"], serde_json::json!(["show_estimate", "prompt_for_budget"]));
    });
}

#[test]
fn predict_with_empty_selection_returns_intercept() {
    with_env(&[], || {
        let fixture = fixture();
        let result = predict::run(fixture.load(), &[], Some(1000.0));
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["price"], 300.0);
        assert_eq!(payload["data"]["outcome"], "WITHIN_BUDGET");
    });
}

#[test]
fn predict_rejects_malformed_spec() {
    with_env(&[], || {
        let fixture = fixture();
        let result = predict::run(fixture.load(), &["Company".to_string()], None);
        assert_eq!(result.exit_code, 6, "expected invalid input code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "invalid_input");
    });
}

#[test]
fn suggest_lists_one_downgrade_per_fired_rule() {
    with_env(&[], || {
        let fixture = fixture();
        let result = suggest::run(fixture.load(), &premium_specs(), 1500.0);
        assert_eq!(result.exit_code, 0, "expected suggest success");

        let payload = parse_payload(&result.output);
        let suggestions = payload["data"]["suggestions"].as_array().expect("suggestion list");
        let labels: Vec<&str> =
            suggestions.iter().filter_map(|suggestion| suggestion["label"].as_str()).collect();
        assert_eq!(labels, vec!["Processor", "RAM", "Storage", "Graphics", "Brand"]);
        assert_eq!(suggestions[0]["proposed"], "Intel Core i5");
        assert_eq!(suggestions[3]["proposed"], "Intel HD Graphics 620");
        assert_eq!(
            suggestions[4]["rationale"],
            "Try cost-effective brand like Acer instead of Apple"
        );
    });
}

#[test]
fn suggest_within_budget_reports_unavailable() {
    with_env(&[], || {
        let fixture = fixture();
        let result = suggest::run(fixture.load(), &premium_specs(), 3000.0);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["outcome"], "WITHIN_BUDGET");
        assert_eq!(payload["data"]["suggestions_available"], false);
        assert_eq!(payload["data"]["suggestions"], serde_json::json!([]));
        assert!(payload["data"]["reason"].as_str().unwrap_or_default().contains("over-budget"));
    });
}

#[test]
fn suggest_with_nothing_to_downgrade_returns_informational_message() {
    with_env(&[], || {
        let fixture = fixture();
        let specs: Vec<String> = [
            "Company=HP",
            "RAM=4GB",
            "Processor=Intel Core i3",
            "Gpu=Intel UHD Graphics 620",
            "Memory=500GB HDD",
        ]
        .iter()
        .map(|spec| (*spec).to_string())
        .collect();

        let result = suggest::run(fixture.load(), &specs, 100.0);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["outcome"], "OVER_BUDGET");
        assert_eq!(payload["message"], NO_SUGGESTIONS_MESSAGE);
        assert_eq!(payload["data"]["suggestions"], serde_json::json!([]));
    });
}

#[test]
fn schema_model_mismatch_is_fatal() {
    with_env(&[], || {
        let fixture =
            fixture_with_model(r#"{"version": "bad", "kind": "linear", "intercept": 0.0, "weights": [1.0]}"#);
        let result = predict::run(fixture.load(), &premium_specs(), None);
        assert_eq!(result.exit_code, 5, "expected schema mismatch code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "schema_mismatch");
    });
}

#[test]
fn missing_catalog_is_fatal() {
    with_env(&[], || {
        let mut fixture = fixture();
        fixture.options.overrides.catalog_path =
            Some(fixture._dir.path().join("does_not_exist.csv"));

        let result = domains::run(fixture.load());
        assert_eq!(result.exit_code, 3, "expected catalog load failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "catalog_load");
    });
}

#[test]
fn invalid_currency_fails_config_validation() {
    with_env(&[("LAPPRICE_CURRENCY", "dollars")], || {
        let fixture = fixture();
        let result = predict::run(fixture.load(), &premium_specs(), None);
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn config_reports_value_sources() {
    with_env(&[("LAPPRICE_PRICE_COLUMN", "Price_euros")], || {
        let fixture = fixture();
        let result = config::run(&fixture.options, fixture.load());
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        let entries = payload["data"]["entries"].as_array().expect("entry list");
        let source_of = |key: &str| {
            entries
                .iter()
                .find(|entry| entry["key"] == key)
                .and_then(|entry| entry["source"].as_str())
                .map(str::to_owned)
        };

        assert_eq!(source_of("artifacts.catalog_path").as_deref(), Some("flag"));
        assert_eq!(source_of("artifacts.price_column").as_deref(), Some("env (LAPPRICE_PRICE_COLUMN)"));
        assert_eq!(source_of("pricing.currency").as_deref(), Some("default"));
    });
}

#[test]
fn doctor_json_passes_with_aligned_artifacts() {
    with_env(&[], || {
        let fixture = fixture();
        let output = doctor::run(fixture.load(), true);

        let report: Value = serde_json::from_str(&output).expect("doctor emits json");
        assert_eq!(report["overall_status"], "pass");
        let names: Vec<&str> = report["checks"]
            .as_array()
            .expect("check list")
            .iter()
            .filter_map(|check| check["name"].as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "config_validation",
                "catalog_load",
                "schema_load",
                "model_load",
                "schema_model_alignment",
                "domain_coverage",
            ]
        );
    });
}

#[test]
fn doctor_flags_schema_model_mismatch() {
    with_env(&[], || {
        let fixture =
            fixture_with_model(r#"{"version": "bad", "kind": "linear", "intercept": 0.0, "weights": [1.0]}"#);
        let output = doctor::run(fixture.load(), false);

        assert!(output.starts_with("doctor: one or more readiness checks failed"));
        assert!(output.contains("- [fail] schema_model_alignment"));
        assert!(output.contains("- [ok] catalog_load"));
    });
}

#[test]
fn doctor_passes_when_schema_attribute_is_absent_from_catalog() {
    with_env(&[], || {
        let fixture = fixture_with_artifacts(
            r#"["Company_Apple", "OpSys_Windows 10"]"#,
            r#"{"version": "v2", "kind": "linear", "intercept": 100.0, "weights": [900.0, 50.0]}"#,
        );
        let output = doctor::run(fixture.load(), true);

        let report: Value = serde_json::from_str(&output).expect("doctor emits json");
        assert_eq!(report["overall_status"], "pass");
        let coverage = report["checks"]
            .as_array()
            .expect("check list")
            .iter()
            .find(|check| check["name"] == "domain_coverage")
            .expect("coverage check present");
        assert_eq!(coverage["status"], "pass");
        assert!(coverage["details"].as_str().unwrap_or_default().contains("OpSys"));

        let listed = parse_payload(&domains::run(fixture.load()).output);
        assert!(listed["data"]["domains"].get("OpSys").is_none());
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "LAPPRICE_CATALOG_PATH",
        "LAPPRICE_SCHEMA_PATH",
        "LAPPRICE_MODEL_PATH",
        "LAPPRICE_PRICE_COLUMN",
        "LAPPRICE_CURRENCY",
        "LAPPRICE_LOGGING_LEVEL",
        "LAPPRICE_LOGGING_FORMAT",
        "LAPPRICE_LOG_LEVEL",
        "LAPPRICE_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
