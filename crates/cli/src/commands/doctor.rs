use lapprice_core::config::AppConfig;
use lapprice_core::{Catalog, FeatureSchema, ModelArtifact, PriceEstimator, PriceModel};
use serde::Serialize;

use crate::commands::LoadedConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into() }
    }

    fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into() }
    }

    fn skipped(name: &'static str, because: &str) -> Self {
        Self { name, status: CheckStatus::Skipped, details: format!("skipped because {because}") }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(loaded: LoadedConfig, json_output: bool) -> String {
    let report = build_report(loaded);

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report(loaded: LoadedConfig) -> DoctorReport {
    let mut checks = Vec::new();

    match loaded {
        Ok(config) => {
            checks.push(DoctorCheck::pass("config_validation", "configuration loaded and validated"));
            check_artifacts(&config, &mut checks);
        }
        Err(error) => {
            checks.push(DoctorCheck::fail("config_validation", error.to_string()));
            for name in ["catalog_load", "schema_load", "model_load", "schema_model_alignment"] {
                checks.push(DoctorCheck::skipped(name, "configuration did not load"));
            }
            checks.push(DoctorCheck::skipped("domain_coverage", "configuration did not load"));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_artifacts(config: &AppConfig, checks: &mut Vec<DoctorCheck>) {
    let artifacts = &config.artifacts;

    let catalog = match Catalog::from_csv_path(&artifacts.catalog_path, &artifacts.price_column) {
        Ok(catalog) => {
            checks.push(DoctorCheck::pass(
                "catalog_load",
                format!("{} records from `{}`", catalog.len(), artifacts.catalog_path.display()),
            ));
            Some(catalog)
        }
        Err(error) => {
            checks.push(DoctorCheck::fail("catalog_load", error.to_string()));
            None
        }
    };

    let schema = match FeatureSchema::from_json_path(&artifacts.schema_path) {
        Ok(schema) => {
            checks.push(DoctorCheck::pass("schema_load", format!("{} feature columns", schema.len())));
            Some(schema)
        }
        Err(error) => {
            checks.push(DoctorCheck::fail("schema_load", error.to_string()));
            None
        }
    };

    let model = match ModelArtifact::from_json_path(&artifacts.model_path) {
        Ok(model) => {
            checks.push(DoctorCheck::pass(
                "model_load",
                format!("model `{}` expects {} features", model.version, model.input_dim()),
            ));
            Some(model)
        }
        Err(error) => {
            checks.push(DoctorCheck::fail("model_load", error.to_string()));
            None
        }
    };

    match (&schema, model) {
        (Some(schema), Some(model)) => match PriceEstimator::new(model, schema) {
            Ok(_) => checks.push(DoctorCheck::pass(
                "schema_model_alignment",
                "model input width matches the feature schema",
            )),
            Err(error) => checks.push(DoctorCheck::fail("schema_model_alignment", error.to_string())),
        },
        _ => checks.push(DoctorCheck::skipped(
            "schema_model_alignment",
            "schema or model did not load",
        )),
    }

    match (&catalog, &schema) {
        (Some(catalog), Some(schema)) => checks.push(check_domain_coverage(catalog, schema)),
        _ => checks.push(DoctorCheck::skipped("domain_coverage", "catalog or schema did not load")),
    }
}

/// Schema attributes the catalog never carries are dropped from the selectable
/// domains, so they are listed but never fail the check.
fn check_domain_coverage(catalog: &Catalog, schema: &FeatureSchema) -> DoctorCheck {
    let missing: Vec<&str> = schema
        .base_attributes()
        .into_iter()
        .filter(|attribute| !catalog.has_attribute(attribute))
        .collect();

    if missing.is_empty() {
        DoctorCheck::pass("domain_coverage", "every schema attribute has catalog values")
    } else {
        DoctorCheck::pass(
            "domain_coverage",
            format!("not selectable (absent from catalog): {}", missing.join(", ")),
        )
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
