use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ArtifactError;

/// Separator between attribute name and value in legacy encoded feature names.
pub const FEATURE_SEPARATOR: char = '_';

/// One slot of the model input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FeatureColumn {
    Categorical { attribute: String, value: String },
    /// A legacy entry without a separator. It never matches a selection.
    Passthrough { name: String },
}

impl FeatureColumn {
    pub fn categorical(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Categorical { attribute: attribute.into(), value: value.into() }
    }

    /// Splits a legacy name such as `Processor_Intel Core i7` at the first separator.
    pub fn from_legacy_name(name: &str) -> Self {
        match name.split_once(FEATURE_SEPARATOR) {
            Some((attribute, value)) => Self::categorical(attribute, value),
            None => Self::Passthrough { name: name.to_owned() },
        }
    }

    pub fn attribute(&self) -> Option<&str> {
        match self {
            Self::Categorical { attribute, .. } => Some(attribute),
            Self::Passthrough { .. } => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SchemaEntry {
    Legacy(String),
    Pair { attribute: String, value: String },
}

impl From<SchemaEntry> for FeatureColumn {
    fn from(entry: SchemaEntry) -> Self {
        match entry {
            SchemaEntry::Legacy(name) => Self::from_legacy_name(&name),
            SchemaEntry::Pair { attribute, value } => Self::categorical(attribute, value),
        }
    }
}

/// Ordered model input layout. Fixed at training time; never reordered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureSchema {
    columns: Vec<FeatureColumn>,
}

impl FeatureSchema {
    pub fn new(columns: Vec<FeatureColumn>) -> Result<Self, ArtifactError> {
        if columns.is_empty() {
            return Err(ArtifactError::EmptySchema);
        }
        Ok(Self { columns })
    }

    pub fn from_legacy_names<I, S>(names: I) -> Result<Self, ArtifactError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(names.into_iter().map(|name| FeatureColumn::from_legacy_name(name.as_ref())).collect())
    }

    pub fn from_json_str(raw: &str, path: &Path) -> Result<Self, ArtifactError> {
        let entries: Vec<SchemaEntry> = serde_json::from_str(raw)
            .map_err(|source| ArtifactError::Parse { path: path.to_path_buf(), source })?;
        Self::new(entries.into_iter().map(FeatureColumn::from).collect())
    }

    pub fn from_json_path(path: &Path) -> Result<Self, ArtifactError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| ArtifactError::Read { path: path.to_path_buf(), source })?;
        Self::from_json_str(&raw, path)
    }

    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn base_attributes(&self) -> BTreeSet<&str> {
        self.columns.iter().filter_map(FeatureColumn::attribute).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{FeatureColumn, FeatureSchema};
    use crate::errors::ArtifactError;

    #[test]
    fn legacy_names_split_at_first_separator() {
        assert_eq!(
            FeatureColumn::from_legacy_name("Processor_Intel Core i7"),
            FeatureColumn::categorical("Processor", "Intel Core i7")
        );
        assert_eq!(
            FeatureColumn::from_legacy_name("Memory_256GB_SSD"),
            FeatureColumn::categorical("Memory", "256GB_SSD")
        );
        assert_eq!(
            FeatureColumn::from_legacy_name("Inches"),
            FeatureColumn::Passthrough { name: "Inches".to_owned() }
        );
    }

    #[test]
    fn json_schema_accepts_mixed_legacy_and_pair_entries() {
        let raw = r#"[
            "RAM_8GB",
            {"attribute": "Op_Sys", "value": "Windows 10"},
            "Inches"
        ]"#;

        let schema = FeatureSchema::from_json_str(raw, Path::new("schema.json"))
            .expect("mixed schema should parse");

        assert_eq!(schema.len(), 3);
        assert_eq!(schema.columns()[1], FeatureColumn::categorical("Op_Sys", "Windows 10"));
        assert_eq!(schema.base_attributes().into_iter().collect::<Vec<_>>(), vec!["Op_Sys", "RAM"]);
    }

    #[test]
    fn empty_schema_is_rejected() {
        let error = FeatureSchema::from_json_str("[]", Path::new("schema.json"))
            .expect_err("empty schema must fail");

        assert!(matches!(error, ArtifactError::EmptySchema));
    }

    #[test]
    fn malformed_schema_reports_path() {
        let error = FeatureSchema::from_json_str("{\"not\": \"a list\"}", Path::new("cols.json"))
            .expect_err("object is not a schema");

        assert!(error.to_string().contains("cols.json"));
    }
}
