use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::schema::{FeatureColumn, FeatureSchema};

/// One chosen value per base attribute, built fresh for each request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserSelection(BTreeMap<String, String>);

impl UserSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(attribute, value);
        self
    }

    pub fn insert(&mut self, attribute: impl Into<String>, value: impl Into<String>) {
        self.0.insert(attribute.into(), value.into());
    }

    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.0.get(attribute).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(attribute, value)| (attribute.as_str(), value.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for UserSelection
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(attribute, value)| (attribute.into(), value.into())).collect())
    }
}

/// Dense 0/1 model input, slot `i` aligned with schema column `i`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EncodedVector(Vec<f64>);

impl EncodedVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn active_indices(&self) -> Vec<usize> {
        self.0.iter().enumerate().filter(|(_, slot)| **slot != 0.0).map(|(index, _)| index).collect()
    }
}

impl From<Vec<f64>> for EncodedVector {
    fn from(slots: Vec<f64>) -> Self {
        Self(slots)
    }
}

/// What to emit for schema slots whose attribute is missing from the selection
/// or whose value is not in the schema.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingValuePolicy {
    #[default]
    ZeroFill,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FeatureEncoder {
    policy: MissingValuePolicy,
}

impl FeatureEncoder {
    pub fn new(policy: MissingValuePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> MissingValuePolicy {
        self.policy
    }

    pub fn encode(&self, selection: &UserSelection, schema: &FeatureSchema) -> EncodedVector {
        let unmatched = match self.policy {
            MissingValuePolicy::ZeroFill => 0.0,
        };
        EncodedVector(
            schema
                .columns()
                .iter()
                .map(|column| match column {
                    FeatureColumn::Categorical { attribute, value } => {
                        if selection.get(attribute) == Some(value.as_str()) {
                            1.0
                        } else {
                            unmatched
                        }
                    }
                    FeatureColumn::Passthrough { .. } => unmatched,
                })
                .collect(),
        )
    }
}

pub fn encode(selection: &UserSelection, schema: &FeatureSchema) -> EncodedVector {
    FeatureEncoder::default().encode(selection, schema)
}
