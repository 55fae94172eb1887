//! Price estimation boundary.
//!
//! The trained model is opaque to the rest of the crate: it is a function from
//! an [`EncodedVector`] to a scalar price with a fixed input width. Two artifact
//! shapes are understood, a linear model and a tree ensemble, both stored as
//! JSON next to the feature schema they were trained with.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::encoder::EncodedVector;
use crate::errors::ArtifactError;
use crate::schema::FeatureSchema;

pub trait PriceModel: Send + Sync {
    /// Number of input slots the model was trained on.
    fn input_dim(&self) -> usize;
    fn estimate(&self, vector: &EncodedVector) -> f64;

    /// Structural check run once before the model serves requests.
    fn validate(&self) -> Result<(), ArtifactError> {
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearPriceModel {
    pub intercept: f64,
    pub weights: Vec<f64>,
}

impl PriceModel for LinearPriceModel {
    fn input_dim(&self) -> usize {
        self.weights.len()
    }

    fn estimate(&self, vector: &EncodedVector) -> f64 {
        self.intercept
            + self.weights.iter().zip(vector.as_slice()).map(|(weight, slot)| weight * slot).sum::<f64>()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "node")]
pub enum TreeNode {
    /// Goes `left` when `vector[feature] <= threshold`.
    Split { feature: usize, threshold: f64, left: usize, right: usize },
    Leaf { value: f64 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
}

impl RegressionTree {
    pub fn new(nodes: Vec<TreeNode>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (index, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split { feature, left, right, .. } = *node {
                if feature >= n_features {
                    return Err(format!(
                        "node {index} splits on feature {feature} but the model has {n_features}"
                    ));
                }
                // Children after parents keeps traversal finite.
                for child in [left, right] {
                    if child <= index || child >= self.nodes.len() {
                        return Err(format!("node {index} has out-of-order child {child}"));
                    }
                }
            }
        }
        Ok(())
    }

    /// Walks a validated tree. A dangling index yields NaN instead of panicking.
    fn predict(&self, slots: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { value }) => return *value,
                Some(TreeNode::Split { feature, threshold, left, right }) => {
                    let slot = slots.get(*feature).copied().unwrap_or(0.0);
                    index = if slot <= *threshold { *left } else { *right };
                }
                None => return f64::NAN,
            }
        }
    }
}

/// Mean of the member trees' outputs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForestPriceModel {
    n_features: usize,
    trees: Vec<RegressionTree>,
}

impl ForestPriceModel {
    pub fn new(n_features: usize, trees: Vec<RegressionTree>) -> Result<Self, ArtifactError> {
        let forest = Self { n_features, trees };
        forest.validate()?;
        Ok(forest)
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }
}

impl PriceModel for ForestPriceModel {
    fn input_dim(&self) -> usize {
        self.n_features
    }

    fn estimate(&self, vector: &EncodedVector) -> f64 {
        if self.trees.is_empty() {
            return f64::NAN;
        }
        let total: f64 = self.trees.iter().map(|tree| tree.predict(vector.as_slice())).sum();
        total / self.trees.len() as f64
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        if self.trees.is_empty() {
            return Err(ArtifactError::MalformedModel("forest has no trees".to_string()));
        }
        for (index, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features)
                .map_err(|reason| ArtifactError::MalformedModel(format!("tree {index}: {reason}")))?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ModelKind {
    Linear(LinearPriceModel),
    Forest(ForestPriceModel),
}

/// On-disk model artifact produced by the training pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: String,
    #[serde(default)]
    pub trained_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub model: ModelKind,
}

impl ModelArtifact {
    pub fn from_json_str(raw: &str, path: &Path) -> Result<Self, ArtifactError> {
        let artifact: Self = serde_json::from_str(raw)
            .map_err(|source| ArtifactError::Parse { path: path.to_path_buf(), source })?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn from_json_path(path: &Path) -> Result<Self, ArtifactError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| ArtifactError::Read { path: path.to_path_buf(), source })?;
        Self::from_json_str(&raw, path)
    }
}

impl PriceModel for ModelArtifact {
    fn input_dim(&self) -> usize {
        match &self.model {
            ModelKind::Linear(model) => model.input_dim(),
            ModelKind::Forest(model) => model.input_dim(),
        }
    }

    fn estimate(&self, vector: &EncodedVector) -> f64 {
        match &self.model {
            ModelKind::Linear(model) => model.estimate(vector),
            ModelKind::Forest(model) => model.estimate(vector),
        }
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        match &self.model {
            ModelKind::Linear(model) => model.validate(),
            ModelKind::Forest(model) => model.validate(),
        }
    }
}

/// A model whose input width has been checked against the feature schema.
pub struct PriceEstimator<M> {
    model: M,
}

impl<M> PriceEstimator<M>
where
    M: PriceModel,
{
    /// Rejects structurally broken models and width mismatches.
    pub fn new(model: M, schema: &FeatureSchema) -> Result<Self, ArtifactError> {
        model.validate()?;
        if model.input_dim() != schema.len() {
            return Err(ArtifactError::SchemaMismatch {
                model_dim: model.input_dim(),
                schema_len: schema.len(),
            });
        }
        Ok(Self { model })
    }

    pub fn estimate(&self, vector: &EncodedVector) -> f64 {
        self.model.estimate(vector)
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}
