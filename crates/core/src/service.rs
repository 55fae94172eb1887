use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::advisor::{AdvisorRules, DowngradeAdvisor, Suggestion};
use crate::budget::BudgetOutcome;
use crate::catalog::Catalog;
use crate::config::AppConfig;
use crate::encoder::{FeatureEncoder, MissingValuePolicy, UserSelection};
use crate::errors::{ArtifactError, StartupError};
use crate::estimator::{ModelArtifact, PriceEstimator, PriceModel};
use crate::schema::FeatureSchema;

/// Unmodified model output for one selection.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub price: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub prediction: PredictionResult,
    pub budget: f64,
    pub outcome: BudgetOutcome,
}

/// Read-only pricing core shared by every request.
pub struct PriceAdvisor<M = ModelArtifact> {
    catalog: Catalog,
    schema: FeatureSchema,
    encoder: FeatureEncoder,
    estimator: PriceEstimator<M>,
    advisor: DowngradeAdvisor,
}

impl PriceAdvisor<ModelArtifact> {
    /// Loads every startup artifact named by `config`. Any failure is fatal.
    pub fn load(config: &AppConfig) -> Result<Self, StartupError> {
        let artifacts = &config.artifacts;

        let catalog = Catalog::from_csv_path(&artifacts.catalog_path, &artifacts.price_column)?;
        info!(
            event_name = "system.startup.catalog_loaded",
            path = %artifacts.catalog_path.display(),
            records = catalog.len(),
            "catalog loaded"
        );

        let schema = FeatureSchema::from_json_path(&artifacts.schema_path)?;
        let model = ModelArtifact::from_json_path(&artifacts.model_path)?;
        info!(
            event_name = "system.startup.model_loaded",
            model_version = %model.version,
            schema_len = schema.len(),
            model_dim = model.input_dim(),
            "model and feature schema loaded"
        );

        let advisor = Self::new(catalog, schema, model, config.advisor.advisor_rules())?;
        Ok(advisor)
    }
}

impl<M> PriceAdvisor<M>
where
    M: PriceModel,
{
    pub fn new(
        catalog: Catalog,
        schema: FeatureSchema,
        model: M,
        rules: AdvisorRules,
    ) -> Result<Self, ArtifactError> {
        let estimator = PriceEstimator::new(model, &schema)?;
        Ok(Self {
            catalog,
            schema,
            encoder: FeatureEncoder::new(MissingValuePolicy::ZeroFill),
            estimator,
            advisor: DowngradeAdvisor::new(rules),
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn model(&self) -> &M {
        self.estimator.model()
    }

    /// Selectable values per schema attribute. Attributes the catalog never
    /// carries are left out.
    pub fn attribute_domains(&self) -> BTreeMap<String, Vec<String>> {
        let mut domains = BTreeMap::new();
        for attribute in self.schema.base_attributes() {
            match self.catalog.attribute_domain(attribute) {
                Some(values) => {
                    domains.insert(attribute.to_owned(), values);
                }
                None => debug!(
                    event_name = "pricing.domain.attribute_absent",
                    attribute,
                    "schema attribute not present in catalog"
                ),
            }
        }
        domains
    }

    pub fn predict_price(&self, selection: &UserSelection) -> PredictionResult {
        let vector = self.encoder.encode(selection, &self.schema);
        let price = self.estimator.estimate(&vector);
        info!(
            event_name = "pricing.estimate_computed",
            price,
            selected_attributes = selection.len(),
            matched_features = vector.active_indices().len(),
            "price estimate computed"
        );
        PredictionResult { price }
    }

    pub fn assess(&self, selection: &UserSelection, budget: f64) -> Assessment {
        let prediction = self.predict_price(selection);
        let outcome = BudgetOutcome::compare(prediction.price, budget);
        info!(
            event_name = "pricing.budget_compared",
            price = prediction.price,
            budget,
            outcome = ?outcome,
            "budget comparison completed"
        );
        Assessment { prediction, budget, outcome }
    }

    pub fn suggest_downgrades(&self, selection: &UserSelection) -> Vec<Suggestion> {
        let suggestions = self.advisor.suggest(selection, &self.catalog);
        info!(
            event_name = "advisor.suggestions_generated",
            count = suggestions.len(),
            "downgrade suggestions generated"
        );
        suggestions
    }
}
