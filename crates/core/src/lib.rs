pub mod advisor;
pub mod budget;
pub mod catalog;
pub mod config;
pub mod encoder;
pub mod errors;
pub mod estimator;
pub mod schema;
pub mod service;

pub use advisor::{
    AdvisorRules, DowngradeAdvisor, DowngradeRule, Predicate, Suggestion, NO_SUGGESTIONS_MESSAGE,
};
pub use budget::BudgetOutcome;
pub use catalog::{Catalog, CatalogRecord};
pub use encoder::{EncodedVector, FeatureEncoder, MissingValuePolicy, UserSelection};
pub use errors::{ArtifactError, CatalogError, StartupError};
pub use estimator::{
    ForestPriceModel, LinearPriceModel, ModelArtifact, PriceEstimator, PriceModel,
};
pub use schema::{FeatureColumn, FeatureSchema};
pub use service::{Assessment, PredictionResult, PriceAdvisor};
