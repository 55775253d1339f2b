//! Error types for the PASS CLI

use pass_client::model::{EntityType, UnknownEntityType};
use pass_client::PassClientError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// The repository has no such object
    #[error("{entity_type} '{id}' not found. Check the id, or list candidates with 'pass select {entity_type}'.")]
    NotFound { entity_type: EntityType, id: String },

    #[error(transparent)]
    Client(PassClientError),

    #[error("Configuration error: {0}. Check --url/--user/--password or the PASS_CORE_* environment variables.")]
    Config(#[from] pass_common::CommonError),

    #[error("{0}. Known types: {known}", known = known_types())]
    UnknownType(#[from] UnknownEntityType),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    pub fn not_found(entity_type: EntityType, id: impl Into<String>) -> Self {
        Self::NotFound { entity_type, id: id.into() }
    }
}

impl From<PassClientError> for CliError {
    fn from(err: PassClientError) -> Self {
        match err {
            PassClientError::Config(err) => Self::Config(err),
            other => Self::Client(other),
        }
    }
}

fn known_types() -> String {
    EntityType::ALL
        .iter()
        .map(|ty| ty.json_type())
        .collect::<Vec<_>>()
        .join(", ")
}
