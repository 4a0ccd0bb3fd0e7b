use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("No forecast data in collections '{count_collection}' and '{value_collection}'")]
    EmptyForecast {
        count_collection: String,
        value_collection: String,
    },

    #[error("Could not clear collection '{collection}', existing data kept: {source}")]
    ReplaceAborted {
        collection: String,
        source: anyhow::Error,
    },

    #[error("Replacing '{collection}' stopped after {inserted} of {total} records: {source}")]
    PartialReplace {
        collection: String,
        inserted: u64,
        total: u64,
        source: anyhow::Error,
    },

    #[error("Storage failure: {0}")]
    Storage(#[from] anyhow::Error),
}
