use thiserror::Error;

/// Request rejected before it reaches the evaluator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("field {field} is not a number: {value:?}")]
    NotANumber { field: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum EcoWoodError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Evaluation failed: {0}")]
    Evaluation(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, EcoWoodError>;
