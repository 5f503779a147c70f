use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("csv error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("column '{column}' not found in {path} (headers: {headers})")]
    MissingColumn {
        column: String,
        path: String,
        headers: String,
    },
    #[error("{path} has no header row")]
    Empty { path: String },
}

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("invalid value for {name}: {value} (must be within 0.0..=1.0)")]
    InvalidThreshold { name: &'static str, value: f64 },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv export error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json export error: {0}")]
    Json(#[from] serde_json::Error),
}
