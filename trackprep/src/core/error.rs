//! Error types for track preprocessing operations.

/// Result type for preprocessing operations
pub type PrepResult<T> = Result<T, PrepError>;

/// Error type for preprocessing operations
#[derive(Debug, thiserror::Error)]
pub enum PrepError {
    #[error("missing required column: {0}")]
    MissingColumn(String),

    #[error("column '{column}' has unexpected type: expected {expected}, got {actual}")]
    ColumnType {
        column: String,
        expected: String,
        actual: String,
    },

    #[error("invalid timestamp '{value}' at row {row}: {source}")]
    Timestamp {
        row: usize,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("null timestamp at row {row}")]
    NullTimestamp { row: usize },

    #[error("epoch seconds {0} out of datetime range")]
    EpochRange(f64),

    #[error("track '{0}' not found")]
    TrackNotFound(String),

    #[error("track '{track_id}' cannot be resampled: {reason}")]
    DegenerateTrack { track_id: String, reason: String },

    #[error("interpolation requires at least 2 points, got {0}")]
    TooFewPoints(usize),

    #[error("interpolation parameter is not strictly increasing at index {0}")]
    NonMonotonicParameter(usize),

    #[error("interpolation input lengths differ: {xs} x-values vs {ys} y-values")]
    LengthMismatch { xs: usize, ys: usize },

    #[error("invalid geometry object at record {row}")]
    Geometry { row: usize },

    #[error("record {row} is not a JSON object")]
    Record { row: usize },

    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Polars(#[from] polars::error::PolarsError),
}
