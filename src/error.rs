//! Error types for the gridscale application.
//!
//! Every failure the query engine can report is a distinct variant so the
//! serving layer can tell caller mistakes apart from startup or I/O failures.
//! A query that succeeds but finds no data is not an error; it is reported as
//! an absent value in the success payload.

use thiserror::Error;

/// The main error type for gridscale operations.
#[derive(Error, Debug)]
pub enum GridscaleError {
    /// The dataset could not be turned into a cell store
    #[error("Load error: {message}")]
    Load { message: String },

    /// Coordinate outside the domain of the grid
    #[error("Invalid coordinate: {message}")]
    InvalidCoordinate { message: String },

    /// Identifier the grid cannot decode
    #[error("Invalid identifier: {message}")]
    InvalidIdentifier { message: String },

    /// Point lies outside the bounding box of the loaded data
    #[error("Outside coverage area: lon={lon}, lat={lat}")]
    OutOfCoverage { lon: f64, lat: f64 },

    /// Identifier length does not match a served resolution
    #[error("Unsupported GID level: {level}. Use one of {supported:?}")]
    UnsupportedLevel { level: usize, supported: Vec<u8> },

    /// Invalid parameter errors
    #[error("Invalid parameter: {param} - {message}")]
    InvalidParameter { param: String, message: String },

    /// Polygon that cannot be used for area or polyfill
    #[error("Invalid polygon: {message}")]
    InvalidPolygon { message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parquet decoding errors
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Arrow array errors
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server errors
    #[error("Server error: {message}")]
    Server { message: String },
}

impl GridscaleError {
    /// Stable reason tag for structured error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            GridscaleError::Load { .. } => "load_error",
            GridscaleError::InvalidCoordinate { .. } => "invalid_coordinate",
            GridscaleError::InvalidIdentifier { .. } => "invalid_identifier",
            GridscaleError::OutOfCoverage { .. } => "out_of_coverage",
            GridscaleError::UnsupportedLevel { .. } => "unsupported_level",
            GridscaleError::InvalidParameter { .. } => "invalid_parameter",
            GridscaleError::InvalidPolygon { .. } => "invalid_polygon",
            GridscaleError::Config { .. } => "config_error",
            GridscaleError::Io(_) => "io_error",
            GridscaleError::Parquet(_) => "parquet_error",
            GridscaleError::Arrow(_) => "arrow_error",
            GridscaleError::Json(_) => "json_error",
            GridscaleError::Server { .. } => "server_error",
        }
    }

    /// Whether the error was caused by the caller's input rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            GridscaleError::InvalidCoordinate { .. }
                | GridscaleError::InvalidIdentifier { .. }
                | GridscaleError::OutOfCoverage { .. }
                | GridscaleError::UnsupportedLevel { .. }
                | GridscaleError::InvalidParameter { .. }
                | GridscaleError::InvalidPolygon { .. }
        )
    }
}

/// Convenience type alias for Results with GridscaleError
pub type Result<T> = std::result::Result<T, GridscaleError>;
