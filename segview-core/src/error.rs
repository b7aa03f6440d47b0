use thiserror::Error;

/// Failures while fetching or interpreting study metadata.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("malformed response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("study {0} has no series")]
    NoSeries(String),

    #[error("series {0} has no instances")]
    EmptySeries(String),

    #[error("dataset is missing required tag {0}")]
    MissingTag(&'static str),
}

/// Failures reported by the external image engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("engine call `{op}` failed: {message}")]
    Call { op: &'static str, message: String },

    #[error("surface is not bound to the engine")]
    Unbound,
}

impl EngineError {
    pub fn call(op: &'static str, message: impl Into<String>) -> Self {
        EngineError::Call { op, message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid viewer configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("zoom limits out of order: min {min} > max {max}")]
    ZoomLimits { min: f64, max: f64 },
}
