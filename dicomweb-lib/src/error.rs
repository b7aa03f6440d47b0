use segview_core::LoadError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("malformed JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ClientError {
    pub fn url(&self) -> &str {
        match self {
            Self::Http { url, .. } | Self::Status { url, .. } | Self::Decode { url, .. } => url,
        }
    }
}

impl From<ClientError> for LoadError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Http { url, source } => LoadError::Network { url, message: source.to_string() },
            ClientError::Status { url, status } => LoadError::Status { url, status },
            ClientError::Decode { url, source } => LoadError::Decode { url, message: source.to_string() },
        }
    }
}
