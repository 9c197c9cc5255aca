use obsnav_protocol::ObjectId;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NavigatorError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server responded {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("index {index} is out of range for the current result set")]
    OutOfRange { index: usize },

    #[error("event stream error: {0}")]
    Stream(String),

    #[error("record not found: {0}")]
    NotFound(ObjectId),

    #[error("Serialization error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl NavigatorError {
    /// The result set shrank underneath a positional lookup.
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, NavigatorError::OutOfRange { .. })
    }
}

pub type Result<T> = std::result::Result<T, NavigatorError>;
