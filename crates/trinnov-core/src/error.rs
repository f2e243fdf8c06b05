use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Missing configuration key: {0}")]
    MissingField(String),

    #[error("Invalid MAC address '{value}': {reason}")]
    InvalidMacAddress { value: String, reason: String },

    #[error("No platform block named '{0}' in configuration")]
    PlatformNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Device context errors
    #[error("Accessory context has no device descriptor")]
    MissingDevice,

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
