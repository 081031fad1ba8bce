use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum BridgeError {
    #[error("eLights API unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("eLights API rejected write for {id} (HTTP {status})")]
    RemoteRejected { id: String, status: u16 },

    #[error("Invalid value {value} for {id}")]
    InvalidValue { id: String, value: String },

    #[error("Unknown component: {0}")]
    UnknownComponent(String),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
}

impl BridgeError {
    pub(crate) fn invalid_value(id: &str, value: impl std::fmt::Display) -> Self {
        Self::InvalidValue {
            id: id.to_string(),
            value: value.to_string(),
        }
    }
}

impl From<reqwest::Error> for BridgeError {
    fn from(err: reqwest::Error) -> Self {
        // Timeouts, refused connections and undecodable bodies all mean the
        // remote could not give us a usable answer.
        Self::RemoteUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
