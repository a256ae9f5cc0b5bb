use thiserror::Error;

use crate::application::ApplicationError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    #[error("invalid adapter configuration: {0}")]
    InvalidConfig(String),
    #[error("lifespan failure: {0}")]
    Lifespan(String),
    #[error(transparent)]
    Application(#[from] ApplicationError),
}

impl AdapterError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRequest(message.into())
    }
}
