use async_trait::async_trait;

pub type HttpRequest = http::Request<Vec<u8>>;
pub type HttpResponse = http::Response<Vec<u8>>;

/// Error raised by an application while handling a request or running one
/// of its lifecycle hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationError {
    message: String,
}

impl ApplicationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ApplicationError {}

/// An HTTP application that can be served through an [`crate::Adapter`].
///
/// The lifecycle hooks mirror a framework's startup/shutdown sequence. They
/// default to no-ops so applications without lifecycle state only implement
/// [`Application::handle`].
#[async_trait]
pub trait Application: Send + Sync {
    async fn handle(&self, request: HttpRequest) -> Result<HttpResponse, ApplicationError>;

    async fn startup(&self) -> Result<(), ApplicationError> {
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ApplicationError> {
        Ok(())
    }

    /// Whether the application participates in the lifespan protocol at all.
    fn supports_lifespan(&self) -> bool {
        true
    }
}
