use std::fmt;
use std::future::Future;
use std::str::FromStr;

use crate::application::Application;
use crate::error::AdapterError;

/// How the adapter drives an application's startup/shutdown hooks around an
/// invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LifespanMode {
    /// Run hooks when the application supports them; hook failures are
    /// logged and ignored.
    #[default]
    Auto,
    /// Run hooks and treat any failure as fatal for the invocation.
    On,
    /// Never run hooks.
    Off,
}

impl LifespanMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::On => "on",
            Self::Off => "off",
        }
    }
}

impl fmt::Display for LifespanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifespanMode {
    type Err = AdapterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            other => Err(AdapterError::InvalidConfig(format!(
                "lifespan must be one of auto, on, off (got '{other}')"
            ))),
        }
    }
}

/// Runs `invocation` wrapped in the application's lifecycle hooks according
/// to `mode`.
///
/// Shutdown runs even when the invocation fails. A shutdown failure only
/// replaces a successful result in [`LifespanMode::On`].
pub async fn run_with_lifespan<A, F, Fut, T>(
    mode: LifespanMode,
    app: &A,
    invocation: F,
) -> Result<T, AdapterError>
where
    A: Application + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, AdapterError>>,
{
    let hooks_enabled = match mode {
        LifespanMode::Off => false,
        LifespanMode::Auto => app.supports_lifespan(),
        LifespanMode::On => {
            if !app.supports_lifespan() {
                return Err(AdapterError::Lifespan(
                    "lifespan is 'on' but the application does not support it".to_string(),
                ));
            }
            true
        }
    };

    if !hooks_enabled {
        return invocation().await;
    }

    if let Err(error) = app.startup().await {
        if mode == LifespanMode::On {
            return Err(AdapterError::Lifespan(format!("startup failed: {error}")));
        }
        tracing::warn!(component = "lifespan", event = "startup_failed", error = %error);
    }

    let result = invocation().await;

    match app.shutdown().await {
        Ok(()) => result,
        Err(error) if mode == LifespanMode::On && result.is_ok() => {
            Err(AdapterError::Lifespan(format!("shutdown failed: {error}")))
        }
        Err(error) => {
            tracing::warn!(component = "lifespan", event = "shutdown_failed", error = %error);
            result
        }
    }
}
