use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use api_backend::BackendApp;
use api_serverless_core::{Adapter, AdapterConfig, AdapterError, Application, LifespanMode};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntrypointError {
    #[error("failed to construct handler: {0}")]
    HandlerConstruction(#[source] AdapterError),
}

/// Looks up one adapter setting by variable name.
pub type ConfigLookup = fn(&str) -> Option<String>;

struct Loaded {
    app: Arc<BackendApp>,
    handler: Result<Adapter<BackendApp>, AdapterError>,
}

/// One-time cold-start state: the backend application and the adapter that
/// wraps it, resolved on first use and kept for the life of the process.
pub struct Entrypoint {
    lookup: ConfigLookup,
    loaded: OnceLock<Loaded>,
    load_count: AtomicUsize,
}

impl Entrypoint {
    pub const fn new(lookup: ConfigLookup) -> Self {
        Self {
            lookup,
            loaded: OnceLock::new(),
            load_count: AtomicUsize::new(0),
        }
    }

    fn load(&self) -> &Loaded {
        self.loaded.get_or_init(|| {
            self.load_count.fetch_add(1, Ordering::SeqCst);
            let app = api_backend::app();
            let handler = AdapterConfig::from_lookup(self.lookup)
                .and_then(|config| build_handler(Arc::clone(&app), config));

            match &handler {
                Ok(adapter) => tracing::info!(
                    component = "entrypoint",
                    event = "entrypoint_loaded",
                    lifespan = %adapter.lifespan(),
                    base_path = adapter.config().api_gateway_base_path.as_str(),
                ),
                Err(error) => tracing::error!(
                    component = "entrypoint",
                    event = "entrypoint_load_failed",
                    error = %error,
                ),
            }

            Loaded { app, handler }
        })
    }

    /// The adapter, built on first use. A construction failure is cached and
    /// returned on every call.
    pub fn handler(&self) -> Result<&Adapter<BackendApp>, EntrypointError> {
        self.load()
            .handler
            .as_ref()
            .map_err(|error| EntrypointError::HandlerConstruction(error.clone()))
    }

    /// The same application instance the handler wraps.
    pub fn app(&self) -> Arc<BackendApp> {
        Arc::clone(&self.load().app)
    }

    pub fn load_count(&self) -> usize {
        self.load_count.load(Ordering::SeqCst)
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

static ENTRYPOINT: Entrypoint = Entrypoint::new(env_var);

/// Handler convention: the platform looks this up first and calls it with
/// each request.
///
/// The adapter is built from the process environment on first use and reused
/// for every later invocation in the same process.
pub fn handler() -> Result<&'static Adapter<BackendApp>, EntrypointError> {
    ENTRYPOINT.handler()
}

/// Application convention: tooling that integrates with the application
/// directly (local serving, tests) takes the raw application instead of the
/// adapter. This is the same instance the handler wraps.
pub fn app() -> Arc<BackendApp> {
    ENTRYPOINT.app()
}

/// Wraps `app` for the serverless platform. Lifespan is always off: the
/// platform gives no startup/shutdown signal and may freeze the process
/// between invocations.
pub fn build_handler<A: Application + ?Sized>(
    app: Arc<A>,
    config: AdapterConfig,
) -> Result<Adapter<A>, AdapterError> {
    Adapter::new(app, config.with_lifespan(LifespanMode::Off))
}

/// How many times cold-start initialization has run in this process.
pub fn load_count() -> usize {
    ENTRYPOINT.load_count()
}

#[cfg(test)]
mod tests {
    use api_serverless_core::config::{BASE_PATH_ENV, LIFESPAN_ENV};

    use super::*;

    #[test]
    fn build_handler_forces_lifespan_off() {
        let config = AdapterConfig::default().with_lifespan(LifespanMode::On);
        let adapter = build_handler(api_backend::app(), config).expect("handler should build");
        assert_eq!(adapter.lifespan(), LifespanMode::Off);
    }

    #[test]
    fn build_handler_keeps_other_settings() {
        let config = AdapterConfig {
            api_gateway_base_path: "/api".to_string(),
            exclude_headers: vec!["server".to_string()],
            ..AdapterConfig::default()
        };
        let adapter = build_handler(api_backend::app(), config).expect("handler should build");
        assert_eq!(adapter.config().api_gateway_base_path, "/api");
        assert_eq!(adapter.config().exclude_headers, vec!["server".to_string()]);
    }

    #[test]
    fn build_handler_surfaces_config_errors() {
        let config = AdapterConfig {
            api_gateway_base_path: "api".to_string(),
            ..AdapterConfig::default()
        };
        let error = build_handler(api_backend::app(), config)
            .expect_err("invalid base path should fail");
        assert!(matches!(error, AdapterError::InvalidConfig(_)));
    }

    #[test]
    fn invalid_lifespan_fails_every_call_after_one_load() {
        let entrypoint =
            Entrypoint::new(|key| (key == LIFESPAN_ENV).then(|| "sometimes".to_string()));

        for _ in 0..3 {
            let error = entrypoint
                .handler()
                .expect_err("unknown lifespan should fail construction");
            assert!(matches!(
                error,
                EntrypointError::HandlerConstruction(AdapterError::InvalidConfig(_))
            ));
        }

        assert_eq!(entrypoint.load_count(), 1);
        assert!(Arc::ptr_eq(&entrypoint.app(), &entrypoint.app()));
        assert_eq!(entrypoint.load_count(), 1);
    }

    #[test]
    fn configured_entrypoint_applies_lookup_settings() {
        let entrypoint = Entrypoint::new(|key| match key {
            BASE_PATH_ENV => Some("/api".to_string()),
            LIFESPAN_ENV => Some("on".to_string()),
            _ => None,
        });

        let adapter = entrypoint.handler().expect("handler should build");

        assert_eq!(adapter.config().api_gateway_base_path, "/api");
        assert_eq!(adapter.lifespan(), LifespanMode::Off);
        assert!(Arc::ptr_eq(adapter.app(), &entrypoint.app()));
        assert_eq!(entrypoint.load_count(), 1);
    }
}
