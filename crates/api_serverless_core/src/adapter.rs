use std::sync::Arc;

use http::uri::{PathAndQuery, Uri};

use crate::application::{Application, HttpRequest, HttpResponse};
use crate::config::AdapterConfig;
use crate::error::AdapterError;
use crate::lifespan::{run_with_lifespan, LifespanMode};

/// Serves an [`Application`] behind a serverless HTTP trigger. Platform
/// event parsing belongs to the runtime crate; the adapter only strips the
/// configured base path, applies the lifespan mode, and drops excluded
/// response headers.
pub struct Adapter<A: ?Sized> {
    app: Arc<A>,
    config: AdapterConfig,
}

impl<A: Application + ?Sized> Adapter<A> {
    pub fn new(app: Arc<A>, config: AdapterConfig) -> Result<Self, AdapterError> {
        config.validate()?;
        Ok(Self { app, config })
    }

    pub fn app(&self) -> &Arc<A> {
        &self.app
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn lifespan(&self) -> LifespanMode {
        self.config.lifespan
    }

    pub async fn handle(&self, request: HttpRequest) -> Result<HttpResponse, AdapterError> {
        let request = self.strip_base_path(request)?;
        tracing::debug!(
            component = "adapter",
            event = "request_received",
            method = %request.method(),
            path = request.uri().path(),
        );

        let app = self.app.as_ref();
        let mut response = run_with_lifespan(self.config.lifespan, app, move || async move {
            app.handle(request).await.map_err(AdapterError::from)
        })
        .await?;

        if !self.config.exclude_headers.is_empty() {
            let excluded: Vec<_> = response
                .headers()
                .keys()
                .filter(|name| self.config.is_excluded_header(name.as_str()))
                .cloned()
                .collect();
            for name in excluded {
                response.headers_mut().remove(name);
            }
        }

        Ok(response)
    }

    fn strip_base_path(&self, request: HttpRequest) -> Result<HttpRequest, AdapterError> {
        let base = self.config.api_gateway_base_path.trim_end_matches('/');
        if base.is_empty() {
            return Ok(request);
        }

        let stripped = match request.uri().path().strip_prefix(base) {
            Some("") => "/".to_string(),
            Some(rest) if rest.starts_with('/') => rest.to_string(),
            _ => return Ok(request),
        };
        replace_uri_path(request, &stripped)
    }
}

impl<A: ?Sized> std::fmt::Debug for Adapter<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Swaps the request's URI path, keeping the query string. `path` must
/// already be percent-encoded.
pub fn replace_uri_path<B>(
    request: http::Request<B>,
    path: &str,
) -> Result<http::Request<B>, AdapterError> {
    let (mut parts, body) = request.into_parts();
    let path_and_query = match parts.uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    };

    let mut uri_parts = parts.uri.into_parts();
    uri_parts.path_and_query = Some(
        PathAndQuery::try_from(path_and_query)
            .map_err(|error| AdapterError::malformed(format!("invalid path: {error}")))?,
    );
    parts.uri = Uri::from_parts(uri_parts)
        .map_err(|error| AdapterError::malformed(format!("invalid uri: {error}")))?;

    Ok(http::Request::from_parts(parts, body))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::application::ApplicationError;

    struct RecordingApp {
        seen: Mutex<Vec<String>>,
        hook_calls: AtomicUsize,
        fail_with: Option<&'static str>,
    }

    impl RecordingApp {
        fn new() -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                hook_calls: AtomicUsize::new(0),
                fail_with: None,
            }
        }

        fn seen(&self) -> Vec<String> {
            self.seen.lock().expect("poisoned mutex").clone()
        }
    }

    #[async_trait]
    impl Application for RecordingApp {
        async fn handle(&self, request: HttpRequest) -> Result<HttpResponse, ApplicationError> {
            self.seen
                .lock()
                .expect("poisoned mutex")
                .push(format!("{} {}", request.method(), request.uri()));
            if let Some(message) = self.fail_with {
                return Err(ApplicationError::new(message));
            }
            http::Response::builder()
                .status(200)
                .header("content-type", "application/json")
                .header("x-powered-by", "backend")
                .header("server", "backend")
                .body(br#"{"status":"ok"}"#.to_vec())
                .map_err(|error| ApplicationError::new(error.to_string()))
        }

        async fn startup(&self) -> Result<(), ApplicationError> {
            self.hook_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn shutdown(&self) -> Result<(), ApplicationError> {
            self.hook_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn lifespan_off() -> AdapterConfig {
        AdapterConfig::default().with_lifespan(LifespanMode::Off)
    }

    fn get(uri: &str) -> HttpRequest {
        http::Request::builder()
            .method("GET")
            .uri(uri)
            .body(Vec::new())
            .expect("request should build")
    }

    #[tokio::test]
    async fn passes_request_through_to_the_application() {
        let app = Arc::new(RecordingApp::new());
        let adapter = Adapter::new(app.clone(), lifespan_off()).expect("adapter should build");

        let response = adapter
            .handle(get("/health"))
            .await
            .expect("request should be handled");

        assert_eq!(response.status(), 200);
        assert_eq!(response.body().as_slice(), br#"{"status":"ok"}"#);
        assert_eq!(response.headers()["x-powered-by"], "backend");
        assert_eq!(app.seen(), vec!["GET /health".to_string()]);
    }

    #[tokio::test]
    async fn strips_base_path_and_keeps_encoding_and_query() {
        let app = Arc::new(RecordingApp::new());
        let config = AdapterConfig {
            api_gateway_base_path: "/api/".to_string(),
            ..lifespan_off()
        };
        let adapter = Adapter::new(app.clone(), config).expect("adapter should build");

        for uri in ["/api/files/a%2520b?x=1", "/api", "/apiary"] {
            adapter.handle(get(uri)).await.expect("request should be handled");
        }

        assert_eq!(
            app.seen(),
            vec![
                "GET /files/a%2520b?x=1".to_string(),
                "GET /".to_string(),
                "GET /apiary".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn removes_excluded_response_headers() {
        let config = AdapterConfig {
            exclude_headers: vec!["X-Powered-By".to_string(), "server".to_string()],
            ..lifespan_off()
        };
        let adapter =
            Adapter::new(Arc::new(RecordingApp::new()), config).expect("adapter should build");

        let response = adapter
            .handle(get("/health"))
            .await
            .expect("request should be handled");

        assert!(response.headers().get("x-powered-by").is_none());
        assert!(response.headers().get("server").is_none());
        assert_eq!(response.headers()["content-type"], "application/json");
    }

    #[tokio::test]
    async fn lifespan_off_skips_hooks_across_invocations() {
        let app = Arc::new(RecordingApp::new());
        let adapter = Adapter::new(app.clone(), lifespan_off()).expect("adapter should build");

        for _ in 0..5 {
            adapter
                .handle(get("/health"))
                .await
                .expect("request should be handled");
        }

        assert_eq!(app.hook_calls.load(Ordering::SeqCst), 0);
        assert_eq!(app.seen().len(), 5);
    }

    #[tokio::test]
    async fn lifespan_auto_runs_hooks_per_invocation() {
        let app = Arc::new(RecordingApp::new());
        let adapter =
            Adapter::new(app.clone(), AdapterConfig::default()).expect("adapter should build");

        adapter
            .handle(get("/health"))
            .await
            .expect("request should be handled");

        assert_eq!(app.hook_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn application_errors_propagate_unchanged() {
        let mut app = RecordingApp::new();
        app.fail_with = Some("model not loaded");
        let adapter = Adapter::new(Arc::new(app), lifespan_off()).expect("adapter should build");

        let error = adapter
            .handle(get("/health"))
            .await
            .expect_err("application error should propagate");

        assert_eq!(
            error,
            AdapterError::Application(ApplicationError::new("model not loaded"))
        );
    }

    #[test]
    fn replace_uri_path_keeps_query() {
        let request = replace_uri_path(get("/old/path?a=1&b=%20"), "/new/a%20b")
            .expect("path should be replaced");
        assert_eq!(request.uri().path(), "/new/a%20b");
        assert_eq!(request.uri().query(), Some("a=1&b=%20"));
    }

    #[test]
    fn rejects_invalid_config() {
        let config = AdapterConfig {
            api_gateway_base_path: "api".to_string(),
            ..AdapterConfig::default()
        };
        let error = Adapter::new(Arc::new(RecordingApp::new()), config)
            .expect_err("relative base path should be rejected");
        assert!(matches!(error, AdapterError::InvalidConfig(_)));
    }
}
