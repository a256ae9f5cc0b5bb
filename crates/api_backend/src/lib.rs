//! Backend HTTP application served by the serverless entrypoint.
//!
//! The application owns its routes and lifecycle hooks; the entrypoint only
//! wraps [`app`] in an adapter. Keep platform concerns out of this crate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use api_serverless_core::{Application, ApplicationError, HttpRequest, HttpResponse};
use async_trait::async_trait;
use http::header::{ALLOW, CONTENT_TYPE};
use http::{Method, StatusCode};
use serde::Serialize;
use serde_json::json;

pub const SERVICE_NAME: &str = "api_backend";
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Root,
    Health,
    Echo,
}

impl Route {
    fn resolve(path: &str) -> Option<Self> {
        match path.trim_end_matches('/') {
            "" => Some(Self::Root),
            "/health" => Some(Self::Health),
            "/echo" => Some(Self::Echo),
            _ => None,
        }
    }

    fn allowed_method(self) -> Method {
        match self {
            Self::Root | Self::Health => Method::GET,
            Self::Echo => Method::POST,
        }
    }

    fn allow_header(self) -> http::HeaderValue {
        match self {
            Self::Root | Self::Health => http::HeaderValue::from_static("GET, HEAD"),
            Self::Echo => http::HeaderValue::from_static("POST"),
        }
    }
}

#[derive(Debug, Default)]
pub struct BackendApp {
    startup_calls: AtomicUsize,
    shutdown_calls: AtomicUsize,
}

impl BackendApp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn startup_calls(&self) -> usize {
        self.startup_calls.load(Ordering::SeqCst)
    }

    pub fn shutdown_calls(&self) -> usize {
        self.shutdown_calls.load(Ordering::SeqCst)
    }
}

/// Builds the application instance served by the entrypoint.
pub fn app() -> Arc<BackendApp> {
    Arc::new(BackendApp::new())
}

#[async_trait]
impl Application for BackendApp {
    async fn handle(&self, request: HttpRequest) -> Result<HttpResponse, ApplicationError> {
        let Some(route) = Route::resolve(request.uri().path()) else {
            return json_response(StatusCode::NOT_FOUND, &json!({"detail": "Not Found"}));
        };

        let allowed = route.allowed_method();
        let head_on_get = allowed == Method::GET && request.method() == Method::HEAD;
        if request.method() != allowed && !head_on_get {
            let mut response = json_response(
                StatusCode::METHOD_NOT_ALLOWED,
                &json!({"detail": "Method Not Allowed"}),
            )?;
            response.headers_mut().insert(ALLOW, route.allow_header());
            return Ok(response);
        }

        let mut response = match route {
            Route::Root => json_response(
                StatusCode::OK,
                &json!({"service": SERVICE_NAME, "version": SERVICE_VERSION}),
            ),
            Route::Health => json_response(StatusCode::OK, &json!({"status": "ok"})),
            Route::Echo => echo(request),
        }?;
        // HEAD answers with the GET headers and no body.
        if head_on_get {
            response.body_mut().clear();
        }
        Ok(response)
    }

    async fn startup(&self) -> Result<(), ApplicationError> {
        self.startup_calls.fetch_add(1, Ordering::SeqCst);
        tracing::info!(component = "backend", event = "startup");
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ApplicationError> {
        self.shutdown_calls.fetch_add(1, Ordering::SeqCst);
        tracing::info!(component = "backend", event = "shutdown");
        Ok(())
    }
}

fn echo(request: HttpRequest) -> Result<HttpResponse, ApplicationError> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| http::HeaderValue::from_static("application/octet-stream"));
    let body = request.into_body();

    http::Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .header("x-echo-length", body.len())
        .body(body)
        .map_err(|error| ApplicationError::new(format!("failed to build echo response: {error}")))
}

fn json_response(
    status: StatusCode,
    payload: &impl Serialize,
) -> Result<HttpResponse, ApplicationError> {
    let body = serde_json::to_vec(payload)
        .map_err(|error| ApplicationError::new(format!("failed to serialize response: {error}")))?;
    http::Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(body)
        .map_err(|error| ApplicationError::new(format!("failed to build response: {error}")))
}
