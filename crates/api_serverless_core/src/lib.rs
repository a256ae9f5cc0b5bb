//! Adapter primitives for serving an HTTP application from a serverless
//! function platform.
//!
//! This crate owns the application contract, lifespan sequencing, and the
//! request/response adjustments the adapter applies around the application
//! (base path, excluded headers, text vs binary bodies). Translating platform
//! events to and from HTTP is left to the runtime integration crate.

pub mod adapter;
pub mod application;
pub mod config;
pub mod error;
pub mod lifespan;

pub use adapter::{replace_uri_path, Adapter};
pub use application::{Application, ApplicationError, HttpRequest, HttpResponse};
pub use config::AdapterConfig;
pub use error::AdapterError;
pub use lifespan::LifespanMode;
