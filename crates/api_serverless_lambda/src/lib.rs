//! Lambda entrypoint for the API backend.
//!
//! This crate owns the process-level wiring: it resolves the backend
//! application once per cold start, wraps it in an adapter with lifespan
//! hooks disabled, and exposes both under their caller conventions.
//! Platform events are parsed by `lambda_http`; [`platform`] converts its
//! request and response types to the adapter's.

pub mod entrypoint;
pub mod platform;
