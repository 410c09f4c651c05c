//! service-core: shared HTTP plumbing for the listings front end.
//!
//! Tracing/OTLP setup, outgoing trace-context propagation, and the axum
//! middleware stack (request ids, request metrics, security headers).
pub mod middleware;
pub mod observability;
