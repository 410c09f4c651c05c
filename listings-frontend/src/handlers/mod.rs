pub mod app;
pub mod auth;
pub mod listings;
pub mod metrics;
