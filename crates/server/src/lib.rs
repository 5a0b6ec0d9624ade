//! Price estimator HTTP server

pub mod api;
pub mod config;
