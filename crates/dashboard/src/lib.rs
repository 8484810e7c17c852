//! Headless deployment-risk dashboard
//!
//! Runs the sync scheduler in the background and exposes its state, health
//! and Prometheus metrics over HTTP.

pub mod api;
pub mod config;
