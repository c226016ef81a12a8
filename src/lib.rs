//! Library root for the `trqp_registry` crate

// Core error handling
pub mod api_errors;
pub mod errors;

// JSON Canonicalization Scheme (RFC 8785)
pub mod canonicalize;

// Identifiers
pub mod did_peer;

// Trust graph and query evaluation
pub mod evaluator;
pub mod model;
pub mod trust_graph;

// Signed responses
pub mod attestation;
pub mod composer;

// Configuration & CLI
pub mod cli;
pub mod config_loader;
pub mod registry_loader;

// Web server interface
pub mod admin_web;
pub mod app_state;
pub mod trqp_web;

// Logging
pub mod logging;

pub use app_state::AppState;
pub use errors::{RegistryError, RegistryResult};
