//! flowdoc-core
//!
//! Core library for turning a single source file into structured unit records
//! and flowchart diagrams.
//!
//! The pipeline is: detect the language, ask a unit source (deterministic mock
//! or an external generator) for candidate unit records, normalize those
//! untrusted records into schema-valid units, then classify and render each
//! unit as a diagram.
//!
//! All substantive logic lives here so it is fully testable and reusable from
//! multiple frontends (CLI, web service, etc.).

pub mod config;
pub mod detect;
pub mod diagram;
pub mod model;
pub mod normalize;
pub mod schema;
pub mod services;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
