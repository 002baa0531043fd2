//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`albums`] — Album job submission and polling
//! - [`system`] — Metadata probe, health, OpenAPI

mod albums;
mod system;

// Re-export all handlers so `routes::function_name` continues to work
pub use albums::*;
pub use system::*;
