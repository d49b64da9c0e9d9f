//! Webhook intake server for work-item callbacks.
//!
//! Exposes the callback routes and configuration so integration tests
//! and the binary entrypoint can both access them.

pub mod config;
pub mod routes;

pub use config::IntakeConfig;
pub use routes::router;
