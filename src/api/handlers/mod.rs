//! API request handlers.

/// Liveness endpoint.
pub mod health;
/// Report generation and email handlers.
pub mod reports;
