//! HTTP API Handlers and Routes
//!
//! REST layer over [`ReportService`](crate::service::ReportService), built on
//! the Axum web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # API Endpoints
//!
//! ## Reports (`/api/reports`)
//! - `POST /api/reports` - Run the pipeline for `{ "company": "..." }`
//! - `POST /api/reports/{run_id}/email` - Email the rendered document of a run
//!
//! ## Health (`/api/health`)
//! - `GET /api/health` - Health check endpoint
//!
//! Errors are returned as `{ "error": "..." }` with a status derived from
//! [`AppError`](crate::types::AppError).

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;
