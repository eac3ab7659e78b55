//! API Module
//!
//! HTTP handlers and routing for the cache admin REST API.
//!
//! # Endpoints
//! - `PUT /cache/:namespace/:key` - Store a value
//! - `GET /cache/:namespace/:key` - Retrieve a value
//! - `DELETE /cache/:namespace/:key` - Delete a key
//! - `DELETE /cache/:namespace` - Clear one namespace
//! - `DELETE /cache` - Clear every namespace
//! - `GET /stats` - Statistics for all namespaces
//! - `GET /stats/:namespace` - Statistics for one namespace
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
