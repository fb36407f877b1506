//! HTTP API layer for the informes registry.
//!
//! - **Middleware**: per-request identity check against the allow-list
//! - **Extractors**: authorized user and admin guards
//! - **Endpoints**: reports, ratings, export rows, and directory administration
//!
//! Every endpoint is a `POST` taking and returning camelCase JSON.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
