//! Core business logic for the informes registry.
//!
//! Services here own the registry rules: who may enter (allow-list and
//! access guard), how reports are numbered and validated, and the one-shot
//! rating lock. The HTTP layer only translates requests into these calls.

pub mod services;

pub use services::*;
