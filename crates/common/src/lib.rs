//! Common utilities and shared types for informes.
//!
//! This crate provides foundational components used across all informes crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based opaque record identifiers via [`IdGenerator`]
//!
//! # Example
//!
//! ```no_run
//! use informes_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     config.registry.validate()?;
//!     let id = IdGenerator::new().generate();
//!     assert_eq!(id.len(), 26);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;

pub use config::{AuthConfig, Config, RegistryConfig};
pub use error::{AppError, AppResult, FieldError, FieldErrors};
pub use id::IdGenerator;
