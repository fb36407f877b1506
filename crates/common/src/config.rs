//! Application configuration.

use serde::Deserialize;
use std::path::Path;

use crate::{AppError, AppResult};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Identity verification configuration.
    pub auth: AuthConfig,
    /// Report registry configuration.
    #[serde(default)]
    pub registry: RegistryConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Identity token verification and allow-list bootstrap.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared secret used to verify identity tokens (HS256).
    pub jwt_secret: String,
    /// Expected `iss` claim.
    #[serde(default)]
    pub issuer: Option<String>,
    /// Expected `aud` claim.
    #[serde(default)]
    pub audience: Option<String>,
    /// Emails granted admin access at startup when missing from the directory.
    #[serde(default)]
    pub bootstrap_admins: Vec<String>,
}

/// Report numbering and form options.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// Leading part of every `nro_consulta`.
    #[serde(default = "default_report_prefix")]
    pub report_prefix: String,
    /// Zero-padding width of the sequence part.
    #[serde(default = "default_sequence_width")]
    pub sequence_width: usize,
    /// IANA timezone that decides the calendar year and export dates.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Offices a report can be referred to.
    #[serde(default = "default_referral_offices")]
    pub referral_offices: Vec<String>,
    /// Communication detail used for in-person reports left blank.
    #[serde(default = "default_on_site_label")]
    pub on_site_label: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            report_prefix: default_report_prefix(),
            sequence_width: default_sequence_width(),
            timezone: default_timezone(),
            referral_offices: default_referral_offices(),
            on_site_label: default_on_site_label(),
        }
    }
}

/// Longest accepted report prefix.
///
/// Report numbers are stored in 32-character columns; with a 10-digit
/// sequence and the year this leaves room for 16, so 10 keeps a margin.
pub const MAX_REPORT_PREFIX_LEN: usize = 10;

impl RegistryConfig {
    /// Reject settings that would produce malformed report numbers.
    pub fn validate(&self) -> AppResult<()> {
        if self.report_prefix.is_empty()
            || !self.report_prefix.chars().all(|c| c.is_ascii_uppercase())
        {
            return Err(AppError::Config(format!(
                "registry.report_prefix must be uppercase ASCII letters, got {:?}",
                self.report_prefix
            )));
        }
        if self.report_prefix.len() > MAX_REPORT_PREFIX_LEN {
            return Err(AppError::Config(format!(
                "registry.report_prefix must be at most {MAX_REPORT_PREFIX_LEN} letters, got {}",
                self.report_prefix.len()
            )));
        }
        if !(3..=8).contains(&self.sequence_width) {
            return Err(AppError::Config(format!(
                "registry.sequence_width must be between 3 and 8, got {}",
                self.sequence_width
            )));
        }
        if self.referral_offices.is_empty() {
            return Err(AppError::Config(
                "registry.referral_offices must list at least one office".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

fn default_report_prefix() -> String {
    "CEP".to_string()
}

const fn default_sequence_width() -> usize {
    4
}

fn default_timezone() -> String {
    "America/Lima".to_string()
}

fn default_referral_offices() -> Vec<String> {
    vec![
        "Informática CEPRUNSA".to_string(),
        "Supervisión Académica".to_string(),
    ]
}

fn default_on_site_label() -> String {
    "En sede".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `INFORMES_ENV`)
    /// 3. Environment variables with `INFORMES_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        // A missing .env file is normal outside local development.
        let _ = dotenvy::dotenv();
        let env = std::env::var("INFORMES_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("INFORMES")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("auth.bootstrap_admins")
                    .with_list_parse_key("registry.referral_offices")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("INFORMES")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
