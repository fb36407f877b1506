//! Report numbering.
//!
//! Numbers look like `CEP-0042-2025`: prefix, a per-year sequence padded to
//! the configured width, and the calendar year in the registry timezone.
//! Sequences come from an atomic per-year counter, so concurrent creators
//! never share a number.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use informes_common::{AppError, AppResult, RegistryConfig};
use informes_db::repositories::{ReportCounterRepository, ReportRepository};
use mockable::Clock;
use tracing::{debug, warn};

use super::{SharedClock, parse_timezone};

/// A human-readable report number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportNumber {
    prefix: String,
    seq: u32,
    year: i32,
    width: usize,
}

impl ReportNumber {
    /// Build a number from its parts.
    #[must_use]
    pub fn new(prefix: impl Into<String>, seq: u32, year: i32, width: usize) -> Self {
        Self {
            prefix: prefix.into(),
            seq,
            year,
            width,
        }
    }

    /// Registry prefix, e.g. `CEP`.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Sequence within the year.
    #[must_use]
    pub const fn seq(&self) -> u32 {
        self.seq
    }

    /// Calendar year the sequence belongs to.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }
}

impl fmt::Display for ReportNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{:0width$}-{}",
            self.prefix,
            self.seq,
            self.year,
            width = self.width
        )
    }
}

impl FromStr for ReportNumber {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::BadRequest(format!("Invalid report number: {s}"));

        let mut parts = s.split('-');
        let (Some(prefix), Some(seq), Some(year), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(invalid());
        }
        if seq.is_empty() || !seq.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        Ok(Self {
            prefix: prefix.to_string(),
            seq: seq.parse().map_err(|_| invalid())?,
            year: year.parse().map_err(|_| invalid())?,
            width: seq.len(),
        })
    }
}

/// Sequence derived from the clock, used only when the counter is unreachable.
#[must_use]
pub fn fallback_sequence(now: DateTime<Utc>, width: usize) -> u32 {
    let modulus = 10_i64.pow(width as u32);
    (now.timestamp_millis().rem_euclid(modulus) as u32).max(1)
}

/// Assigns report numbers.
#[derive(Clone)]
pub struct NumberingService {
    reports: ReportRepository,
    counters: ReportCounterRepository,
    clock: SharedClock,
    tz: Tz,
    prefix: String,
    width: usize,
}

impl NumberingService {
    /// Create a numbering service from the registry settings.
    pub fn new(
        reports: ReportRepository,
        counters: ReportCounterRepository,
        clock: SharedClock,
        registry: &RegistryConfig,
    ) -> AppResult<Self> {
        registry.validate()?;
        Ok(Self {
            reports,
            counters,
            clock,
            tz: parse_timezone(&registry.timezone)?,
            prefix: registry.report_prefix.clone(),
            width: registry.sequence_width,
        })
    }

    /// Calendar year "now" in the registry timezone.
    #[must_use]
    pub fn current_year(&self) -> i32 {
        self.year_at(self.clock.utc())
    }

    fn year_at(&self, instant: DateTime<Utc>) -> i32 {
        instant.with_timezone(&self.tz).year()
    }

    /// Seed for a year that has no counter row yet: the highest sequence
    /// already stored for it.
    async fn seed_for(&self, year: i32) -> AppResult<i32> {
        if self.counters.find(year).await?.is_some() {
            return Ok(0);
        }
        Ok(self.reports.max_seq_for_year(year).await?.unwrap_or(0))
    }

    /// Hand out the next number for the current year.
    pub async fn next_number(&self) -> ReportNumber {
        let now = self.clock.utc();
        let year = self.year_at(now);

        let assigned = match self.seed_for(year).await {
            Ok(seed) => {
                self.counters
                    .next_sequence(year, seed, now.fixed_offset())
                    .await
            }
            Err(e) => Err(e),
        };

        let seq = match assigned {
            Ok(seq) => seq as u32,
            Err(e) => {
                let seq = fallback_sequence(now, self.width);
                warn!(year, seq, error = %e, "Report counter unavailable, using time-derived sequence");
                seq
            }
        };

        let number = ReportNumber::new(self.prefix.clone(), seq, year, self.width);
        debug!(nro_consulta = %number, "Report number assigned");
        number
    }
}
