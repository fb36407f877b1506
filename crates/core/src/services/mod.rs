//! Business logic services.

pub mod access;
pub mod allow_list;
pub mod export;
pub mod identity;
pub mod numbering;
pub mod rating;
pub mod report;

#[cfg(test)]
pub(crate) mod test_support;

pub use access::{AccessGuard, AuthorizedUser, SessionEvent, SessionSnapshot, SessionUser};
pub use allow_list::AllowListService;
pub use export::{ExportRow, ExportService, RatingCell};
pub use identity::{Identity, IdentityProvider, IdentityService, JwtIdentityProvider};
pub use numbering::{NumberingService, ReportNumber};
pub use rating::{RatingInput, RatingService, RatingState};
pub use report::{ReportInput, ReportService};

use std::sync::Arc;

use chrono_tz::Tz;
use informes_common::{AppError, AppResult};
use mockable::Clock;

/// Shared time source, replaced by a fixed clock in tests.
pub type SharedClock = Arc<dyn Clock + Send + Sync>;

/// Parse the configured registry timezone.
pub fn parse_timezone(name: &str) -> AppResult<Tz> {
    name.parse::<Tz>()
        .map_err(|e| AppError::Config(format!("invalid registry.timezone {name:?}: {e}")))
}
