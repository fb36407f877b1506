//! Database entities.

pub mod allowed_user;
pub mod rating;
pub mod report;
pub mod report_counter;

pub use allowed_user::Entity as AllowedUser;
pub use rating::Entity as Rating;
pub use report::Entity as Report;
pub use report_counter::Entity as ReportCounter;
