//! HTTP client for the linked2 configuration API.

pub mod notifications;
pub mod session;
pub mod types;

pub use notifications::{expand_page_size, read_first_notification};
pub use session::PlatformSession;
pub use types::{InstalledStage, Notification, Product};
