//! Onboard a customer onto the linked2 integration platform.
//!
//! The binary authenticates with client credentials, fills a product's stage
//! configurator with the customer's settings, validates it against the
//! template schema and installs the stage.

pub mod cli;
pub mod configurator;
pub mod error;
pub mod onboard;
pub mod onboard_log;
pub mod platform;
pub mod report;
pub mod secret_prompt;
pub mod secret_value;
pub mod settings;
pub mod validation;

pub use error::{OnboardError, Result};
