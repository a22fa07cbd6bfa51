//! Thin logging facade over `tracing`.
//!
//! Call sites pass `module_path!()` so events keep their origin even when the
//! message is built dynamically. Output goes to stderr; stdout is reserved for
//! the onboarding report.

use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Level {
    Warn,
    Info,
    Debug,
}

impl Level {
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Level::Warn
        } else if verbose {
            Level::Debug
        } else {
            Level::Info
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Level::Warn => "warn",
            Level::Info => "info",
            Level::Debug => "debug",
        }
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `level` when set.
pub fn init(level: Level) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("stage_onboard={}", level.as_str())));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("failed to install log subscriber: {err}"))
}

pub fn debug(module: &str, message: impl AsRef<str>) {
    tracing::debug!(module, "{}", message.as_ref());
}

pub fn info(module: &str, message: impl AsRef<str>) {
    tracing::info!(module, "{}", message.as_ref());
}

pub fn warn(module: &str, message: impl AsRef<str>) {
    tracing::warn!(module, "{}", message.as_ref());
}
