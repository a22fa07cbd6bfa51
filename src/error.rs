use thiserror::Error;

/// Failures of an onboarding run, one variant per class the operator needs to
/// tell apart.
#[derive(Debug, Error)]
pub enum OnboardError {
    /// Settings file unreadable or required keys missing.
    #[error("configuration error: {0}")]
    Config(String),

    /// The request never produced an HTTP response (DNS, TLS, timeout, ...).
    #[error("{operation} failed: {message}")]
    Transport { operation: String, message: String },

    /// Bad client credentials, or the token was rejected by the platform.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The platform answered with a non-success status.
    #[error("{operation} returned HTTP {status}: {body}")]
    Api {
        operation: String,
        status: u16,
        body: String,
    },

    /// The platform answered, but not with the shape we expected.
    #[error("unexpected response from {operation}: {message}")]
    UnexpectedResponse { operation: String, message: String },

    /// The filled configurator violates the template schema.
    #[error("stage configurator failed schema validation ({} error(s))", errors.len())]
    Schema { errors: Vec<String> },

    /// The shared secret could not be collected.
    #[error("secret input failed: {0}")]
    Prompt(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl OnboardError {
    pub fn transport(operation: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Transport {
            operation: operation.into(),
            message: err.to_string(),
        }
    }

    pub fn unexpected(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Process exit status for this failure class.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Transport { .. } => 3,
            Self::Auth(_) => 4,
            Self::Api { .. } => 5,
            Self::UnexpectedResponse { .. } => 6,
            Self::Schema { .. } => 7,
            Self::Prompt(_) | Self::Io(_) => 8,
        }
    }
}

pub type Result<T, E = OnboardError> = std::result::Result<T, E>;
