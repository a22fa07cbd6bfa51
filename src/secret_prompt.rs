//! Collection of the Shopify shared secret.
//!
//! Collection blocks until a value is available, so the secret is always
//! attached before the configurator is validated or submitted.

use rpassword::prompt_password;

use crate::error::{OnboardError, Result};
use crate::secret_value::SecretValue;

pub const SHARED_SECRET_PROMPT: &str = "What is the Shopify shared secret? ";

pub trait SecretSource {
    fn shared_secret(&mut self) -> Result<SecretValue>;
}

/// Secret supplied up front (flag or environment).
pub struct FixedSecret(SecretValue);

impl FixedSecret {
    pub fn new(value: impl Into<SecretValue>) -> Self {
        Self(value.into())
    }
}

impl SecretSource for FixedSecret {
    fn shared_secret(&mut self) -> Result<SecretValue> {
        non_empty(SecretValue::new(self.0.expose().trim()))
    }
}

/// Hidden interactive prompt on the controlling terminal.
pub struct TerminalPrompt {
    prompt: String,
}

impl TerminalPrompt {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self::new(SHARED_SECRET_PROMPT)
    }
}

impl SecretSource for TerminalPrompt {
    fn shared_secret(&mut self) -> Result<SecretValue> {
        let value = prompt_password(&self.prompt)
            .map_err(|err| OnboardError::Prompt(format!("read secret: {err}")))?;
        non_empty(SecretValue::new(value.trim()))
    }
}

fn non_empty(value: SecretValue) -> Result<SecretValue> {
    if value.is_empty() {
        Err(OnboardError::Prompt(
            "the Shopify shared secret must not be empty".to_string(),
        ))
    } else {
        Ok(value)
    }
}
