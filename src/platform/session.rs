use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use ureq::http::Response;
use ureq::{Agent, Body};

use crate::configurator::{FilledConfigurator, StageConfigurator};
use crate::error::{OnboardError, Result};
use crate::onboard_log;
use crate::platform::types::{InstalledStage, Notification, Product, TokenRequest, TokenResponse};
use crate::secret_value::SecretValue;
use crate::settings::{ClientCredentials, PlatformSettings};

const BODY_EXCERPT_CHARS: usize = 512;

/// Authenticated connection to the platform API.
///
/// Built once by [`PlatformSession::authenticate`]; every later call borrows it
/// and sends `Authorization: Bearer <token>` plus a JSON content type.
pub struct PlatformSession {
    agent: Agent,
    base_url: String,
    token: SecretValue,
}

impl PlatformSession {
    /// Exchange client credentials for a bearer token.
    pub fn authenticate(platform: &PlatformSettings, credentials: &ClientCredentials) -> Result<Self> {
        let agent = build_agent(platform);
        let token = request_token(&agent, platform, credentials)?;
        Ok(Self::with_token(agent, &platform.base_url, token))
    }

    pub(crate) fn with_token(agent: Agent, base_url: &str, token: SecretValue) -> Self {
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Absolute URL for a platform path. Absolute inputs pass through.
    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    pub fn list_products(&self) -> Result<Vec<Product>> {
        self.get_json("GET products", &self.resolve("products"))
    }

    /// Fetch a fresh configurator template. Nothing is created on the platform.
    pub fn fetch_configurator(&self, product_id: &str) -> Result<StageConfigurator> {
        let url = self.resolve(&format!("new/stage/{}", product_id.trim()));
        self.get_json("GET configurator", &url)
    }

    /// Create (or update) the stage described by `filled`.
    pub fn install_stage(&self, filled: &FilledConfigurator) -> Result<InstalledStage> {
        let url = self.resolve("stage");
        onboard_log::debug(module_path!(), format!("PUT {url}"));
        let result = self
            .agent
            .put(&url)
            .header("Authorization", &self.bearer())
            .header("Content-Type", "application/json")
            .send_json(filled.to_payload());
        read_json("PUT stage", result)
    }

    pub fn read_notifications(&self, url: &str) -> Result<Vec<Notification>> {
        self.get_json("GET notifications", url)
    }

    fn get_json<T: DeserializeOwned>(&self, operation: &str, url: &str) -> Result<T> {
        onboard_log::debug(module_path!(), format!("GET {url}"));
        let result = self
            .agent
            .get(url)
            .header("Authorization", &self.bearer())
            .header("Content-Type", "application/json")
            .call();
        read_json(operation, result)
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token.expose())
    }
}

pub(crate) fn build_agent(platform: &PlatformSettings) -> Agent {
    let timeout = (platform.timeout_secs > 0).then(|| Duration::from_secs(platform.timeout_secs));
    Agent::config_builder()
        .timeout_global(timeout)
        .http_status_as_error(false)
        .build()
        .into()
}

fn request_token(
    agent: &Agent,
    platform: &PlatformSettings,
    credentials: &ClientCredentials,
) -> Result<SecretValue> {
    let request = TokenRequest {
        client_id: &credentials.client_id,
        client_secret: credentials.client_secret.expose(),
        audience: &platform.audience,
        grant_type: &credentials.grant_type,
    };
    onboard_log::info(
        module_path!(),
        format!(
            "requesting access token url={} client_id={} audience={}",
            platform.token_url, credentials.client_id, platform.audience
        ),
    );

    let mut resp = agent
        .post(&platform.token_url)
        .header("Content-Type", "application/json")
        .send_json(&request)
        .map_err(|err| OnboardError::transport("POST token", err))?;
    let status = resp.status().as_u16();
    let raw = resp
        .body_mut()
        .read_to_string()
        .map_err(|err| OnboardError::transport("POST token", err))?;

    if !resp.status().is_success() {
        let reason = serde_json::from_str::<TokenResponse>(&raw)
            .ok()
            .and_then(|parsed| parsed.failure_reason())
            .unwrap_or_else(|| excerpt(&raw));
        return Err(OnboardError::Auth(format!(
            "token endpoint returned HTTP {status}: {reason}"
        )));
    }

    let parsed: TokenResponse = serde_json::from_str(&raw)
        .map_err(|err| OnboardError::unexpected("POST token", format!("invalid JSON: {err}")))?;
    let token = match parsed.access_token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => SecretValue::new(token),
        _ => {
            let reason = parsed
                .failure_reason()
                .unwrap_or_else(|| "response did not contain an access_token".to_string());
            return Err(OnboardError::Auth(reason));
        }
    };
    onboard_log::info(
        module_path!(),
        format!(
            "authenticated token_preview={} token_type={} expires_in={}",
            token.preview(),
            parsed.token_type.as_deref().unwrap_or("-"),
            parsed
                .expires_in
                .map(|secs| format!("{secs}s"))
                .unwrap_or_else(|| "-".to_string()),
        ),
    );
    Ok(token)
}

fn read_json<T: DeserializeOwned>(
    operation: &str,
    result: std::result::Result<Response<Body>, ureq::Error>,
) -> Result<T> {
    let mut resp = result.map_err(|err| OnboardError::transport(operation, err))?;
    let status = resp.status();
    let raw = resp
        .body_mut()
        .read_to_string()
        .map_err(|err| OnboardError::transport(operation, err))?;
    onboard_log::debug(
        module_path!(),
        format!("{operation} status={} bytes={}", status.as_u16(), raw.len()),
    );

    match status.as_u16() {
        401 | 403 => {
            return Err(OnboardError::Auth(format!(
                "{operation} rejected the access token (HTTP {}): {}",
                status.as_u16(),
                excerpt(&raw)
            )));
        }
        _ if !status.is_success() => {
            return Err(OnboardError::Api {
                operation: operation.to_string(),
                status: status.as_u16(),
                body: excerpt(&raw),
            });
        }
        _ => {}
    }

    let value: Value = serde_json::from_str(&raw)
        .map_err(|err| OnboardError::unexpected(operation, format!("invalid JSON: {err}")))?;
    serde_json::from_value(value)
        .map_err(|err| OnboardError::unexpected(operation, err.to_string()))
}

fn excerpt(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.chars().count() > BODY_EXCERPT_CHARS {
        let cut: String = trimmed.chars().take(BODY_EXCERPT_CHARS).collect();
        format!("{cut}...")
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(base: &str) -> PlatformSession {
        PlatformSession::with_token(
            build_agent(&PlatformSettings::default()),
            base,
            SecretValue::new("token"),
        )
    }

    #[test]
    fn resolve_joins_relative_paths_once() {
        let session = session("https://platform.linked2.io/api/config/");
        assert_eq!(
            session.resolve("products"),
            "https://platform.linked2.io/api/config/products"
        );
        assert_eq!(
            session.resolve("/new/stage/42"),
            "https://platform.linked2.io/api/config/new/stage/42"
        );
    }

    #[test]
    fn resolve_keeps_absolute_urls() {
        let session = session("https://platform.linked2.io/api/config");
        let url = "https://platform.linked2.io/api/notifications/7?max=10";
        assert_eq!(session.resolve(url), url);
    }

    #[test]
    fn excerpt_truncates_long_bodies() {
        let long = "x".repeat(BODY_EXCERPT_CHARS + 10);
        let cut = excerpt(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.len(), BODY_EXCERPT_CHARS + 3);
    }
}
