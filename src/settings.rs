use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use directories_next::ProjectDirs;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{OnboardError, Result};
use crate::secret_value::SecretValue;

pub const DEFAULT_BASE_URL: &str = "https://platform.linked2.io/api/config/";
pub const DEFAULT_TOKEN_URL: &str = "https://linked2.eu.auth0.com/oauth/token";
pub const DEFAULT_AUDIENCE: &str = "https://platform.linked2.io/api";
pub const SETTINGS_FILE: &str = "onboard.yaml";

const ENV_CONFIG_DIR: &str = "STAGE_ONBOARD_CONFIG_DIR";
const ENV_CLIENT_ID: &str = "STAGE_ONBOARD_CLIENT_ID";
const ENV_CLIENT_SECRET: &str = "STAGE_ONBOARD_CLIENT_SECRET";
const ENV_BASE_URL: &str = "STAGE_ONBOARD_BASE_URL";
const ENV_TOKEN_URL: &str = "STAGE_ONBOARD_TOKEN_URL";
const ENV_PRODUCT_ID: &str = "STAGE_ONBOARD_PRODUCT_ID";
pub const ENV_SHOPIFY_SECRET: &str = "STAGE_ONBOARD_SHOPIFY_SECRET";

#[derive(Clone, Debug, Deserialize, Default)]
pub struct OnboardSettings {
    #[serde(default)]
    pub platform: PlatformSettings,
    #[serde(default)]
    pub credentials: ClientCredentials,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub stage: StageSettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub validation: ValidationSettings,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PlatformSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_audience")]
    pub audience: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token_url: default_token_url(),
            audience: default_audience(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ClientCredentials {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: SecretValue,
    #[serde(default = "default_grant_type")]
    pub grant_type: String,
}

impl Default for ClientCredentials {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: SecretValue::default(),
            grant_type: default_grant_type(),
        }
    }
}

/// Customer-specific values written into the configurator template.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct StageSettings {
    #[serde(default)]
    pub customer: CustomerSettings,
    /// Merged key by key into `publishContextConfiguration`.
    #[serde(default)]
    pub publish_context: BTreeMap<String, Value>,
    #[serde(default)]
    pub support: SupportSettings,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct CustomerSettings {
    #[serde(default)]
    pub name: String,
    /// Must be unique per customer; the platform tracks usage by it.
    #[serde(default)]
    pub identifier: String,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct SupportSettings {
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub primary_contact: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NotificationSettings {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_poll_attempts")]
    pub poll_attempts: u32,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            initial_delay_ms: default_initial_delay_ms(),
            poll_attempts: default_poll_attempts(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ValidationSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

fn default_audience() -> String {
    DEFAULT_AUDIENCE.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_grant_type() -> String {
    "client_credentials".to_string()
}

fn default_page_size() -> u32 {
    10
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_poll_attempts() -> u32 {
    5
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

impl OnboardSettings {
    /// Load settings from `explicit` or the default location, then apply
    /// environment overrides. A missing file yields defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => settings_path()?,
        };
        let mut settings = if path.exists() {
            Self::from_file(&path)?
        } else if explicit.is_some() {
            return Err(OnboardError::Config(format!(
                "settings file {} does not exist",
                path.display()
            )));
        } else {
            Self::default()
        };
        settings.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|err| {
            OnboardError::Config(format!("failed to read {}: {err}", path.display()))
        })?;
        serde_yaml_bw::from_str(&contents)
            .map_err(|err| OnboardError::Config(format!("invalid settings in {}: {err}", path.display())))
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        serde_yaml_bw::from_str(contents)
            .map_err(|err| OnboardError::Config(format!("invalid settings: {err}")))
    }

    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(value) = read(ENV_CLIENT_ID) {
            self.credentials.client_id = value;
        }
        if let Some(value) = read(ENV_CLIENT_SECRET) {
            self.credentials.client_secret = SecretValue::new(value);
        }
        if let Some(value) = read(ENV_BASE_URL) {
            self.platform.base_url = value;
        }
        if let Some(value) = read(ENV_TOKEN_URL) {
            self.platform.token_url = value;
        }
        if let Some(value) = read(ENV_PRODUCT_ID) {
            self.product_id = Some(value);
        }
    }

    /// Check the keys every run needs to authenticate.
    pub fn require_credentials(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.credentials.client_id.trim().is_empty() {
            missing.push("credentials.client_id");
        }
        if self.credentials.client_secret.is_empty() {
            missing.push("credentials.client_secret");
        }
        missing_keys(missing)
    }

    /// Check the keys a stage install needs on top of the credentials.
    pub fn require_complete(&self) -> Result<()> {
        self.require_credentials()?;
        let stage = &self.stage;
        let mut missing = Vec::new();
        if stage.customer.name.trim().is_empty() {
            missing.push("stage.customer.name");
        }
        if stage.customer.identifier.trim().is_empty() {
            missing.push("stage.customer.identifier");
        }
        if stage.support.contact_email.trim().is_empty() {
            missing.push("stage.support.contact_email");
        }
        if stage.support.primary_contact.trim().is_empty() {
            missing.push("stage.support.primary_contact");
        }
        missing_keys(missing)
    }
}

fn missing_keys(missing: Vec<&str>) -> Result<()> {
    if missing.is_empty() {
        Ok(())
    } else {
        Err(OnboardError::Config(format!(
            "missing required settings: {}",
            missing.join(", ")
        )))
    }
}

pub fn settings_path() -> Result<PathBuf> {
    if let Ok(value) = std::env::var(ENV_CONFIG_DIR) {
        return Ok(Path::new(&value).join(SETTINGS_FILE));
    }
    let dirs = ProjectDirs::from("", "linked2", "stage-onboard").ok_or_else(|| {
        OnboardError::Config("unable to determine config directory".to_string())
    })?;
    Ok(dirs.config_dir().join(SETTINGS_FILE))
}

/// Settings file written by `stage-onboard init`.
pub fn settings_template() -> String {
    format!(
        r#"# stage-onboard settings. Credentials may instead come from
# {ENV_CLIENT_ID} / {ENV_CLIENT_SECRET}.
platform:
  base_url: {DEFAULT_BASE_URL}
  token_url: {DEFAULT_TOKEN_URL}
  audience: {DEFAULT_AUDIENCE}
  timeout_secs: 30
credentials:
  client_id: ""
  client_secret: ""
  grant_type: client_credentials
product_id: ""
stage:
  customer:
    name: ""
    identifier: ""
  publish_context:
    powerOfficeClientKey: ""
  support:
    contact_email: ""
    phone: ""
    primary_contact: ""
notifications:
  page_size: 10
  initial_delay_ms: 500
  poll_attempts: 5
  poll_interval_ms: 500
validation:
  enabled: true
"#
    )
}

pub fn write_settings_template(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, settings_template())?;
    Ok(())
}
