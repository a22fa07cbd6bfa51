use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value};

/// A product descriptor. The platform's shape is not relied on: any JSON
/// value is accepted and only the id is ever read.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(transparent)]
pub struct Product(pub Value);

impl Product {
    /// `id` or `productId`, as a string or a number.
    pub fn id(&self) -> Option<String> {
        ["id", "productId"]
            .iter()
            .filter_map(|key| self.0.get(key))
            .find_map(|value| match value {
                Value::String(id) => Some(id.trim().to_string()),
                Value::Number(id) => Some(id.to_string()),
                _ => None,
            })
    }

    pub fn name(&self) -> Option<&str> {
        self.0
            .get("name")
            .or_else(|| self.0.get("productName"))
            .and_then(Value::as_str)
    }
}

/// Result of `PUT /stage`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstalledStage {
    /// Must be registered with Shopify so it can deliver events.
    pub webhook_url: String,
    /// URL template; `{max}` is the page size placeholder. Empty when the
    /// platform did not return one.
    #[serde(default)]
    pub success_notification_resource: String,
    #[serde(flatten)]
    pub endpoints: JsonMap<String, Value>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub note_type: String,
    #[serde(default)]
    pub message: String,
    #[serde(flatten)]
    pub extra: JsonMap<String, Value>,
}

#[derive(Serialize)]
pub(crate) struct TokenRequest<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub audience: &'a str,
    pub grant_type: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl TokenResponse {
    pub fn failure_reason(&self) -> Option<String> {
        match (&self.error, &self.error_description) {
            (Some(code), Some(description)) => Some(format!("{code}: {description}")),
            (Some(code), None) => Some(code.clone()),
            (None, Some(description)) => Some(description.clone()),
            (None, None) => None,
        }
    }
}
