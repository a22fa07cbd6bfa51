//! Stage configurator templates and the filler that turns one into an
//! installable configuration.
//!
//! A template has six parts:
//! 1. `stageConfiguration`: global stage settings,
//! 2. `filterConfiguration`: validation of incoming data per end customer,
//! 3. `transformerConfiguration`: per end customer transformation tweaks,
//! 4. `publishContextConfiguration`: target accounts, emails, keys,
//! 5. `supportConfiguration`: who gets support tickets,
//! 6. `schema`: JSON Schema (Draft 7) describing parts 1-5.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map as JsonMap, Value};

use crate::secret_value::SecretValue;
use crate::settings::StageSettings;

/// Configurator template as returned by `GET new/stage/{productId}`.
///
/// Sections may be missing or `null`; both read as empty. Filter and
/// transformer content is kept as-is since the filler discards it. Unknown
/// top-level keys are preserved in `extra` so dumps stay lossless.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StageConfigurator {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub stage_configuration: JsonMap<String, Value>,
    #[serde(default)]
    pub filter_configuration: Value,
    #[serde(default)]
    pub transformer_configuration: Value,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub publish_context_configuration: JsonMap<String, Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub support_configuration: JsonMap<String, Value>,
    pub schema: Value,
    #[serde(flatten)]
    pub extra: JsonMap<String, Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<JsonMap<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<JsonMap<String, Value>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// The five installable sections, without the schema.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FilledConfigurator {
    pub stage_configuration: JsonMap<String, Value>,
    pub filter_configuration: JsonMap<String, Value>,
    pub transformer_configuration: JsonMap<String, Value>,
    pub publish_context_configuration: JsonMap<String, Value>,
    pub support_configuration: JsonMap<String, Value>,
    #[serde(skip)]
    shared_secret: Option<SecretValue>,
}

impl FilledConfigurator {
    pub fn attach_shared_secret(&mut self, secret: SecretValue) {
        self.shared_secret = Some(secret);
    }

    /// The five sections only; safe to print.
    pub fn sections(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(JsonMap::new()))
    }

    /// Request body for `PUT stage`: the sections plus the Shopify shared
    /// secret under `secret` once one has been attached.
    pub fn to_payload(&self) -> Value {
        let mut payload = self.sections();
        if let (Some(secret), Some(map)) = (&self.shared_secret, payload.as_object_mut()) {
            map.insert(
                "secret".to_string(),
                Value::String(secret.expose().to_string()),
            );
        }
        payload
    }
}

/// Apply the customer settings to a template.
///
/// The template is left untouched so its schema can still validate the
/// result. Filter and transformer sections are always cleared.
pub fn configure_stage(template: &StageConfigurator, stage: &StageSettings) -> FilledConfigurator {
    let mut stage_configuration = template.stage_configuration.clone();
    stage_configuration.insert(
        "customerName".to_string(),
        Value::String(stage.customer.name.clone()),
    );
    // customerIdentifier must be unique per customer; usage is tracked by it.
    stage_configuration.insert(
        "customerIdentifier".to_string(),
        Value::String(stage.customer.identifier.clone()),
    );

    let mut publish_context_configuration = template.publish_context_configuration.clone();
    for (key, value) in &stage.publish_context {
        publish_context_configuration.insert(key.clone(), value.clone());
    }

    let mut support_configuration = template.support_configuration.clone();
    support_configuration.insert(
        "supportContactEmail".to_string(),
        Value::String(stage.support.contact_email.clone()),
    );
    support_configuration.insert(
        "phone".to_string(),
        Value::String(stage.support.phone.clone()),
    );
    support_configuration.insert(
        "primaryContact".to_string(),
        Value::String(stage.support.primary_contact.clone()),
    );

    FilledConfigurator {
        stage_configuration,
        filter_configuration: JsonMap::new(),
        transformer_configuration: JsonMap::new(),
        publish_context_configuration,
        support_configuration,
        shared_secret: None,
    }
}
