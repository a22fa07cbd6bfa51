use serde_json::Value;

use crate::error::{OnboardError, Result};

/// Check `instance` against a configurator's Draft-7 schema.
///
/// A schema that does not compile is the platform's fault and is reported as
/// an unexpected response; violations come back as [`OnboardError::Schema`]
/// with one line per error.
pub fn validate_configurator(schema: &Value, instance: &Value) -> Result<()> {
    let validator = jsonschema::draft7::new(schema).map_err(|err| {
        OnboardError::unexpected("configurator schema", format!("schema does not compile: {err}"))
    })?;
    let errors: Vec<String> = validator
        .iter_errors(instance)
        .map(|err| err.to_string())
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(OnboardError::Schema { errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Value {
        json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "required": ["supportConfiguration"],
            "properties": {
                "supportConfiguration": {
                    "type": "object",
                    "required": ["supportContactEmail", "primaryContact"],
                    "properties": {
                        "supportContactEmail": { "type": "string", "format": "email" },
                        "primaryContact": { "type": "string", "minLength": 1 }
                    }
                }
            }
        })
    }

    #[test]
    fn valid_instance_passes() {
        let instance = json!({
            "supportConfiguration": {
                "supportContactEmail": "at@email.com",
                "primaryContact": "Support Person"
            }
        });
        validate_configurator(&schema(), &instance).unwrap();
    }

    #[test]
    fn missing_required_support_field_is_reported() {
        let instance = json!({
            "supportConfiguration": { "supportContactEmail": "at@email.com" }
        });
        match validate_configurator(&schema(), &instance) {
            Err(OnboardError::Schema { errors }) => {
                assert!(!errors.is_empty());
                assert!(errors.iter().any(|line| line.contains("primaryContact")));
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn broken_schema_is_an_unexpected_response() {
        let schema = json!({ "type": 12 });
        let err = validate_configurator(&schema, &json!({})).unwrap_err();
        assert!(matches!(err, OnboardError::UnexpectedResponse { .. }));
    }
}
