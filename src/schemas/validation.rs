use crate::{error::PlannerError, schemas::SchemaHandle};
use jsonschema::{Draft, JSONSchema};
use serde_json::{json, Value};

const MAX_SCHEMA_ERRORS: usize = 3;

/// Check a model payload against the handle's JSON schema (Draft 7).
///
/// At most three violations are reported, each prefixed with its instance path.
pub fn validate_structured_payload(
    schema: &SchemaHandle,
    payload: &Value,
) -> Result<(), PlannerError> {
    let validator = JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(schema.schema_json())
        .map_err(|err| {
            PlannerError::Config(format!(
                "`{}` schema could not be compiled: {}",
                schema.schema_name(),
                err
            ))
        })?;

    if let Err(errors) = validator.validate(payload) {
        let mut details = Vec::new();
        let mut truncated = false;

        for (idx, error) in errors.enumerate() {
            if idx == MAX_SCHEMA_ERRORS {
                truncated = true;
                break;
            }
            let path = error.instance_path.to_string();
            let location = if path.is_empty() { "<root>" } else { path.as_str() };
            details.push(format!("{location}: {error}"));
        }

        let mut detail_str = if details.is_empty() {
            "payload failed schema validation".to_string()
        } else {
            details.join("; ")
        };
        if truncated {
            detail_str.push_str("; additional errors truncated");
        }

        return Err(PlannerError::SchemaViolation(format!(
            "model output does not match `{}` schema: {}",
            schema.schema_name(),
            detail_str
        )));
    }

    Ok(())
}

/// `response_format` body that constrains a chat completion to the schema.
pub fn response_format(schema: &SchemaHandle) -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": schema.schema_name(),
            "schema": schema.schema_json()
        }
    })
}
