use std::any::{type_name, TypeId};

use serde_json::Value;

use crate::{
    error::{PlannerError, Result},
    schemas::{CompletionSchema, SchemaHandle},
};

/// Parse the text body of an assistant message as a JSON value.
///
/// Models sometimes wrap JSON in a Markdown fence even when a response format
/// is requested; a single surrounding fence is removed before parsing.
pub fn parse_model_content(content: &str, schema: &SchemaHandle) -> Result<Value> {
    let body = strip_code_fence(content.trim());
    if body.is_empty() {
        return Err(PlannerError::SchemaViolation(format!(
            "model returned an empty `{}` payload",
            schema.schema_name()
        )));
    }

    serde_json::from_str(body).map_err(|err| {
        PlannerError::SchemaViolation(format!(
            "model output for `{}` is not valid JSON: {}",
            schema.schema_name(),
            err
        ))
    })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop an optional language tag on the opening fence line.
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Deserialize a validated payload into `T`, reporting the failing field path.
pub fn deserialize_structured_response<T>(payload: &Value, schema: &SchemaHandle) -> Result<T>
where
    T: CompletionSchema,
{
    ensure_schema_matches::<T>(schema)?;

    serde_path_to_error::deserialize(payload.clone()).map_err(|err| {
        let path = err.path().to_string();
        let location = if path.is_empty() || path == "." {
            "<root>".to_string()
        } else {
            path
        };
        PlannerError::SchemaViolation(format!(
            "failed to deserialize `{}` at {}: {}",
            schema.schema_name(),
            location,
            err.inner()
        ))
    })
}

fn ensure_schema_matches<T: 'static>(schema: &SchemaHandle) -> Result<()> {
    if schema.type_id() != TypeId::of::<T>() {
        return Err(PlannerError::Config(format!(
            "schema `{}` does not match target type `{}`",
            schema.schema_name(),
            type_name::<T>(),
        )));
    }
    Ok(())
}
