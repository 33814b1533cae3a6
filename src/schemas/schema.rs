use schemars::schema::{RootSchema, SchemaObject};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{any::TypeId, sync::Arc};

/// Cached JSON schema for a type the model is asked to produce.
#[derive(Clone, Debug)]
pub struct SchemaHandle {
    schema_name: &'static str,
    type_name: &'static str,
    type_id: TypeId,
    schema_json: Arc<Value>,
}

impl SchemaHandle {
    /// Serializing a `RootSchema` cannot fail for schemars output, so this is
    /// infallible in practice; it runs once per type inside a `OnceLock`.
    pub fn from_root_schema<T: 'static>(
        schema_name: &'static str,
        type_name: &'static str,
        root: RootSchema,
    ) -> Self {
        let schema_json = serde_json::to_value(root)
            .unwrap_or_else(|err| panic!("failed to serialize schema for {type_name}: {err}"));

        Self {
            schema_name,
            type_name,
            type_id: TypeId::of::<T>(),
            schema_json: Arc::new(schema_json),
        }
    }

    pub fn schema_name(&self) -> &'static str {
        self.schema_name
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn schema_json(&self) -> &Value {
        self.schema_json.as_ref()
    }

    /// Names of the top-level required properties.
    pub fn required_fields(&self) -> Vec<&str> {
        self.schema_json
            .get("required")
            .and_then(Value::as_array)
            .map(|fields| fields.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// A type the generation pipeline can coerce model output into.
pub trait CompletionSchema: DeserializeOwned + Send + Sync + 'static {
    fn schema() -> &'static SchemaHandle;
}

/// Set the root title and, when given, the description.
///
/// `title` is either the struct name or an explicit `name = ...`, so it always
/// replaces what schemars derived.
pub fn apply_metadata(
    root: &mut RootSchema,
    title: &'static str,
    description: Option<&'static str>,
) {
    let schema_object: &mut SchemaObject = &mut root.schema;
    let metadata = schema_object.metadata();

    metadata.title = Some(title.to_string());
    if let Some(description) = description {
        metadata.description = Some(description.to_string());
    }
}
