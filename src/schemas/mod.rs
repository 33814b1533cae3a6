//! JSON schema handles for structured model output.

pub mod schema;
pub mod validation;

pub use schema::{apply_metadata, CompletionSchema, SchemaHandle};
pub use validation::{response_format, validate_structured_payload};
