use crate::{
    core::prompt::PromptPayload,
    error::Result,
    schemas::{validate_structured_payload, CompletionSchema, SchemaHandle},
    types::{deserialize_structured_response, Itinerary},
};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

/// A hosted model asked to answer in the shape of `schema`.
///
/// Implementations return the raw JSON the model produced; coercion into a
/// Rust type happens in [`generate_structured`].
#[async_trait]
pub trait StructuredModel: Send + Sync + std::fmt::Debug {
    async fn generate(&self, prompt: &PromptPayload, schema: &SchemaHandle) -> Result<Value>;
}

/// One generation attempt: call the model, validate its payload against the
/// JSON schema, then deserialize into `T`. No partial value is ever returned.
pub async fn generate_structured<T: CompletionSchema>(
    model: &dyn StructuredModel,
    prompt: &PromptPayload,
) -> Result<T> {
    let schema = T::schema();
    let payload = model.generate(prompt, schema).await?;

    if let Err(err) = validate_structured_payload(schema, &payload) {
        debug!(
            target: "trip_planner::generation",
            schema = schema.schema_name(),
            error = %err,
            payload = %payload
        );
        return Err(err);
    }

    deserialize_structured_response::<T>(&payload, schema)
}

/// [`generate_structured`] for itineraries, with day numbering enforced.
pub async fn generate_itinerary(
    model: &dyn StructuredModel,
    prompt: &PromptPayload,
) -> Result<Itinerary> {
    let itinerary: Itinerary = generate_structured(model, prompt).await?;
    itinerary.validate_days()?;
    Ok(itinerary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlannerError;
    use serde_json::json;

    #[derive(Debug)]
    struct CannedModel(Value);

    #[async_trait]
    impl StructuredModel for CannedModel {
        async fn generate(&self, _prompt: &PromptPayload, _schema: &SchemaHandle) -> Result<Value> {
            Ok(self.0.clone())
        }
    }

    fn prompt() -> PromptPayload {
        PromptPayload {
            system: "rules".to_string(),
            user: "Plan a weekend in Lisbon".to_string(),
        }
    }

    #[tokio::test]
    async fn test_conformant_payload() {
        let model = CannedModel(json!({
            "title": "Weekend in Lisbon",
            "total_cost": 310.5,
            "days": [
                { "day": 1, "city": "Lisbon", "activities": [
                    { "time": "10:00", "activity": "Tram 28", "place_name": null, "cost": 3.0 }
                ]}
            ]
        }));

        let itinerary = generate_itinerary(&model, &prompt()).await.unwrap();
        assert_eq!(itinerary.days.len(), 1);
        assert_eq!(itinerary.days[0].activities[0].cost, Some(3.0));
        assert_eq!(itinerary.total_cost, Some(310.5));
    }

    #[tokio::test]
    async fn test_missing_required_field_is_schema_violation() {
        let model = CannedModel(json!({
            "title": "Weekend in Lisbon",
            "days": [{ "day": 1, "city": "Lisbon" }]
        }));

        let err = generate_itinerary(&model, &prompt()).await.unwrap_err();
        assert!(matches!(err, PlannerError::SchemaViolation(_)), "{err:?}");
        assert!(err.to_string().contains("activities"));
    }

    #[tokio::test]
    async fn test_out_of_order_days_rejected() {
        let model = CannedModel(json!({
            "title": "Trip",
            "days": [
                { "day": 2, "city": "Porto", "activities": [] },
                { "day": 1, "city": "Lisbon", "activities": [] }
            ]
        }));

        let err = generate_itinerary(&model, &prompt()).await.unwrap_err();
        assert!(matches!(err, PlannerError::SchemaViolation(_)));
    }

    #[tokio::test]
    async fn test_model_error_propagates() {
        #[derive(Debug)]
        struct DownModel;

        #[async_trait]
        impl StructuredModel for DownModel {
            async fn generate(&self, _: &PromptPayload, _: &SchemaHandle) -> Result<Value> {
                Err(PlannerError::Upstream("HTTP 503".to_string()))
            }
        }

        let err = generate_itinerary(&DownModel, &prompt()).await.unwrap_err();
        assert!(matches!(err, PlannerError::Upstream(_)));
    }
}
