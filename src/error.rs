use thiserror::Error;

/// Errors raised while planning a trip.
///
/// `VectorStore` and `ExampleFetch` are absorbed inside the retriever and the
/// example cache; everything else reaches the caller of `TripPlanner::plan`.
#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Example source error: {0}")]
    ExampleFetch(String),

    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    #[error("Upstream model error: {0}")]
    Upstream(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("Rate limit exceeded: retry after {retry_after}s")]
    RateLimit { retry_after: u64 },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, PlannerError>;

impl PlannerError {
    /// Whether the same request may succeed if sent again later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PlannerError::Upstream(_) | PlannerError::RateLimit { .. } | PlannerError::Timeout(_)
        )
    }

    /// Whether the error is degraded locally instead of failing the request.
    pub fn is_absorbed(&self) -> bool {
        matches!(
            self,
            PlannerError::VectorStore(_) | PlannerError::ExampleFetch(_)
        )
    }

    /// Get the error code for structured responses
    pub fn error_code(&self) -> &'static str {
        match self {
            PlannerError::Config(_) => "CONFIG_ERROR",
            PlannerError::InvalidQuery(_) => "INVALID_QUERY",
            PlannerError::VectorStore(_) => "VECTOR_STORE_ERROR",
            PlannerError::ExampleFetch(_) => "EXAMPLE_FETCH_ERROR",
            PlannerError::SchemaViolation(_) => "SCHEMA_VIOLATION",
            PlannerError::Upstream(_) => "UPSTREAM_MODEL_ERROR",
            PlannerError::Serialization(_) => "SERIALIZATION_ERROR",
            PlannerError::Timeout(_) => "TIMEOUT_ERROR",
            PlannerError::RateLimit { .. } => "RATE_LIMIT_ERROR",
        }
    }

    /// Convert to a structured error payload
    pub fn to_error_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
                "retryable": self.is_retryable()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_violation_is_fatal_and_not_retryable() {
        let err = PlannerError::SchemaViolation("days: missing".to_string());
        assert!(!err.is_absorbed());
        assert!(!err.is_retryable());
        assert_eq!(err.error_code(), "SCHEMA_VIOLATION");
    }

    #[test]
    fn payload_carries_code_and_message() {
        let payload = PlannerError::RateLimit { retry_after: 4 }.to_error_payload();
        assert_eq!(payload["error"]["code"], "RATE_LIMIT_ERROR");
        assert_eq!(payload["error"]["retryable"], true);
        assert!(payload["error"]["message"]
            .as_str()
            .unwrap()
            .contains("retry after 4s"));
    }
}
