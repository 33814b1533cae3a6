//! Environment-driven configuration.
//!
//! Values are read from the process environment after `.env` has been
//! loaded by the binary. Only `OPENAI_API_KEY` is required.

use std::{env, str::FromStr, sync::Arc, time::Duration};

use crate::{
    core::{CompositeRetriever, ExampleCache, TripPlanner, DEFAULT_TOP_K},
    error::{PlannerError, Result},
    services::{
        chroma::{DEFAULT_CHROMA_URL, DEFAULT_DATABASE, DEFAULT_TENANT},
        huggingface::DEFAULT_ROWS_URL,
        openai_client::{DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL},
        ChromaStore, HuggingFaceExamples, OpenAIClient,
    },
};

#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
    pub timeout: Duration,
    pub chroma_url: String,
    pub chroma_tenant: String,
    pub chroma_database: String,
    pub top_k: usize,
    pub examples_url: String,
}

impl PlannerConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            temperature: 0.2,
            max_tokens: None,
            timeout: Duration::from_secs(120),
            chroma_url: DEFAULT_CHROMA_URL.to_string(),
            chroma_tenant: DEFAULT_TENANT.to_string(),
            chroma_database: DEFAULT_DATABASE.to_string(),
            top_k: DEFAULT_TOP_K,
            examples_url: DEFAULT_ROWS_URL.to_string(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let api_key = env::var("OPENAI_API_KEY").map_err(|_| {
            PlannerError::Config(
                "OPENAI_API_KEY environment variable must be set before planning".to_string(),
            )
        })?;

        let mut config = Self::new(api_key);
        if let Ok(base_url) = env::var("OPENAI_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(model) = env::var("PLANNER_MODEL") {
            config.chat_model = model;
        }
        if let Ok(model) = env::var("PLANNER_EMBEDDING_MODEL") {
            config.embedding_model = model;
        }
        if let Some(temperature) = parse_var("PLANNER_TEMPERATURE")? {
            config.temperature = temperature;
        }
        config.max_tokens = parse_var("PLANNER_MAX_TOKENS")?;
        if let Some(secs) = parse_var::<u64>("PLANNER_TIMEOUT_SECS")? {
            config.timeout = Duration::from_secs(secs);
        }
        if let Ok(url) = env::var("CHROMA_URL") {
            config.chroma_url = url;
        }
        if let Ok(tenant) = env::var("CHROMA_TENANT") {
            config.chroma_tenant = tenant;
        }
        if let Ok(database) = env::var("CHROMA_DATABASE") {
            config.chroma_database = database;
        }
        if let Some(top_k) = parse_var("PLANNER_TOP_K")? {
            config.top_k = top_k;
        }
        if let Ok(url) = env::var("PLANNER_EXAMPLES_URL") {
            config.examples_url = url;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would leave the planner running but ungrounded.
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(PlannerError::Config(
                "top_k must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Wire the hosted-service clients into a planner.
    pub fn build_planner(&self) -> TripPlanner {
        let openai = Arc::new(
            OpenAIClient::new(self.api_key.clone())
                .with_base_url(self.base_url.clone())
                .with_chat_model(self.chat_model.clone())
                .with_embedding_model(self.embedding_model.clone())
                .with_temperature(self.temperature)
                .with_max_tokens(self.max_tokens)
                .with_timeout(self.timeout),
        );

        let store = Arc::new(
            ChromaStore::new(self.chroma_url.clone())
                .with_tenant(self.chroma_tenant.clone())
                .with_database(self.chroma_database.clone()),
        );

        let examples = Arc::new(ExampleCache::new(Arc::new(
            HuggingFaceExamples::new().with_rows_url(self.examples_url.clone()),
        )));

        TripPlanner::new(CompositeRetriever::new(openai.clone(), store), examples, openai)
            .with_top_k(self.top_k)
            .with_timeout(self.timeout)
    }
}

fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|err| PlannerError::Config(format!("{name}={raw:?} is invalid: {err}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PlannerConfig::new("sk-test");
        assert_eq!(config.top_k, 3);
        assert_eq!(config.chroma_url, "http://localhost:8001");
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert_eq!(config.build_planner().top_k(), 3);
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let err = PlannerConfig::new("sk-test").with_top_k(0).validate().unwrap_err();
        assert!(matches!(err, PlannerError::Config(_)));
        assert!(err.to_string().contains("top_k"));
        assert!(PlannerConfig::new("sk-test").with_top_k(1).validate().is_ok());
    }

    #[test]
    fn test_parse_var_reports_bad_values() {
        env::set_var("TRIP_PLANNER_TEST_TOP_K", "three");
        let err = parse_var::<usize>("TRIP_PLANNER_TEST_TOP_K").unwrap_err();
        assert!(err.to_string().contains("TRIP_PLANNER_TEST_TOP_K"));

        env::set_var("TRIP_PLANNER_TEST_TOP_K", " 5 ");
        assert_eq!(parse_var::<usize>("TRIP_PLANNER_TEST_TOP_K").unwrap(), Some(5));
        env::remove_var("TRIP_PLANNER_TEST_TOP_K");
        assert_eq!(parse_var::<usize>("TRIP_PLANNER_TEST_TOP_K").unwrap(), None);
    }
}
