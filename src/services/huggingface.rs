use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{
    core::{ExampleSource, Exemplar},
    error::{PlannerError, Result},
};

pub const DEFAULT_ROWS_URL: &str = "https://datasets-server.huggingface.co/rows";
pub const DEFAULT_DATASET: &str = "osunlp/TravelPlanner";
pub const DEFAULT_SPLIT: &str = "validation";

/// Columns tried, in order, for the reference plan of a row.
const PLAN_COLUMNS: [&str; 2] = ["plan", "annotated_plan"];

/// Reads reference (query, plan) rows from the Hugging Face datasets server.
#[derive(Debug, Clone)]
pub struct HuggingFaceExamples {
    http: reqwest::Client,
    rows_url: String,
    dataset: String,
    config: String,
    split: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct RowsResponse {
    rows: Vec<RowEntry>,
}

#[derive(Debug, Deserialize)]
struct RowEntry {
    row: Value,
}

impl HuggingFaceExamples {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            rows_url: DEFAULT_ROWS_URL.to_string(),
            dataset: DEFAULT_DATASET.to_string(),
            config: DEFAULT_SPLIT.to_string(),
            split: DEFAULT_SPLIT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_rows_url(mut self, rows_url: impl Into<String>) -> Self {
        self.rows_url = rows_url.into();
        self
    }

    pub fn with_dataset(
        mut self,
        dataset: impl Into<String>,
        config: impl Into<String>,
        split: impl Into<String>,
    ) -> Self {
        self.dataset = dataset.into();
        self.config = config.into();
        self.split = split.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for HuggingFaceExamples {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExampleSource for HuggingFaceExamples {
    async fn fetch_examples(&self, n: usize) -> Result<Vec<Exemplar>> {
        let length = n.to_string();
        let response = self
            .http
            .get(&self.rows_url)
            .query(&[
                ("dataset", self.dataset.as_str()),
                ("config", self.config.as_str()),
                ("split", self.split.as_str()),
                ("offset", "0"),
                ("length", length.as_str()),
            ])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| PlannerError::ExampleFetch(format!("request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlannerError::ExampleFetch(format!(
                "datasets server returned HTTP {status}"
            )));
        }

        let body: RowsResponse = response
            .json()
            .await
            .map_err(|err| PlannerError::ExampleFetch(format!("invalid rows response: {err}")))?;

        debug!(target: "trip_planner::examples", rows = body.rows.len(), "fetched example rows");

        body.rows
            .into_iter()
            .take(n)
            .map(|entry| row_to_exemplar(entry.row))
            .collect()
    }
}

fn row_to_exemplar(row: Value) -> Result<Exemplar> {
    let query = row
        .get("query")
        .and_then(Value::as_str)
        .ok_or_else(|| PlannerError::ExampleFetch("row has no `query` column".to_string()))?
        .to_string();

    let plan = PLAN_COLUMNS
        .iter()
        .find_map(|column| row.get(*column).filter(|value| !value.is_null()))
        .cloned()
        .ok_or_else(|| PlannerError::ExampleFetch("row has no plan column".to_string()))?;

    Ok(Exemplar {
        query,
        plan: decode_once(plan),
    })
}

// A plan column holding JSON text is decoded a single time; anything that
// does not parse is kept as the original string.
fn decode_once(plan: Value) -> Value {
    match plan {
        Value::String(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        other => other,
    }
}
