use std::{collections::HashMap, sync::Mutex, time::Duration};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::{
    core::VectorStore,
    error::{PlannerError, Result},
    types::RetrievedDocument,
};

pub const DEFAULT_CHROMA_URL: &str = "http://localhost:8001";
pub const DEFAULT_TENANT: &str = "default_tenant";
pub const DEFAULT_DATABASE: &str = "default_database";

/// Read-only client for a Chroma server (v2 REST API).
///
/// Collection ids are resolved by name on first use and remembered; the
/// serving path never creates or drops collections.
#[derive(Debug)]
pub struct ChromaStore {
    http: reqwest::Client,
    base_url: String,
    tenant: String,
    database: String,
    timeout: Duration,
    collection_ids: Mutex<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct CollectionModel {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<Map<String, Value>>>>>,
}

impl ChromaStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tenant: DEFAULT_TENANT.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            timeout: Duration::from_secs(30),
            collection_ids: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = tenant.into();
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn collections_url(&self) -> String {
        format!(
            "{}/api/v2/tenants/{}/databases/{}/collections",
            self.base_url, self.tenant, self.database
        )
    }

    async fn collection_id(&self, name: &str) -> Result<String> {
        if let Some(id) = self.cached_id(name) {
            return Ok(id);
        }

        let response = self
            .http
            .get(format!("{}/{}", self.collections_url(), name))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| PlannerError::VectorStore(format!("{name}: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlannerError::VectorStore(format!(
                "collection `{name}` unavailable (HTTP {status}): {body}"
            )));
        }

        let collection: CollectionModel = response.json().await.map_err(|err| {
            PlannerError::VectorStore(format!("collection `{name}` response invalid: {err}"))
        })?;

        if let Ok(mut ids) = self.collection_ids.lock() {
            ids.insert(name.to_string(), collection.id.clone());
        }
        Ok(collection.id)
    }

    fn cached_id(&self, name: &str) -> Option<String> {
        self.collection_ids
            .lock()
            .ok()
            .and_then(|ids| ids.get(name).cloned())
    }
}

#[async_trait]
impl VectorStore for ChromaStore {
    async fn similarity_search(
        &self,
        collection: &str,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievedDocument>> {
        let id = self.collection_id(collection).await?;

        let body = json!({
            "query_embeddings": [embedding],
            "n_results": k,
            "include": ["documents", "metadatas", "distances"],
        });

        let response = self
            .http
            .post(format!("{}/{}/query", self.collections_url(), id))
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|err| PlannerError::VectorStore(format!("{collection}: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlannerError::VectorStore(format!(
                "query on `{collection}` failed (HTTP {status}): {body}"
            )));
        }

        let parsed: QueryResponse = response.json().await.map_err(|err| {
            PlannerError::VectorStore(format!(
                "query on `{collection}` returned invalid JSON: {err}"
            ))
        })?;

        Ok(into_documents(parsed))
    }
}

// Chroma returns one row per query embedding; only one is ever sent.
fn into_documents(response: QueryResponse) -> Vec<RetrievedDocument> {
    let documents = response
        .documents
        .and_then(|rows| rows.into_iter().next())
        .unwrap_or_default();
    let mut metadatas = response
        .metadatas
        .and_then(|rows| rows.into_iter().next())
        .unwrap_or_default()
        .into_iter();

    documents
        .into_iter()
        .map(|content| {
            let metadata = metadatas.next().flatten().unwrap_or_default();
            (content, metadata)
        })
        .filter_map(|(content, metadata)| {
            content.map(|content| RetrievedDocument::new(content, metadata))
        })
        .collect()
}
