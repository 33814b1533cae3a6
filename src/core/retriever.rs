use crate::{error::Result, types::RetrievedDocument};
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

/// Place collections searched for every query, in merge order.
pub const PLACE_COLLECTIONS: [&str; 3] = ["restaurants", "hotels", "attractions"];

pub const DEFAULT_TOP_K: usize = 3;

/// Turns text into a vector. Query-time and ingestion-time embeddings must
/// come from the same model or similarity search is meaningless.
#[async_trait]
pub trait Embedder: Send + Sync + std::fmt::Debug {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Nearest-neighbour lookup over one named collection.
#[async_trait]
pub trait VectorStore: Send + Sync + std::fmt::Debug {
    /// Up to `k` documents ordered by similarity. A collection that does not
    /// exist is reported as an error.
    async fn similarity_search(
        &self,
        collection: &str,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievedDocument>>;
}

/// Searches every place collection with the same query and concatenates the
/// hits. Failures are logged and skipped, never returned.
#[derive(Debug, Clone)]
pub struct CompositeRetriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    collections: Vec<String>,
}

impl CompositeRetriever {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self {
            embedder,
            store,
            collections: PLACE_COLLECTIONS.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn with_collections<I, S>(mut self, collections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.collections = collections.into_iter().map(Into::into).collect();
        self
    }

    pub fn collections(&self) -> &[String] {
        &self.collections
    }

    /// At most `k * collections().len()` documents, grouped by collection in
    /// declaration order and by similarity rank within each group.
    pub async fn invoke(&self, query: &str, k: usize) -> Vec<RetrievedDocument> {
        if k == 0 || self.collections.is_empty() {
            return Vec::new();
        }

        let embedding = match self.embedder.embed(query).await {
            Ok(embedding) => embedding,
            Err(err) => {
                warn!(
                    target: "trip_planner::retrieval",
                    error = %err,
                    "query embedding failed; continuing without context"
                );
                return Vec::new();
            }
        };

        // join_all yields results in input order, whatever order they finish in.
        let searches = self
            .collections
            .iter()
            .map(|collection| self.search_collection(collection, &embedding, k));
        let per_collection = join_all(searches).await;

        let merged: Vec<RetrievedDocument> = per_collection.into_iter().flatten().collect();
        debug!(
            target: "trip_planner::retrieval",
            documents = merged.len(),
            "merged retrieval results"
        );
        merged
    }

    async fn search_collection(
        &self,
        collection: &str,
        embedding: &[f32],
        k: usize,
    ) -> Vec<RetrievedDocument> {
        match self.store.similarity_search(collection, embedding, k).await {
            Ok(mut docs) => {
                docs.truncate(k);
                for doc in &mut docs {
                    doc.tag_source(collection);
                }
                docs
            }
            Err(err) => {
                warn!(
                    target: "trip_planner::retrieval",
                    collection,
                    error = %err,
                    "error querying collection; skipping"
                );
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlannerError;
    use serde_json::{json, Map};
    use std::{collections::HashMap, time::Duration};

    #[derive(Debug)]
    struct FixedEmbedder;

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }
    }

    #[derive(Debug)]
    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(PlannerError::Upstream("embedding service down".to_string()))
        }
    }

    /// Returns `count` documents per known collection; the first collection
    /// answers last so completion order differs from declaration order.
    #[derive(Debug, Default)]
    struct ScriptedStore {
        counts: HashMap<&'static str, usize>,
    }

    #[async_trait]
    impl VectorStore for ScriptedStore {
        async fn similarity_search(
            &self,
            collection: &str,
            _embedding: &[f32],
            k: usize,
        ) -> Result<Vec<RetrievedDocument>> {
            if collection == "restaurants" {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            let count = self
                .counts
                .get(collection)
                .copied()
                .ok_or_else(|| PlannerError::VectorStore(format!("no collection {collection}")))?;
            Ok((0..count.min(k))
                .map(|idx| {
                    let metadata: Map<_, _> = json!({ "name": format!("{collection}-{idx}") })
                        .as_object()
                        .cloned()
                        .unwrap();
                    RetrievedDocument::new(format!("{collection} #{idx}"), metadata)
                })
                .collect())
        }
    }

    fn store(counts: &[(&'static str, usize)]) -> Arc<ScriptedStore> {
        Arc::new(ScriptedStore {
            counts: counts.iter().copied().collect(),
        })
    }

    #[tokio::test]
    async fn test_merge_preserves_collection_order() {
        let retriever = CompositeRetriever::new(
            Arc::new(FixedEmbedder),
            store(&[("restaurants", 3), ("hotels", 3), ("attractions", 3)]),
        );

        let docs = retriever.invoke("Paris", 2).await;
        let sources: Vec<_> = docs.iter().filter_map(|d| d.source_collection()).collect();
        assert_eq!(
            sources,
            vec!["restaurants", "restaurants", "hotels", "hotels", "attractions", "attractions"]
        );
        assert_eq!(docs[0].content, "restaurants #0");
    }

    #[tokio::test]
    async fn test_missing_collection_is_skipped() {
        let retriever = CompositeRetriever::new(
            Arc::new(FixedEmbedder),
            store(&[("restaurants", 1), ("attractions", 2)]),
        );

        let docs = retriever.invoke("Paris", 3).await;
        assert_eq!(docs.len(), 3);
        assert!(docs.iter().all(|d| d.source_collection() != Some("hotels")));
    }

    #[tokio::test]
    async fn test_all_collections_failing_yields_empty() {
        let retriever = CompositeRetriever::new(Arc::new(FixedEmbedder), store(&[]));
        assert!(retriever.invoke("Paris", 3).await.is_empty());
    }

    #[tokio::test]
    async fn test_embedding_failure_yields_empty() {
        let retriever = CompositeRetriever::new(
            Arc::new(FailingEmbedder),
            store(&[("restaurants", 3), ("hotels", 3), ("attractions", 3)]),
        );
        assert!(retriever.invoke("Paris", 3).await.is_empty());
    }

    #[tokio::test]
    async fn test_result_size_bounded_by_k() {
        let retriever = CompositeRetriever::new(
            Arc::new(FixedEmbedder),
            store(&[("restaurants", 10), ("hotels", 10), ("attractions", 10)]),
        );
        for k in 0..5 {
            assert!(retriever.invoke("Paris", k).await.len() <= 3 * k);
        }
    }

    #[tokio::test]
    async fn test_custom_collections() {
        let retriever = CompositeRetriever::new(
            Arc::new(FixedEmbedder),
            store(&[("hotels", 2), ("restaurants", 2)]),
        )
        .with_collections(["hotels", "restaurants"]);

        let docs = retriever.invoke("Rome", 1).await;
        let sources: Vec<_> = docs.iter().filter_map(|d| d.source_collection()).collect();
        assert_eq!(sources, vec!["hotels", "restaurants"]);
    }
}
