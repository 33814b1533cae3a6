use std::{cmp::Ordering, collections::HashMap, sync::RwLock};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::{
    core::{Embedder, VectorStore},
    error::{PlannerError, Result},
    types::RetrievedDocument,
};

#[derive(Debug, Clone)]
struct StoredEntry {
    document: RetrievedDocument,
    embedding: Vec<f32>,
}

/// Process-local vector store ranking by cosine similarity.
///
/// Suitable for tests and small demos; equal scores keep insertion order.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, Vec<StoredEntry>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pre-embedded document, creating the collection if needed.
    pub fn add(
        &self,
        collection: &str,
        content: impl Into<String>,
        metadata: Map<String, Value>,
        embedding: Vec<f32>,
    ) -> Result<()> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| PlannerError::VectorStore("in-memory store lock poisoned".to_string()))?;

        collections
            .entry(collection.to_string())
            .or_default()
            .push(StoredEntry {
                document: RetrievedDocument::new(content, metadata),
                embedding,
            });
        Ok(())
    }

    /// Embed `content` with `embedder` and store it.
    pub async fn add_text(
        &self,
        embedder: &dyn Embedder,
        collection: &str,
        content: &str,
        metadata: Map<String, Value>,
    ) -> Result<()> {
        let embedding = embedder.embed(content).await?;
        self.add(collection, content, metadata, embedding)
    }

    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .map(|collections| collections.get(collection).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.collections
            .read()
            .map(|collections| collections.values().all(Vec::is_empty))
            .unwrap_or(true)
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn similarity_search(
        &self,
        collection: &str,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievedDocument>> {
        let collections = self
            .collections
            .read()
            .map_err(|_| PlannerError::VectorStore("in-memory store lock poisoned".to_string()))?;

        let entries = collections.get(collection).ok_or_else(|| {
            PlannerError::VectorStore(format!("collection `{collection}` does not exist"))
        })?;

        let mut scored: Vec<(f32, &StoredEntry)> = entries
            .iter()
            .map(|entry| (cosine_similarity(embedding, &entry.embedding), entry))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(_, entry)| entry.document.clone())
            .collect())
    }
}

/// Zero when either vector has no magnitude or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[tokio::test]
    async fn test_search_ranks_by_similarity() {
        let store = InMemoryStore::new();
        store.add("hotels", "far", Map::new(), vec![0.0, 1.0]).unwrap();
        store.add("hotels", "near", Map::new(), vec![1.0, 0.1]).unwrap();
        store.add("hotels", "middle", Map::new(), vec![1.0, 1.0]).unwrap();

        let docs = store.similarity_search("hotels", &[1.0, 0.0], 2).await.unwrap();
        let contents: Vec<_> = docs.iter().map(|d| d.content.as_str()).collect();
        assert_eq!(contents, vec!["near", "middle"]);
        assert_eq!(store.len("hotels"), 3);
    }

    #[test]
    fn test_missing_collection_errors() {
        let store = InMemoryStore::new();
        assert!(store.is_empty());
        let err = tokio_test::block_on(store.similarity_search("hotels", &[1.0], 3)).unwrap_err();
        assert!(err.is_absorbed());
    }
}
