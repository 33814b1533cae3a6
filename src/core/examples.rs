use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Number of worked examples placed in every prompt.
pub const EXAMPLE_COUNT: usize = 2;

/// Cached in place of the example block when the source cannot be read.
pub const NO_EXAMPLES: &str = "No examples available.";

/// A reference query paired with the plan that answered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exemplar {
    pub query: String,
    pub plan: Value,
}

#[async_trait]
pub trait ExampleSource: Send + Sync + std::fmt::Debug {
    async fn fetch_examples(&self, n: usize) -> Result<Vec<Exemplar>>;
}

/// Write-once holder for the formatted example block.
///
/// Concurrent first callers wait on a single fetch. If that fetch is
/// cancelled the cell stays empty and the next caller fetches again.
#[derive(Debug)]
pub struct ExampleCache {
    source: Arc<dyn ExampleSource>,
    count: usize,
    block: OnceCell<String>,
}

impl ExampleCache {
    pub fn new(source: Arc<dyn ExampleSource>) -> Self {
        Self {
            source,
            count: EXAMPLE_COUNT,
            block: OnceCell::new(),
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.block.initialized()
    }

    /// The formatted block, fetching it on first use.
    pub async fn get(&self) -> &str {
        self.block.get_or_init(|| self.load()).await
    }

    /// Eager initialisation for server start-up.
    pub async fn preload(&self) {
        let block = self.get().await;
        info!(
            target: "trip_planner::examples",
            bytes = block.len(),
            "few-shot examples ready"
        );
    }

    async fn load(&self) -> String {
        info!(target: "trip_planner::examples", count = self.count, "loading few-shot examples");
        match self.source.fetch_examples(self.count).await {
            Ok(examples) if !examples.is_empty() => format_examples(&examples),
            Ok(_) => {
                warn!(target: "trip_planner::examples", "example source returned no rows");
                NO_EXAMPLES.to_string()
            }
            Err(err) => {
                warn!(
                    target: "trip_planner::examples",
                    error = %err,
                    "error loading few-shot examples"
                );
                NO_EXAMPLES.to_string()
            }
        }
    }
}

/// `Example N:` blocks with the plan pretty-printed so the model sees its shape.
pub fn format_examples(examples: &[Exemplar]) -> String {
    let mut formatted = String::new();
    for (idx, example) in examples.iter().enumerate() {
        let plan = serde_json::to_string_pretty(&example.plan)
            .unwrap_or_else(|_| example.plan.to_string());
        formatted.push_str(&format!(
            "\nExample {}:\nQuery: {}\nAnswer: {}\n",
            idx + 1,
            example.query,
            plan
        ));
    }
    formatted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlannerError;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ExampleSource for CountingSource {
        async fn fetch_examples(&self, n: usize) -> Result<Vec<Exemplar>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            if self.fail {
                return Err(PlannerError::ExampleFetch("offline".to_string()));
            }
            Ok((1..=n)
                .map(|idx| Exemplar {
                    query: format!("Plan trip {idx}"),
                    plan: json!([{ "day": idx, "city": "Paris" }]),
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn test_second_call_hits_cache() {
        let source = Arc::new(CountingSource::default());
        let cache = ExampleCache::new(source.clone());

        assert!(!cache.is_loaded());
        let first = cache.get().await.to_string();
        let second = cache.get().await.to_string();

        assert_eq!(first, second);
        assert!(cache.is_loaded());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(first.contains("Example 1:\nQuery: Plan trip 1\nAnswer: "));
        assert!(first.contains("Example 2:"));
    }

    #[tokio::test]
    async fn test_concurrent_first_access_fetches_once() {
        let source = Arc::new(CountingSource::default());
        let cache = Arc::new(ExampleCache::new(source.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get().await.to_string() })
            })
            .collect();

        let mut blocks = Vec::new();
        for handle in handles {
            blocks.push(handle.await.unwrap());
        }

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(blocks.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[tokio::test]
    async fn test_failure_caches_sentinel() {
        let source = Arc::new(CountingSource {
            fail: true,
            ..Default::default()
        });
        let cache = ExampleCache::new(source.clone());

        assert_eq!(cache.get().await, NO_EXAMPLES);
        assert_eq!(cache.get().await, NO_EXAMPLES);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_format_uses_pretty_json() {
        let block = format_examples(&[Exemplar {
            query: "Two days in Rome".to_string(),
            plan: json!({ "day": 1 }),
        }]);
        assert_eq!(
            block,
            "\nExample 1:\nQuery: Two days in Rome\nAnswer: {\n  \"day\": 1\n}\n"
        );
    }
}
