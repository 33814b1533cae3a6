use crate::{
    core::{
        examples::ExampleCache,
        generation::{generate_itinerary, StructuredModel},
        prompt::assemble_prompt,
        retriever::{CompositeRetriever, DEFAULT_TOP_K},
    },
    error::{PlannerError, Result},
    types::Itinerary,
};
use std::{sync::Arc, time::Duration};
use tokio::time::timeout;
use tracing::info;

/// Retrieval, prompt assembly and generation for one query at a time.
///
/// Cheap to share behind an `Arc`; the example cache is the only state and
/// it is written once.
#[derive(Debug)]
pub struct TripPlanner {
    retriever: CompositeRetriever,
    examples: Arc<ExampleCache>,
    model: Arc<dyn StructuredModel>,
    top_k: usize,
    timeout: Duration,
}

impl TripPlanner {
    pub fn new(
        retriever: CompositeRetriever,
        examples: Arc<ExampleCache>,
        model: Arc<dyn StructuredModel>,
    ) -> Self {
        Self {
            retriever,
            examples,
            model,
            top_k: DEFAULT_TOP_K,
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Upper bound on one `plan` call, retrieval and example loading included.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn examples(&self) -> &ExampleCache {
        &self.examples
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// The query is checked for content but forwarded to the model as given.
    pub async fn plan(&self, query: &str) -> Result<Itinerary> {
        if query.trim().is_empty() {
            return Err(PlannerError::InvalidQuery(
                "query must not be empty".to_string(),
            ));
        }

        info!(target: "trip_planner::planner", query, "planning trip");

        let (itinerary, context_documents) = timeout(self.timeout, self.run(query))
            .await
            .map_err(|_| {
                PlannerError::Timeout(format!(
                    "trip planning exceeded {}s",
                    self.timeout.as_secs_f64()
                ))
            })??;

        info!(
            target: "trip_planner::planner",
            title = %itinerary.title,
            days = itinerary.days.len(),
            context_documents,
            "itinerary generated"
        );
        Ok(itinerary)
    }

    async fn run(&self, query: &str) -> Result<(Itinerary, usize)> {
        let documents = self.retriever.invoke(query, self.top_k).await;
        let examples = self.examples.get().await;
        let prompt = assemble_prompt(&documents, examples, query);

        let itinerary = generate_itinerary(self.model.as_ref(), &prompt).await?;
        Ok((itinerary, documents.len()))
    }
}
