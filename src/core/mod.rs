pub mod examples;
pub mod generation;
pub mod planner;
pub mod prompt;
pub mod retriever;

pub use examples::{format_examples, ExampleCache, ExampleSource, Exemplar, NO_EXAMPLES};
pub use generation::{generate_itinerary, generate_structured, StructuredModel};
pub use planner::TripPlanner;
pub use prompt::{assemble_prompt, format_context, PromptPayload};
pub use retriever::{CompositeRetriever, Embedder, VectorStore, DEFAULT_TOP_K, PLACE_COLLECTIONS};
