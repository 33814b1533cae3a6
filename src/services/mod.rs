//! Clients for the hosted services behind the planner's traits.

pub mod chroma;
pub mod huggingface;
pub mod memory_store;
pub mod openai_client;

pub use chroma::ChromaStore;
pub use huggingface::HuggingFaceExamples;
pub use memory_store::{cosine_similarity, InMemoryStore};
pub use openai_client::{ChatCompletionRequest, OpenAIClient};
