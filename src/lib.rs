//! trip-planner-rs: retrieval-augmented trip planning with schema-validated output
//!
//! A query is embedded once and searched against the `restaurants`, `hotels`
//! and `attractions` collections. The merged places, two cached worked
//! examples and the request are sent to a chat model constrained to the
//! [`Itinerary`] JSON schema, and the reply is validated before it is
//! returned.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use trip_planner_rs::PlannerConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let planner = PlannerConfig::from_env()?.build_planner();
//!
//!     let itinerary = planner.plan("Plan a 2-day trip to Paris").await?;
//!     println!("{}", itinerary.to_markdown());
//!     Ok(())
//! }
//! ```

extern crate self as trip_planner_rs;

pub mod api;
pub mod config;
pub mod core;
pub mod error;
pub mod schemas;
pub mod services;
pub mod types;

pub use config::PlannerConfig;
pub use crate::core::{
    CompositeRetriever, Embedder, ExampleCache, ExampleSource, Exemplar, PromptPayload,
    StructuredModel, TripPlanner, VectorStore, PLACE_COLLECTIONS,
};
pub use error::{PlannerError, Result};
pub use schemas::{CompletionSchema, SchemaHandle};
pub use services::{ChromaStore, HuggingFaceExamples, InMemoryStore, OpenAIClient};
pub use tripplanner_macros::completion_schema;
pub use types::{Activity, Category, DayPlan, Itinerary, RetrievedDocument};

pub use schemas as schema;

#[cfg(feature = "cli")]
pub mod cli;
