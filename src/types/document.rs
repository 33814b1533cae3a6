use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub const SOURCE_COLLECTION_KEY: &str = "source_collection";

/// Kind of place a reference document describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Restaurant,
    Hotel,
    Attraction,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Restaurant => "restaurant",
            Category::Hotel => "hotel",
            Category::Attraction => "attraction",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "restaurant" | "restaurants" => Some(Category::Restaurant),
            "hotel" | "hotels" => Some(Category::Hotel),
            "attraction" | "attractions" => Some(Category::Attraction),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference place returned by similarity search. Lives for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl RetrievedDocument {
    pub fn new(content: impl Into<String>, metadata: Map<String, Value>) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.metadata_str("name")
    }

    /// The stored `category`, falling back to the collection it came from.
    pub fn category(&self) -> Option<Category> {
        self.metadata_str("category")
            .and_then(Category::parse)
            .or_else(|| self.source_collection().and_then(Category::parse))
    }

    pub fn source_collection(&self) -> Option<&str> {
        self.metadata_str(SOURCE_COLLECTION_KEY)
    }

    pub fn tag_source(&mut self, collection: &str) {
        self.metadata.insert(
            SOURCE_COLLECTION_KEY.to_string(),
            Value::String(collection.to_string()),
        );
    }

    fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}
